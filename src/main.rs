//! Host-side helper: `cargo run` builds the wasm bundle into `static/pkg`
//! and serves `static/` locally so the camera page can be opened on
//! http://127.0.0.1:8000 (getUserMedia needs a secure or local origin).

use std::process::{exit, Command};
use std::env;

const PORT: &str = "8000";

fn main() {
    // Only meaningful on non-wasm targets.
    if env::var("TARGET").unwrap_or_default() == "wasm32-unknown-unknown" {
        return;
    }

    println!("Building WASM pkg …");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(_) => {
            eprintln!("wasm-pack finished with errors. Ensure wasm-pack is installed (https://rustwasm.github.io/wasm-pack/).");
            exit(1);
        }
        Err(_) => {
            eprintln!("wasm-pack not found in PATH. Skipping wasm build; the site may serve stale artifacts.");
        }
    }

    println!("Serving static/ at http://127.0.0.1:{PORT} (Ctrl-C to stop)");
    let status = Command::new("python3")
        .args(["-m", "http.server", PORT, "--bind", "127.0.0.1", "--directory", "static"])
        .status();
    match status {
        Ok(st) if st.success() => {}
        Ok(st) => {
            eprintln!("http server exited with {st}");
            exit(1);
        }
        Err(e) => {
            eprintln!("failed to start http server: {e}");
            exit(1);
        }
    }
}
