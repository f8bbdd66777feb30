#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Webcam feed through a chain of post-processing shader stages whose
//! intensity follows a face-distance signal.
//!
//! The effect logic (mapping, stage chain, animation driver) is plain Rust
//! and tested on the host; the browser glue lives in `wasm`.

pub mod config;
pub mod driver;
pub mod error;
pub mod mapping;
pub mod params;
pub mod pipeline;
pub mod scene;

pub use config::SessionConfig;
pub use driver::{DistanceSignal, FrameStatus, Overlay, RevealState, Session};
pub use error::{Error, Result};
pub use mapping::{map_range, LinearMap};
pub use pipeline::{Pipeline, Renderer, Stage, StageKind};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::driver::Session;
    use crate::SessionConfig;

    mod overlay;
    mod render;
    mod webcam;

    #[cfg(test)]
    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    type WebSession = Session<render::WebGlRenderer, overlay::DomOverlay>;

    thread_local! {
        static SESSION: RefCell<Option<Rc<RefCell<WebSession>>>> = const { RefCell::new(None) };
    }

    impl From<crate::Error> for JsValue {
        fn from(e: crate::Error) -> Self {
            JsValue::from_str(&e.to_string())
        }
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let Some(canvas) = document.get_element_by_id("c") else {
            // e.g. loaded by the test harness
            log::warn!("no #c canvas on this page, not starting");
            return Ok(());
        };
        let canvas = canvas.dyn_into::<web_sys::HtmlCanvasElement>()?;

        let config = SessionConfig::default().with_thresholds(
            canvas.get_attribute("data-face-low").as_deref(),
            canvas.get_attribute("data-face-high").as_deref(),
        )?;

        let webcam = webcam::Webcam::new(&document)?;
        webcam.request();

        let renderer = render::WebGlRenderer::new(&canvas, webcam.video().clone())?;
        let overlay = overlay::DomOverlay::find(&document)?;
        let session = Rc::new(RefCell::new(Session::new(config, renderer, overlay)?));
        SESSION.with(|s| *s.borrow_mut() = Some(session.clone()));

        log::info!("static intro starting");
        render::start(session, webcam)?;
        Ok(())
    }

    fn with_session(f: impl FnOnce(&mut WebSession)) {
        SESSION.with(|s| {
            if let Some(session) = s.borrow().as_ref() {
                f(&mut session.borrow_mut());
            }
        });
    }

    /// Feed the latest face distance from the tracker.
    #[wasm_bindgen]
    pub fn set_face_distance(distance: f64) {
        with_session(|s| s.set_distance(distance));
    }

    #[wasm_bindgen]
    pub fn set_face_found(found: bool) {
        with_session(|s| s.set_face_found(found));
    }

    #[wasm_bindgen]
    pub fn experience_begun() -> bool {
        let mut begun = false;
        with_session(|s| begun = s.experience_begun());
        begun
    }
}

