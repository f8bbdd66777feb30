#![cfg(target_arch = "wasm32")]

use static_intro::{FrameStatus, Overlay, Pipeline, Renderer, Session, SessionConfig, Stage};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[derive(Default)]
struct NullRenderer {
    frames: usize,
}

impl Renderer for NullRenderer {
    fn resize(&mut self, _: u32, _: u32) -> static_intro::Result<()> {
        Ok(())
    }

    fn upload_frame(&mut self) -> static_intro::Result<()> {
        Ok(())
    }

    fn render(&mut self, _: &[Stage], _: f32) -> static_intro::Result<()> {
        self.frames += 1;
        Ok(())
    }
}

struct ClassOverlay(web_sys::Element);

impl Overlay for ClassOverlay {
    fn show(&mut self, _: u32) {
        self.0.set_class_name("shown");
    }

    fn hide(&mut self, _: u32) {
        self.0.set_class_name("");
    }
}

fn timestamp() -> f64 {
    web_sys::window().unwrap().performance().unwrap().now()
}

#[wasm_bindgen_test]
fn webgl2_is_available() {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas = document
        .create_element("canvas")
        .unwrap()
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .unwrap();
    assert!(canvas.get_context("webgl2").unwrap().is_some());
}

#[wasm_bindgen_test]
fn session_drives_overlay_element() {
    let document = web_sys::window().unwrap().document().unwrap();
    let el = document.create_element("div").unwrap();

    let mut session = Session::new(
        SessionConfig::default(),
        NullRenderer::default(),
        ClassOverlay(el.clone()),
    )
    .unwrap();
    session.start();
    session.set_distance(1.9);

    let t0 = timestamp();
    session.tick(t0, FrameStatus::NotReady).unwrap();
    assert_eq!(el.class_name(), "shown");

    session.set_distance(1.0);
    session.tick(t0 + 16.0, FrameStatus::NotReady).unwrap();
    assert_eq!(el.class_name(), "");
    assert!(!session.experience_begun());
}

#[wasm_bindgen_test]
fn standard_chain_renders_with_null_backend() {
    let mut p = Pipeline::standard(NullRenderer::default()).unwrap();
    p.tick(0.1).unwrap();
    p.tick(0.1).unwrap();
    assert_eq!(p.renderer().frames, 2);
}
