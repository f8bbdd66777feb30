use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement};

use crate::driver::Overlay;

/// `#overlay`, faded with a CSS opacity transition.
pub struct DomOverlay {
    element: HtmlElement,
}

impl DomOverlay {
    pub fn find(document: &Document) -> Result<Self, JsValue> {
        let element = document
            .get_element_by_id("overlay")
            .ok_or("overlay not found")?
            .dyn_into::<HtmlElement>()?;
        Ok(Self { element })
    }

    fn apply(&self, props: &[(&str, &str)]) {
        let style = self.element.style();
        for (name, value) in props {
            if let Err(e) = style.set_property(name, value) {
                log::error!("overlay style {name}: {e:?}");
            }
        }
    }
}

impl Overlay for DomOverlay {
    fn show(&mut self, fade_ms: u32) {
        let transition = format!("opacity {fade_ms}ms");
        self.apply(&[
            ("transition", transition.as_str()),
            ("visibility", "visible"),
            ("opacity", "1"),
        ]);
    }

    fn hide(&mut self, fade_ms: u32) {
        // keep it visible until the fade has finished
        let transition = format!("opacity {fade_ms}ms, visibility 0s linear {fade_ms}ms");
        self.apply(&[
            ("transition", transition.as_str()),
            ("opacity", "0"),
            ("visibility", "hidden"),
        ]);
    }
}
