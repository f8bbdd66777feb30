use log::{info, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, HtmlMediaElement, HtmlVideoElement, MediaStream, MediaStreamConstraints};

use crate::driver::FrameStatus;

const CAMERA_ERROR: &str = "Unable to capture WebCam. Please reload the page.";

/// Hidden `<video>` element fed by the user's camera.
pub struct Webcam {
    video: HtmlVideoElement,
    prompt: Option<Element>,
}

impl Webcam {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        let video = document
            .create_element("video")?
            .dyn_into::<HtmlVideoElement>()?;
        video.set_width(320);
        video.set_height(240);
        video.set_autoplay(true);
        video.set_loop(true);
        video.set_muted(true);
        video.set_attribute("playsinline", "")?;

        Ok(Self {
            video,
            prompt: document.get_element_by_id("prompt"),
        })
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    /// Ask for camera access in the background. On failure the prompt shows
    /// an error and the video simply never becomes ready.
    pub fn request(&self) {
        let video = self.video.clone();
        let prompt = self.prompt.clone();
        spawn_local(async move {
            match acquire(&video).await {
                Ok(()) => info!("camera stream bound"),
                Err(e) => {
                    warn!("camera unavailable: {e:?}");
                    report_failure(prompt.as_ref());
                }
            }
        });
    }

    pub fn frame_status(&self) -> FrameStatus {
        if self.video.ready_state() == HtmlMediaElement::HAVE_ENOUGH_DATA {
            FrameStatus::Ready
        } else {
            FrameStatus::NotReady
        }
    }
}

/// Tell the user the camera could not be opened. Rendering carries on over
/// an empty frame.
fn report_failure(prompt: Option<&Element>) {
    match prompt {
        Some(p) => p.set_text_content(Some(CAMERA_ERROR)),
        None => warn!("no #prompt element to report camera failure"),
    }
}

async fn acquire(video: &HtmlVideoElement) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let devices = window.navigator().media_devices()?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&JsValue::TRUE);
    let stream = JsFuture::from(devices.get_user_media_with_constraints(&constraints)?)
        .await?
        .dyn_into::<MediaStream>()?;

    video.set_src_object(Some(&stream));
    // autoplay covers most browsers; the returned promise is not awaited
    let _ = video.play()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    #[wasm_bindgen_test]
    fn camera_failure_fills_prompt() {
        let prompt = document().create_element("p").unwrap();
        report_failure(Some(&prompt));
        assert_eq!(prompt.text_content().as_deref(), Some(CAMERA_ERROR));
        // no prompt on the page is tolerated
        report_failure(None);
    }

    #[wasm_bindgen_test]
    fn video_without_stream_is_not_ready() {
        let cam = Webcam::new(&document()).unwrap();
        assert_eq!(cam.frame_status(), FrameStatus::NotReady);
    }
}
