//! Ordered post-processing chain over a renderer backend.
//!
//! The chain is library-agnostic: a [`Renderer`] receives the stage list each
//! tick and decides how to execute it. The browser build drives WebGL2; tests
//! use a recording fake.

use crate::error::{Error, Result};

/// One step of the effect chain. Order in [`Pipeline::standard`] is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Camera + mirrored video plane.
    Scene,
    Film,
    BadTv,
    RgbShift,
    Static,
    Copy,
}

impl StageKind {
    /// Uniforms the stage's shader declares, with their shader defaults.
    pub fn default_uniforms(self) -> &'static [(&'static str, f32)] {
        match self {
            StageKind::Scene => &[],
            StageKind::Film => &[
                ("time", 0.0),
                ("nIntensity", 0.5),
                ("sIntensity", 0.05),
                ("sCount", 4096.0),
                ("grayscale", 1.0),
            ],
            StageKind::BadTv => &[
                ("time", 0.0),
                ("distortion", 3.0),
                ("distortion2", 5.0),
                ("speed", 0.2),
                ("rollSpeed", 0.1),
            ],
            StageKind::RgbShift => &[("amount", 0.005), ("angle", 0.0)],
            StageKind::Static => &[("time", 0.0), ("amount", 0.5), ("size", 4.0)],
            StageKind::Copy => &[("opacity", 1.0)],
        }
    }

    pub fn is_time_dependent(self) -> bool {
        self.default_uniforms().iter().any(|(n, _)| *n == "time")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    kind: StageKind,
    uniforms: Vec<(&'static str, f32)>,
    render_to_screen: bool,
}

impl Stage {
    pub fn new(kind: StageKind) -> Self {
        Self {
            kind,
            uniforms: kind.default_uniforms().to_vec(),
            render_to_screen: false,
        }
    }

    /// The final copy-to-screen stage.
    pub fn present() -> Self {
        Self {
            render_to_screen: true,
            ..Self::new(StageKind::Copy)
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn renders_to_screen(&self) -> bool {
        self.render_to_screen
    }

    pub fn uniforms(&self) -> &[(&'static str, f32)] {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<f32> {
        self.uniforms.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn set_uniform(&mut self, name: &str, value: f32) -> Result<()> {
        match self.uniforms.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                slot.1 = value;
                Ok(())
            }
            None => Err(Error::UnknownUniform {
                stage: self.kind,
                name: name.to_string(),
            }),
        }
    }
}

/// Rendering backend. `render` runs every stage in order; the stage flagged
/// `renders_to_screen` targets the visible surface.
pub trait Renderer {
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Re-sample the current video frame into the scene texture.
    fn upload_frame(&mut self) -> Result<()>;

    fn render(&mut self, stages: &[Stage], delta: f32) -> Result<()>;
}

pub struct Pipeline<R> {
    renderer: R,
    stages: Vec<Stage>,
    frame_dirty: bool,
}

impl<R: Renderer> Pipeline<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            stages: Vec::new(),
            frame_dirty: false,
        }
    }

    /// Scene -> film -> bad TV -> RGB shift -> static -> copy to screen.
    pub fn standard(renderer: R) -> Result<Self> {
        let mut p = Self::new(renderer);
        for kind in [
            StageKind::Scene,
            StageKind::Film,
            StageKind::BadTv,
            StageKind::RgbShift,
            StageKind::Static,
        ] {
            p.add_stage(Stage::new(kind))?;
        }
        p.add_stage(Stage::present())?;
        Ok(p)
    }

    pub fn add_stage(&mut self, stage: Stage) -> Result<()> {
        if self.stages.iter().any(Stage::renders_to_screen) {
            return Err(Error::StageAfterPresent(stage.kind()));
        }
        self.stages.push(stage);
        Ok(())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, kind: StageKind) -> Option<&Stage> {
        self.stages.iter().find(|s| s.kind() == kind)
    }

    pub fn stage_mut(&mut self, kind: StageKind) -> Result<&mut Stage> {
        self.stages
            .iter_mut()
            .find(|s| s.kind() == kind)
            .ok_or(Error::StageNotFound(kind))
    }

    pub fn set_uniform(&mut self, kind: StageKind, name: &str, value: f32) -> Result<()> {
        self.stage_mut(kind)?.set_uniform(name, value)
    }

    /// Write `value` into every stage that declares `name`; returns how many
    /// stages were updated.
    pub fn broadcast_uniform(&mut self, name: &str, value: f32) -> Result<usize> {
        let mut updated = 0;
        for stage in self.stages.iter_mut().filter(|s| s.uniform(name).is_some()) {
            stage.set_uniform(name, value)?;
            updated += 1;
        }
        Ok(updated)
    }

    pub fn mark_frame_dirty(&mut self) {
        self.frame_dirty = true;
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.renderer.resize(width, height)
    }

    pub fn tick(&mut self, delta: f32) -> Result<()> {
        if !self.stages.last().is_some_and(Stage::renders_to_screen) {
            return Err(Error::NoPresentStage);
        }
        if self.frame_dirty {
            self.renderer.upload_frame()?;
            self.frame_dirty = false;
        }
        self.renderer.render(&self.stages, delta)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Resize(u32, u32),
        Upload,
        Render(Vec<StageKind>),
    }

    /// Records every backend call; never touches a GPU.
    #[derive(Debug, Default)]
    pub struct RecordingRenderer {
        pub calls: Vec<Call>,
        pub last_stages: Vec<Stage>,
    }

    impl Renderer for RecordingRenderer {
        fn resize(&mut self, width: u32, height: u32) -> Result<()> {
            self.calls.push(Call::Resize(width, height));
            Ok(())
        }

        fn upload_frame(&mut self) -> Result<()> {
            self.calls.push(Call::Upload);
            Ok(())
        }

        fn render(&mut self, stages: &[Stage], _delta: f32) -> Result<()> {
            self.calls
                .push(Call::Render(stages.iter().map(Stage::kind).collect()));
            self.last_stages = stages.to_vec();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{Call, RecordingRenderer};
    use super::*;

    #[test]
    fn standard_order_ends_with_single_present_stage() {
        let p = Pipeline::standard(RecordingRenderer::default()).unwrap();
        let kinds: Vec<_> = p.stages().iter().map(Stage::kind).collect();
        assert_eq!(
            kinds,
            [
                StageKind::Scene,
                StageKind::Film,
                StageKind::BadTv,
                StageKind::RgbShift,
                StageKind::Static,
                StageKind::Copy,
            ]
        );
        let presenting: Vec<_> = p.stages().iter().filter(|s| s.renders_to_screen()).collect();
        assert_eq!(presenting.len(), 1);
        assert_eq!(presenting[0].kind(), StageKind::Copy);
        assert!(p.stages().last().unwrap().renders_to_screen());
    }

    #[test]
    fn rejects_stage_after_present() {
        let mut p = Pipeline::standard(RecordingRenderer::default()).unwrap();
        assert_eq!(
            p.add_stage(Stage::new(StageKind::Film)),
            Err(Error::StageAfterPresent(StageKind::Film))
        );
        assert_eq!(
            p.add_stage(Stage::present()),
            Err(Error::StageAfterPresent(StageKind::Copy))
        );
        assert_eq!(p.stages().len(), 6);
    }

    #[test]
    fn tick_without_present_stage_fails() {
        let mut p = Pipeline::new(RecordingRenderer::default());
        p.add_stage(Stage::new(StageKind::Scene)).unwrap();
        assert_eq!(p.tick(0.1), Err(Error::NoPresentStage));
        assert!(p.renderer().calls.is_empty());
    }

    #[test]
    fn unknown_uniform_is_rejected() {
        let mut p = Pipeline::standard(RecordingRenderer::default()).unwrap();
        let err = p.set_uniform(StageKind::RgbShift, "time", 1.0).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownUniform {
                stage: StageKind::RgbShift,
                name: "time".into()
            }
        );
    }

    #[test]
    fn broadcast_only_touches_declaring_stages() {
        let mut p = Pipeline::standard(RecordingRenderer::default()).unwrap();
        assert_eq!(p.broadcast_uniform("time", 2.5).unwrap(), 3);
        assert_eq!(p.broadcast_uniform("noSuchUniform", 1.0).unwrap(), 0);
        for s in p.stages() {
            assert_eq!(s.uniform("time").is_some(), s.kind().is_time_dependent());
            if let Some(t) = s.uniform("time") {
                assert_eq!(t, 2.5);
            }
        }
        let time_stages: Vec<_> = p
            .stages()
            .iter()
            .filter(|s| s.kind().is_time_dependent())
            .map(Stage::kind)
            .collect();
        assert_eq!(time_stages, [StageKind::Film, StageKind::BadTv, StageKind::Static]);
    }

    #[test]
    fn dirty_frame_is_uploaded_once() {
        let mut p = Pipeline::standard(RecordingRenderer::default()).unwrap();
        p.mark_frame_dirty();
        p.tick(0.1).unwrap();
        p.tick(0.1).unwrap();
        let uploads = p
            .renderer()
            .calls
            .iter()
            .filter(|c| **c == Call::Upload)
            .count();
        assert_eq!(uploads, 1);
        assert_eq!(p.renderer().calls[0], Call::Upload);
    }

    #[test]
    fn uniform_order_is_stable() {
        let mut s = Stage::new(StageKind::BadTv);
        s.set_uniform("rollSpeed", 0.12).unwrap();
        let names: Vec<_> = s.uniforms().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["time", "distortion", "distortion2", "speed", "rollSpeed"]);
    }
}
