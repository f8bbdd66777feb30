//! Fixed uniform values: startup table and distance-driven modulations.

use crate::error::Result;
use crate::mapping::LinearMap;
use crate::pipeline::{Pipeline, Renderer, StageKind};

pub const INITIAL: &[(StageKind, &str, f32)] = &[
    (StageKind::BadTv, "distortion", 20.0),
    (StageKind::BadTv, "distortion2", 20.0),
    (StageKind::BadTv, "speed", 0.2),
    (StageKind::BadTv, "rollSpeed", 0.12),
    (StageKind::RgbShift, "angle", 0.0),
    (StageKind::RgbShift, "amount", 0.07),
    (StageKind::Static, "amount", 0.07),
    (StageKind::Film, "sCount", 679.0),
    (StageKind::Film, "sIntensity", 0.4),
    (StageKind::Film, "nIntensity", 0.3),
    (StageKind::Film, "grayscale", 0.0),
];

/// A uniform that fades from `far` (distance at the low threshold) to `near`
/// (distance at the high threshold).
#[derive(Debug, Clone, Copy)]
pub struct Modulation {
    pub stage: StageKind,
    pub uniform: &'static str,
    pub far: f64,
    pub near: f64,
}

const fn m(stage: StageKind, uniform: &'static str, far: f64, near: f64) -> Modulation {
    Modulation {
        stage,
        uniform,
        far,
        near,
    }
}

pub const MODULATIONS: &[Modulation] = &[
    m(StageKind::BadTv, "distortion", 20.0, 1.0),
    m(StageKind::BadTv, "distortion2", 20.0, 1.2),
    m(StageKind::BadTv, "speed", 20.0, 0.0),
    m(StageKind::BadTv, "rollSpeed", 0.12, 0.0),
    m(StageKind::RgbShift, "amount", 0.07, 0.01),
    m(StageKind::Film, "sIntensity", 0.4, 0.01),
    m(StageKind::Film, "nIntensity", 0.3, 0.0),
];

pub fn apply_initial<R: Renderer>(pipeline: &mut Pipeline<R>) -> Result<()> {
    for &(stage, name, value) in INITIAL {
        pipeline.set_uniform(stage, name, value)?;
    }
    Ok(())
}

/// Recompute every modulated uniform for `distance` against `[low, high]`.
pub fn apply_distance<R: Renderer>(
    pipeline: &mut Pipeline<R>,
    distance: f64,
    low: f64,
    high: f64,
) -> Result<()> {
    for md in MODULATIONS {
        let value = LinearMap::new(low, high, md.far, md.near)?.apply(distance);
        pipeline.set_uniform(md.stage, md.uniform, value as f32)?;
    }
    Ok(())
}
