use thiserror::Error;

use crate::pipeline::StageKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input range of a linear map has zero (or negative, or non-finite) width.
    #[error("degenerate input range [{low}, {high}]")]
    DegenerateRange { low: f64, high: f64 },

    #[error("stage {stage:?} has no uniform named `{name}`")]
    UnknownUniform { stage: StageKind, name: String },

    #[error("pipeline has no {0:?} stage")]
    StageNotFound(StageKind),

    #[error("cannot add {0:?} after the presenting stage")]
    StageAfterPresent(StageKind),

    #[error("pipeline has no stage that renders to screen")]
    NoPresentStage,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("render failed: {0}")]
    Render(String),
}
