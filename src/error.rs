use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Stage of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Loading,
    DetectingReference,
    DetectingTarget,
    Calibrating,
    Estimating,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Loading => "loading",
            PipelineState::DetectingReference => "reference detection",
            PipelineState::DetectingTarget => "target detection",
            PipelineState::Calibrating => "calibration",
            PipelineState::Estimating => "estimation",
            PipelineState::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("degenerate reference box {width}x{height}")]
    Degenerate { width: u32, height: u32 },

    #[error("reference box aspect {observed:.3} deviates from expected {expected:.3} by more than {tolerance}")]
    AspectMismatch {
        observed: f64,
        expected: f64,
        tolerance: f64,
    },

    #[error("reference size {real_width}x{real_height} is not positive and finite")]
    InvalidReference { real_width: f64, real_height: f64 },
}

/// Failure category, for callers that only route on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    DetectionFailed,
    Calibration,
    Timeout,
    InvalidInput,
    Aborted,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to decode image {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("{stage} found nothing")]
    DetectionFailed { stage: PipelineState },

    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("{stage} exceeded its {budget:?} budget")]
    Timeout {
        stage: PipelineState,
        budget: Duration,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{stage} aborted: {reason}")]
    Aborted { stage: PipelineState, reason: String },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode { .. } => ErrorKind::Decode,
            PipelineError::DetectionFailed { .. } => ErrorKind::DetectionFailed,
            PipelineError::Calibration(_) => ErrorKind::Calibration,
            PipelineError::Timeout { .. } => ErrorKind::Timeout,
            PipelineError::InvalidInput(_) => ErrorKind::InvalidInput,
            PipelineError::Aborted { .. } => ErrorKind::Aborted,
        }
    }

    /// Only timeouts are worth resubmitting unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Timeout { .. })
    }
}

/// Non-fatal: the estimate is returned but should be reviewed
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("combined confidence {confidence:.2} is below {threshold:.2}")]
pub struct LowConfidenceWarning {
    pub confidence: f64,
    pub threshold: f64,
}
