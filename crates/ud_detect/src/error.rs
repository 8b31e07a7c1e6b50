use std::fmt;
use std::io;

use thiserror::Error;
use ud_core::Tier;
use ud_platform::{PlatformError, TierError};

/// Why one tier was excluded from a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    pub tier: Tier,
    pub error: TierError,
}

impl TierFailure {
    pub fn new(tier: Tier, error: TierError) -> Self {
        Self { tier, error }
    }
}

impl fmt::Display for TierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tier {}", self.tier, self.error)
    }
}

fn join_failures(failures: &[TierFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Detection errors.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("window not found: {0}")]
    WindowNotFound(String),

    #[error("window resolution failed: {0}")]
    WindowResolution(PlatformError),

    #[error("invalid screenshot: {0}")]
    InvalidScreenshot(String),

    #[error("no detection tier selected")]
    NoTiersSelected,

    #[error("every selected tier failed: {}", join_failures(.failures))]
    AllTiersFailed { failures: Vec<TierFailure> },

    #[error("detection cancelled")]
    Cancelled,

    #[error("failed to start detection runtime: {0}")]
    Io(#[from] io::Error),
}

impl From<PlatformError> for DetectError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::WindowNotFound(what) => DetectError::WindowNotFound(what),
            other => DetectError::WindowResolution(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_error_names_each_tier() {
        let err = DetectError::AllTiersFailed {
            failures: vec![
                TierFailure::new(Tier::Ocr, TierError::Unavailable("no models".into())),
                TierFailure::new(Tier::PixelAnalysis, TierError::Failed("bad image".into())),
            ],
        };
        assert_eq!(
            err.to_string(),
            "every selected tier failed: ocr tier unavailable: no models; \
             pixelAnalysis tier failed: bad image"
        );
    }

    #[test]
    fn platform_errors_map_to_window_errors() {
        let err: DetectError = PlatformError::WindowNotFound("window titled \"x\"".into()).into();
        assert!(matches!(err, DetectError::WindowNotFound(_)));

        let err: DetectError = PlatformError::Unsupported("linux".into()).into();
        assert!(matches!(err, DetectError::WindowResolution(_)));
    }
}
