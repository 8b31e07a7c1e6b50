//! Detection orchestrator.
//!
//! Resolves the target window, runs the selected tiers (accessibility on a dedicated worker
//! thread, OCR and pixel analysis on the blocking pool), waits for all of them and fuses their
//! candidates into one numbered element list.

pub mod error;
pub mod orchestrator;
pub mod request;
pub mod result;
pub mod worker;

pub use error::{DetectError, TierFailure};
pub use orchestrator::{Detector, DetectorBuilder};
pub use request::DetectionRequest;
pub use result::DetectionResult;
pub use worker::AccessibilityWorker;

pub use tokio_util::sync::CancellationToken;
