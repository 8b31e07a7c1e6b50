use std::fmt;

use ud_core::{AccessibilityElement, TextRegion, VisualElement};

use crate::{Screenshot, WindowId, WindowInfo, WindowQuery};

/// Window resolution error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// No window satisfied the query.
    WindowNotFound(String),
    /// EnumWindows or an equivalent call failed.
    EnumerationFailed(String),
    /// The current platform has no backend.
    Unsupported(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::WindowNotFound(what) => write!(f, "window not found: {what}"),
            PlatformError::EnumerationFailed(msg) => write!(f, "window enumeration failed: {msg}"),
            PlatformError::Unsupported(msg) => write!(f, "unsupported platform: {msg}"),
        }
    }
}

impl std::error::Error for PlatformError {}

/// Structured failure of a detection tier.
///
/// Finding nothing is not an error: tiers return `Ok(vec![])` for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    /// The tier could not be attempted (missing models, no platform backend, ...).
    Unavailable(String),
    /// The tier was attempted and failed.
    Failed(String),
}

impl fmt::Display for TierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierError::Unavailable(msg) => write!(f, "unavailable: {msg}"),
            TierError::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

impl std::error::Error for TierError {}

/// Finds the target window.
pub trait WindowResolver: Send + Sync {
    fn resolve(&self, query: &WindowQuery) -> Result<WindowInfo, PlatformError>;
}

/// Accessibility/automation tier.
///
/// Takes `&mut self`: an implementation lives on one dedicated thread for its whole life and may
/// keep thread-affine state there.
pub trait AccessibilitySource: Send {
    fn collect(
        &mut self,
        window: WindowId,
        max_depth: u32,
    ) -> Result<Vec<AccessibilityElement>, TierError>;
}

/// OCR tier.
pub trait OcrSource: Send + Sync {
    fn recognize(&self, screenshot: &Screenshot) -> Result<Vec<TextRegion>, TierError>;
}

/// Pixel/visual-pattern tier.
pub trait PixelSource: Send + Sync {
    fn analyze(&self, screenshot: &Screenshot) -> Result<Vec<VisualElement>, TierError>;
}
