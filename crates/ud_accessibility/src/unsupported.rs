use ud_core::AccessibilityElement;
use ud_platform::{
    AccessibilitySource, PlatformError, TierError, WindowId, WindowInfo, WindowQuery, WindowResolver,
};

use crate::control::ChildControl;

const NO_BACKEND: &str = "native window enumeration is only implemented for Windows";

/// Window resolver stand-in for platforms without a backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowResolver;

impl Win32WindowResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn enumerate(&self) -> Result<Vec<WindowInfo>, PlatformError> {
        Err(PlatformError::Unsupported(NO_BACKEND.to_string()))
    }
}

impl WindowResolver for Win32WindowResolver {
    fn resolve(&self, _query: &WindowQuery) -> Result<WindowInfo, PlatformError> {
        Err(PlatformError::Unsupported(NO_BACKEND.to_string()))
    }
}

/// Accessibility tier stand-in for platforms without a backend.
#[derive(Debug, Default)]
pub struct Win32AccessibilitySource;

impl Win32AccessibilitySource {
    pub fn new() -> Self {
        Self
    }

    pub fn child_controls(&self, _window: WindowId) -> Result<Vec<ChildControl>, TierError> {
        Err(TierError::Unavailable(NO_BACKEND.to_string()))
    }
}

impl AccessibilitySource for Win32AccessibilitySource {
    fn collect(
        &mut self,
        window: WindowId,
        _max_depth: u32,
    ) -> Result<Vec<AccessibilityElement>, TierError> {
        self.child_controls(window).map(|_| Vec::new())
    }
}
