use ud_core::Tier;
use ud_platform::{Screenshot, WindowQuery};
use ud_settings::Settings;

/// Default accessibility tree depth limit.
pub const DEFAULT_MAX_DEPTH: u32 = 8;

/// One detection invocation.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub window: WindowQuery,
    /// Tiers to run; duplicates are ignored.
    pub tiers: Vec<Tier>,
    /// Already-captured image of the window. Required by the OCR and pixel tiers.
    pub screenshot: Option<Screenshot>,
    /// Accessibility tree depth limit.
    pub max_depth: u32,
}

impl DetectionRequest {
    /// Request every tier with default limits.
    pub fn new(window: WindowQuery, screenshot: Option<Screenshot>) -> Self {
        Self {
            window,
            tiers: Tier::ALL.to_vec(),
            screenshot,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Request with tier selection and depth taken from `settings`.
    pub fn from_settings(window: WindowQuery, screenshot: Option<Screenshot>, settings: &Settings) -> Self {
        Self {
            window,
            tiers: settings.selected_tiers(),
            screenshot,
            max_depth: settings.max_depth,
        }
    }

    pub fn with_tiers(mut self, tiers: impl IntoIterator<Item = Tier>) -> Self {
        self.tiers = tiers.into_iter().collect();
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Selected tiers, deduplicated in canonical order.
    pub fn selected_tiers(&self) -> Vec<Tier> {
        let mut tiers = self.tiers.clone();
        tiers.sort();
        tiers.dedup();
        tiers
    }

    pub(crate) fn needs_screenshot(&self) -> bool {
        self.tiers.iter().any(|t| *t != Tier::Accessibility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_deduplicated_in_canonical_order() {
        let request = DetectionRequest::new(WindowQuery::Title("x".into()), None).with_tiers([
            Tier::PixelAnalysis,
            Tier::Ocr,
            Tier::PixelAnalysis,
        ]);
        assert_eq!(request.selected_tiers(), vec![Tier::Ocr, Tier::PixelAnalysis]);
        assert!(request.needs_screenshot());
    }

    #[test]
    fn accessibility_alone_needs_no_screenshot() {
        let request = DetectionRequest::new(WindowQuery::Title("x".into()), None)
            .with_tiers([Tier::Accessibility]);
        assert!(!request.needs_screenshot());
    }
}
