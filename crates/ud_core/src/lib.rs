//! Platform-neutral core of the UI element detector: geometry, the unified element model,
//! label heuristics and the multi-source fusion engine.

pub mod element;
pub mod fusion;
pub mod geometry;
pub mod heuristics;

pub use element::{
    ACCESSIBILITY_CONFIDENCE, AccessibilityElement, Candidate, ControlType, DetectedElement,
    Sources, TextRegion, Tier, UnknownTier, VisualElement,
};
pub use fusion::{
    FusionConfig, FusionReport, MatchScore, fuse, fuse_candidates, fuse_with_report, is_match,
    merge_pair,
};
pub use geometry::BoundingRect;
pub use heuristics::{guess_type_from_ocr_text, text_similarity};
