//! Pixel analysis tier.
//!
//! Finds visually distinct regions (icons, button outlines, images) from edge density alone,
//! without any model. Results are low-confidence hints meant to be corroborated by the other
//! tiers during fusion.

pub mod analyzer;
pub mod config;

pub use analyzer::{PixelAnalyzer, analyze_image, classify_region};
pub use config::PixelConfig;
