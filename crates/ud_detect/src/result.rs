use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use ud_core::{DetectedElement, Tier};
use ud_platform::WindowInfo;

/// Outcome of one detection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub window: WindowInfo,
    /// Fused elements, numbered `1..=N` in reading order.
    pub elements: Vec<DetectedElement>,
    /// Raw candidate count per selected tier; 0 for excluded tiers.
    pub tier_counts: BTreeMap<Tier, usize>,
    /// One entry per excluded tier.
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
    /// Annotated screenshot written by a downstream renderer, if any.
    pub annotated_image: Option<PathBuf>,
}

impl DetectionResult {
    pub fn element(&self, id: u32) -> Option<&DetectedElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn raw_count(&self) -> usize {
        self.tier_counts.values().sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
