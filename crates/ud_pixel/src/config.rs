use serde::{Deserialize, Serialize};

/// Pixel analyzer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PixelConfig {
    /// Side of the square analysis cell, in pixels.
    pub cell_size: u32,
    /// Minimum gradient magnitude (|dx| + |dy| on 8-bit luma) for an edge pixel.
    pub edge_threshold: u16,
    /// Fraction of edge pixels that makes a cell part of a region.
    pub min_cell_density: f32,
    /// Regions narrower or shorter than this are noise.
    pub min_size: u32,
    /// Regions wider or taller than this are layout panels, not elements.
    pub max_size: u32,
    /// Regions covering more than this fraction of the image are dropped.
    pub max_area_fraction: f32,
}

impl Default for PixelConfig {
    fn default() -> Self {
        Self {
            cell_size: 4,
            edge_threshold: 40,
            min_cell_density: 0.15,
            min_size: 8,
            max_size: 400,
            max_area_fraction: 0.25,
        }
    }
}
