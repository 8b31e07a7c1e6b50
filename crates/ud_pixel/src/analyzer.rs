use anyhow::{Context, Result};
use image::GrayImage;
use tracing::debug;
use ud_core::{BoundingRect, ControlType, VisualElement};
use ud_platform::{PixelSource, Screenshot, TierError};

use crate::config::PixelConfig;

const MIN_CONFIDENCE: f32 = 0.5;
const MAX_CONFIDENCE: f32 = 0.8;

/// Largest side of a region still considered an icon.
const ICON_MAX_SIDE: i32 = 48;

/// Pixel analysis tier.
#[derive(Debug, Clone, Default)]
pub struct PixelAnalyzer {
    config: PixelConfig,
}

impl PixelAnalyzer {
    pub fn new(config: PixelConfig) -> Self {
        Self { config }
    }

    /// Decode and analyze encoded image bytes, in image coordinates.
    pub fn analyze_bytes(&self, image_data: &[u8]) -> Result<Vec<VisualElement>> {
        let gray = image::load_from_memory(image_data)
            .context("failed to decode screenshot")?
            .to_luma8();
        Ok(analyze_image(&gray, &self.config))
    }
}

impl PixelSource for PixelAnalyzer {
    fn analyze(&self, screenshot: &Screenshot) -> Result<Vec<VisualElement>, TierError> {
        let (dx, dy) = screenshot.origin;
        let regions = self
            .analyze_bytes(screenshot.bytes())
            .map_err(|e| TierError::Failed(format!("{e:#}")))?
            .into_iter()
            .map(|v| VisualElement {
                bounds: v.bounds.offset(dx, dy),
                ..v
            })
            .collect::<Vec<_>>();

        debug!(count = regions.len(), "pixel regions detected");
        Ok(regions)
    }
}

/// Grid of per-cell edge densities.
struct EdgeGrid {
    cols: u32,
    rows: u32,
    dense: Vec<bool>,
}

impl EdgeGrid {
    fn build(gray: &GrayImage, config: &PixelConfig) -> Self {
        let (width, height) = gray.dimensions();
        let cell = config.cell_size.max(1);
        let cols = width.div_ceil(cell);
        let rows = height.div_ceil(cell);
        let mut counts = vec![0u32; (cols * rows) as usize];

        let pixels = gray.as_raw();
        let at = |x: u32, y: u32| i32::from(pixels[(y * width + x) as usize]);

        for y in 0..height.saturating_sub(1) {
            for x in 0..width.saturating_sub(1) {
                let here = at(x, y);
                let magnitude = (at(x + 1, y) - here).abs() + (at(x, y + 1) - here).abs();
                if magnitude >= i32::from(config.edge_threshold) {
                    counts[((y / cell) * cols + x / cell) as usize] += 1;
                }
            }
        }

        let cell_pixels = (cell * cell) as f32;
        let dense = counts
            .into_iter()
            .map(|c| c as f32 / cell_pixels >= config.min_cell_density)
            .collect();

        Self { cols, rows, dense }
    }

    #[inline]
    fn index(&self, col: u32, row: u32) -> usize {
        (row * self.cols + col) as usize
    }

    /// 8-connected components of dense cells, as (min_col, min_row, max_col, max_row, cells).
    fn components(&self) -> Vec<(u32, u32, u32, u32, u32)> {
        let mut visited = vec![false; self.dense.len()];
        let mut out = Vec::new();
        let mut stack = Vec::new();

        for row in 0..self.rows {
            for col in 0..self.cols {
                let start = self.index(col, row);
                if !self.dense[start] || visited[start] {
                    continue;
                }

                visited[start] = true;
                stack.push((col, row));
                let (mut min_c, mut min_r, mut max_c, mut max_r, mut cells) = (col, row, col, row, 0);

                while let Some((c, r)) = stack.pop() {
                    cells += 1;
                    min_c = min_c.min(c);
                    min_r = min_r.min(r);
                    max_c = max_c.max(c);
                    max_r = max_r.max(r);

                    for (nc, nr) in neighbours(c, r, self.cols, self.rows) {
                        let i = self.index(nc, nr);
                        if self.dense[i] && !visited[i] {
                            visited[i] = true;
                            stack.push((nc, nr));
                        }
                    }
                }

                out.push((min_c, min_r, max_c, max_r, cells));
            }
        }

        out
    }
}

fn neighbours(col: u32, row: u32, cols: u32, rows: u32) -> impl Iterator<Item = (u32, u32)> {
    (-1i64..=1)
        .flat_map(|dr| (-1i64..=1).map(move |dc| (dc, dr)))
        .filter(|&(dc, dr)| dc != 0 || dr != 0)
        .filter_map(move |(dc, dr)| {
            let c = i64::from(col) + dc;
            let r = i64::from(row) + dr;
            (c >= 0 && r >= 0 && c < i64::from(cols) && r < i64::from(rows))
                .then_some((c as u32, r as u32))
        })
}

/// Detect visually distinct regions in a grayscale image.
///
/// Output is in image coordinates, ordered top to bottom then left to right.
pub fn analyze_image(gray: &GrayImage, config: &PixelConfig) -> Vec<VisualElement> {
    let (width, height) = gray.dimensions();
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let grid = EdgeGrid::build(gray, config);
    let cell = config.cell_size.max(1);
    let image_area = f64::from(width) * f64::from(height);

    let mut regions: Vec<VisualElement> = grid
        .components()
        .into_iter()
        .filter_map(|(min_c, min_r, max_c, max_r, cells)| {
            let left = min_c * cell;
            let top = min_r * cell;
            let right = ((max_c + 1) * cell).min(width);
            let bottom = ((max_r + 1) * cell).min(height);
            let (w, h) = (right - left, bottom - top);

            if w < config.min_size || h < config.min_size {
                return None;
            }
            if w > config.max_size || h > config.max_size {
                return None;
            }
            if f64::from(w) * f64::from(h) > image_area * f64::from(config.max_area_fraction) {
                return None;
            }

            let bbox_cells = (max_c - min_c + 1) * (max_r - min_r + 1);
            let fill = cells as f32 / bbox_cells as f32;
            let bounds = BoundingRect::new(left as i32, top as i32, w as i32, h as i32);

            Some(VisualElement {
                element_type: classify_region(&bounds),
                bounds,
                confidence: (MIN_CONFIDENCE + (MAX_CONFIDENCE - MIN_CONFIDENCE) * fill)
                    .clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
            })
        })
        .collect();

    regions.sort_by_key(|r| (r.bounds.y, r.bounds.x));
    regions
}

/// Infer a control type from region shape alone.
pub fn classify_region(bounds: &BoundingRect) -> ControlType {
    let (w, h) = (bounds.width, bounds.height);
    if w <= 0 || h <= 0 {
        return ControlType::Image;
    }
    let aspect = w as f32 / h as f32;

    if w <= ICON_MAX_SIDE && h <= ICON_MAX_SIDE && (0.75..=1.34).contains(&aspect) {
        ControlType::Icon
    } else if (16..=64).contains(&h) && (1.5..=8.0).contains(&aspect) {
        ControlType::Button
    } else {
        ControlType::Image
    }
}
