use ocr_rs::OcrEngine;
use parking_lot::Mutex;
use tracing::{debug, info};
use ud_core::TextRegion;
use ud_platform::{OcrSource, Screenshot, TierError};

use crate::engine::{create_engine, decode_image, group_into_lines, recognize_image};
use crate::types::OcrConfig;

/// OCR tier backed by PaddleOCR models.
///
/// The engine is created lazily on first use and reused afterwards; missing model files make the
/// tier unavailable rather than failing the whole detection.
pub struct PaddleOcrSource {
    config: OcrConfig,
    engine: Mutex<Option<OcrEngine>>,
}

impl PaddleOcrSource {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            engine: Mutex::new(None),
        }
    }
}

impl OcrSource for PaddleOcrSource {
    fn recognize(&self, screenshot: &Screenshot) -> Result<Vec<TextRegion>, TierError> {
        let image = decode_image(screenshot.bytes()).map_err(|e| TierError::Failed(format!("{e:#}")))?;

        let regions = {
            let mut guard = self.engine.lock();
            if guard.is_none() {
                let engine =
                    create_engine(&self.config).map_err(|e| TierError::Unavailable(format!("{e:#}")))?;
                info!(language = %self.config.language, "OCR engine started");
                *guard = Some(engine);
            }
            let Some(engine) = guard.as_ref() else {
                return Err(TierError::Unavailable("OCR engine not initialized".into()));
            };
            recognize_image(engine, &image).map_err(|e| TierError::Failed(format!("{e:#}")))?
        };

        let regions = if self.config.group_lines {
            group_into_lines(regions)
        } else {
            regions
        };

        let (dx, dy) = screenshot.origin;
        let regions: Vec<TextRegion> = regions
            .into_iter()
            .filter(|r| r.confidence >= self.config.min_confidence)
            .map(|r| TextRegion {
                bounds: r.bounds.offset(dx, dy),
                ..r
            })
            .collect();

        debug!(count = regions.len(), "OCR regions recognized");
        Ok(regions)
    }
}
