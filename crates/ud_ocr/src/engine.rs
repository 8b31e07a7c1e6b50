use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use ocr_rs::OcrEngine;
use ud_core::{BoundingRect, TextRegion};

use crate::types::{OcrConfig, OcrLanguageInfo};

/// Detection model shared by every language.
const DETECTION_MODEL: &str = "PP-OCRv5_mobile_det.mnn";

/// Rows whose tops are within this many pixels are one text line.
pub const LINE_HEIGHT_THRESHOLD: i32 = 20;

// (id, rec_model, charset)
const LANGUAGE_MODELS: &[(&str, &str, &str)] = &[
    (
        "chinese",
        "PP-OCRv5_mobile_rec.mnn",
        "ppocr_keys_v5.txt",
    ),
    (
        "english",
        "en_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_en.txt",
    ),
    (
        "korean",
        "korean_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_korean.txt",
    ),
    (
        "cyrillic",
        "cyrillic_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_cyrillic.txt",
    ),
    (
        "latin",
        "latin_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_latin.txt",
    ),
    (
        "greek",
        "el_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_el.txt",
    ),
];

/// Resolve (detection, recognition, charset) model paths for the given config.
///
/// Falls back to the first installed language when the requested one is missing.
pub fn get_model_paths(config: &OcrConfig) -> Result<(PathBuf, PathBuf, PathBuf)> {
    let det_path = config.models_dir.join(DETECTION_MODEL);

    let available_languages = get_available_languages(&config.models_dir);
    let lang_info = available_languages
        .iter()
        .find(|l| l.id == config.language)
        .or_else(|| available_languages.first())
        .ok_or_else(|| {
            anyhow!(
                "no OCR language model installed in {}",
                config.models_dir.display()
            )
        })?;

    let rec_path = config.models_dir.join(&lang_info.rec_model);
    let charset_path = config.models_dir.join(&lang_info.charset_file);

    if !det_path.exists() {
        return Err(anyhow!("detection model missing: {}", det_path.display()));
    }

    Ok((det_path, rec_path, charset_path))
}

/// Detect installed OCR languages by inspecting the models directory.
pub fn get_available_languages(models_dir: &Path) -> Vec<OcrLanguageInfo> {
    LANGUAGE_MODELS
        .iter()
        .filter(|(_, rec_model, charset)| {
            models_dir.join(rec_model).exists() && models_dir.join(charset).exists()
        })
        .map(|(id, rec_model, charset)| OcrLanguageInfo {
            id: id.to_string(),
            rec_model: rec_model.to_string(),
            charset_file: charset.to_string(),
        })
        .collect()
}

/// Create an OCR engine instance.
pub fn create_engine(config: &OcrConfig) -> Result<OcrEngine> {
    let (det_path, rec_path, charset_path) = get_model_paths(config)?;

    OcrEngine::new(&det_path, &rec_path, &charset_path, None)
        .map_err(|e| anyhow!("failed to create OCR engine: {e}"))
}

/// Decode encoded screenshot bytes.
pub fn decode_image(image_data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(image_data).context("failed to decode screenshot")
}

/// Recognize text regions in an image. Blank results are dropped; an image without text yields
/// an empty list.
pub fn recognize_image(engine: &OcrEngine, image: &DynamicImage) -> Result<Vec<TextRegion>> {
    let raw_results = engine
        .recognize(image)
        .map_err(|e| anyhow!("OCR recognition failed: {e}"))?;

    Ok(raw_results
        .into_iter()
        .filter(|r| !r.text.trim().is_empty())
        .map(|r| TextRegion {
            text: r.text.trim().to_string(),
            confidence: r.confidence,
            bounds: BoundingRect::new(
                r.bbox.rect.left(),
                r.bbox.rect.top(),
                r.bbox.rect.width() as i32,
                r.bbox.rect.height() as i32,
            ),
        })
        .collect())
}

/// Group word regions into lines based on coordinates.
///
/// Regions whose tops lie within [`LINE_HEIGHT_THRESHOLD`] of a line's first region join that
/// line; each line is joined left to right with single spaces, its box is the union of its
/// members and its confidence the mean. Output is sorted top to bottom.
pub fn group_into_lines(regions: Vec<TextRegion>) -> Vec<TextRegion> {
    let mut regions = regions;
    regions.sort_by_key(|r| r.bounds.y);

    let mut text_lines: Vec<Vec<TextRegion>> = Vec::new();
    for region in regions {
        let line = text_lines.iter_mut().find(|line| {
            line.first()
                .is_some_and(|first| (region.bounds.y - first.bounds.y).abs() <= LINE_HEIGHT_THRESHOLD)
        });

        match line {
            Some(line) => line.push(region),
            None => text_lines.push(vec![region]),
        }
    }

    let mut final_results = Vec::with_capacity(text_lines.len());
    for mut line_blocks in text_lines {
        line_blocks.sort_by_key(|r| r.bounds.x);

        let line_text = line_blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let line_text = line_text.trim();
        if line_text.is_empty() {
            continue;
        }

        let bounds = line_blocks
            .iter()
            .skip(1)
            .fold(line_blocks[0].bounds, |acc, b| acc.union(&b.bounds));
        let total_confidence: f32 = line_blocks.iter().map(|b| b.confidence).sum();

        final_results.push(TextRegion {
            text: line_text.to_string(),
            bounds,
            confidence: total_confidence / line_blocks.len() as f32,
        });
    }

    final_results.sort_by_key(|r| r.bounds.y);
    final_results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: i32, y: i32, w: i32, confidence: f32) -> TextRegion {
        TextRegion {
            text: text.to_string(),
            bounds: BoundingRect::new(x, y, w, 18),
            confidence,
        }
    }

    #[test]
    fn words_on_one_row_become_one_line() {
        let lines = group_into_lines(vec![
            word("in", 60, 12, 20, 0.8),
            word("Sign", 10, 10, 40, 1.0),
            word("Password", 10, 60, 90, 0.9),
        ]);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Sign in");
        assert_eq!(lines[0].bounds, BoundingRect::new(10, 10, 70, 20));
        assert!((lines[0].confidence - 0.9).abs() < 1e-6);
        assert_eq!(lines[1].text, "Password");
    }

    #[test]
    fn grouping_empty_input_is_empty() {
        assert!(group_into_lines(Vec::new()).is_empty());
    }

    #[test]
    fn missing_models_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = OcrConfig::new(dir.path(), "english");

        assert!(get_available_languages(dir.path()).is_empty());
        assert!(get_model_paths(&config).is_err());
        assert!(create_engine(&config).is_err());
    }

    #[test]
    fn falls_back_to_first_installed_language() {
        let dir = tempfile::tempdir().unwrap();
        for file in [
            DETECTION_MODEL,
            "latin_PP-OCRv5_mobile_rec_infer.mnn",
            "ppocr_keys_latin.txt",
        ] {
            std::fs::write(dir.path().join(file), b"").unwrap();
        }

        let langs = get_available_languages(dir.path());
        assert_eq!(langs.len(), 1);
        assert_eq!(langs[0].id, "latin");

        let (_, rec, charset) = get_model_paths(&OcrConfig::new(dir.path(), "english")).unwrap();
        assert!(rec.ends_with("latin_PP-OCRv5_mobile_rec_infer.mnn"));
        assert!(charset.ends_with("ppocr_keys_latin.txt"));
    }
}
