use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// OCR language information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrLanguageInfo {
    /// Language identifier (e.g. "chinese", "english").
    pub id: String,
    /// Recognition model filename.
    pub rec_model: String,
    /// Charset filename.
    pub charset_file: String,
}

/// OCR tier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// Directory containing the model files.
    pub models_dir: PathBuf,
    /// Language identifier.
    pub language: String,
    /// Merge words on the same row into one region per line.
    pub group_lines: bool,
    /// Regions below this confidence are dropped.
    pub min_confidence: f32,
}

impl OcrConfig {
    pub fn new(models_dir: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            language: language.into(),
            group_lines: false,
            min_confidence: 0.0,
        }
    }

    pub fn with_group_lines(mut self, group_lines: bool) -> Self {
        self.group_lines = group_lines;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}
