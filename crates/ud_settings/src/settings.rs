use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};
use ud_core::{FusionConfig, Tier};
use ud_ocr::OcrConfig;
use ud_pixel::PixelConfig;

use crate::defaults::*;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV_VAR: &str = "UI_DETECT_CONFIG";

/// Detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    // Tier selection
    #[serde(default = "default_tiers")]
    pub tiers: Vec<String>,
    /// Accessibility tree depth limit.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Time allowed for all selected tiers of one run.
    #[serde(default = "default_tier_timeout_ms")]
    pub tier_timeout_ms: u64,

    // OCR
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    #[serde(default = "default_ocr_models_dir")]
    pub ocr_models_dir: String,
    #[serde(default = "default_ocr_group_lines")]
    pub ocr_group_lines: bool,
    #[serde(default = "default_ocr_min_confidence")]
    pub ocr_min_confidence: f32,

    // Engine tuning
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub pixel: PixelConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            max_depth: default_max_depth(),
            tier_timeout_ms: default_tier_timeout_ms(),

            ocr_language: default_ocr_language(),
            ocr_models_dir: default_ocr_models_dir(),
            ocr_group_lines: default_ocr_group_lines(),
            ocr_min_confidence: default_ocr_min_confidence(),

            fusion: FusionConfig::default(),
            pixel: PixelConfig::default(),
        }
    }
}

impl Settings {
    fn settings_dir() -> PathBuf {
        default_home_dir().join(".ui_detect")
    }

    /// Settings file location: `$UI_DETECT_CONFIG` if set, else `<home>/.ui_detect/settings.json`.
    pub fn settings_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::settings_dir().join("settings.json"),
        }
    }

    /// Load settings from disk.
    ///
    /// Falls back to defaults if loading fails.
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    /// Load settings from `path`, falling back to defaults.
    ///
    /// Defaults are written out only when no file exists; an unreadable or invalid file is left
    /// untouched.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Settings>(&content) {
                Ok(settings) => {
                    debug!(path = %path.display(), "settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, writing defaults");
                let default_settings = Self::default();
                if let Err(e) = default_settings.save_to(path) {
                    warn!(path = %path.display(), error = %e, "failed to persist default settings");
                }
                default_settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read settings file, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Selected tiers, parsed and deduplicated in canonical order.
    ///
    /// Unknown names are logged and ignored.
    pub fn selected_tiers(&self) -> Vec<Tier> {
        let mut tiers: Vec<Tier> = self
            .tiers
            .iter()
            .filter_map(|name| match name.parse::<Tier>() {
                Ok(tier) => Some(tier),
                Err(e) => {
                    warn!("{e}, ignoring");
                    None
                }
            })
            .collect();
        tiers.sort();
        tiers.dedup();
        tiers
    }

    pub fn tier_timeout(&self) -> Duration {
        Duration::from_millis(self.tier_timeout_ms)
    }

    pub fn ocr_config(&self) -> OcrConfig {
        OcrConfig::new(&self.ocr_models_dir, &self.ocr_language)
            .with_group_lines(self.ocr_group_lines)
            .with_min_confidence(self.ocr_min_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "tiers": ["ocr"], "fusion": { "highIou": 0.8 } }"#).unwrap();

        assert_eq!(settings.tiers, vec!["ocr"]);
        assert_eq!(settings.max_depth, 8);
        assert_eq!(settings.tier_timeout_ms, 15_000);
        assert_eq!(settings.ocr_language, "english");
        assert_eq!(settings.fusion.high_iou, 0.8);
        assert_eq!(settings.fusion.moderate_iou, 0.3);
        assert_eq!(settings.pixel, PixelConfig::default());
    }

    #[test]
    fn tier_names_are_parsed_leniently() {
        let settings = Settings {
            tiers: vec![
                "pixel".into(),
                "OCR".into(),
                "bogus".into(),
                "uia".into(),
                "ocr".into(),
            ],
            ..Settings::default()
        };
        assert_eq!(
            settings.selected_tiers(),
            vec![Tier::Accessibility, Tier::Ocr, Tier::PixelAnalysis]
        );
    }

    #[test]
    fn defaults_select_every_tier() {
        assert_eq!(Settings::default().selected_tiers(), Tier::ALL.to_vec());
    }

    #[test]
    fn ocr_config_follows_settings() {
        let settings = Settings {
            ocr_language: "latin".into(),
            ocr_group_lines: true,
            ..Settings::default()
        };
        let config = settings.ocr_config();
        assert_eq!(config.language, "latin");
        assert!(config.group_lines);
        assert_eq!(config.models_dir, PathBuf::from("models"));
    }
}
