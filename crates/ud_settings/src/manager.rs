use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use ud_core::{FusionConfig, Tier};
use ud_ocr::OcrConfig;
use ud_pixel::PixelConfig;

use crate::Settings;

/// Unified config manager.
pub struct ConfigManager {
    path: PathBuf,
    settings: Arc<RwLock<Settings>>,
}

impl ConfigManager {
    /// Create a new config manager (loads settings once and caches them).
    pub fn new() -> Self {
        Self::with_path(Settings::settings_path())
    }

    /// Manage the settings file at `path` instead of the default location.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = Settings::load_from(&path);
        Self {
            path,
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Get a snapshot copy of current settings.
    pub fn get(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Get the shared settings reference.
    pub fn get_shared(&self) -> Arc<RwLock<Settings>> {
        Arc::clone(&self.settings)
    }

    /// Reload settings from disk.
    pub fn reload(&self) {
        let new_settings = Settings::load_from(&self.path);
        *self.settings.write() = new_settings;
    }

    /// Replace the cached settings and persist them.
    pub fn update(&self, settings: Settings) -> anyhow::Result<()> {
        settings.save_to(&self.path)?;
        *self.settings.write() = settings;
        Ok(())
    }

    // Convenience accessors.

    #[inline]
    pub fn selected_tiers(&self) -> Vec<Tier> {
        self.settings.read().selected_tiers()
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.settings.read().max_depth
    }

    #[inline]
    pub fn tier_timeout(&self) -> Duration {
        self.settings.read().tier_timeout()
    }

    #[inline]
    pub fn ocr_config(&self) -> OcrConfig {
        self.settings.read().ocr_config()
    }

    #[inline]
    pub fn fusion(&self) -> FusionConfig {
        self.settings.read().fusion
    }

    #[inline]
    pub fn pixel(&self) -> PixelConfig {
        self.settings.read().pixel
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
