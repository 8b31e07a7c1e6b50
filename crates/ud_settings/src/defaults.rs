use std::path::PathBuf;

use ud_core::Tier;

// Tier selection defaults
pub fn default_tiers() -> Vec<String> {
    Tier::ALL.iter().map(|t| t.name().to_string()).collect()
}

pub fn default_max_depth() -> u32 {
    8
}

pub fn default_tier_timeout_ms() -> u64 {
    15_000
}

// OCR defaults
pub fn default_ocr_language() -> String {
    "english".to_string()
}

pub fn default_ocr_models_dir() -> String {
    ud_ocr::DEFAULT_MODELS_DIR.to_string()
}

pub fn default_ocr_group_lines() -> bool {
    false
}

pub fn default_ocr_min_confidence() -> f32 {
    0.0
}

// Settings directory default
pub fn default_home_dir() -> PathBuf {
    // Prefer a user home directory.
    if let Ok(home_dir) = std::env::var("USERPROFILE") {
        return PathBuf::from(home_dir);
    }
    if let Ok(home_dir) = std::env::var("HOME") {
        return PathBuf::from(home_dir);
    }

    // Fallback: program directory.
    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        return exe_dir.to_path_buf();
    }

    // Last resort: cwd.
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
