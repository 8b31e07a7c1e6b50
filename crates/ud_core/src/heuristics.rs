//! Label heuristics shared by the fusion engine and the OCR tier.

use std::collections::HashSet;

use crate::element::ControlType;

/// Score returned when one label is contained in the other (OCR truncation/padding).
pub const SUBSTRING_SIMILARITY: f64 = 0.8;

const BUTTON_LABELS: &[&str] = &[
    "ok", "cancel", "save", "submit", "sign in", "sign up", "log in", "login", "log out",
    "logout", "apply", "close", "yes", "no", "next", "back", "continue", "done", "finish",
    "delete", "remove", "add", "send", "search", "retry", "confirm", "accept", "decline",
    "browse", "install", "update", "upload", "download", "reset",
];

const MENU_LABELS: &[&str] = &[
    "file", "edit", "view", "help", "settings", "tools", "window", "format", "insert",
    "options", "preferences", "selection", "go", "run", "terminal", "history", "bookmarks",
];

/// Similarity of two labels in `[0, 1]`.
///
/// Exact match scores 1.0, containment scores [`SUBSTRING_SIMILARITY`], anything else falls back
/// to the Jaccard index of the two character sets. Missing or empty input scores 0.0.
pub fn text_similarity<'a>(a: impl Into<Option<&'a str>>, b: impl Into<Option<&'a str>>) -> f64 {
    let (Some(a), Some(b)) = (a.into(), b.into()) else {
        return 0.0;
    };
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a == b {
        return 1.0;
    }

    if a.contains(b) || b.contains(a) {
        return SUBSTRING_SIMILARITY;
    }

    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();
    let intersection = set_a.intersection(&set_b).count();
    if intersection == 0 {
        return 0.0;
    }
    let union = set_a.union(&set_b).count();

    intersection as f64 / union as f64
}

/// Infer a control type from OCR text alone.
///
/// Only a small vocabulary of actionable verbs and top-level menu words is recognized; everything
/// else is reported as plain `Text`.
pub fn guess_type_from_ocr_text(text: &str) -> ControlType {
    let normalized = text
        .trim()
        .trim_end_matches(['.', ':', '…'])
        .trim()
        .to_lowercase();

    if BUTTON_LABELS.contains(&normalized.as_str()) {
        ControlType::Button
    } else if MENU_LABELS.contains(&normalized.as_str()) {
        ControlType::MenuItem
    } else {
        ControlType::Text
    }
}
