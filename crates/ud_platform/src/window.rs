use serde::{Deserialize, Serialize};
use ud_core::BoundingRect;

/// Opaque window identifier.
///
/// Keeps platform window handles (e.g. Win32 `HWND`) from leaking across crate boundaries and
/// lets the handle cross threads. Platform backends convert to/from raw handles as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(usize);

impl WindowId {
    pub const INVALID: WindowId = WindowId(0);

    #[inline]
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> usize {
        self.0
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// How the caller identifies the target window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowQuery {
    /// A handle the caller already holds.
    Handle(WindowId),
    /// Case-insensitive substring of the window title; the topmost match wins.
    Title(String),
}

impl std::fmt::Display for WindowQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowQuery::Handle(id) => write!(f, "window {:#x}", id.raw()),
            WindowQuery::Title(title) => write!(f, "window titled \"{title}\""),
        }
    }
}

/// Resolved top-level window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub class_name: String,
    /// Window rect in screen coordinates.
    pub rect: BoundingRect,
    pub is_visible: bool,
    pub is_minimized: bool,
}

impl WindowInfo {
    /// True for windows worth detecting in: visible, restored, titled and non-empty.
    pub fn is_candidate(&self) -> bool {
        self.is_visible && !self.is_minimized && !self.title.is_empty() && !self.rect.is_degenerate()
    }

    /// Whether this window satisfies `query`.
    pub fn matches(&self, query: &WindowQuery) -> bool {
        match query {
            WindowQuery::Handle(id) => self.id == *id,
            WindowQuery::Title(needle) => self
                .title
                .to_lowercase()
                .contains(&needle.trim().to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(title: &str) -> WindowInfo {
        WindowInfo {
            id: WindowId::from_raw(0x42),
            title: title.to_string(),
            class_name: "Notepad".to_string(),
            rect: BoundingRect::new(0, 0, 800, 600),
            is_visible: true,
            is_minimized: false,
        }
    }

    #[test]
    fn title_query_is_case_insensitive_substring() {
        let w = window("Untitled - Notepad");
        assert!(w.matches(&WindowQuery::Title("notepad".into())));
        assert!(w.matches(&WindowQuery::Title(" UNTITLED ".into())));
        assert!(!w.matches(&WindowQuery::Title("Calculator".into())));
    }

    #[test]
    fn handle_query_matches_id() {
        let w = window("x");
        assert!(w.matches(&WindowQuery::Handle(WindowId::from_raw(0x42))));
        assert!(!w.matches(&WindowQuery::Handle(WindowId::INVALID)));
    }

    #[test]
    fn minimized_or_untitled_windows_are_not_candidates() {
        let mut w = window("Editor");
        assert!(w.is_candidate());
        w.is_minimized = true;
        assert!(!w.is_candidate());
        assert!(!window("").is_candidate());
    }
}
