use ud_core::{AccessibilityElement, BoundingRect, ControlType};
use ud_platform::{PlatformError, WindowInfo, WindowQuery};

// Button styles (low nibble of GWL_STYLE).
const BS_TYPEMASK: u32 = 0x0F;
const BS_CHECKBOX: u32 = 0x02;
const BS_AUTOCHECKBOX: u32 = 0x03;
const BS_RADIOBUTTON: u32 = 0x04;
const BS_3STATE: u32 = 0x05;
const BS_AUTO3STATE: u32 = 0x06;
const BS_GROUPBOX: u32 = 0x07;
const BS_AUTORADIOBUTTON: u32 = 0x09;

/// Child control as reported by the window system.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildControl {
    pub class_name: String,
    pub text: String,
    /// Control rect in screen coordinates.
    pub rect: BoundingRect,
    /// Raw window style bits.
    pub style: u32,
    /// Dialog control id; 0 when the control has none.
    pub control_id: i32,
    pub is_visible: bool,
    pub is_enabled: bool,
    /// Distance from the target window; direct children are at depth 1.
    pub depth: u32,
}

impl ChildControl {
    pub fn control_type(&self) -> ControlType {
        control_type_for_class(&self.class_name, self.style)
    }

    pub fn to_element(&self) -> AccessibilityElement {
        AccessibilityElement {
            control_type: self.control_type(),
            name: self.text.trim().to_string(),
            stable_id: (self.control_id > 0).then(|| self.control_id.to_string()),
            is_enabled: self.is_enabled,
            is_interactable: self.is_visible && self.is_enabled,
            bounds: self.rect,
        }
    }
}

/// Map a window class name (and, for buttons, its style) to a control type.
pub fn control_type_for_class(class_name: &str, style: u32) -> ControlType {
    let class = class_name.to_ascii_lowercase();
    match class.as_str() {
        "button" => match style & BS_TYPEMASK {
            BS_CHECKBOX | BS_AUTOCHECKBOX | BS_3STATE | BS_AUTO3STATE => ControlType::CheckBox,
            BS_RADIOBUTTON | BS_AUTORADIOBUTTON => ControlType::RadioButton,
            BS_GROUPBOX => ControlType::Pane,
            _ => ControlType::Button,
        },
        "edit" => ControlType::TextBox,
        c if c.starts_with("richedit") => ControlType::TextBox,
        "combobox" | "comboboxex32" => ControlType::ComboBox,
        "listbox" | "syslistview32" | "systreeview32" => ControlType::List,
        "systabcontrol32" => ControlType::Tab,
        "static" => ControlType::Text,
        "syslink" => ControlType::Link,
        "#32770" => ControlType::Window,
        "scrollbar" => ControlType::Other("ScrollBar".to_string()),
        "msctls_trackbar32" => ControlType::Other("Slider".to_string()),
        "msctls_progress32" => ControlType::Other("ProgressBar".to_string()),
        _ => ControlType::Pane,
    }
}

/// Convert enumerated controls into accessibility elements.
///
/// Hidden controls, empty rects and controls deeper than `max_depth` are skipped; enumeration
/// order is kept.
pub fn elements_from_controls(controls: &[ChildControl], max_depth: u32) -> Vec<AccessibilityElement> {
    controls
        .iter()
        .filter(|c| c.is_visible && c.depth <= max_depth && !c.rect.is_degenerate())
        .map(ChildControl::to_element)
        .collect()
}

/// Pick the window satisfying `query` from `windows`, given in z-order (topmost first).
///
/// Title queries only consider candidate windows (visible, restored, titled); a handle query
/// matches any window.
pub fn select_window(windows: Vec<WindowInfo>, query: &WindowQuery) -> Result<WindowInfo, PlatformError> {
    windows
        .into_iter()
        .filter(|w| matches!(query, WindowQuery::Handle(_)) || w.is_candidate())
        .find(|w| w.matches(query))
        .ok_or_else(|| PlatformError::WindowNotFound(query.to_string()))
}
