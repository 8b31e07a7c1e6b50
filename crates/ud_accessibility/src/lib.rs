//! Accessibility tier backed by native window/control enumeration.
//!
//! On Windows, top-level windows are resolved with `EnumWindows` and their child controls are
//! enumerated with `EnumChildWindows`; each control's class and style map to a [`ControlType`].
//! Other platforms get stand-ins that report the tier as unavailable.
//!
//! [`ControlType`]: ud_core::ControlType

pub mod control;

#[cfg(windows)]
mod win32;
#[cfg(windows)]
pub use win32::{Win32AccessibilitySource, Win32WindowResolver};

#[cfg(not(windows))]
mod unsupported;
#[cfg(not(windows))]
pub use unsupported::{Win32AccessibilitySource, Win32WindowResolver};

pub use control::{ChildControl, control_type_for_class, elements_from_controls, select_window};
