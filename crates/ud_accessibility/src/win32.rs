use std::ffi::c_void;

use tracing::debug;
use ud_core::{AccessibilityElement, BoundingRect};
use ud_platform::{
    AccessibilitySource, PlatformError, TierError, WindowId, WindowInfo, WindowQuery, WindowResolver,
};
use windows::Win32::Foundation::{HWND, LPARAM, RECT};
use windows::Win32::UI::Input::KeyboardAndMouse::IsWindowEnabled;
use windows::Win32::UI::WindowsAndMessaging::{
    EnumChildWindows, EnumWindows, GWL_STYLE, GetClassNameW, GetDlgCtrlID, GetParent,
    GetWindowLongW, GetWindowRect, GetWindowTextW, IsIconic, IsWindow, IsWindowVisible,
};

use crate::control::{ChildControl, elements_from_controls, select_window};

/// Parent chains longer than this are treated as broken.
const MAX_PARENT_CHAIN: u32 = 256;

#[inline]
fn window_id_from_hwnd(hwnd: HWND) -> WindowId {
    WindowId::from_raw(hwnd.0 as usize)
}

#[inline]
fn hwnd_from_window_id(window: WindowId) -> HWND {
    HWND(window.raw() as *mut c_void)
}

fn rect_from_win32(rect: RECT) -> BoundingRect {
    BoundingRect::from_ltrb(rect.left, rect.top, rect.right, rect.bottom)
}

fn window_text(hwnd: HWND) -> String {
    let mut buffer = [0u16; 256];
    let len = unsafe { GetWindowTextW(hwnd, &mut buffer) };
    if len > 0 {
        String::from_utf16_lossy(&buffer[..len as usize])
    } else {
        String::new()
    }
}

fn class_name(hwnd: HWND) -> String {
    let mut buffer = [0u16; 256];
    let len = unsafe { GetClassNameW(hwnd, &mut buffer) };
    if len > 0 {
        String::from_utf16_lossy(&buffer[..len as usize])
    } else {
        String::new()
    }
}

fn window_info(hwnd: HWND) -> Option<WindowInfo> {
    let mut rect = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut rect) }.ok()?;

    Some(WindowInfo {
        id: window_id_from_hwnd(hwnd),
        title: window_text(hwnd),
        class_name: class_name(hwnd),
        rect: rect_from_win32(rect),
        is_visible: unsafe { IsWindowVisible(hwnd) }.as_bool(),
        is_minimized: unsafe { IsIconic(hwnd) }.as_bool(),
    })
}

/// Number of parent hops from `hwnd` up to `root`, or `None` if `root` is not an ancestor.
fn depth_below(hwnd: HWND, root: HWND) -> Option<u32> {
    let mut current = hwnd;
    for depth in 1..=MAX_PARENT_CHAIN {
        let parent = unsafe { GetParent(current) }.ok()?;
        if parent == root {
            return Some(depth);
        }
        current = parent;
    }
    None
}

/// Resolves top-level windows through `EnumWindows`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowResolver;

impl Win32WindowResolver {
    pub fn new() -> Self {
        Self
    }

    /// All top-level windows, topmost first.
    pub fn enumerate(&self) -> Result<Vec<WindowInfo>, PlatformError> {
        let mut windows: Vec<WindowInfo> = Vec::new();
        unsafe {
            EnumWindows(
                Some(enum_windows_proc),
                LPARAM(&mut windows as *mut _ as isize),
            )
        }
        .map_err(|e| PlatformError::EnumerationFailed(e.to_string()))?;
        Ok(windows)
    }
}

impl WindowResolver for Win32WindowResolver {
    fn resolve(&self, query: &WindowQuery) -> Result<WindowInfo, PlatformError> {
        if let WindowQuery::Handle(id) = query {
            let hwnd = hwnd_from_window_id(*id);
            if !id.is_valid() || !unsafe { IsWindow(Some(hwnd)) }.as_bool() {
                return Err(PlatformError::WindowNotFound(query.to_string()));
            }
            return window_info(hwnd).ok_or_else(|| PlatformError::WindowNotFound(query.to_string()));
        }

        let windows = self.enumerate()?;
        debug!(count = windows.len(), "top-level windows enumerated");
        select_window(windows, query)
    }
}

/// Child-window enumeration as the accessibility tier.
#[derive(Debug, Default)]
pub struct Win32AccessibilitySource;

impl Win32AccessibilitySource {
    pub fn new() -> Self {
        Self
    }

    /// Every descendant control of `window`, in enumeration order.
    pub fn child_controls(&self, window: WindowId) -> Result<Vec<ChildControl>, TierError> {
        let root = hwnd_from_window_id(window);
        if !unsafe { IsWindow(Some(root)) }.as_bool() {
            return Err(TierError::Failed(format!(
                "window {:#x} no longer exists",
                window.raw()
            )));
        }

        let mut context = ChildEnumContext {
            root,
            controls: Vec::new(),
        };
        // The return value of EnumChildWindows carries no meaning; a window without children
        // simply yields nothing.
        let _ = unsafe {
            EnumChildWindows(
                Some(root),
                Some(enum_child_windows_proc),
                LPARAM(&mut context as *mut _ as isize),
            )
        };
        Ok(context.controls)
    }
}

impl AccessibilitySource for Win32AccessibilitySource {
    fn collect(
        &mut self,
        window: WindowId,
        max_depth: u32,
    ) -> Result<Vec<AccessibilityElement>, TierError> {
        let controls = self.child_controls(window)?;
        let elements = elements_from_controls(&controls, max_depth);
        debug!(
            controls = controls.len(),
            elements = elements.len(),
            max_depth,
            "child controls enumerated"
        );
        Ok(elements)
    }
}

struct ChildEnumContext {
    root: HWND,
    controls: Vec<ChildControl>,
}

unsafe extern "system" fn enum_windows_proc(hwnd: HWND, lparam: LPARAM) -> windows::core::BOOL {
    unsafe {
        let windows = &mut *(lparam.0 as *mut Vec<WindowInfo>);
        if let Some(info) = window_info(hwnd) {
            windows.push(info);
        }
        windows::core::BOOL::from(true)
    }
}

unsafe extern "system" fn enum_child_windows_proc(
    hwnd: HWND,
    lparam: LPARAM,
) -> windows::core::BOOL {
    unsafe {
        let context = &mut *(lparam.0 as *mut ChildEnumContext);

        let mut rect = RECT::default();
        if GetWindowRect(hwnd, &mut rect).is_err() {
            return windows::core::BOOL::from(true);
        }

        let Some(depth) = depth_below(hwnd, context.root) else {
            return windows::core::BOOL::from(true);
        };

        context.controls.push(ChildControl {
            class_name: class_name(hwnd),
            text: window_text(hwnd),
            rect: rect_from_win32(rect),
            style: GetWindowLongW(hwnd, GWL_STYLE) as u32,
            control_id: GetDlgCtrlID(hwnd),
            is_visible: IsWindowVisible(hwnd).as_bool(),
            is_enabled: IsWindowEnabled(hwnd).as_bool(),
            depth,
        });

        windows::core::BOOL::from(true)
    }
}
