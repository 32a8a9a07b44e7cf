//! Capture-target resolution.
//!
//! Turns a [`CaptureTarget`] into a [`WindowHandle`]: the desktop root, the
//! foreground window, or the first visible top-level window whose title
//! starts with a given prefix.  Lookups are single read-only queries with no
//! retry; a miss is reported immediately.

use serde::Serialize;

use crate::errors::{Result, ScreenCapError};
use crate::geometry::Rect;
use crate::platform::WindowSystem;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Opaque platform window handle (`HWND`).  Borrowed, never destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WindowHandle(isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub const fn from_raw(raw: isize) -> Self {
        WindowHandle(raw)
    }

    pub const fn as_raw(self) -> isize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Owned snapshot of a visible top-level window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowInfo {
    pub hwnd: WindowHandle,
    pub title: String,
    pub class_name: String,
    pub rect: Rect,
}

/// What to capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Desktop,
    ActiveWindow,
    /// First window whose title starts with this prefix.
    Title(String),
}

impl CaptureTarget {
    /// Target for an optional title argument.  Absent means the whole
    /// desktop; an empty string keeps the current active window.
    pub fn from_title_arg(title: Option<&str>) -> Self {
        match title {
            None => CaptureTarget::Desktop,
            Some("") => CaptureTarget::ActiveWindow,
            Some(t) => CaptureTarget::Title(t.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve `target` to a window handle.
///
/// # Errors
///
/// - [`ScreenCapError::NoActiveWindow`] when an active window is required
///   and the OS reports none.
/// - [`ScreenCapError::WindowNotFound`] when no title matches.
pub fn locate<S>(system: &S, target: &CaptureTarget) -> Result<WindowHandle>
where
    S: WindowSystem + ?Sized,
{
    match target {
        CaptureTarget::Desktop => Ok(system.desktop_window()),
        CaptureTarget::ActiveWindow => active_window(system),
        CaptureTarget::Title(prefix) if prefix.is_empty() => active_window(system),
        CaptureTarget::Title(prefix) => find_by_title_prefix(system, prefix),
    }
}

/// Foreground window handle.
pub fn active_window<S>(system: &S) -> Result<WindowHandle>
where
    S: WindowSystem + ?Sized,
{
    system
        .foreground_window()
        .filter(|h| !h.is_null())
        .ok_or(ScreenCapError::NoActiveWindow)
}

/// First visible top-level window whose title starts with `prefix`.
pub fn find_by_title_prefix<S>(system: &S, prefix: &str) -> Result<WindowHandle>
where
    S: WindowSystem + ?Sized,
{
    let windows = system.top_level_windows()?;
    log::debug!("matching '{prefix}' against {} window title(s)", windows.len());

    windows
        .into_iter()
        .find(|w| w.title.starts_with(prefix))
        .map(|w| {
            log::debug!("'{prefix}' matched \"{}\" ({:#x})", w.title, w.hwnd.as_raw());
            w.hwnd
        })
        .ok_or_else(|| ScreenCapError::WindowNotFound(prefix.to_string()))
}

/// All visible top-level windows serialized as JSON.
pub fn list_windows_json<S>(system: &S, pretty: bool) -> Result<String>
where
    S: WindowSystem + ?Sized,
{
    let windows = system.top_level_windows()?;
    let json = if pretty {
        serde_json::to_string_pretty(&windows)
    } else {
        serde_json::to_string(&windows)
    };
    json.map_err(|e| ScreenCapError::Encoding(format!("window list serialization failed: {e}")))
}
