//! OS window-system primitives used by the locator and the frame grabber.
//!
//! [`WindowSystem`] is a thin, handle-level view of the Win32 calls the
//! capture pipeline needs.  It deliberately mirrors the raw API: acquisition
//! calls hand back raw handles and every one of them has a matching release
//! call.  Pairing them up is the job of the guard types in
//! [`crate::capture`]; implementors never track ownership themselves.
//!
//! | Implementation | Where |
//! |----------------|-------|
//! | [`win32::Win32`] | Windows only, GDI + `WindowsAndMessaging` via `windows-rs` |
//! | [`mock::MockWindowSystem`] | Every OS; in-process fake with handle accounting |

pub mod mock;
#[cfg(windows)]
pub mod win32;

use crate::errors::Result;
use crate::geometry::{Point, Rect};
use crate::window::{WindowHandle, WindowInfo};

/// Raw device-context handle (`HDC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawDc(pub isize);

/// Raw bitmap handle (`HBITMAP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawBitmap(pub isize);

/// Raw GDI object handle (`HGDIOBJ`) previously selected into a DC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawObject(pub isize);

/// Handle-level window-system API.
///
/// Release methods are infallible from the caller's point of view: they run
/// from `Drop` and there is nothing useful to do when the OS refuses.
pub trait WindowSystem {
    // -- window queries ----------------------------------------------------

    /// Root handle of the desktop window.
    fn desktop_window(&self) -> WindowHandle;

    /// Foreground window, or `None` when nothing has focus.
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// Visible, titled top-level windows in z-order.
    fn top_level_windows(&self) -> Result<Vec<WindowInfo>>;

    /// Outer rectangle in screen coordinates.
    fn window_rect(&self, window: WindowHandle) -> Result<Rect>;

    /// Client rectangle in window-local coordinates.
    fn client_rect(&self, window: WindowHandle) -> Result<Rect>;

    /// Map a window-local client point to screen coordinates.
    fn client_to_screen(&self, window: WindowHandle, point: Point) -> Result<Point>;

    // -- scoped GDI resources ---------------------------------------------

    /// `GetWindowDC`; released with [`WindowSystem::release_dc`].
    fn window_dc(&self, window: WindowHandle) -> Result<RawDc>;
    fn release_dc(&self, window: WindowHandle, dc: RawDc);

    /// `CreateCompatibleDC`; released with [`WindowSystem::delete_dc`].
    fn create_compatible_dc(&self, dc: RawDc) -> Result<RawDc>;
    fn delete_dc(&self, dc: RawDc);

    /// `CreateCompatibleBitmap`; released with [`WindowSystem::delete_bitmap`].
    fn create_compatible_bitmap(&self, dc: RawDc, width: i32, height: i32) -> Result<RawBitmap>;
    fn delete_bitmap(&self, bitmap: RawBitmap);

    /// `SelectObject`; undone with [`WindowSystem::restore_object`].
    fn select_bitmap(&self, dc: RawDc, bitmap: RawBitmap) -> Result<RawObject>;
    fn restore_object(&self, dc: RawDc, previous: RawObject);

    // -- pixel transfer ----------------------------------------------------

    /// `BitBlt` with `SRCCOPY` of `width × height` pixels from `src` at
    /// `src_origin` to `dest` at (0,0).
    fn bit_blt(&self, dest: RawDc, width: i32, height: i32, src: RawDc, src_origin: Point)
        -> Result<()>;

    /// Copy a bitmap's pixels out as top-down BGRA.  The bitmap must not be
    /// selected into any DC.
    fn read_bitmap(&self, dc: RawDc, bitmap: RawBitmap, width: u32, height: u32)
        -> Result<Vec<u8>>;
}

/// The window system of the running OS.
///
/// # Errors
///
/// [`crate::errors::ScreenCapError::ResourceAcquisition`] on hosts without a
/// supported window system.
pub fn native() -> Result<Box<dyn WindowSystem>> {
    #[cfg(windows)]
    {
        Ok(Box::new(win32::Win32::new()))
    }
    #[cfg(not(windows))]
    {
        Err(crate::errors::ScreenCapError::ResourceAcquisition(format!(
            "no supported window system on {}",
            std::env::consts::OS
        )))
    }
}
