//! [`WindowSystem`] over Win32 GDI and `WindowsAndMessaging`.
//!
//! Each method is one Win32 call (plus error translation).  Raw handles
//! cross the trait boundary as pointer-sized integers; nothing here owns
//! them.

use std::ffi::{c_void, OsString};
use std::os::windows::ffi::OsStringExt;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    BitBlt, ClientToScreen, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject,
    GetDIBits, GetWindowDC, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
    DIB_RGB_COLORS, HBITMAP, HDC, HGDIOBJ, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetClientRect, GetDesktopWindow, GetForegroundWindow,
    GetWindowLongW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW, IsWindowVisible,
    GWL_EXSTYLE, GWL_STYLE, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_VISIBLE,
};

use crate::errors::{Result, ScreenCapError};
use crate::geometry::{Point, Rect};
use crate::platform::{RawBitmap, RawDc, RawObject, WindowSystem};
use crate::window::{WindowHandle, WindowInfo};

/// The live Win32 desktop.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32;

impl Win32 {
    pub fn new() -> Self {
        Win32
    }
}

// ---------------------------------------------------------------------------
// Handle conversions
// ---------------------------------------------------------------------------

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.as_raw() as *mut c_void)
}

fn hdc(dc: RawDc) -> HDC {
    HDC(dc.0 as *mut c_void)
}

fn hbitmap(bitmap: RawBitmap) -> HBITMAP {
    HBITMAP(bitmap.0 as *mut c_void)
}

fn rect(r: RECT) -> Rect {
    Rect::new(r.left, r.top, r.right, r.bottom)
}

// ---------------------------------------------------------------------------
// Enumeration helpers
// ---------------------------------------------------------------------------

/// Read the window title.
fn read_window_title(hwnd: HWND) -> String {
    let len = unsafe { GetWindowTextLengthW(hwnd) };
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u16; (len + 1) as usize];
    let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
    if copied <= 0 {
        return String::new();
    }
    OsString::from_wide(&buf[..copied as usize])
        .to_string_lossy()
        .into_owned()
}

/// Read the window class name (up to 256 chars).
fn read_class_name(hwnd: HWND) -> String {
    let mut buf = [0u16; 256];
    let len = unsafe { GetClassNameW(hwnd, &mut buf) };
    if len <= 0 {
        return String::new();
    }
    OsString::from_wide(&buf[..len as usize])
        .to_string_lossy()
        .into_owned()
}

/// Visible, activatable, non-tool window.
fn is_app_window(hwnd: HWND) -> bool {
    let style = unsafe { GetWindowLongW(hwnd, GWL_STYLE) } as u32;
    let ex_style = unsafe { GetWindowLongW(hwnd, GWL_EXSTYLE) } as u32;

    if style & WS_VISIBLE.0 == 0 {
        return false;
    }
    if ex_style & WS_EX_TOOLWINDOW.0 != 0 || ex_style & WS_EX_NOACTIVATE.0 != 0 {
        return false;
    }
    true
}

/// Callback for EnumWindows that collects visible titled window handles.
unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let handles = unsafe { &mut *(lparam.0 as *mut Vec<HWND>) };

    if unsafe { IsWindowVisible(hwnd) }.as_bool()
        && is_app_window(hwnd)
        && unsafe { GetWindowTextLengthW(hwnd) } > 0
    {
        handles.push(hwnd);
    }

    TRUE // continue enumeration
}

// ---------------------------------------------------------------------------
// WindowSystem
// ---------------------------------------------------------------------------

impl WindowSystem for Win32 {
    fn desktop_window(&self) -> WindowHandle {
        let hwnd = unsafe { GetDesktopWindow() };
        WindowHandle::from_raw(hwnd.0 as isize)
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let hwnd = unsafe { GetForegroundWindow() };
        let handle = WindowHandle::from_raw(hwnd.0 as isize);
        (!handle.is_null()).then_some(handle)
    }

    fn top_level_windows(&self) -> Result<Vec<WindowInfo>> {
        let mut handles: Vec<HWND> = Vec::with_capacity(64);
        unsafe {
            EnumWindows(
                Some(enum_callback),
                LPARAM(&mut handles as *mut Vec<HWND> as isize),
            )
        }
        .map_err(|e| ScreenCapError::ResourceAcquisition(format!("EnumWindows failed: {e}")))?;

        Ok(handles
            .into_iter()
            .map(|h| {
                let mut r = RECT::default();
                let _ = unsafe { GetWindowRect(h, &mut r) };
                WindowInfo {
                    hwnd: WindowHandle::from_raw(h.0 as isize),
                    title: read_window_title(h),
                    class_name: read_class_name(h),
                    rect: rect(r),
                }
            })
            .collect())
    }

    fn window_rect(&self, window: WindowHandle) -> Result<Rect> {
        let mut r = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut r) }.map_err(|e| {
            ScreenCapError::ResourceAcquisition(format!("GetWindowRect failed: {e}"))
        })?;
        Ok(rect(r))
    }

    fn client_rect(&self, window: WindowHandle) -> Result<Rect> {
        let mut r = RECT::default();
        unsafe { GetClientRect(hwnd(window), &mut r) }.map_err(|e| {
            ScreenCapError::ResourceAcquisition(format!("GetClientRect failed: {e}"))
        })?;
        Ok(rect(r))
    }

    fn client_to_screen(&self, window: WindowHandle, point: Point) -> Result<Point> {
        let mut p = POINT {
            x: point.x,
            y: point.y,
        };
        if !unsafe { ClientToScreen(hwnd(window), &mut p) }.as_bool() {
            return Err(ScreenCapError::ResourceAcquisition(
                "ClientToScreen failed".into(),
            ));
        }
        Ok(Point::new(p.x, p.y))
    }

    fn window_dc(&self, window: WindowHandle) -> Result<RawDc> {
        let dc = unsafe { GetWindowDC(hwnd(window)) };
        if dc.is_invalid() {
            return Err(ScreenCapError::ResourceAcquisition(format!(
                "GetWindowDC({:#x}) failed",
                window.as_raw()
            )));
        }
        Ok(RawDc(dc.0 as isize))
    }

    fn release_dc(&self, window: WindowHandle, dc: RawDc) {
        if unsafe { ReleaseDC(hwnd(window), hdc(dc)) } == 0 {
            log::warn!("ReleaseDC({:#x}) reported failure", dc.0);
        }
    }

    fn create_compatible_dc(&self, dc: RawDc) -> Result<RawDc> {
        let mem_dc = unsafe { CreateCompatibleDC(hdc(dc)) };
        if mem_dc.is_invalid() {
            return Err(ScreenCapError::ResourceAcquisition(
                "CreateCompatibleDC failed".into(),
            ));
        }
        Ok(RawDc(mem_dc.0 as isize))
    }

    fn delete_dc(&self, dc: RawDc) {
        if !unsafe { DeleteDC(hdc(dc)) }.as_bool() {
            log::warn!("DeleteDC({:#x}) reported failure", dc.0);
        }
    }

    fn create_compatible_bitmap(&self, dc: RawDc, width: i32, height: i32) -> Result<RawBitmap> {
        let bitmap = unsafe { CreateCompatibleBitmap(hdc(dc), width, height) };
        if bitmap.is_invalid() {
            return Err(ScreenCapError::ResourceAcquisition(format!(
                "CreateCompatibleBitmap({width}x{height}) failed"
            )));
        }
        Ok(RawBitmap(bitmap.0 as isize))
    }

    fn delete_bitmap(&self, bitmap: RawBitmap) {
        if !unsafe { DeleteObject(hbitmap(bitmap)) }.as_bool() {
            log::warn!("DeleteObject({:#x}) reported failure", bitmap.0);
        }
    }

    fn select_bitmap(&self, dc: RawDc, bitmap: RawBitmap) -> Result<RawObject> {
        let previous = unsafe { SelectObject(hdc(dc), hbitmap(bitmap)) };
        // NULL or HGDI_ERROR.
        if previous.0.is_null() || previous.0 as isize == -1 {
            return Err(ScreenCapError::ResourceAcquisition(
                "SelectObject failed".into(),
            ));
        }
        Ok(RawObject(previous.0 as isize))
    }

    fn restore_object(&self, dc: RawDc, previous: RawObject) {
        unsafe { SelectObject(hdc(dc), HGDIOBJ(previous.0 as *mut c_void)) };
    }

    fn bit_blt(
        &self,
        dest: RawDc,
        width: i32,
        height: i32,
        src: RawDc,
        src_origin: Point,
    ) -> Result<()> {
        unsafe {
            BitBlt(
                hdc(dest),
                0,
                0,
                width,
                height,
                hdc(src),
                src_origin.x,
                src_origin.y,
                SRCCOPY,
            )
        }
        .map_err(|e| ScreenCapError::ResourceAcquisition(format!("BitBlt failed: {e}")))
    }

    fn read_bitmap(&self, dc: RawDc, bitmap: RawBitmap, width: u32, height: u32) -> Result<Vec<u8>> {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];

        let mut bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width as i32,
                // Negative height = top-down bitmap (row 0 at top).
                biHeight: -(height as i32),
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                biSizeImage: 0,
                biXPelsPerMeter: 0,
                biYPelsPerMeter: 0,
                biClrUsed: 0,
                biClrImportant: 0,
            },
            bmiColors: [Default::default()],
        };

        let lines = unsafe {
            GetDIBits(
                hdc(dc),
                hbitmap(bitmap),
                0,
                height,
                Some(pixels.as_mut_ptr() as *mut c_void),
                &mut bmi,
                DIB_RGB_COLORS,
            )
        };
        if lines == 0 {
            return Err(ScreenCapError::ResourceAcquisition("GetDIBits failed".into()));
        }

        // BI_RGB 32-bit leaves alpha at 0; make it opaque.
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Ok(pixels)
    }
}
