//! Client-area capture via GDI `BitBlt`.
//!
//! # Pipeline
//!
//! 1. Acquire the window DC (`GetWindowDC`).
//! 2. Read the outer and client rectangles and derive the client-area size
//!    and its offset inside the window DC ([`crate::geometry::client_geometry`]).
//! 3. Create a compatible memory DC and a compatible `width × height` bitmap.
//! 4. Select the bitmap into the memory DC and `BitBlt` with `SRCCOPY`.
//! 5. Deselect the bitmap, delete the memory DC, copy the pixels out with
//!    `GetDIBits`, release the window DC and finally delete the bitmap.
//!
//! # Handle lifetimes
//!
//! Every GDI handle is owned by a guard whose `Drop` runs the matching
//! release call.  Guards are declared in acquisition order, so on an early
//! `?` return they unwind in reverse: the selection is undone before the
//! bitmap is deleted, and the bitmap is deleted before the DCs go away.  The
//! success path drops them explicitly to get the order GDI wants for
//! `GetDIBits` (bitmap deselected, pixels copied before `DeleteObject`).

use crate::errors::Result;
use crate::geometry::{client_geometry, ClientGeometry};
use crate::platform::{RawBitmap, RawDc, RawObject, WindowSystem};
use crate::window::{active_window, WindowHandle};

// ---------------------------------------------------------------------------
// Public data types
// ---------------------------------------------------------------------------

/// Captured pixels.
///
/// Pixels are stored row-major, top-to-bottom, 4 bytes each in BGRA order
/// (the layout of a 32-bit top-down DIB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedBitmap {
    pub width: u32,
    pub height: u32,
    /// Raw pixel bytes in BGRA order; length == `width * height * 4`.
    pub data: Vec<u8>,
}

impl CapturedBitmap {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// BGRA value of the pixel at (x, y), if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

// ---------------------------------------------------------------------------
// Handle guards
// ---------------------------------------------------------------------------

/// `GetWindowDC` result; `ReleaseDC` on drop.
struct WindowDc<'a, S: WindowSystem + ?Sized> {
    system: &'a S,
    window: WindowHandle,
    dc: RawDc,
}

impl<'a, S: WindowSystem + ?Sized> WindowDc<'a, S> {
    fn acquire(system: &'a S, window: WindowHandle) -> Result<Self> {
        let dc = system.window_dc(window)?;
        Ok(Self { system, window, dc })
    }
}

impl<S: WindowSystem + ?Sized> Drop for WindowDc<'_, S> {
    fn drop(&mut self) {
        self.system.release_dc(self.window, self.dc);
    }
}

/// `CreateCompatibleDC` result; `DeleteDC` on drop.
struct MemoryDc<'a, S: WindowSystem + ?Sized> {
    system: &'a S,
    dc: RawDc,
}

impl<'a, S: WindowSystem + ?Sized> MemoryDc<'a, S> {
    fn compatible_with(system: &'a S, src: RawDc) -> Result<Self> {
        let dc = system.create_compatible_dc(src)?;
        Ok(Self { system, dc })
    }
}

impl<S: WindowSystem + ?Sized> Drop for MemoryDc<'_, S> {
    fn drop(&mut self) {
        self.system.delete_dc(self.dc);
    }
}

/// `CreateCompatibleBitmap` result; `DeleteObject` on drop.
struct Bitmap<'a, S: WindowSystem + ?Sized> {
    system: &'a S,
    bitmap: RawBitmap,
}

impl<'a, S: WindowSystem + ?Sized> Bitmap<'a, S> {
    fn compatible_with(system: &'a S, src: RawDc, width: i32, height: i32) -> Result<Self> {
        let bitmap = system.create_compatible_bitmap(src, width, height)?;
        Ok(Self { system, bitmap })
    }
}

impl<S: WindowSystem + ?Sized> Drop for Bitmap<'_, S> {
    fn drop(&mut self) {
        self.system.delete_bitmap(self.bitmap);
    }
}

/// A bitmap selected into a DC; the previous object is selected back on drop.
struct Selection<'a, S: WindowSystem + ?Sized> {
    system: &'a S,
    dc: RawDc,
    previous: RawObject,
}

impl<'a, S: WindowSystem + ?Sized> Selection<'a, S> {
    fn select(system: &'a S, dc: &MemoryDc<'a, S>, bitmap: &Bitmap<'a, S>) -> Result<Self> {
        let previous = system.select_bitmap(dc.dc, bitmap.bitmap)?;
        Ok(Self {
            system,
            dc: dc.dc,
            previous,
        })
    }
}

impl<S: WindowSystem + ?Sized> Drop for Selection<'_, S> {
    fn drop(&mut self) {
        self.system.restore_object(self.dc, self.previous);
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Client-area geometry of `window` at this instant.
pub fn window_geometry<S>(system: &S, window: WindowHandle) -> Result<ClientGeometry>
where
    S: WindowSystem + ?Sized,
{
    let window_rect = system.window_rect(window)?;
    let client_rect = system.client_rect(window)?;
    client_geometry(window_rect, client_rect, |p| system.client_to_screen(window, p))
}

/// Capture the client area of `window`.
///
/// A null handle captures the current foreground window.  Minimized or
/// otherwise degenerate windows yield a zero-sized bitmap rather than an
/// error.
///
/// # Errors
///
/// - [`crate::errors::ScreenCapError::NoActiveWindow`] for a null handle
///   with nothing in the foreground.
/// - [`crate::errors::ScreenCapError::ResourceAcquisition`] when any GDI
///   call fails.  Handles acquired before the failure are released first.
pub fn capture<S>(system: &S, window: WindowHandle) -> Result<CapturedBitmap>
where
    S: WindowSystem + ?Sized,
{
    let window = if window.is_null() {
        active_window(system)?
    } else {
        window
    };

    let src = WindowDc::acquire(system, window)?;
    let geometry = window_geometry(system, window)?;
    let (width, height) = geometry.pixel_size();
    if geometry.is_empty() {
        log::warn!(
            "window {:#x} has a degenerate client area ({}x{}); capturing an empty image",
            window.as_raw(),
            geometry.width,
            geometry.height
        );
    }
    log::debug!(
        "capturing {width}x{height} from window {:#x} at offset ({}, {})",
        window.as_raw(),
        geometry.offset.x,
        geometry.offset.y
    );

    let dest = MemoryDc::compatible_with(system, src.dc)?;
    let bitmap = Bitmap::compatible_with(system, src.dc, width as i32, height as i32)?;
    let selection = Selection::select(system, &dest, &bitmap)?;

    system.bit_blt(
        dest.dc,
        width as i32,
        height as i32,
        src.dc,
        geometry.offset,
    )?;

    // Deselect before the DC is deleted and before GetDIBits reads the bitmap.
    drop(selection);
    drop(dest);

    let data = if width == 0 || height == 0 {
        Vec::new()
    } else {
        system.read_bitmap(src.dc, bitmap.bitmap, width, height)?
    };
    drop(src);

    let captured = CapturedBitmap {
        width,
        height,
        data,
    };
    // The pixels are owned by `captured` now; the GDI bitmap can go.
    drop(bitmap);

    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScreenCapError;
    use crate::geometry::{Point, Rect};
    use crate::platform::mock::{FailPoint, MockWindowSystem, FRAME_BORDER, FRAME_CAPTION};

    fn notepad() -> MockWindowSystem {
        MockWindowSystem::new().with_window("Notepad", "Notepad", Rect::new(100, 200, 916, 839))
    }

    fn assert_balanced(sys: &MockWindowSystem) {
        assert_eq!(sys.acquired(), sys.released(), "events: {:?}", sys.events());
        assert_eq!(sys.live_handles(), 0);
        assert!(sys.violations().is_empty(), "{:?}", sys.violations());
    }

    #[test]
    fn test_capture_matches_client_rect() {
        let sys = notepad();
        let hwnd = sys.handle_of("Notepad").unwrap();
        let client = sys.client_rect(hwnd).unwrap();

        let bmp = capture(&sys, hwnd).unwrap();
        assert_eq!(bmp.width as i32, client.right - client.left);
        assert_eq!(bmp.height as i32, client.bottom - client.top);
        assert_eq!(bmp.data.len(), (bmp.width * bmp.height * 4) as usize);
        assert_balanced(&sys);
    }

    #[test]
    fn test_blit_reads_from_client_offset() {
        let sys = notepad();
        let hwnd = sys.handle_of("Notepad").unwrap();
        let bmp = capture(&sys, hwnd).unwrap();

        let blits = sys.blits();
        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].src_origin, Point::new(FRAME_BORDER, FRAME_CAPTION));
        assert_eq!((blits[0].width, blits[0].height), (800, 600));

        // Top-left pixel is the client-area origin on screen, not the frame.
        assert_eq!(
            bmp.pixel(0, 0),
            Some(MockWindowSystem::pixel_at(100 + FRAME_BORDER, 200 + FRAME_CAPTION))
        );
        assert_eq!(
            bmp.pixel(5, 3),
            Some(MockWindowSystem::pixel_at(105 + FRAME_BORDER, 203 + FRAME_CAPTION))
        );
    }

    #[test]
    fn test_desktop_capture() {
        let sys = MockWindowSystem::new().with_screen(1280, 720);
        let bmp = capture(&sys, sys.desktop_window()).unwrap();
        assert_eq!((bmp.width, bmp.height), (1280, 720));
        assert_eq!(sys.blits()[0].src_origin, Point::new(0, 0));
        assert_balanced(&sys);
    }

    #[test]
    fn test_null_handle_captures_foreground() {
        let sys = notepad().with_window("Calculator", "Calc", Rect::new(0, 0, 336, 539));
        sys.set_foreground(sys.handle_of("Calculator"));

        let bmp = capture(&sys, WindowHandle::NULL).unwrap();
        assert_eq!((bmp.width, bmp.height), (320, 500));
        assert_balanced(&sys);
    }

    #[test]
    fn test_null_handle_without_foreground() {
        let sys = notepad();
        sys.set_foreground(None);
        let err = capture(&sys, WindowHandle::NULL).unwrap_err();
        assert!(matches!(err, ScreenCapError::NoActiveWindow));
        assert_eq!(sys.acquired(), 0);
    }

    #[test]
    fn test_minimized_window_gives_empty_image() {
        let outer = Rect::new(-32000, -32000, -31840, -31972);
        let sys = MockWindowSystem::new().with_window_frame(
            "Minimized",
            "Notepad",
            outer,
            Rect::new(0, 0, 0, 0),
            Point::new(-32000, -32000),
        );
        let hwnd = sys.handle_of("Minimized").unwrap();

        let bmp = capture(&sys, hwnd).unwrap();
        assert!(bmp.is_empty());
        assert!(bmp.data.is_empty());
        assert!(!sys.events().contains(&"GetDIBits"));
        assert_balanced(&sys);
    }

    #[test]
    fn test_release_order() {
        let sys = notepad();
        capture(&sys, sys.handle_of("Notepad").unwrap()).unwrap();
        assert_eq!(
            sys.events(),
            vec![
                "GetWindowDC",
                "CreateCompatibleDC",
                "CreateCompatibleBitmap",
                "SelectObject",
                "BitBlt",
                "RestoreObject",
                "DeleteDC",
                "GetDIBits",
                "ReleaseDC",
                "DeleteObject",
            ]
        );
    }

    #[test]
    fn test_every_failure_releases_everything() {
        let points = [
            FailPoint::WindowRect,
            FailPoint::ClientRect,
            FailPoint::ClientToScreen,
            FailPoint::WindowDc,
            FailPoint::CompatibleDc,
            FailPoint::CompatibleBitmap,
            FailPoint::SelectBitmap,
            FailPoint::BitBlt,
            FailPoint::ReadBitmap,
        ];
        for point in points {
            let sys = notepad().with_failure(point);
            let hwnd = sys.handle_of("Notepad").unwrap();
            let err = capture(&sys, hwnd).unwrap_err();
            assert!(
                matches!(err, ScreenCapError::ResourceAcquisition(_)),
                "{point:?}: {err}"
            );
            assert_balanced(&sys);
        }
    }

    #[test]
    fn test_blit_failure_unwinds_in_reverse() {
        let sys = notepad().with_failure(FailPoint::BitBlt);
        let _ = capture(&sys, sys.handle_of("Notepad").unwrap());
        let events = sys.events();
        let tail = &events[events.len() - 4..];
        assert_eq!(tail, ["RestoreObject", "DeleteObject", "DeleteDC", "ReleaseDC"]);
    }

    #[test]
    fn test_repeated_captures_do_not_leak() {
        let sys = notepad();
        let hwnd = sys.handle_of("Notepad").unwrap();
        for _ in 0..25 {
            capture(&sys, hwnd).unwrap();
        }
        assert_eq!(sys.acquired(), 25 * 4);
        assert_balanced(&sys);
    }

    #[test]
    fn test_invalid_handle_fails_cleanly() {
        let sys = notepad();
        let err = capture(&sys, WindowHandle::from_raw(0xDEAD)).unwrap_err();
        assert!(matches!(err, ScreenCapError::ResourceAcquisition(_)));
        assert_balanced(&sys);
    }
}
