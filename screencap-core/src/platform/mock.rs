//! In-process fake window system.
//!
//! [`MockWindowSystem`] simulates a desktop with a handful of top-level
//! windows and hands out fake GDI handles.  Every acquisition and release is
//! recorded, so tests can assert that the capture pipeline balances them on
//! every path.  A single call can be made to fail with [`FailPoint`] to walk
//! the early-return paths.
//!
//! The fake also enforces the GDI rules the real API punishes silently:
//! deleting a DC or bitmap while the bitmap is still selected, reading a
//! selected bitmap, and releasing a handle twice are all logged as
//! violations.
//!
//! ```
//! use screencap_core::capture::capture;
//! use screencap_core::geometry::Rect;
//! use screencap_core::platform::mock::MockWindowSystem;
//!
//! let sys = MockWindowSystem::new().with_window("Notepad", "Notepad", Rect::new(0, 0, 816, 639));
//! let hwnd = sys.handle_of("Notepad").unwrap();
//! let bitmap = capture(&sys, hwnd).unwrap();
//! assert_eq!((bitmap.width, bitmap.height), (800, 600));
//! assert_eq!(sys.acquired(), sys.released());
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::errors::{Result, ScreenCapError};
use crate::geometry::{Point, Rect};
use crate::platform::{RawBitmap, RawDc, RawObject, WindowSystem};
use crate::window::{WindowHandle, WindowInfo};

/// Left/right/bottom border of a simulated window frame.
pub const FRAME_BORDER: i32 = 8;
/// Caption height of a simulated window frame, border included.
pub const FRAME_CAPTION: i32 = 31;

const DESKTOP_HWND: isize = 0x0001_0010;
const STOCK_BITMAP: isize = 0x0185_000F;

/// Call to fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    WindowRect,
    ClientRect,
    ClientToScreen,
    WindowDc,
    CompatibleDc,
    CompatibleBitmap,
    SelectBitmap,
    BitBlt,
    ReadBitmap,
}

/// A recorded `BitBlt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blit {
    pub dest: RawDc,
    pub src: RawDc,
    pub width: i32,
    pub height: i32,
    pub src_origin: Point,
}

#[derive(Debug, Clone)]
struct MockWindow {
    info: WindowInfo,
    client: Rect,
    client_origin: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    WindowDc(WindowHandle),
    MemoryDc,
    Bitmap { width: i32, height: i32 },
}

#[derive(Debug, Default)]
struct Ledger {
    next_handle: isize,
    acquired: usize,
    released: usize,
    live: HashMap<isize, Resource>,
    /// dc -> (selected bitmap, object it replaced)
    selected: HashMap<isize, (isize, RawObject)>,
    /// bitmap -> source origin of the blit that filled it
    painted: HashMap<isize, Point>,
    blits: Vec<Blit>,
    events: Vec<&'static str>,
    violations: Vec<String>,
}

impl Ledger {
    fn acquire(&mut self, resource: Resource) -> isize {
        self.next_handle += 0x10;
        let handle = 0x0A00_0000 + self.next_handle;
        self.live.insert(handle, resource);
        self.acquired += 1;
        handle
    }

    fn release(&mut self, handle: isize, what: &str) -> Option<Resource> {
        match self.live.remove(&handle) {
            Some(resource) => {
                self.released += 1;
                Some(resource)
            }
            None => {
                self.violations
                    .push(format!("{what} on unknown or already released handle {handle:#x}"));
                None
            }
        }
    }

    fn is_selected(&self, bitmap: isize) -> bool {
        self.selected.values().any(|(b, _)| *b == bitmap)
    }
}

/// Fake desktop with handle accounting.
#[derive(Debug)]
pub struct MockWindowSystem {
    screen: Rect,
    windows: Vec<MockWindow>,
    foreground: Cell<Option<WindowHandle>>,
    fail_at: Option<FailPoint>,
    ledger: RefCell<Ledger>,
}

impl Default for MockWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWindowSystem {
    /// A 1920×1080 desktop with no windows and nothing in the foreground.
    pub fn new() -> Self {
        Self {
            screen: Rect::new(0, 0, 1920, 1080),
            windows: Vec::new(),
            foreground: Cell::new(None),
            fail_at: None,
            ledger: RefCell::new(Ledger::default()),
        }
    }

    pub fn with_screen(mut self, width: i32, height: i32) -> Self {
        self.screen = Rect::new(0, 0, width, height);
        self
    }

    /// Add a framed window with the given outer rectangle.  The client area
    /// sits inside an [`FRAME_BORDER`] border and a [`FRAME_CAPTION`]
    /// caption.  The first window added becomes the foreground window.
    pub fn with_window(self, title: &str, class_name: &str, outer: Rect) -> Self {
        let client = Rect::new(
            0,
            0,
            (outer.width() - 2 * FRAME_BORDER).max(0),
            (outer.height() - FRAME_CAPTION - FRAME_BORDER).max(0),
        );
        let origin = Point::new(outer.left + FRAME_BORDER, outer.top + FRAME_CAPTION);
        self.with_window_frame(title, class_name, outer, client, origin)
    }

    /// Add a window with explicit client rectangle and client origin.
    pub fn with_window_frame(
        mut self,
        title: &str,
        class_name: &str,
        outer: Rect,
        client: Rect,
        client_origin: Point,
    ) -> Self {
        let hwnd = WindowHandle::from_raw(0x0002_0000 + 0x100 * (self.windows.len() as isize + 1));
        self.windows.push(MockWindow {
            info: WindowInfo {
                hwnd,
                title: title.to_string(),
                class_name: class_name.to_string(),
                rect: outer,
            },
            client,
            client_origin,
        });
        if self.foreground.get().is_none() {
            self.foreground.set(Some(hwnd));
        }
        self
    }

    /// Make the call at `point` fail.
    pub fn with_failure(mut self, point: FailPoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    pub fn set_foreground(&self, window: Option<WindowHandle>) {
        self.foreground.set(window);
    }

    pub fn handle_of(&self, title: &str) -> Option<WindowHandle> {
        self.windows
            .iter()
            .find(|w| w.info.title == title)
            .map(|w| w.info.hwnd)
    }

    /// Number of handles handed out (DCs, bitmaps, selections).
    pub fn acquired(&self) -> usize {
        self.ledger.borrow().acquired
    }

    /// Number of handles given back.
    pub fn released(&self) -> usize {
        self.ledger.borrow().released
    }

    /// Handles acquired but not yet released.
    pub fn live_handles(&self) -> usize {
        self.ledger.borrow().live.len() + self.ledger.borrow().selected.len()
    }

    /// GDI misuse observed so far.
    pub fn violations(&self) -> Vec<String> {
        self.ledger.borrow().violations.clone()
    }

    /// API calls in the order they were made.
    pub fn events(&self) -> Vec<&'static str> {
        self.ledger.borrow().events.clone()
    }

    pub fn blits(&self) -> Vec<Blit> {
        self.ledger.borrow().blits.clone()
    }

    /// Pixel value the fake screen holds at a screen coordinate (BGRA).
    pub fn pixel_at(x: i32, y: i32) -> [u8; 4] {
        [x as u8, y as u8, 0x40, 0xFF]
    }

    fn check(&self, point: FailPoint, call: &str) -> Result<()> {
        if self.fail_at == Some(point) {
            return Err(ScreenCapError::ResourceAcquisition(format!(
                "{call} failed (injected)"
            )));
        }
        Ok(())
    }

    fn record(&self, event: &'static str) {
        self.ledger.borrow_mut().events.push(event);
    }

    /// (outer rect, client rect, client origin) of a window or the desktop.
    fn frame(&self, window: WindowHandle) -> Result<(Rect, Rect, Point)> {
        if window.as_raw() == DESKTOP_HWND {
            return Ok((self.screen, self.screen, self.screen.top_left()));
        }
        self.windows
            .iter()
            .find(|w| w.info.hwnd == window)
            .map(|w| (w.info.rect, w.client, w.client_origin))
            .ok_or_else(|| {
                ScreenCapError::ResourceAcquisition(format!(
                    "invalid window handle {:#x}",
                    window.as_raw()
                ))
            })
    }
}

impl WindowSystem for MockWindowSystem {
    fn desktop_window(&self) -> WindowHandle {
        WindowHandle::from_raw(DESKTOP_HWND)
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.foreground.get()
    }

    fn top_level_windows(&self) -> Result<Vec<WindowInfo>> {
        Ok(self.windows.iter().map(|w| w.info.clone()).collect())
    }

    fn window_rect(&self, window: WindowHandle) -> Result<Rect> {
        self.check(FailPoint::WindowRect, "GetWindowRect")?;
        Ok(self.frame(window)?.0)
    }

    fn client_rect(&self, window: WindowHandle) -> Result<Rect> {
        self.check(FailPoint::ClientRect, "GetClientRect")?;
        Ok(self.frame(window)?.1)
    }

    fn client_to_screen(&self, window: WindowHandle, point: Point) -> Result<Point> {
        self.check(FailPoint::ClientToScreen, "ClientToScreen")?;
        let (_, _, origin) = self.frame(window)?;
        Ok(Point::new(origin.x + point.x, origin.y + point.y))
    }

    fn window_dc(&self, window: WindowHandle) -> Result<RawDc> {
        self.check(FailPoint::WindowDc, "GetWindowDC")?;
        self.frame(window)?;
        self.record("GetWindowDC");
        Ok(RawDc(self.ledger.borrow_mut().acquire(Resource::WindowDc(window))))
    }

    fn release_dc(&self, window: WindowHandle, dc: RawDc) {
        self.record("ReleaseDC");
        let mut ledger = self.ledger.borrow_mut();
        match ledger.release(dc.0, "ReleaseDC") {
            Some(Resource::WindowDc(owner)) if owner == window => {}
            Some(other) => ledger
                .violations
                .push(format!("ReleaseDC on {other:?} owned by another window")),
            None => {}
        }
    }

    fn create_compatible_dc(&self, dc: RawDc) -> Result<RawDc> {
        self.check(FailPoint::CompatibleDc, "CreateCompatibleDC")?;
        self.record("CreateCompatibleDC");
        let mut ledger = self.ledger.borrow_mut();
        if !ledger.live.contains_key(&dc.0) {
            return Err(ScreenCapError::ResourceAcquisition(
                "CreateCompatibleDC on a released DC".into(),
            ));
        }
        Ok(RawDc(ledger.acquire(Resource::MemoryDc)))
    }

    fn delete_dc(&self, dc: RawDc) {
        self.record("DeleteDC");
        let mut ledger = self.ledger.borrow_mut();
        if ledger.selected.contains_key(&dc.0) {
            ledger
                .violations
                .push(format!("DeleteDC on {:#x} with a bitmap still selected", dc.0));
        }
        ledger.release(dc.0, "DeleteDC");
    }

    fn create_compatible_bitmap(&self, dc: RawDc, width: i32, height: i32) -> Result<RawBitmap> {
        self.check(FailPoint::CompatibleBitmap, "CreateCompatibleBitmap")?;
        self.record("CreateCompatibleBitmap");
        if width < 0 || height < 0 {
            return Err(ScreenCapError::ResourceAcquisition(format!(
                "CreateCompatibleBitmap rejected {width}x{height}"
            )));
        }
        let mut ledger = self.ledger.borrow_mut();
        if !ledger.live.contains_key(&dc.0) {
            return Err(ScreenCapError::ResourceAcquisition(
                "CreateCompatibleBitmap on a released DC".into(),
            ));
        }
        Ok(RawBitmap(ledger.acquire(Resource::Bitmap { width, height })))
    }

    fn delete_bitmap(&self, bitmap: RawBitmap) {
        self.record("DeleteObject");
        let mut ledger = self.ledger.borrow_mut();
        if ledger.is_selected(bitmap.0) {
            ledger
                .violations
                .push(format!("DeleteObject on selected bitmap {:#x}", bitmap.0));
        }
        ledger.painted.remove(&bitmap.0);
        ledger.release(bitmap.0, "DeleteObject");
    }

    fn select_bitmap(&self, dc: RawDc, bitmap: RawBitmap) -> Result<RawObject> {
        self.check(FailPoint::SelectBitmap, "SelectObject")?;
        self.record("SelectObject");
        let mut ledger = self.ledger.borrow_mut();
        if ledger.live.get(&dc.0) != Some(&Resource::MemoryDc) {
            return Err(ScreenCapError::ResourceAcquisition(
                "SelectObject into a non-memory DC".into(),
            ));
        }
        if ledger.is_selected(bitmap.0) {
            return Err(ScreenCapError::ResourceAcquisition(
                "SelectObject of a bitmap already selected elsewhere".into(),
            ));
        }
        let previous = RawObject(STOCK_BITMAP);
        ledger.selected.insert(dc.0, (bitmap.0, previous));
        ledger.acquired += 1;
        Ok(previous)
    }

    fn restore_object(&self, dc: RawDc, previous: RawObject) {
        self.record("RestoreObject");
        let mut ledger = self.ledger.borrow_mut();
        match ledger.selected.remove(&dc.0) {
            Some((_, original)) if original == previous => ledger.released += 1,
            Some(_) => {
                ledger.released += 1;
                ledger
                    .violations
                    .push(format!("RestoreObject on {:#x} with the wrong object", dc.0));
            }
            None => ledger
                .violations
                .push(format!("RestoreObject on {:#x} with nothing selected", dc.0)),
        }
    }

    fn bit_blt(
        &self,
        dest: RawDc,
        width: i32,
        height: i32,
        src: RawDc,
        src_origin: Point,
    ) -> Result<()> {
        self.check(FailPoint::BitBlt, "BitBlt")?;
        self.record("BitBlt");
        let mut ledger = self.ledger.borrow_mut();
        let Some(&(bitmap, _)) = ledger.selected.get(&dest.0) else {
            return Err(ScreenCapError::ResourceAcquisition(
                "BitBlt into a DC without a selected bitmap".into(),
            ));
        };
        let Some(Resource::WindowDc(window)) = ledger.live.get(&src.0).copied() else {
            return Err(ScreenCapError::ResourceAcquisition(
                "BitBlt from a released DC".into(),
            ));
        };
        // Window DC coordinates are relative to the outer window rect.
        let (outer, _, _) = self.frame(window)?;
        let screen_origin = Point::new(outer.left + src_origin.x, outer.top + src_origin.y);
        ledger.painted.insert(bitmap, screen_origin);
        ledger.blits.push(Blit {
            dest,
            src,
            width,
            height,
            src_origin,
        });
        Ok(())
    }

    fn read_bitmap(&self, _dc: RawDc, bitmap: RawBitmap, width: u32, height: u32) -> Result<Vec<u8>> {
        self.check(FailPoint::ReadBitmap, "GetDIBits")?;
        self.record("GetDIBits");
        let mut ledger = self.ledger.borrow_mut();
        if ledger.is_selected(bitmap.0) {
            ledger
                .violations
                .push(format!("GetDIBits on selected bitmap {:#x}", bitmap.0));
            return Err(ScreenCapError::ResourceAcquisition(
                "GetDIBits on a selected bitmap".into(),
            ));
        }
        match ledger.live.get(&bitmap.0) {
            Some(Resource::Bitmap { width: w, height: h })
                if *w as u32 == width && *h as u32 == height => {}
            _ => {
                return Err(ScreenCapError::ResourceAcquisition(
                    "GetDIBits on an unknown bitmap or with the wrong size".into(),
                ))
            }
        }
        let origin = ledger.painted.get(&bitmap.0).copied().unwrap_or_default();
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                pixels.extend_from_slice(&Self::pixel_at(origin.x + x, origin.y + y));
            }
        }
        Ok(pixels)
    }
}
