//! Pixel rectangles and client-area geometry.
//!
//! A window's outer rectangle (from `GetWindowRect`) includes the title bar
//! and borders; its client rectangle (from `GetClientRect`) is window-local
//! and always starts at (0,0).  [`client_geometry`] combines the two into the
//! size of the area to copy and its offset inside the window DC.

use serde::Serialize;

use crate::errors::Result;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Pixel coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Signed width; negative for malformed rectangles.
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Signed height; negative for malformed rectangles.
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub const fn top_left(&self) -> Point {
        Point {
            x: self.left,
            y: self.top,
        }
    }
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Size and source offset of a window's client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientGeometry {
    pub width: i32,
    pub height: i32,
    /// Client-area top-left in screen coordinates.
    pub origin: Point,
    /// Client-area top-left relative to the outer window's top-left.
    pub offset: Point,
}

impl ClientGeometry {
    /// Bitmap dimensions; degenerate extents become zero.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.max(0) as u32, self.height.max(0) as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Compute the client-area geometry of a window.
///
/// `window_rect` is the outer rectangle in screen coordinates,
/// `client_rect` the window-local client rectangle, and `to_screen` maps a
/// window-local point to screen coordinates (`ClientToScreen`).  A failing
/// `to_screen` is passed through unchanged.
pub fn client_geometry<F>(window_rect: Rect, client_rect: Rect, to_screen: F) -> Result<ClientGeometry>
where
    F: FnOnce(Point) -> Result<Point>,
{
    let origin = to_screen(client_rect.top_left())?;
    Ok(ClientGeometry {
        width: client_rect.width(),
        height: client_rect.height(),
        origin,
        offset: origin - window_rect.top_left(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScreenCapError;

    #[test]
    fn test_rect_extent() {
        let r = Rect::new(10, 20, 110, 70);
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 50);
        assert_eq!(r.top_left(), Point::new(10, 20));
    }

    #[test]
    fn test_offset_excludes_border_and_title_bar() {
        // 8px borders, 31px caption, window placed at (100, 200).
        let window = Rect::new(100, 200, 916, 839);
        let client = Rect::new(0, 0, 800, 600);
        let g = client_geometry(window, client, |p| Ok(Point::new(p.x + 108, p.y + 231))).unwrap();

        assert_eq!(g.width, 800);
        assert_eq!(g.height, 600);
        assert_eq!(g.origin, Point::new(108, 231));
        assert_eq!(g.offset, Point::new(8, 31));
        assert_eq!(g.pixel_size(), (800, 600));
    }

    #[test]
    fn test_desktop_has_zero_offset() {
        let screen = Rect::new(0, 0, 1920, 1080);
        let g = client_geometry(screen, screen, Ok).unwrap();
        assert_eq!(g.offset, Point::default());
        assert_eq!(g.pixel_size(), (1920, 1080));
    }

    #[test]
    fn test_negative_screen_coordinates() {
        // Window on a monitor left of the primary.
        let window = Rect::new(-1280, 0, -480, 600);
        let client = Rect::new(0, 0, 784, 561);
        let g = client_geometry(window, client, |p| Ok(Point::new(p.x - 1272, p.y + 31))).unwrap();
        assert_eq!(g.offset, Point::new(8, 31));
    }

    #[test]
    fn test_degenerate_client_rect_is_empty() {
        let window = Rect::new(-32000, -32000, -31840, -31972);
        let client = Rect::new(0, 0, 0, 0);
        let g = client_geometry(window, client, Ok).unwrap();
        assert!(g.is_empty());
        assert_eq!(g.pixel_size(), (0, 0));

        let inverted = client_geometry(window, Rect::new(5, 5, 0, 0), Ok).unwrap();
        assert_eq!(inverted.width, -5);
        assert_eq!(inverted.pixel_size(), (0, 0));
    }

    #[test]
    fn test_to_screen_receives_client_top_left() {
        let window = Rect::new(0, 0, 100, 100);
        let client = Rect::new(3, 4, 50, 60);
        let mut seen = None;
        let g = client_geometry(window, client, |p| {
            seen = Some(p);
            Ok(Point::new(p.x + 10, p.y + 20))
        })
        .unwrap();
        assert_eq!(seen, Some(Point::new(3, 4)));
        assert_eq!(g.origin, Point::new(13, 24));
        assert_eq!(g.offset, Point::new(13, 24));
    }

    #[test]
    fn test_to_screen_failure_propagates() {
        let err = client_geometry(Rect::default(), Rect::new(0, 0, 10, 10), |_| {
            Err(ScreenCapError::ResourceAcquisition("ClientToScreen failed".into()))
        })
        .unwrap_err();
        assert!(matches!(err, ScreenCapError::ResourceAcquisition(_)));
    }
}
