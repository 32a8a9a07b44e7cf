//! End-to-end capture: locate, capture, save.

use std::path::{Path, PathBuf};

use crate::capture::{capture, CapturedBitmap};
use crate::config::CaptureConfig;
use crate::encode::{check_encodable, save};
use crate::errors::{Result, ScreenCapError};
use crate::format::ImageFormat;
use crate::platform::WindowSystem;
use crate::window::{locate, WindowHandle};

/// Outcome of [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Capture the whole desktop.
pub fn capture_screen<S>(system: &S) -> Result<CapturedBitmap>
where
    S: WindowSystem + ?Sized,
{
    capture(system, system.desktop_window())
}

/// Capture one window's client area; a null handle means the foreground
/// window.
pub fn capture_window<S>(system: &S, window: WindowHandle) -> Result<CapturedBitmap>
where
    S: WindowSystem + ?Sized,
{
    capture(system, window)
}

pub fn capture_screen_to_file<S>(system: &S, path: &Path, format: ImageFormat) -> Result<CaptureReport>
where
    S: WindowSystem + ?Sized,
{
    capture_window_to_file(system, system.desktop_window(), path, format)
}

pub fn capture_window_to_file<S>(
    system: &S,
    window: WindowHandle,
    path: &Path,
    format: ImageFormat,
) -> Result<CaptureReport>
where
    S: WindowSystem + ?Sized,
{
    let bitmap = capture(system, window)?;
    let (width, height) = (bitmap.width, bitmap.height);
    save(bitmap, path, format)?;
    Ok(CaptureReport {
        path: path.to_path_buf(),
        width,
        height,
    })
}

/// Create the parent directory tree of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| ScreenCapError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Run a configured capture.
///
/// The format is checked and the target resolved before anything touches
/// the file system or the window system's handles, so an unencodable
/// format or a failed lookup leaves no file or directory behind.
pub fn run<S>(system: &S, config: &CaptureConfig) -> Result<CaptureReport>
where
    S: WindowSystem + ?Sized,
{
    check_encodable(config.format)?;

    let window = locate(system, &config.target)?;
    log::debug!("{:?} resolved to {:#x}", config.target, window.as_raw());

    ensure_parent_dir(config.output())?;
    capture_window_to_file(system, window, config.output(), config.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::platform::mock::{FailPoint, MockWindowSystem};

    fn desktop() -> MockWindowSystem {
        MockWindowSystem::new()
            .with_screen(320, 200)
            .with_window("Untitled - Notepad", "Notepad", Rect::new(10, 10, 226, 189))
    }

    #[test]
    fn test_screen_capture_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaptureConfig::from_args(dir.path().join("screenshot.png"), None).unwrap();
        let sys = desktop();

        let report = run(&sys, &config).unwrap();
        assert_eq!((report.width, report.height), (320, 200));

        let img = image::open(&report.path).unwrap();
        assert_eq!((img.width(), img.height()), (320, 200));
        assert_eq!(sys.acquired(), sys.released());
    }

    #[test]
    fn test_window_capture_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("note.bmp");
        let config = CaptureConfig::from_args(&path, Some("Untitled")).unwrap();

        let report = run(&desktop(), &config).unwrap();
        assert_eq!((report.width, report.height), (200, 140));
        assert!(path.is_file());
    }

    #[test]
    fn test_window_not_found_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("out.bmp");
        let config = CaptureConfig::from_args(&path, Some("Paint")).unwrap();

        let err = run(&desktop(), &config).unwrap_err();
        assert_eq!(err.exit_code(), -1);
        assert!(!path.exists());
        assert!(!dir.path().join("sub").exists());
    }

    #[test]
    fn test_metafile_output_fails_before_capture() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["x.emf", "x.wmf"] {
            let path = dir.path().join("sub").join(name);
            let config = CaptureConfig::from_args(&path, Some("Untitled")).unwrap();
            let sys = desktop();

            let err = run(&sys, &config).unwrap_err();
            assert!(matches!(err, ScreenCapError::Encoding(_)));
            assert_eq!(err.exit_code(), 3);
            assert!(!dir.path().join("sub").exists());
            assert_eq!(sys.acquired(), 0);
        }
    }

    #[test]
    fn test_capture_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let sys = desktop().with_failure(FailPoint::BitBlt);

        let err = capture_screen_to_file(&sys, &path, ImageFormat::Png).unwrap_err();
        assert!(matches!(err, ScreenCapError::ResourceAcquisition(_)));
        assert!(!path.exists());
        assert_eq!(sys.acquired(), sys.released());
    }

    #[test]
    fn test_capture_window_null_uses_foreground() {
        let sys = desktop();
        let bmp = capture_window(&sys, WindowHandle::NULL).unwrap();
        assert_eq!((bmp.width, bmp.height), (200, 140));
        assert_eq!(capture_screen(&sys).unwrap().width, 320);
    }

    #[test]
    fn test_ensure_parent_dir_without_parent() {
        ensure_parent_dir(Path::new("screenshot.png")).unwrap();
    }
}
