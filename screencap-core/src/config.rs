//! Immutable capture configuration, parsed once from the command line.

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::format::ImageFormat;
use crate::window::CaptureTarget;

/// Where to write, in which format, and what to capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub output: PathBuf,
    pub format: ImageFormat,
    pub target: CaptureTarget,
}

impl CaptureConfig {
    /// Build a configuration from the output file name and the optional
    /// window-title argument.
    ///
    /// # Errors
    ///
    /// [`crate::errors::ScreenCapError::MissingExtension`] or
    /// [`crate::errors::ScreenCapError::UnsupportedExtension`] when the file
    /// name does not select a format.
    pub fn from_args(file: impl Into<PathBuf>, window_title: Option<&str>) -> Result<Self> {
        let output = file.into();
        let format = ImageFormat::from_path(&output)?;
        Ok(Self {
            output,
            format,
            target: CaptureTarget::from_title_arg(window_title),
        })
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn is_fullscreen(&self) -> bool {
        self.target == CaptureTarget::Desktop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScreenCapError;

    #[test]
    fn test_fullscreen_by_default() {
        let c = CaptureConfig::from_args("screenshot.png", None).unwrap();
        assert_eq!(c.format, ImageFormat::Png);
        assert!(c.is_fullscreen());
        assert_eq!(c.output(), Path::new("screenshot.png"));
    }

    #[test]
    fn test_title_switches_mode() {
        let c = CaptureConfig::from_args("out.bmp", Some("Notepad")).unwrap();
        assert_eq!(c.target, CaptureTarget::Title("Notepad".into()));
        assert!(!c.is_fullscreen());

        let c = CaptureConfig::from_args("out.bmp", Some("")).unwrap();
        assert_eq!(c.target, CaptureTarget::ActiveWindow);
    }

    #[test]
    fn test_bad_extension_rejected_before_anything_else() {
        let err = CaptureConfig::from_args("shot.xyz", Some("Notepad")).unwrap_err();
        assert!(matches!(err, ScreenCapError::UnsupportedExtension(_)));
        let err = CaptureConfig::from_args("shot", None).unwrap_err();
        assert!(matches!(err, ScreenCapError::MissingExtension(_)));
    }
}
