//! Output image formats selected by file extension.

use std::fmt;
use std::path::Path;

use crate::errors::{Result, ScreenCapError};

/// Output format, picked once from the target file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Bmp,
    Emf,
    Exif,
    Jpeg,
    Gif,
    Png,
    Tiff,
    Wmf,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 8] = [
        ImageFormat::Bmp,
        ImageFormat::Emf,
        ImageFormat::Exif,
        ImageFormat::Jpeg,
        ImageFormat::Gif,
        ImageFormat::Png,
        ImageFormat::Tiff,
        ImageFormat::Wmf,
    ];

    /// Look up a format by extension (without the dot, case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "bmp" => Some(ImageFormat::Bmp),
            "emf" => Some(ImageFormat::Emf),
            "exif" => Some(ImageFormat::Exif),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            "png" => Some(ImageFormat::Png),
            "tiff" => Some(ImageFormat::Tiff),
            "wmf" => Some(ImageFormat::Wmf),
            _ => None,
        }
    }

    /// Resolve the format of an output path.
    ///
    /// # Errors
    ///
    /// [`ScreenCapError::MissingExtension`] when the file name has no
    /// extension, [`ScreenCapError::UnsupportedExtension`] when it has one
    /// that maps to no format.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .ok_or_else(|| ScreenCapError::MissingExtension(path.display().to_string()))?;
        let ext = ext.to_string_lossy();
        Self::from_extension(&ext).ok_or_else(|| ScreenCapError::UnsupportedExtension(ext.into_owned()))
    }

    /// Canonical lower-case extension.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Bmp => "bmp",
            ImageFormat::Emf => "emf",
            ImageFormat::Exif => "exif",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Wmf => "wmf",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
