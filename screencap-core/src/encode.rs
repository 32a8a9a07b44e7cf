//! Writing captured bitmaps to disk with the [`image`] crate.
//!
//! Raster formats are encoded from the captured BGRA pixels:
//!
//! | Format | Encoded as |
//! |--------|------------|
//! | Bmp, Png, Gif, Tiff | RGBA8 |
//! | Jpeg, Exif | RGB8 JPEG (Exif is the JPEG container) |
//! | Emf, Wmf | not encodable from a raster bitmap |

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::{DynamicImage, ImageError, RgbaImage};

use crate::capture::CapturedBitmap;
use crate::errors::{Result, ScreenCapError};
use crate::format::ImageFormat;

impl CapturedBitmap {
    /// Convert BGRA -> RGBA for the `image` crate (which uses RGBA layout).
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        let rgba: Vec<u8> = self
            .data
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect();

        RgbaImage::from_raw(self.width, self.height, rgba).ok_or_else(|| {
            ScreenCapError::Encoding(format!(
                "pixel buffer of {} bytes does not hold a {}x{} BGRA image",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }
}

/// `image` encoder for a format, or `None` for vector metafiles.
fn encoder_format(format: ImageFormat) -> Option<image::ImageFormat> {
    match format {
        ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
        ImageFormat::Png => Some(image::ImageFormat::Png),
        ImageFormat::Gif => Some(image::ImageFormat::Gif),
        ImageFormat::Tiff => Some(image::ImageFormat::Tiff),
        ImageFormat::Jpeg | ImageFormat::Exif => Some(image::ImageFormat::Jpeg),
        ImageFormat::Emf | ImageFormat::Wmf => None,
    }
}

fn map_image_error(path: &Path, err: ImageError) -> ScreenCapError {
    match err {
        ImageError::IoError(source) => ScreenCapError::io(path, source),
        other => ScreenCapError::Encoding(format!("{}: {other}", path.display())),
    }
}

fn unsupported(format: ImageFormat) -> ScreenCapError {
    ScreenCapError::Encoding(format!(
        "{} is a vector metafile format and cannot be written from a captured bitmap",
        format.extension().to_uppercase()
    ))
}

fn to_dynamic(bitmap: &CapturedBitmap, target: image::ImageFormat) -> Result<DynamicImage> {
    let rgba = bitmap.to_rgba_image()?;
    if target == image::ImageFormat::Jpeg {
        // JPEG has no alpha channel.
        Ok(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()))
    } else {
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

/// Fail with [`ScreenCapError::Encoding`] if `format` has no raster encoder.
pub fn check_encodable(format: ImageFormat) -> Result<()> {
    encoder_format(format).map(|_| ()).ok_or_else(|| unsupported(format))
}

/// Encode `bitmap` as `format` into an in-memory buffer.
pub fn encode(bitmap: &CapturedBitmap, format: ImageFormat) -> Result<Vec<u8>> {
    let target = encoder_format(format).ok_or_else(|| unsupported(format))?;
    let mut buf = Vec::new();
    to_dynamic(bitmap, target)?
        .write_to(&mut Cursor::new(&mut buf), target)
        .map_err(|e| map_image_error(Path::new("<memory>"), e))?;
    Ok(buf)
}

/// Encode `bitmap` as `format` and write it to `path`, replacing any
/// existing file.
///
/// The parent directory must already exist (see
/// [`crate::pipeline::ensure_parent_dir`]).  Nothing is created when the
/// format cannot be encoded.
///
/// # Errors
///
/// - [`ScreenCapError::Encoding`] for Emf/Wmf or an encoder failure.
/// - [`ScreenCapError::Io`] when the file cannot be created or written.
pub fn save(bitmap: CapturedBitmap, path: &Path, format: ImageFormat) -> Result<()> {
    let target = encoder_format(format).ok_or_else(|| unsupported(format))?;
    let image = to_dynamic(&bitmap, target)?;

    let file = File::create(path).map_err(|e| ScreenCapError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    image
        .write_to(&mut writer, target)
        .map_err(|e| map_image_error(path, e))?;
    writer.flush().map_err(|e| ScreenCapError::io(path, e))?;

    log::debug!(
        "wrote {}x{} {format} image to {}",
        bitmap.width,
        bitmap.height,
        path.display()
    );
    Ok(())
}
