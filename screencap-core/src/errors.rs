//! Error types for `screencap_core`.
//!
//! All failures are funnelled through [`ScreenCapError`], which uses
//! `thiserror` for `Display` and `Error` derives.  Each variant maps to a
//! distinct process exit status via [`ScreenCapError::exit_code`] so that
//! scripts driving the CLI can branch on the outcome.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `screencap_core` library.
#[derive(Debug, Error)]
pub enum ScreenCapError {
    /// The OS reports no foreground window.
    #[error("NoActiveWindow: no window is currently in the foreground")]
    NoActiveWindow,

    /// No visible window title starts with the requested prefix.
    #[error("WindowNotFound: could not find a window with title '{0}'")]
    WindowNotFound(String),

    /// The output file name carries an extension with no image format.
    #[error("UnsupportedExtension: probably wrong file format: {0}")]
    UnsupportedExtension(String),

    /// The output file name has no extension at all.
    #[error("MissingExtension: invalid file name '{0}' - no extension")]
    MissingExtension(String),

    /// The encoder cannot produce the requested format from this bitmap.
    #[error("EncodingError: {0}")]
    Encoding(String),

    /// The output path could not be created or written.
    #[error("IOError: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A device context, bitmap or other OS handle could not be obtained.
    #[error("ResourceAcquisitionFailure: {0}")]
    ResourceAcquisition(String),
}

impl ScreenCapError {
    /// Process exit status reported by the CLI for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScreenCapError::WindowNotFound(_) => -1,
            ScreenCapError::NoActiveWindow => 2,
            ScreenCapError::Encoding(_) => 3,
            ScreenCapError::Io { .. } => 4,
            ScreenCapError::ResourceAcquisition(_) => 5,
            ScreenCapError::MissingExtension(_) => 7,
            ScreenCapError::UnsupportedExtension(_) => 8,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScreenCapError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convert a `windows::core::Error` (Win32 failure carrying `GetLastError`)
/// into a `ScreenCapError::ResourceAcquisition`.
#[cfg(windows)]
impl From<windows::core::Error> for ScreenCapError {
    fn from(err: windows::core::Error) -> Self {
        ScreenCapError::ResourceAcquisition(format!("Win32 error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ScreenCapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            ScreenCapError::NoActiveWindow,
            ScreenCapError::WindowNotFound("Notepad".into()),
            ScreenCapError::UnsupportedExtension("xyz".into()),
            ScreenCapError::MissingExtension("shot".into()),
            ScreenCapError::Encoding("bad".into()),
            ScreenCapError::io("out.png", std::io::Error::other("denied")),
            ScreenCapError::ResourceAcquisition("GetWindowDC failed".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(ScreenCapError::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_cli_contract_codes() {
        assert_eq!(ScreenCapError::MissingExtension("a".into()).exit_code(), 7);
        assert_eq!(ScreenCapError::UnsupportedExtension("xyz".into()).exit_code(), 8);
        assert_eq!(ScreenCapError::WindowNotFound("Notepad".into()).exit_code(), -1);
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ScreenCapError::WindowNotFound("Notepad".into());
        assert!(err.to_string().contains("'Notepad'"));
        let err = ScreenCapError::io("dir/out.png", std::io::Error::other("denied"));
        assert!(err.to_string().contains("out.png"));
    }
}
