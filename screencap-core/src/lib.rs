//! `screencap_core` -- desktop and window capture to image files.
//!
//! The CLI in `screencap-cli` is a thin shell over this crate.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | `ScreenCapError` enum via `thiserror`, exit codes |
//! | [`geometry`] | `Rect`, `Point`, client-area offset arithmetic |
//! | [`window`] | Capture targets and window lookup |
//! | [`capture`] | `BitBlt` frame grabber with RAII handle guards |
//! | [`encode`] | Image encoding via the `image` crate |
//! | [`format`] | Output format from file extension |
//! | [`config`] | Immutable `CaptureConfig` |
//! | [`pipeline`] | Locate → capture → save |
//! | [`platform`] | `WindowSystem` trait: Win32 and mock implementations |

pub mod capture;
pub mod config;
pub mod encode;
pub mod errors;
pub mod format;
pub mod geometry;
pub mod pipeline;
pub mod platform;
pub mod window;

pub use capture::CapturedBitmap;
pub use config::CaptureConfig;
pub use errors::{Result, ScreenCapError};
pub use format::ImageFormat;
pub use window::{CaptureTarget, WindowHandle};
