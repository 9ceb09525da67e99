//! Core of the now-playing overlay: album-art color theming and playback
//! state mirroring, independent of the window that presents them.

pub mod artwork;
pub mod config;
pub mod error;
pub mod playback;
pub mod theming;

pub use error::OverlayError;
