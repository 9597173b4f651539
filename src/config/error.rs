//! Error types and result aliases.
//!
//! Defines the core `CaptchaError` enumeration and common `Result` type.

use thiserror::Error;

/// Captcha-specific errors.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// A render was requested while the font set is empty.
    #[error("no font configured: load at least one font before rendering")]
    NoFont,

    /// Font bytes could not be parsed into a usable font.
    #[error("font parse error: {0}")]
    FontParse(String),

    /// The chosen font has no glyph for a requested character.
    #[error("no glyph available for character {0:?}")]
    UnsupportedGlyph(char),

    /// Image encoding failed.
    #[error("image encode error: {0}")]
    Encode(#[from] image::ImageError),
}

/// Result type alias for `CaptchaError`.
pub type Result<T> = std::result::Result<T, CaptchaError>;
