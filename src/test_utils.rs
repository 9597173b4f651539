//! Test utilities and shared configuration.
//!
//! This module provides common helpers for unit and integration tests,
//! reducing duplication across the codebase. The bundled font is a test
//! fixture only; the library itself ships no default font.

#[cfg(any(test, feature = "testing"))]
use crate::captcha::generator::Captcha;
#[cfg(any(test, feature = "testing"))]
use crate::config::CaptchaOptions;
#[cfg(any(test, feature = "testing"))]
use ab_glyph::FontArc;

/// DejaVu Sans, bundled for the test suites.
#[cfg(any(test, feature = "testing"))]
pub const TEST_FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Parses the bundled test font.
///
/// # Panics
///
/// Panics if the bundled font bytes are invalid.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn test_font() -> FontArc {
    FontArc::try_from_slice(TEST_FONT_BYTES).expect("bundled test font parses")
}

/// Creates a generator with the default configuration and the bundled test
/// font loaded.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_test_captcha() -> Captcha {
    Captcha::with_options(CaptchaOptions {
        fonts: vec![test_font()],
        ..CaptchaOptions::default()
    })
}
