//! Shared integration-test helpers.

use mavecap::{Captcha, CaptchaOptions, FontArc};

pub const FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Parses the bundled test font.
pub fn test_font() -> FontArc {
    FontArc::try_from_slice(FONT_BYTES).expect("bundled test font parses")
}

/// A black-on-white generator at `size` with the test font loaded.
pub fn black_on_white(size: (u32, u32)) -> Captcha {
    Captcha::with_options(CaptchaOptions {
        size,
        fonts: vec![test_font()],
        ..CaptchaOptions::default()
    })
}
