//! Captcha rendering pipeline.
//!
//! Owns the rendering configuration and orchestrates background fill,
//! noise injection, per-glyph rotation and compositing, and the conditional
//! wave-distortion pass.

use crate::captcha::charset::{self, CharClass};
use crate::config::{CaptchaError, CaptchaOptions, DisturbLevel, MIN_HEIGHT, MIN_WIDTH, Result};
use crate::render::canvas::Canvas;
use crate::render::distort::wave;
use ab_glyph::FontArc;
use image::Rgba;
use rand::Rng;
use tracing::debug;

/// Answer length used when a render is requested with a count of zero.
const DEFAULT_COUNT: usize = 4;

/// Smallest canvas height the wave pass is applied at; below this the
/// distortion destroys legibility and is skipped entirely.
const WAVE_MIN_HEIGHT: u32 = 48;

/// Horizontal period of the wave pass, in pixels.
const WAVE_PERIOD: f32 = 200.0;

/// Text rendered by [`Captcha::create_custom`] when given an empty string.
const CUSTOM_FALLBACK: &str = "unknown";

/// Generates obfuscated text images.
///
/// Configuration is mutated only through the validating setters; invalid
/// updates are clamped or ignored, never errors. Renders take `&self`, so a
/// shared `Captcha` may serve concurrent `create` calls as long as nobody
/// holds a mutable borrow (single-writer, multi-reader).
#[derive(Debug, Clone)]
pub struct Captcha {
    size: (u32, u32),
    front_colors: Vec<Rgba<u8>>,
    bkg_colors: Vec<Rgba<u8>>,
    fonts: Vec<FontArc>,
    disturb_level: DisturbLevel,
}

impl Default for Captcha {
    fn default() -> Self {
        Self::new()
    }
}

impl Captcha {
    /// Creates a generator with the default configuration and no fonts.
    ///
    /// At least one font must be added before rendering.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(CaptchaOptions::default())
    }

    /// Creates a generator from `options`, resolving invalid values against
    /// the defaults.
    #[must_use]
    pub fn with_options(options: CaptchaOptions) -> Self {
        let options = options.resolve();
        Self {
            size: options.size,
            front_colors: options.front_colors,
            bkg_colors: options.bkg_colors,
            fonts: options.fonts,
            disturb_level: options.disturb_level,
        }
    }

    /// Configured canvas size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Configured disturbance level.
    #[must_use]
    pub fn disturb_level(&self) -> DisturbLevel {
        self.disturb_level
    }

    /// Number of configured fonts.
    #[must_use]
    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    /// Sets the canvas size, clamped to the hard floors of
    /// [`MIN_WIDTH`]×[`MIN_HEIGHT`].
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width.max(MIN_WIDTH), height.max(MIN_HEIGHT));
    }

    /// Sets the disturbance level.
    pub fn set_disturbance(&mut self, level: DisturbLevel) {
        self.disturb_level = level;
    }

    /// Replaces the text/noise color set. An empty input is ignored,
    /// preserving the previous set.
    pub fn set_front_colors(&mut self, colors: Vec<Rgba<u8>>) {
        if !colors.is_empty() {
            self.front_colors = colors;
        }
    }

    /// Replaces the background color set. An empty input is ignored,
    /// preserving the previous set.
    pub fn set_bkg_colors(&mut self, colors: Vec<Rgba<u8>>) {
        if !colors.is_empty() {
            self.bkg_colors = colors;
        }
    }

    /// Replaces the font set. An empty input is ignored, preserving the
    /// previous set.
    pub fn set_fonts(&mut self, fonts: Vec<FontArc>) {
        if !fonts.is_empty() {
            self.fonts = fonts;
        }
    }

    /// Appends a parsed font handle.
    pub fn add_font(&mut self, font: FontArc) {
        self.fonts.push(font);
    }

    /// Parses `bytes` as a font and appends it to the font set.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::FontParse`] if the bytes are not a usable
    /// font; the existing font set is left untouched.
    pub fn add_font_bytes(&mut self, bytes: Vec<u8>) -> Result<()> {
        let font =
            FontArc::try_from_vec(bytes).map_err(|e| CaptchaError::FontParse(e.to_string()))?;
        self.fonts.push(font);
        Ok(())
    }

    /// Generates a captcha image together with its ground-truth answer.
    ///
    /// A `count` of zero defaults to four characters. Randomness comes from
    /// the OS-seeded thread-local generator; use
    /// [`Captcha::create_with_rng`] for deterministic output.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::NoFont`] if no font has been configured and
    /// [`CaptchaError::UnsupportedGlyph`] if a drawn character has no glyph
    /// in the chosen font. No image is returned on failure.
    pub fn create(&self, count: usize, class: CharClass) -> Result<(Canvas, String)> {
        self.create_with_rng(&mut rand::rng(), count, class)
    }

    /// [`Captcha::create`] with an explicit randomness source; output is
    /// deterministic under a fixed-seed source.
    ///
    /// # Errors
    ///
    /// See [`Captcha::create`].
    pub fn create_with_rng(
        &self,
        rng: &mut impl Rng,
        count: usize,
        class: CharClass,
    ) -> Result<(Canvas, String)> {
        if self.fonts.is_empty() {
            return Err(CaptchaError::NoFont);
        }
        let count = if count == 0 { DEFAULT_COUNT } else { count };
        debug!(
            width = self.size.0,
            height = self.size.1,
            count,
            "generating captcha"
        );

        let mut dst = Canvas::new(self.size.0, self.size.1);
        self.draw_bkg(rng, &mut dst);
        self.draw_noise(rng, &mut dst);

        let answer = charset::build(rng, count, class);
        let text = self.draw_string(rng, &answer)?;
        text.composite_over(&mut dst, 0, 0);

        Ok((dst, answer))
    }

    /// Renders the caller's text through the same pipeline instead of a
    /// generated answer. An empty `text` renders a fixed fallback literal,
    /// never an empty image.
    ///
    /// # Errors
    ///
    /// See [`Captcha::create`].
    pub fn create_custom(&self, text: &str) -> Result<Canvas> {
        self.create_custom_with_rng(&mut rand::rng(), text)
    }

    /// [`Captcha::create_custom`] with an explicit randomness source.
    ///
    /// # Errors
    ///
    /// See [`Captcha::create`].
    pub fn create_custom_with_rng(&self, rng: &mut impl Rng, text: &str) -> Result<Canvas> {
        if self.fonts.is_empty() {
            return Err(CaptchaError::NoFont);
        }
        let text = if text.is_empty() { CUSTOM_FALLBACK } else { text };

        let mut dst = Canvas::new(self.size.0, self.size.1);
        self.draw_bkg(rng, &mut dst);
        self.draw_noise(rng, &mut dst);

        let rendered = self.draw_string(rng, text)?;
        rendered.composite_over(&mut dst, 0, 0);

        Ok(dst)
    }

    fn rand_front(&self, rng: &mut impl Rng) -> Rgba<u8> {
        self.front_colors[rng.random_range(0..self.front_colors.len())]
    }

    fn draw_bkg(&self, rng: &mut impl Rng, canvas: &mut Canvas) {
        let color = self.bkg_colors[rng.random_range(0..self.bkg_colors.len())];
        canvas.fill_background(color);
    }

    /// Injects `disturb_level` circles, then the same number of lines.
    ///
    /// Every fourth circle is an outline; pure filled noise would occlude
    /// too much of the text. Line runs flip sign on odd indices so the
    /// noise does not trend a single diagonal.
    fn draw_noise(&self, rng: &mut impl Rng, canvas: &mut Canvas) {
        let (w, h) = self.size;
        for i in 0..self.disturb_level.count() {
            let x = to_i32(rng.random_range(0..w));
            let y = to_i32(rng.random_range(0..h));
            let radius = to_i32(rng.random_range(0..(h / 20).max(1)) + 1);
            canvas.draw_circle(x, y, radius, i % 4 != 0, self.rand_front(rng));
        }
        for i in 0..self.disturb_level.count() {
            let x = to_i32(rng.random_range(0..w));
            let y = to_i32(rng.random_range(0..h));
            let sign = if i % 2 == 0 { 1 } else { -1 };
            let run_x = to_i32(rng.random_range(0..h)) * sign;
            let run_y = to_i32(rng.random_range(0..(h / 10).max(1))) * sign;
            canvas.draw_line(x, y, x + run_x, y + run_y, self.rand_front(rng));
        }
    }

    /// Renders each character as an independently rotated glyph cell and
    /// composites the cells left to right onto a transparent layer.
    fn compose_glyphs(&self, rng: &mut impl Rng, text: &str) -> Result<Canvas> {
        let (w, h) = self.size;
        let mut layer = Canvas::new(w, h);

        // Point size is 0.6 of the canvas height; a quarter of it is kept
        // as padding on each side.
        let px = h * 3 / 5;
        let padding = px / 4;
        let count = u32::try_from(text.chars().count()).unwrap_or(u32::MAX).max(1);
        let slot = (w.saturating_sub(padding * 2) / count).max(1);

        for (i, ch) in text.chars().enumerate() {
            let mut cell = Canvas::new(px, px);
            let font = &self.fonts[rng.random_range(0..self.fonts.len())];
            let color = self.rand_front(rng);
            cell.draw_text(font, color, &ch.to_string(), to_f32(px))?;

            let angle = rng.random_range(-20.0_f32..20.0);
            let rotated = cell.rotate(angle);

            let index = u32::try_from(i).unwrap_or(u32::MAX);
            let left = i64::from(index * slot + padding);
            let top = (i64::from(h) - i64::from(rotated.height())) / 2;
            rotated.composite_over(&mut layer, left, top);
        }
        Ok(layer)
    }

    fn draw_string(&self, rng: &mut impl Rng, text: &str) -> Result<Canvas> {
        let mut layer = self.compose_glyphs(rng, text)?;
        let h = self.size.1;
        if h >= WAVE_MIN_HEIGHT {
            let px = h * 3 / 5;
            wave(&mut layer, to_f32(px) / 10.0, WAVE_PERIOD);
        } else {
            debug!(height = h, "canvas below wave threshold, distortion skipped");
        }
        Ok(layer)
    }
}

#[inline]
fn to_i32(val: u32) -> i32 {
    i32::try_from(val).unwrap_or(i32::MAX)
}

#[inline]
fn to_f32(val: u32) -> f32 {
    f32::from(u16::try_from(val).unwrap_or(u16::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SIZE;
    use crate::test_utils::{create_test_captcha, test_font};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_create_dimensions_and_answer_length() {
        let captcha = create_test_captcha();
        let (canvas, answer) = captcha.create(5, CharClass::Mixed).unwrap();
        assert_eq!((canvas.width(), canvas.height()), DEFAULT_SIZE);
        assert_eq!(answer.chars().count(), 5);
    }

    #[test]
    fn test_zero_count_defaults_to_four() {
        let captcha = create_test_captcha();
        let (_, answer) = captcha.create(0, CharClass::Digits).unwrap();
        assert_eq!(answer.chars().count(), 4);
    }

    #[test]
    fn test_create_without_font_is_typed_error() {
        let captcha = Captcha::new();
        assert!(matches!(
            captcha.create(4, CharClass::Mixed),
            Err(CaptchaError::NoFont)
        ));
        assert!(matches!(
            captcha.create_custom("abc"),
            Err(CaptchaError::NoFont)
        ));
    }

    #[test]
    fn test_unambiguous_answers_stay_in_curated_alphabet() {
        let captcha = create_test_captcha();
        let mut rng = StdRng::seed_from_u64(20);
        let (_, answer) = captcha
            .create_with_rng(&mut rng, 16, CharClass::Unambiguous)
            .unwrap();
        assert!(
            answer
                .bytes()
                .all(|b| b"34578acdefghjkmnpqstwxyABCDEFGHJKMNPQRSVWXY".contains(&b))
        );
    }

    #[test]
    fn test_seeded_renders_are_reproducible() {
        let captcha = create_test_captcha();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let (canvas_a, answer_a) = captcha.create_with_rng(&mut a, 6, CharClass::Mixed).unwrap();
        let (canvas_b, answer_b) = captcha.create_with_rng(&mut b, 6, CharClass::Mixed).unwrap();
        assert_eq!(answer_a, answer_b);
        assert_eq!(canvas_a, canvas_b);
    }

    #[test]
    fn test_custom_empty_text_renders_fallback() {
        let captcha = create_test_captcha();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let empty = captcha.create_custom_with_rng(&mut a, "").unwrap();
        let fallback = captcha.create_custom_with_rng(&mut b, "unknown").unwrap();
        assert_eq!(empty, fallback);
    }

    #[test]
    fn test_custom_unsupported_text_is_typed_error() {
        let captcha = create_test_captcha();
        // DejaVu Sans carries no CJK glyphs.
        assert!(matches!(
            captcha.create_custom("\u{65E5}\u{672C}"),
            Err(CaptchaError::UnsupportedGlyph(_))
        ));
    }

    #[test]
    fn test_set_size_enforces_floors() {
        let mut captcha = create_test_captcha();
        captcha.set_size(10, 10);
        assert_eq!(captcha.size(), (48, 20));
        captcha.set_size(300, 100);
        assert_eq!(captcha.size(), (300, 100));
    }

    #[test]
    fn test_empty_setter_inputs_are_ignored() {
        let mut captcha = create_test_captcha();
        captcha.set_front_colors(Vec::new());
        captcha.set_bkg_colors(Vec::new());
        captcha.set_fonts(Vec::new());
        assert_eq!(captcha.font_count(), 1);
        assert!(captcha.create(4, CharClass::Mixed).is_ok());
    }

    #[test]
    fn test_set_disturbance_applies_supplied_level() {
        let mut captcha = create_test_captcha();
        captcha.set_disturbance(DisturbLevel::HIGH);
        assert_eq!(captcha.disturb_level(), DisturbLevel::HIGH);
        captcha.set_disturbance(DisturbLevel::custom(3).unwrap());
        assert_eq!(captcha.disturb_level().count(), 3);
    }

    #[test]
    fn test_add_font_bytes_rejects_garbage_atomically() {
        let mut captcha = create_test_captcha();
        let err = captcha.add_font_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, CaptchaError::FontParse(_)));
        assert_eq!(captcha.font_count(), 1);
        assert!(captcha.create(4, CharClass::Mixed).is_ok());
    }

    #[test]
    fn test_add_font_appends() {
        let mut captcha = create_test_captcha();
        captcha.add_font(test_font());
        assert_eq!(captcha.font_count(), 2);
    }

    #[test]
    fn test_wave_skipped_below_height_threshold() {
        let captcha = Captcha::with_options(CaptchaOptions {
            size: (128, 40),
            fonts: vec![test_font()],
            ..CaptchaOptions::default()
        });
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let distorted = captcha.draw_string(&mut a, "AB").unwrap();
        let plain = captcha.compose_glyphs(&mut b, "AB").unwrap();
        assert_eq!(distorted, plain);
    }

    #[test]
    fn test_wave_applied_at_height_threshold() {
        let captcha = Captcha::with_options(CaptchaOptions {
            size: (128, 64),
            fonts: vec![test_font()],
            ..CaptchaOptions::default()
        });
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let distorted = captcha.draw_string(&mut a, "AB").unwrap();
        let mut expected = captcha.compose_glyphs(&mut b, "AB").unwrap();
        assert_ne!(distorted, expected);
        wave(&mut expected, to_f32(64 * 3 / 5) / 10.0, WAVE_PERIOD);
        assert_eq!(distorted, expected);
    }

    #[test]
    fn test_small_canvas_renders() {
        let mut captcha = create_test_captcha();
        captcha.set_size(48, 20);
        let (canvas, answer) = captcha.create(4, CharClass::Upper).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (48, 20));
        assert_eq!(answer.len(), 4);
    }
}
