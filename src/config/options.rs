//! Configuration options.
//!
//! Defines the construction-time options for a [`crate::Captcha`] and the
//! disturbance-level type controlling how much noise a render injects.

use ab_glyph::FontArc;
use image::Rgba;
use std::str::FromStr;

/// Size used when no (or an undersized) size is supplied at construction.
pub const DEFAULT_SIZE: (u32, u32) = (128, 64);

/// Smallest width accepted from construction options.
pub const MIN_OPTION_WIDTH: u32 = 64;
/// Smallest height accepted from construction options.
pub const MIN_OPTION_HEIGHT: u32 = 32;

/// Hard width floor enforced by [`crate::Captcha::set_size`].
pub const MIN_WIDTH: u32 = 48;
/// Hard height floor enforced by [`crate::Captcha::set_size`].
pub const MIN_HEIGHT: u32 = 20;

/// Number of noise primitives (circles plus lines) injected per render.
///
/// Levels are strictly positive by construction, so a stored level is
/// always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DisturbLevel(u32);

impl DisturbLevel {
    /// Light noise.
    pub const NORMAL: Self = Self(4);
    /// Moderate noise.
    pub const MEDIUM: Self = Self(8);
    /// Heavy noise.
    pub const HIGH: Self = Self(16);

    /// Creates a custom level. Returns `None` for zero.
    #[must_use]
    pub const fn custom(count: u32) -> Option<Self> {
        if count == 0 { None } else { Some(Self(count)) }
    }

    /// Number of primitives of each kind drawn at this level.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0
    }
}

impl Default for DisturbLevel {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl FromStr for DisturbLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "medium" => Ok(Self::MEDIUM),
            "high" => Ok(Self::HIGH),
            _ => Ok(Self::NORMAL),
        }
    }
}

/// Construction-time options for [`crate::Captcha`].
///
/// Every field has a usable default; invalid values are resolved by falling
/// back to the default rather than erroring. Note that the default font set
/// is empty: loading fonts is the caller's responsibility and rendering
/// without one fails with [`crate::CaptchaError::NoFont`].
#[derive(Debug, Clone)]
pub struct CaptchaOptions {
    /// Canvas size; honored only at `MIN_OPTION_WIDTH`/`MIN_OPTION_HEIGHT`
    /// or above, otherwise `DEFAULT_SIZE` is kept.
    pub size: (u32, u32),
    /// Colors used for text and noise. Empty falls back to black.
    pub front_colors: Vec<Rgba<u8>>,
    /// Colors used for the background fill. Empty falls back to white.
    pub bkg_colors: Vec<Rgba<u8>>,
    /// Parsed font handles used for glyph rendering.
    pub fonts: Vec<FontArc>,
    /// Noise level.
    pub disturb_level: DisturbLevel,
}

impl Default for CaptchaOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            front_colors: vec![Rgba([0, 0, 0, 255])],
            bkg_colors: vec![Rgba([255, 255, 255, 255])],
            fonts: Vec::new(),
            disturb_level: DisturbLevel::NORMAL,
        }
    }
}

impl CaptchaOptions {
    /// Resolves the options against the defaults: undersized dimensions and
    /// empty color sets are replaced, everything else passes through.
    #[must_use]
    pub(crate) fn resolve(self) -> Self {
        let defaults = Self::default();
        let size = if self.size.0 >= MIN_OPTION_WIDTH && self.size.1 >= MIN_OPTION_HEIGHT {
            self.size
        } else {
            defaults.size
        };
        let front_colors = if self.front_colors.is_empty() {
            defaults.front_colors
        } else {
            self.front_colors
        };
        let bkg_colors = if self.bkg_colors.is_empty() {
            defaults.bkg_colors
        } else {
            self.bkg_colors
        };
        Self {
            size,
            front_colors,
            bkg_colors,
            fonts: self.fonts,
            disturb_level: self.disturb_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disturb_level_constants() {
        assert_eq!(DisturbLevel::NORMAL.count(), 4);
        assert_eq!(DisturbLevel::MEDIUM.count(), 8);
        assert_eq!(DisturbLevel::HIGH.count(), 16);
    }

    #[test]
    fn test_disturb_level_custom_rejects_zero() {
        assert!(DisturbLevel::custom(0).is_none());
        assert_eq!(DisturbLevel::custom(7).unwrap().count(), 7);
    }

    #[test]
    fn test_disturb_level_parsing() {
        assert_eq!(
            DisturbLevel::from_str("medium").unwrap(),
            DisturbLevel::MEDIUM
        );
        assert_eq!(DisturbLevel::from_str("HIGH").unwrap(), DisturbLevel::HIGH);
        assert_eq!(
            DisturbLevel::from_str("normal").unwrap(),
            DisturbLevel::NORMAL
        );
        assert_eq!(
            DisturbLevel::from_str("anything").unwrap(),
            DisturbLevel::NORMAL
        );
    }

    #[test]
    fn test_undersized_options_fall_back_to_default() {
        let opts = CaptchaOptions {
            size: (40, 16),
            ..CaptchaOptions::default()
        }
        .resolve();
        assert_eq!(opts.size, DEFAULT_SIZE);
    }

    #[test]
    fn test_valid_size_is_honored() {
        let opts = CaptchaOptions {
            size: (256, 96),
            ..CaptchaOptions::default()
        }
        .resolve();
        assert_eq!(opts.size, (256, 96));
    }

    #[test]
    fn test_empty_color_sets_fall_back_to_default() {
        let opts = CaptchaOptions {
            front_colors: Vec::new(),
            bkg_colors: Vec::new(),
            ..CaptchaOptions::default()
        }
        .resolve();
        assert_eq!(opts.front_colors, vec![Rgba([0, 0, 0, 255])]);
        assert_eq!(opts.bkg_colors, vec![Rgba([255, 255, 255, 255])]);
    }
}
