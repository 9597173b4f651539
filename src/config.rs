//! Configuration management.
//!
//! Defines the error taxonomy and the options used to construct a
//! [`crate::Captcha`].

mod error;
mod options;

pub use error::{CaptchaError, Result};
pub use options::{
    CaptchaOptions, DEFAULT_SIZE, DisturbLevel, MIN_HEIGHT, MIN_OPTION_HEIGHT, MIN_OPTION_WIDTH,
    MIN_WIDTH,
};
