//! Wave distortion.
//!
//! A horizontal sinusoidal remap of a canvas's pixel columns, producing the
//! classic wavy captcha look.

use crate::render::canvas::Canvas;
use image::RgbaImage;
use std::f32::consts::TAU;

/// Remaps every output pixel `(x, y)` to the source sample at
/// `(x, y + amplitude * sin(TAU * x / period))`, nearest-sampled. Samples
/// falling outside the canvas become fully transparent.
///
/// The remap is a pure function of the current canvas contents, so it must
/// run after everything that belongs to the distorted layer has been
/// composited into it.
pub fn wave(canvas: &mut Canvas, amplitude: f32, period: f32) {
    if amplitude == 0.0 || period == 0.0 {
        return;
    }
    let (w, h) = (canvas.width(), canvas.height());
    let height = i64::from(h);
    let step = TAU / period;
    let mut out = RgbaImage::new(w, h);
    for x in 0..w {
        let shift = round_to_i64(amplitude * (to_f32(x) * step).sin());
        for y in 0..h {
            let sy = i64::from(y) + shift;
            if (0..height).contains(&sy)
                && let Ok(sy) = u32::try_from(sy)
            {
                out.put_pixel(x, y, *canvas.img.get_pixel(x, sy));
            }
        }
    }
    canvas.img = out;
}

#[inline]
fn to_f32(val: u32) -> f32 {
    f32::from(u16::try_from(val).unwrap_or(u16::MAX))
}

#[inline]
fn round_to_i64(val: f32) -> i64 {
    val.round().clamp(-65_536.0, 65_536.0) as i64
}
