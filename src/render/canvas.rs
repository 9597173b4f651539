//! Pixel canvas.
//!
//! An owned RGBA buffer with the drawing operations the captcha pipeline
//! needs: uniform fill, circle and line primitives, centered glyph text,
//! rotation and alpha compositing.

use crate::config::{CaptchaError, Result};
use ab_glyph::{Font, FontArc, PxScale};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, Rgba, RgbaImage, imageops};
use imageproc::drawing::{
    draw_antialiased_line_segment_mut, draw_filled_circle_mut, draw_hollow_circle_mut,
    draw_text_mut, text_size,
};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use imageproc::pixelops::interpolate;
use std::io::{Cursor, Seek, Write};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// An owned 2-D RGBA pixel buffer.
///
/// Created fully transparent; fill and draw operations mutate it in place,
/// while [`Canvas::rotate`] produces a new canvas sized to the rotated
/// bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub(crate) img: RgbaImage,
}

impl Canvas {
    /// Allocates a blank, fully transparent canvas. Zero dimensions are
    /// lifted to one pixel.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.img.width()
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.img.height()
    }

    /// Borrows the underlying image buffer.
    #[must_use]
    pub fn as_image(&self) -> &RgbaImage {
        &self.img
    }

    /// Consumes the canvas, returning the underlying image buffer.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    /// Sets every pixel to `color`, overwriting prior content.
    pub fn fill_background(&mut self, color: Rgba<u8>) {
        for pixel in self.img.pixels_mut() {
            *pixel = color;
        }
    }

    /// Draws a circle outline or a filled disc, clipped to the canvas.
    /// A radius below one is a no-op.
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, filled: bool, color: Rgba<u8>) {
        if radius < 1 {
            return;
        }
        if filled {
            draw_filled_circle_mut(&mut self.img, (cx, cy), radius, color);
        } else {
            draw_hollow_circle_mut(&mut self.img, (cx, cy), radius, color);
        }
    }

    /// Draws an anti-aliased line segment, clipped to the canvas.
    /// A zero-length segment draws a single point.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
        if x0 == x1 && y0 == y1 {
            self.put_pixel_clipped(x0, y0, color);
            return;
        }
        draw_antialiased_line_segment_mut(&mut self.img, (x0, y0), (x1, y1), color, interpolate);
    }

    /// Rasterizes `text` with the font's glyph outlines at `px_size`,
    /// anti-aliased and centered within the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::UnsupportedGlyph`] if the font maps any
    /// character of `text` to the missing-glyph placeholder; nothing is
    /// drawn in that case.
    pub fn draw_text(
        &mut self,
        font: &FontArc,
        color: Rgba<u8>,
        text: &str,
        px_size: f32,
    ) -> Result<()> {
        for ch in text.chars() {
            if font.glyph_id(ch).0 == 0 {
                return Err(CaptchaError::UnsupportedGlyph(ch));
            }
        }
        let scale = PxScale::from(px_size);
        let (tw, th) = text_size(scale, font, text);
        let x = (i64::from(self.width()) - i64::from(tw)) / 2;
        let y = (i64::from(self.height()) - i64::from(th)) / 2;
        draw_text_mut(
            &mut self.img,
            color,
            i32::try_from(x).unwrap_or(0),
            i32::try_from(y).unwrap_or(0),
            scale,
            font,
            text,
        );
        Ok(())
    }

    /// Produces a new canvas holding this one rotated clockwise by
    /// `degrees` (taken modulo 360) about its center, sized to the rotated
    /// bounding box. Pixels outside the source are fully transparent;
    /// rotation by zero returns an identical copy.
    #[must_use]
    pub fn rotate(&self, degrees: f32) -> Self {
        let angle = degrees.rem_euclid(360.0);
        if angle == 0.0 {
            return self.clone();
        }
        let rad = angle.to_radians();
        let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
        let (sw, sh) = (self.width(), self.height());
        let (wf, hf) = (to_f32(sw), to_f32(sh));
        let bw = ceil_to_u32(wf.mul_add(cos, hf * sin));
        let bh = ceil_to_u32(wf.mul_add(sin, hf * cos));

        // The scratch buffer must hold both the source and the rotated
        // bounding box; a thin source rotated slightly can have a box
        // narrower than itself.
        let (scratch_w, scratch_h) = (bw.max(sw), bh.max(sh));
        let mut scratch = RgbaImage::new(scratch_w, scratch_h);
        imageops::overlay(
            &mut scratch,
            &self.img,
            i64::from((scratch_w - sw) / 2),
            i64::from((scratch_h - sh) / 2),
        );
        let rotated = rotate_about_center(&scratch, rad, Interpolation::Bilinear, TRANSPARENT);
        let img = imageops::crop_imm(
            &rotated,
            (scratch_w - bw) / 2,
            (scratch_h - bh) / 2,
            bw,
            bh,
        )
        .to_image();
        Self { img }
    }

    /// Alpha-blends this canvas onto `dest` with its top-left corner at
    /// `(x, y)`, clipped to the destination. Fully transparent source
    /// pixels leave the destination unchanged; negative offsets are
    /// allowed.
    pub fn composite_over(&self, dest: &mut Self, x: i64, y: i64) {
        imageops::overlay(&mut dest.img, &self.img, x, y);
    }

    /// Encodes the canvas as PNG into an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::Encode`] if PNG encoding fails.
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_png(&mut Cursor::new(&mut bytes))?;
        Ok(bytes)
    }

    /// Encodes the canvas as PNG into `w`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::Encode`] if PNG encoding fails.
    pub fn write_png<W: Write + Seek>(&self, w: &mut W) -> Result<()> {
        self.img.write_to(w, ImageFormat::Png)?;
        Ok(())
    }

    /// Encodes the canvas as a `data:image/png;base64,` URI.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::Encode`] if PNG encoding fails.
    pub fn png_data_uri(&self) -> Result<String> {
        let bytes = self.png_bytes()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }

    fn put_pixel_clipped(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y))
            && px < self.width()
            && py < self.height()
        {
            self.img.put_pixel(px, py, color);
        }
    }
}

#[inline]
fn to_f32(val: u32) -> f32 {
    f32::from(u16::try_from(val).unwrap_or(u16::MAX))
}

#[inline]
fn ceil_to_u32(val: f32) -> u32 {
    val.ceil().clamp(0.0, f32::from(u16::MAX)) as u32
}
