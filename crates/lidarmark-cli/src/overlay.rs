//! Occupancy-map overlay.
//!
//! Blends a second map into the middle of a first one so two mapping runs
//! can be compared by eye.  The base map is shrunk, the top map enlarged,
//! and the top map is alpha-blended into a rectangle centred on the base
//! (plus a fixed alignment offset).

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("alpha must be within [0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error(
        "overlay region at ({x}, {y}) sized {width}x{height} does not fit in a {base_width}x{base_height} base"
    )]
    RoiOutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        base_width: u32,
        base_height: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayParams {
    /// Weight of the base map inside the overlay region; the top map gets
    /// `1 - alpha`.
    pub alpha: f64,
    /// Base dimensions are divided by this.
    pub base_shrink: f64,
    /// Top dimensions are multiplied by this.
    pub top_scale: f64,
    /// Pixel shift of the overlay region from the centred position.
    pub offset: (i64, i64),
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            base_shrink: 2.5,
            top_scale: 2.0,
            offset: (7, -9),
        }
    }
}

impl OverlayParams {
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            ..Self::default()
        }
    }
}

/// Blend `top` into `base`.
pub fn overlay(
    base: &RgbaImage,
    top: &RgbaImage,
    params: &OverlayParams,
) -> Result<RgbaImage, OverlayError> {
    if !(0.0..=1.0).contains(&params.alpha) {
        return Err(OverlayError::InvalidAlpha(params.alpha));
    }

    let base = resize_to(
        base,
        scaled(base.width(), 1.0 / params.base_shrink),
        scaled(base.height(), 1.0 / params.base_shrink),
    );
    let top = resize_to(
        top,
        scaled(top.width(), params.top_scale),
        scaled(top.height(), params.top_scale),
    );
    let (bw, bh) = base.dimensions();
    let (tw, th) = top.dimensions();

    let x = (i64::from(bw) - i64::from(tw)) / 2 + params.offset.0;
    let y = (i64::from(bh) - i64::from(th)) / 2 + params.offset.1;
    if x < 0 || y < 0 || x + i64::from(tw) > i64::from(bw) || y + i64::from(th) > i64::from(bh) {
        return Err(OverlayError::RoiOutOfBounds {
            x,
            y,
            width: tw,
            height: th,
            base_width: bw,
            base_height: bh,
        });
    }
    // Both are non-negative and inside the base here.
    let (x, y) = (x as u32, y as u32);

    let mut out = base.clone();
    for (tx, ty, top_px) in top.enumerate_pixels() {
        let (ox, oy) = (x + tx, y + ty);
        let blended = blend(base.get_pixel(ox, oy), top_px, params.alpha);
        out.put_pixel(ox, oy, blended);
    }
    Ok(out)
}

/// Load both maps, blend them and write the result (format from the
/// extension of `out`).
pub fn overlay_files(
    base_path: &Path,
    top_path: &Path,
    out: &Path,
    params: &OverlayParams,
) -> Result<(u32, u32), OverlayError> {
    let base = image::open(base_path)?.into_rgba8();
    let top = image::open(top_path)?.into_rgba8();
    let blended = overlay(&base, &top, params)?;
    blended.save(out)?;
    Ok(blended.dimensions())
}

/// `dim * factor`, truncated.
fn scaled(dim: u32, factor: f64) -> u32 {
    (f64::from(dim) * factor) as u32
}

fn resize_to(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if (width, height) == img.dimensions() {
        return img.clone();
    }
    if width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    imageops::resize(img, width, height, FilterType::Triangle)
}

fn blend(base: &Rgba<u8>, top: &Rgba<u8>, alpha: f64) -> Rgba<u8> {
    let mix = |b: u8, t: u8| {
        (alpha * f64::from(b) + (1.0 - alpha) * f64::from(t))
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(base[0], top[0]),
        mix(base[1], top[1]),
        mix(base[2], top[2]),
        mix(base[3], top[3]),
    ])
}
