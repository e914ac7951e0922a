use std::io::Cursor;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use makemyroom_contracts::images::ImageRef;

const DIVIDER_HALF_WIDTH: u32 = 1;

/// Renders the split view: "before" on the left of the boundary, "after" on
/// the right, with a thin white divider. Output is PNG at the "after" size.
pub fn compose_comparison(before: &ImageRef, after: &ImageRef, position: f64) -> Result<ImageRef> {
    let before = image::load_from_memory(&before.decode_bytes()?)
        .context("failed decoding before image")?;
    let after = image::load_from_memory(&after.decode_bytes()?)
        .context("failed decoding after image")?
        .to_rgba8();
    let (width, height) = after.dimensions();
    let before = before
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgba8();

    let split = split_column(width, position);
    let mut out = RgbaImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        *pixel = if split > 0 && x.abs_diff(split) <= DIVIDER_HALF_WIDTH {
            Rgba([255, 255, 255, 255])
        } else if x < split {
            *before.get_pixel(x, y)
        } else {
            *after.get_pixel(x, y)
        };
    }

    let mut bytes = Vec::new();
    out.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("failed encoding comparison")?;
    Ok(ImageRef::from_bytes("image/png", &bytes))
}

fn split_column(width: u32, position: f64) -> u32 {
    let clamped = if position.is_finite() {
        position.clamp(0.0, 100.0)
    } else {
        50.0
    };
    ((width as f64) * clamped / 100.0).round() as u32
}
