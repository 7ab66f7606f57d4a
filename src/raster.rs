//! Small raster helpers shared by the compositor, the annotation renderer and the history store.

use std::path::Path;

use egui::Color32;
use image::{ImageFormat, ImageResult, Rgba, RgbaImage, imageops::FilterType};

/// Format used for every raster the crate writes. Lossless, so a reloaded image is pixel-identical.
pub const RASTER_FORMAT: ImageFormat = ImageFormat::Png;
pub const RASTER_EXTENSION: &str = "png";

pub fn load(path: &Path) -> ImageResult<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

pub fn save(image: &RgbaImage, path: &Path) -> ImageResult<()> {
    image.save_with_format(path, RASTER_FORMAT)
}

/// Scale `source` to fit inside `max_width` x `max_height`, keeping the aspect ratio.
///
/// Images that already fit are copied unchanged; each side is at least one pixel.
pub fn fit_within(source: &RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return source.clone();
    }

    let ratio = (max_width as f32 / width as f32)
        .min(max_height as f32 / height as f32)
        .min(1.0);
    if ratio >= 1.0 {
        return source.clone();
    }

    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);
    image::imageops::resize(source, new_width, new_height, FilterType::CatmullRom)
}

pub fn rgba(color: Color32) -> Rgba<u8> {
    Rgba(color.to_srgba_unmultiplied())
}

/// Fill the rectangle `[x, x + width) x [y, y + height)`, clipped to the canvas.
pub fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: Color32) {
    let pixel = rgba(color);
    for_each_clipped(canvas, x, y, width, height, |canvas, px, py| {
        canvas.put_pixel(px, py, pixel);
    });
}

/// Vertical linear gradient from `top` to `bottom`.
pub fn fill_vertical_gradient(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    top: Color32,
    bottom: Color32,
) {
    if height == 0 {
        return;
    }
    for row in 0..height {
        let t = if height > 1 {
            row as f32 / (height - 1) as f32
        } else {
            0.0
        };
        fill_rect(canvas, x, y + row as i64, width, 1, lerp_color(top, bottom, t));
    }
}

/// One pixel wide outline whose outer edge is the given rectangle.
pub fn outline_rect(canvas: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: Color32) {
    if width == 0 || height == 0 {
        return;
    }
    fill_rect(canvas, x, y, width, 1, color);
    fill_rect(canvas, x, y + height as i64 - 1, width, 1, color);
    fill_rect(canvas, x, y, 1, height, color);
    fill_rect(canvas, x + width as i64 - 1, y, 1, height, color);
}

/// Horizontal line spanning `width` pixels.
pub fn hline(canvas: &mut RgbaImage, x: i64, y: i64, width: u32, color: Color32) {
    fill_rect(canvas, x, y, width, 1, color);
}

/// Blend `color` onto the pixel at (x, y) with the given coverage in `0.0..=1.0`.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Color32, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0) * color.a() as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }

    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let src = color.to_srgba_unmultiplied();
    for channel in 0..3 {
        let blended = src[channel] as f32 * alpha + dst.0[channel] as f32 * (1.0 - alpha);
        dst.0[channel] = blended.round() as u8;
    }
    let dst_alpha = dst.0[3] as f32 / 255.0;
    dst.0[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color32::from_rgba_unmultiplied(
        lerp(a.r(), b.r()),
        lerp(a.g(), b.g()),
        lerp(a.b(), b.b()),
        lerp(a.a(), b.a()),
    )
}

fn for_each_clipped(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    mut f: impl FnMut(&mut RgbaImage, u32, u32),
) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + width as i64).min(canvas.width() as i64);
    let y1 = (y + height as i64).min(canvas.height() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            f(canvas, px as u32, py as u32);
        }
    }
}
