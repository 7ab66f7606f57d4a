use egui::{Pos2, Rect};
use image::RgbaImage;

use crate::raster;
use crate::stroke::Stroke;

/// Flatten `strokes` onto a copy of `source`.
///
/// Strokes are painted in order with round caps and joins. Strokes with fewer than
/// two points are skipped.
pub(crate) fn flatten(source: &RgbaImage, strokes: &[Stroke]) -> RgbaImage {
    let mut annotated = source.clone();
    for stroke in strokes.iter().filter(|s| s.is_drawable()) {
        paint_stroke(&mut annotated, stroke);
    }
    annotated
}

/// Paint one stroke using distance-to-segment coverage, anti-aliased over one pixel.
pub(crate) fn paint_stroke(canvas: &mut RgbaImage, stroke: &Stroke) {
    let points = stroke.points();
    if points.len() < 2 {
        return;
    }

    let radius = stroke.width() / 2.0;
    let canvas_rect = Rect::from_min_max(
        Pos2::ZERO,
        Pos2::new(canvas.width() as f32, canvas.height() as f32),
    );
    let area = stroke.bounds().expand(1.0).intersect(canvas_rect);
    if !area.is_positive() {
        return;
    }

    let x0 = area.min.x.floor() as i64;
    let y0 = area.min.y.floor() as i64;
    let x1 = area.max.x.ceil() as i64;
    let y1 = area.max.y.ceil() as i64;

    for y in y0..y1 {
        for x in x0..x1 {
            let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
            let distance = points
                .windows(2)
                .map(|segment| distance_to_line_segment(center, segment[0], segment[1]))
                .fold(f32::INFINITY, f32::min);
            let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
            if coverage > 0.0 {
                raster::blend_pixel(canvas, x, y, stroke.color(), coverage);
            }
        }
    }
}

/// Calculate distance from a point to a line segment
pub(crate) fn distance_to_line_segment(point: Pos2, line_start: Pos2, line_end: Pos2) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;

    let line_len = line_vec.length();
    if line_len == 0.0 {
        return point_vec.length();
    }

    let t = ((point_vec.x * line_vec.x + point_vec.y * line_vec.y) / line_len).clamp(0.0, line_len);
    let projection = line_start + (line_vec * t / line_len);
    (point - projection).length()
}
