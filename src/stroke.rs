use egui::{Color32, Pos2, Rect};

/// Default pen used by the annotation editor.
pub const DEFAULT_STROKE_COLOR: Color32 = Color32::RED;
pub const DEFAULT_STROKE_WIDTH: f32 = 3.0;

/// A finished freehand path.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    points: Vec<Pos2>,
    color: Color32,
    width: f32,
}

/// Stroke being drawn; points are only ever appended.
#[derive(Clone, Debug)]
pub struct MutableStroke {
    points: Vec<Pos2>,
    color: Color32,
    width: f32,
}

impl Stroke {
    /// Create a new immutable stroke. Non-positive widths fall back to the default pen width.
    pub fn new(color: Color32, width: f32, points: Vec<Pos2>) -> Self {
        Self {
            points,
            color,
            width: sanitize_width(width),
        }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// A stroke needs at least two points to be drawn as a line.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Bounding box of the painted area, including half the pen width.
    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::NOTHING;
        }

        let half = self.width / 2.0;
        let mut rect = Rect::from_min_max(self.points[0], self.points[0]);
        for point in &self.points[1..] {
            rect.extend_with(*point);
        }
        rect.expand(half)
    }
}

impl MutableStroke {
    pub fn new(color: Color32, width: f32) -> Self {
        Self {
            points: Vec::new(),
            color,
            width: sanitize_width(width),
        }
    }

    pub fn add_point(&mut self, point: Pos2) {
        // Pointer events often repeat the last position
        if self.points.last() == Some(&point) {
            return;
        }
        self.points.push(point);
    }

    /// Drop every point so the same pen can start a fresh path.
    pub fn restart(&mut self) {
        self.points.clear();
    }

    /// Convert to an immutable stroke, or `None` if it is too short to draw.
    pub fn finish(&self) -> Option<Stroke> {
        let stroke = self.to_stroke();
        stroke.is_drawable().then_some(stroke)
    }

    pub fn to_stroke(&self) -> Stroke {
        Stroke::new(self.color, self.width, self.points.clone())
    }

    /// Points collected so far, for drawing a live preview.
    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }
}

impl Default for MutableStroke {
    fn default() -> Self {
        Self::new(DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH)
    }
}

fn sanitize_width(width: f32) -> f32 {
    if width.is_finite() && width > 0.0 {
        width
    } else {
        DEFAULT_STROKE_WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn single_point_stroke_is_not_drawable() {
        let mut pen = MutableStroke::default();
        pen.add_point(pos2(1.0, 1.0));
        pen.add_point(pos2(1.0, 1.0));
        assert_eq!(pen.points().len(), 1);
        assert!(pen.finish().is_none());

        pen.add_point(pos2(4.0, 5.0));
        let stroke = pen.finish().unwrap();
        assert!(stroke.is_drawable());
        assert_eq!(stroke.color(), DEFAULT_STROKE_COLOR);
    }

    #[test]
    fn restart_clears_points() {
        let mut pen = MutableStroke::new(Color32::BLUE, 5.0);
        pen.add_point(pos2(0.0, 0.0));
        pen.add_point(pos2(3.0, 0.0));
        pen.restart();
        assert!(pen.points().is_empty());
        assert_eq!(pen.width(), 5.0);
    }

    #[test]
    fn invalid_width_uses_default() {
        let stroke = Stroke::new(Color32::RED, -2.0, vec![]);
        assert_eq!(stroke.width(), DEFAULT_STROKE_WIDTH);
        assert_eq!(stroke.bounds(), Rect::NOTHING);
    }

    #[test]
    fn bounds_include_half_width() {
        let stroke = Stroke::new(Color32::RED, 4.0, vec![pos2(10.0, 10.0), pos2(20.0, 30.0)]);
        let rect = stroke.bounds();
        assert_eq!(rect.min, pos2(8.0, 8.0));
        assert_eq!(rect.max, pos2(22.0, 32.0));
    }
}
