use std::fmt;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stroke::Stroke;

pub(crate) mod annotate;

/// Stable identity of an entry inside a working set.
///
/// Unlike [`Entry::index`], the id never changes when entries are reordered or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One screenshot or text note contributed by the user.
///
/// The entry owns its rasters. `annotated_image` is always derived from
/// `source_image` and `strokes`; it is replaced (and the old raster dropped) every
/// time either of them changes.
#[derive(Clone)]
pub struct Entry {
    id: EntryId,
    index: usize,
    is_text_only: bool,
    source_image: Option<RgbaImage>,
    annotated_image: Option<RgbaImage>,
    strokes: Vec<Stroke>,
    comment: String,
    checked: bool,
}

// Custom Debug implementation so pixel buffers don't flood the output
impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("is_text_only", &self.is_text_only)
            .field("source_image", &self.source_image.as_ref().map(|i| i.dimensions()))
            .field("annotated", &self.annotated_image.is_some())
            .field("strokes", &self.strokes.len())
            .field("comment", &self.comment)
            .field("checked", &self.checked)
            .finish()
    }
}

impl Entry {
    /// Image entry. The image may arrive later through [`Entry::set_source_image`].
    pub fn image(index: usize, source: Option<RgbaImage>) -> Self {
        Self::new(index, false, source)
    }

    pub fn text(index: usize) -> Self {
        Self::new(index, true, None)
    }

    fn new(index: usize, is_text_only: bool, source_image: Option<RgbaImage>) -> Self {
        Self {
            id: EntryId::new(),
            index,
            is_text_only,
            source_image,
            annotated_image: None,
            strokes: Vec::new(),
            comment: String::new(),
            checked: true,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    /// 1-based display position.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn is_text_only(&self) -> bool {
        self.is_text_only
    }

    pub fn source_image(&self) -> Option<&RgbaImage> {
        if self.is_text_only {
            return None;
        }
        self.source_image.as_ref()
    }

    pub fn annotated_image(&self) -> Option<&RgbaImage> {
        if self.is_text_only {
            return None;
        }
        self.annotated_image.as_ref()
    }

    /// The image that gets composited: annotated if there is one, the source otherwise.
    pub fn display_image(&self) -> Option<&RgbaImage> {
        self.annotated_image().or_else(|| self.source_image())
    }

    /// Replace the source image and redraw the current strokes on top of it.
    /// Ignored for text-only entries.
    pub fn set_source_image(&mut self, image: RgbaImage) {
        if self.is_text_only {
            log::warn!("Ignoring image for text-only entry {}", self.index);
            return;
        }
        self.source_image = Some(image);
        self.rebuild_annotation();
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Append a finished stroke. Returns `false` (and keeps nothing) for strokes that
    /// are too short to draw or for text-only entries.
    pub fn push_stroke(&mut self, stroke: Stroke) -> bool {
        if self.is_text_only || !stroke.is_drawable() {
            return false;
        }
        self.strokes.push(stroke);
        self.rebuild_annotation();
        true
    }

    /// Replace the whole stroke list, e.g. when an annotation session is committed.
    pub fn set_strokes(&mut self, strokes: Vec<Stroke>) {
        if self.is_text_only {
            return;
        }
        self.strokes = strokes.into_iter().filter(Stroke::is_drawable).collect();
        self.rebuild_annotation();
    }

    /// Remove the most recent stroke.
    pub fn undo_stroke(&mut self) -> Option<Stroke> {
        let removed = self.strokes.pop()?;
        self.rebuild_annotation();
        Some(removed)
    }

    pub fn clear_strokes(&mut self) {
        if self.strokes.is_empty() {
            return;
        }
        self.strokes.clear();
        self.rebuild_annotation();
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Whether the comment has anything besides whitespace.
    pub fn has_comment(&self) -> bool {
        !self.comment.trim().is_empty()
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    fn rebuild_annotation(&mut self) {
        // Assigning drops the previous annotated raster
        self.annotated_image = match &self.source_image {
            Some(source) if !self.strokes.is_empty() => {
                Some(annotate::flatten(source, &self.strokes))
            }
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Color32, pos2};
    use image::Rgba;

    fn line() -> Stroke {
        Stroke::new(Color32::RED, 2.0, vec![pos2(1.0, 1.0), pos2(9.0, 1.0)])
    }

    fn white(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn display_image_prefers_annotation() {
        let mut entry = Entry::image(1, Some(white(10, 4)));
        assert_eq!(entry.display_image(), entry.source_image());

        assert!(entry.push_stroke(line()));
        assert!(entry.annotated_image().is_some());
        assert_ne!(entry.display_image(), entry.source_image());
    }

    #[test]
    fn undo_last_stroke_releases_annotation() {
        let mut entry = Entry::image(1, Some(white(10, 4)));
        entry.push_stroke(line());
        assert_eq!(entry.undo_stroke(), Some(line()));
        assert!(entry.annotated_image().is_none());
        assert!(entry.undo_stroke().is_none());
    }

    #[test]
    fn strokes_survive_until_the_image_arrives() {
        let mut entry = Entry::image(3, None);
        assert!(entry.push_stroke(line()));
        assert!(entry.display_image().is_none());

        entry.set_source_image(white(10, 4));
        assert!(entry.annotated_image().is_some());
    }

    #[test]
    fn text_entries_never_carry_images() {
        let mut entry = Entry::text(2).with_comment("note");
        entry.set_source_image(white(2, 2));
        assert!(!entry.push_stroke(line()));
        assert!(entry.display_image().is_none());
        assert!(entry.has_comment());
    }

    #[test]
    fn set_strokes_drops_undrawable_ones() {
        let mut entry = Entry::image(1, Some(white(10, 4)));
        let dot = Stroke::new(Color32::RED, 2.0, vec![pos2(1.0, 1.0)]);
        entry.set_strokes(vec![dot, line()]);
        assert_eq!(entry.strokes().len(), 1);

        entry.clear_strokes();
        assert!(entry.strokes().is_empty());
        assert!(entry.annotated_image().is_none());
    }

    #[test]
    fn blank_comment_is_not_a_comment() {
        let entry = Entry::text(1).with_comment("  \n\t");
        assert!(!entry.has_comment());
    }
}
