use image::RgbaImage;

use super::text::{TextBlock, Typesetter};
use crate::config::LayoutConfig;
use crate::entry::Entry;

/// Space between the title band and the content below it.
pub const TITLE_GAP: u32 = 15;
/// Space below an image.
pub const IMAGE_GAP: u32 = 20;
/// Space below a comment block.
pub const COMMENT_GAP: u32 = 15;
/// Space between the end of a section's content and its separator band.
pub const SEPARATOR_GAP: u32 = 15;

/// Font sizes derived from the images being composed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub body_size: f32,
    pub title_size: f32,
    pub title_height: u32,
}

impl FontMetrics {
    /// Scale text with the largest image dimension so it stays legible next to big
    /// screenshots without dwarfing small ones.
    pub fn for_dimension(config: &LayoutConfig, max_image_dimension: u32) -> Self {
        let body_size = (max_image_dimension as f32 * config.font_size_ratio).max(config.min_font_size);
        let title_size = body_size + config.title_font_boost;
        Self {
            body_size,
            title_size,
            title_height: (title_size * 2.0) as u32,
        }
    }
}

/// Geometry of one entry on the canvas. All `*_top` values are absolute canvas rows.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub entry: &'a Entry,
    pub top: u32,
    pub label: TextBlock,
    pub image: Option<PlacedImage<'a>>,
    pub comment: Option<PlacedText>,
    pub separator_top: u32,
    /// Height of the section up to (not including) its separator band.
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct PlacedImage<'a> {
    pub image: &'a RgbaImage,
    pub top: u32,
}

#[derive(Debug, Clone)]
pub struct PlacedText {
    pub block: TextBlock,
    pub top: u32,
}

/// Complete layout of a composite, computed before any pixel is drawn.
#[derive(Debug, Clone)]
pub struct LayoutPlan<'a> {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub content_left: u32,
    pub content_width: u32,
    pub metrics: FontMetrics,
    pub sections: Vec<Section<'a>>,
}

/// Lay out the checked entries of `entries`, in order.
///
/// Returns `None` when nothing is checked.
pub fn plan<'a>(
    config: &LayoutConfig,
    typesetter: &Typesetter,
    entries: &'a [Entry],
) -> Option<LayoutPlan<'a>> {
    let checked: Vec<&Entry> = entries.iter().filter(|e| e.is_checked()).collect();
    if checked.is_empty() {
        return None;
    }

    let images = checked.iter().filter_map(|e| composited_image(e));
    let (max_width, max_dimension) = images.fold((0, 0), |(width, dimension), image| {
        (
            width.max(image.width()),
            dimension.max(image.width().max(image.height())),
        )
    });

    let content_width = max_width.max(config.min_content_width);
    let canvas_width = content_width + config.padding * 2;
    let metrics = FontMetrics::for_dimension(config, max_dimension);

    let mut cursor = config.padding;
    let mut sections = Vec::with_capacity(checked.len());
    for entry in checked {
        let top = cursor;
        let label = typesetter.label(&format!("[{}]", entry.index()), metrics.title_size);
        cursor += metrics.title_height + TITLE_GAP;

        let image = composited_image(entry).map(|image| {
            let placed = PlacedImage { image, top: cursor };
            cursor += image.height() + IMAGE_GAP;
            placed
        });

        let comment = entry.has_comment().then(|| {
            let block = typesetter.measure(entry.comment(), metrics.body_size, content_width as f32);
            let placed = PlacedText { block, top: cursor };
            cursor += placed.block.height() + COMMENT_GAP;
            placed
        });

        cursor += SEPARATOR_GAP;
        let separator_top = cursor;
        cursor += config.separator_height + config.entry_spacing;

        sections.push(Section {
            entry,
            top,
            label,
            image,
            comment,
            separator_top,
            height: separator_top - top,
        });
    }

    Some(LayoutPlan {
        canvas_width,
        canvas_height: cursor,
        content_left: config.padding,
        content_width,
        metrics,
        sections,
    })
}

/// The raster an entry contributes, if any. Text-only entries never contribute one.
fn composited_image(entry: &Entry) -> Option<&RgbaImage> {
    if entry.is_text_only() {
        return None;
    }
    entry.display_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn font_scales_with_large_images() {
        let small = FontMetrics::for_dimension(&layout(), 300);
        assert_eq!(small.body_size, 16.0);
        assert_eq!(small.title_size, 24.0);
        assert_eq!(small.title_height, 48);

        let large = FontMetrics::for_dimension(&layout(), 2000);
        assert_eq!(large.body_size, 40.0);
        assert_eq!(large.title_height, 96);
    }

    #[test]
    fn image_section_height_is_exact() {
        let typesetter = Typesetter::new();
        let entries = vec![Entry::image(1, Some(RgbaImage::new(100, 50)))];
        let plan = plan(&layout(), &typesetter, &entries).unwrap();

        assert_eq!(plan.canvas_width, 600 + 60);
        assert_eq!(plan.content_width, 600);
        let section = &plan.sections[0];
        assert_eq!(section.top, 30);
        assert_eq!(section.image.unwrap().top, 30 + 48 + TITLE_GAP);
        assert!(section.comment.is_none());
        assert_eq!(section.height, 48 + TITLE_GAP + 50 + IMAGE_GAP + SEPARATOR_GAP);
        assert_eq!(plan.canvas_height, 30 + section.height + 8 + 40);
    }

    #[test]
    fn wide_images_widen_the_canvas() {
        let typesetter = Typesetter::new();
        let entries = vec![
            Entry::image(1, Some(RgbaImage::new(900, 10))),
            Entry::image(2, Some(RgbaImage::new(1200, 10))).with_checked(false),
        ];
        let plan = plan(&layout(), &typesetter, &entries).unwrap();
        assert_eq!(plan.canvas_width, 900 + 60);
        assert_eq!(plan.sections.len(), 1);
    }

    #[test]
    fn sections_are_stacked_without_overlap() {
        let typesetter = Typesetter::new();
        let entries = vec![
            Entry::text(1).with_comment("first"),
            Entry::image(2, Some(RgbaImage::new(40, 40))).with_comment("second"),
            Entry::text(3),
        ];
        let plan = plan(&layout(), &typesetter, &entries).unwrap();
        for pair in plan.sections.windows(2) {
            assert!(pair[1].top >= pair[0].separator_top + 8 + 40);
        }
        let last = plan.sections.last().unwrap();
        assert_eq!(plan.canvas_height, last.separator_top + 8 + 40);
    }

    #[test]
    fn nothing_checked_means_no_plan() {
        let typesetter = Typesetter::new();
        let entries = vec![Entry::text(1).with_comment("hidden").with_checked(false)];
        assert!(plan(&layout(), &typesetter, &entries).is_none());
        assert!(plan(&layout(), &typesetter, &[]).is_none());
    }
}
