//! Renders a list of entries into one tall image.
//!
//! Composition runs in two steps: [`layout::plan`] measures every checked entry and
//! fixes the canvas size, then [`Compositor::composite`] paints the plan. Text is laid
//! out exactly once, in the planning step, and the resulting blocks are reused for
//! drawing.
//!
//! Every call gets its own [`Typesetter`], so a composite never depends on what the
//! same [`Compositor`] rendered before.

use egui::Color32;
use egui::epaint::text::FontDefinitions;
use image::{Rgba, RgbaImage};

use crate::config::LayoutConfig;
use crate::entry::Entry;
use crate::error::FontError;
use crate::raster;

pub mod layout;
pub mod text;

pub use layout::{FontMetrics, LayoutPlan, Section};
pub use text::{TextBlock, Typesetter, font_definitions, load_font};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

const TITLE_TOP: Color32 = Color32::from_rgb(240, 248, 255);
const TITLE_BOTTOM: Color32 = Color32::from_rgb(220, 235, 252);
const ACCENT: Color32 = Color32::from_rgb(0, 122, 204);
const ACCENT_WIDTH: u32 = 5;
const LABEL_COLOR: Color32 = Color32::from_rgb(0, 100, 180);

const IMAGE_BORDER: Color32 = Color32::from_rgb(200, 200, 200);

const COMMENT_BACKGROUND: Color32 = Color32::from_rgb(252, 252, 252);
const COMMENT_INSET: u32 = 5;
const COMMENT_COLOR: Color32 = Color32::from_rgb(40, 40, 40);

const SEPARATOR_TOP: Color32 = Color32::from_rgb(230, 230, 230);
const SEPARATOR_BOTTOM: Color32 = Color32::from_rgb(200, 200, 200);
const SEPARATOR_EDGE: Color32 = Color32::from_rgb(180, 180, 180);

/// Composition engine. Holds the layout settings and the fonts; reusable across calls.
pub struct Compositor {
    config: LayoutConfig,
    fonts: FontDefinitions,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            config: LayoutConfig::default(),
            fonts: font_definitions(None),
        }
    }
}

impl Compositor {
    /// Fails only when `config.font_path` names a file that is not a usable font.
    pub fn new(config: LayoutConfig) -> Result<Self, FontError> {
        let custom = config.font_path.as_deref().map(load_font).transpose()?;
        if let Some(path) = &config.font_path {
            log::debug!("Composing text with {}", path.display());
        }
        Ok(Self {
            fonts: font_definitions(custom),
            config,
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Measure the checked entries without drawing anything.
    pub fn plan<'a>(&self, entries: &'a [Entry]) -> Option<LayoutPlan<'a>> {
        layout::plan(&self.config, &self.typesetter(), entries)
    }

    fn typesetter(&self) -> Typesetter {
        Typesetter::with_fonts(self.fonts.clone())
    }

    /// Render every checked entry, top to bottom, into a single image.
    ///
    /// Returns `None` when no entry is checked; there is nothing to compose.
    pub fn composite(&self, entries: &[Entry]) -> Option<RgbaImage> {
        let typesetter = self.typesetter();
        let Some(plan) = layout::plan(&self.config, &typesetter, entries) else {
            log::debug!("Nothing checked, skipping composition of {} entries", entries.len());
            return None;
        };

        let mut canvas = RgbaImage::from_pixel(plan.canvas_width, plan.canvas_height, BACKGROUND);
        for section in &plan.sections {
            self.draw_section(&mut canvas, &typesetter, &plan, section);
        }

        log::debug!(
            "Composited {} entries into {}x{}",
            plan.sections.len(),
            plan.canvas_width,
            plan.canvas_height
        );
        Some(canvas)
    }

    fn draw_section(
        &self,
        canvas: &mut RgbaImage,
        typesetter: &Typesetter,
        plan: &LayoutPlan<'_>,
        section: &Section<'_>,
    ) {
        let left = plan.content_left as i64;
        let title_height = plan.metrics.title_height;

        // 1. Title band with the index label
        let top = section.top as i64;
        raster::fill_vertical_gradient(
            canvas,
            0,
            top,
            plan.canvas_width,
            title_height,
            TITLE_TOP,
            TITLE_BOTTOM,
        );
        raster::fill_rect(canvas, 0, top, ACCENT_WIDTH, title_height, ACCENT);
        let label_top = top + (title_height as i64 - plan.metrics.title_size as i64) / 2 - 2;
        typesetter.draw_bold(canvas, &section.label, left + 5, label_top, LABEL_COLOR);

        // 2. Image at natural size inside a thin frame
        if let Some(placed) = &section.image {
            let (width, height) = placed.image.dimensions();
            let image_top = placed.top as i64;
            raster::outline_rect(canvas, left - 1, image_top - 1, width + 2, height + 2, IMAGE_BORDER);
            image::imageops::overlay(canvas, placed.image, left, image_top);
        }

        // 3. Comment on a light background
        if let Some(comment) = &section.comment {
            let comment_top = comment.top as i64;
            let inset = COMMENT_INSET as i64;
            raster::fill_rect(
                canvas,
                left - inset,
                comment_top - inset,
                plan.content_width + COMMENT_INSET * 2,
                comment.block.height() + COMMENT_INSET * 2,
                COMMENT_BACKGROUND,
            );
            typesetter.draw(canvas, &comment.block, left, comment_top, COMMENT_COLOR);
        }

        // 4. Separator band before the next section
        self.draw_separator(canvas, section.separator_top as i64, plan.canvas_width);
    }

    fn draw_separator(&self, canvas: &mut RgbaImage, y: i64, width: u32) {
        let height = self.config.separator_height;
        if height == 0 {
            return;
        }
        raster::fill_vertical_gradient(canvas, 0, y, width, height, SEPARATOR_TOP, SEPARATOR_BOTTOM);
        raster::hline(canvas, 0, y, width, SEPARATOR_EDGE);
        raster::hline(canvas, 0, y + height as i64 - 1, width, SEPARATOR_EDGE);
    }
}

/// Compose with the default layout settings.
pub fn composite(entries: &[Entry]) -> Option<RgbaImage> {
    Compositor::default().composite(entries)
}
