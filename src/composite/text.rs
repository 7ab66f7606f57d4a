use std::fs;
use std::path::Path;
use std::sync::Arc;

use egui::epaint::text::{FontData, FontDefinitions, FontFamily, Fonts, Galley};
use egui::epaint::{FontImage, ImageData};
use egui::{Color32, FontId, Pos2, Vec2};
use image::RgbaImage;
use parking_lot::Mutex;

use crate::error::FontError;
use crate::raster;

const PIXELS_PER_POINT: f32 = 1.0;
const MAX_TEXTURE_SIDE: usize = 8192;

/// Minimum block height as a multiple of the font size.
const MIN_LINE_FACTOR: f32 = 1.8;
/// Extra room below the last line of a block.
const BLOCK_SLACK: u32 = 8;

/// Name under which a user supplied font is registered.
const CUSTOM_FONT: &str = "custom";
/// Leading tags of TrueType, OpenType and font collection files.
const SFNT_TAGS: [[u8; 4]; 4] = [[0, 1, 0, 0], *b"OTTO", *b"true", *b"ttcf"];

/// Read a TrueType/OpenType font (or collection, first face) from disk.
pub fn load_font(path: &Path) -> Result<FontData, FontError> {
    let bytes = fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_font = bytes
        .get(..4)
        .is_some_and(|tag| SFNT_TAGS.iter().any(|known| known == tag));
    if !is_font {
        return Err(FontError::NotAFont(path.to_path_buf()));
    }
    Ok(FontData::from_owned(bytes))
}

/// egui's built-in fonts, with `custom` tried first for proportional text.
///
/// The built-in faces stay behind it as fallbacks for glyphs the custom font lacks.
pub fn font_definitions(custom: Option<FontData>) -> FontDefinitions {
    let mut definitions = FontDefinitions::default();
    if let Some(font) = custom {
        definitions
            .font_data
            .insert(CUSTOM_FONT.to_owned(), font.into());
        definitions
            .families
            .entry(FontFamily::Proportional)
            .or_default()
            .insert(0, CUSTOM_FONT.to_owned());
    }
    definitions
}

/// Lays out and rasterizes text with egui's built-in fonts.
///
/// egui keeps rasterized glyphs in a coverage atlas and only reports changes to it,
/// so we mirror the atlas locally and patch it after every layout.
///
/// The atlas only grows, so a typesetter is meant to serve a single composite.
pub struct Typesetter {
    fonts: Fonts,
    atlas: Mutex<FontImage>,
}

/// Text that has been laid out once and can be painted any number of times.
///
/// The same block is used to size the canvas and to draw, so the reserved space always
/// matches what ends up on the canvas.
#[derive(Clone, Debug)]
pub struct TextBlock {
    galley: Arc<Galley>,
    height: u32,
}

impl TextBlock {
    /// Height reserved for the block, never less than one comfortable line.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width actually covered by the laid out text.
    pub fn width(&self) -> f32 {
        self.galley.rect.width()
    }

    pub fn line_count(&self) -> usize {
        self.galley.rows.len()
    }
}

impl Default for Typesetter {
    fn default() -> Self {
        Self::new()
    }
}

impl Typesetter {
    /// Typesetter using only egui's built-in fonts.
    pub fn new() -> Self {
        Self::with_fonts(FontDefinitions::default())
    }

    pub fn with_fonts(definitions: FontDefinitions) -> Self {
        let fonts = Fonts::new(PIXELS_PER_POINT, MAX_TEXTURE_SIDE, definitions);
        let typesetter = Self {
            fonts,
            atlas: Mutex::new(FontImage::new([0, 0])),
        };
        typesetter.sync_atlas(&mut typesetter.atlas.lock());
        typesetter
    }

    /// Wrap `text` at `max_width` pixels using a proportional font of `font_size` pixels.
    pub fn measure(&self, text: &str, font_size: f32, max_width: f32) -> TextBlock {
        let mut atlas = self.atlas.lock();
        let galley = self.fonts.layout(
            text.to_owned(),
            FontId::proportional(font_size),
            Color32::BLACK,
            max_width,
        );
        self.sync_atlas(&mut atlas);

        let laid_out = galley.rect.height().ceil().max(0.0) as u32 + BLOCK_SLACK;
        let minimum = (font_size * MIN_LINE_FACTOR) as u32;
        TextBlock {
            galley,
            height: laid_out.max(minimum),
        }
    }

    /// Single line label; never wraps.
    pub fn label(&self, text: &str, font_size: f32) -> TextBlock {
        self.measure(text, font_size, f32::INFINITY)
    }

    /// Paint `block` with its top-left corner at (`x`, `y`).
    pub fn draw(&self, canvas: &mut RgbaImage, block: &TextBlock, x: i64, y: i64, color: Color32) {
        let atlas = self.atlas.lock();
        let [atlas_width, atlas_height] = atlas.size;
        let origin = Vec2::new(x as f32, y as f32);

        for row in &block.galley.rows {
            for glyph in &row.glyphs {
                let uv = glyph.uv_rect;
                if uv.is_nothing() {
                    continue;
                }

                let left_top: Pos2 = glyph.pos + uv.offset + origin;
                let left = left_top.x.round() as i64;
                let top = left_top.y.round() as i64;

                let (u0, v0) = (uv.min[0] as usize, uv.min[1] as usize);
                let u1 = (uv.max[0] as usize).min(atlas_width);
                let v1 = (uv.max[1] as usize).min(atlas_height);
                for v in v0..v1 {
                    for u in u0..u1 {
                        let coverage = atlas.pixels[v * atlas_width + u];
                        if coverage > 0.0 {
                            raster::blend_pixel(
                                canvas,
                                left + (u - u0) as i64,
                                top + (v - v0) as i64,
                                color,
                                coverage,
                            );
                        }
                    }
                }
            }
        }
    }

    /// Paint `block` in faux bold: the glyphs are laid down twice, one pixel apart.
    pub fn draw_bold(&self, canvas: &mut RgbaImage, block: &TextBlock, x: i64, y: i64, color: Color32) {
        self.draw(canvas, block, x, y, color);
        self.draw(canvas, block, x + 1, y, color);
    }

    fn sync_atlas(&self, atlas: &mut FontImage) {
        let Some(delta) = self.fonts.font_image_delta() else {
            return;
        };
        let ImageData::Font(patch) = delta.image else {
            return;
        };

        match delta.pos {
            None => *atlas = patch,
            Some([x0, y0]) => {
                let [width, height] = atlas.size;
                let [patch_width, patch_height] = patch.size;
                if x0 + patch_width > width || y0 + patch_height > height {
                    log::warn!(
                        "Font atlas patch {:?} at {:?} does not fit {:?}",
                        patch.size,
                        [x0, y0],
                        atlas.size
                    );
                    return;
                }
                for row in 0..patch_height {
                    let src = row * patch_width;
                    let dst = (y0 + row) * width + x0;
                    atlas.pixels[dst..dst + patch_width]
                        .copy_from_slice(&patch.pixels[src..src + patch_width]);
                }
            }
        }
    }
}
