use batch_note::{Compositor, Entry, LayoutConfig, Stroke};
use egui::{Color32, pos2};
use image::{Rgba, RgbaImage};

const TEAL: Rgba<u8> = Rgba([0, 128, 128, 255]);

fn solid(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, TEAL)
}

fn compositor() -> Compositor {
    Compositor::default()
}

#[test]
fn test_no_entries_returns_none() {
    assert!(compositor().composite(&[]).is_none());
}

#[test]
fn test_only_unchecked_entries_returns_none() {
    let entries = vec![
        Entry::text(1).with_comment("Test").with_checked(false),
        Entry::image(2, Some(solid(50, 50))).with_checked(false),
    ];
    assert!(compositor().composite(&entries).is_none());
}

#[test]
fn test_text_only_entry_composes() {
    let entries = vec![Entry::text(1).with_comment("Hello")];
    let image = compositor().composite(&entries).unwrap();

    // Text entries don't affect the width, so the minimum applies
    assert_eq!(image.width(), 600 + 2 * 30);
    assert!(image.height() > 0);
}

#[test]
fn test_unchecked_entries_are_left_out() {
    let text = Entry::text(1).with_comment("Hello");
    let hidden = Entry::image(2, Some(solid(1500, 900))).with_checked(false);

    let alone = compositor().composite(&[text.clone()]).unwrap();
    let with_hidden = compositor().composite(&[text, hidden]).unwrap();

    assert_eq!(alone.dimensions(), with_hidden.dimensions());
    assert_eq!(alone, with_hidden);
}

#[test]
fn test_canvas_grows_for_wide_images() {
    let entries = vec![
        Entry::image(1, Some(solid(1000, 200))),
        Entry::text(2).with_comment("wide screenshot above"),
    ];
    let image = compositor().composite(&entries).unwrap();
    assert_eq!(image.width(), 1000 + 60);
}

#[test]
fn test_height_never_shrinks_when_entries_are_added() {
    let compositor = compositor();
    let pool = vec![
        Entry::image(1, Some(solid(120, 80))),
        Entry::text(2).with_comment("a note"),
        Entry::image(3, Some(solid(300, 20))).with_comment("with a comment"),
        Entry::text(4),
        Entry::text(5).with_comment("long ".repeat(200)),
    ];

    let mut previous = 0;
    for count in 1..=pool.len() {
        let height = compositor.composite(&pool[..count]).unwrap().height();
        assert!(height > previous, "{count} entries: {height} <= {previous}");
        previous = height;
    }
}

#[test]
fn test_long_comments_get_taller_sections() {
    let compositor = compositor();
    let short = compositor
        .composite(&[Entry::text(1).with_comment("short")])
        .unwrap();
    let long = compositor
        .composite(&[Entry::text(1).with_comment("this comment wraps ".repeat(100))])
        .unwrap();
    assert_eq!(short.width(), long.width());
    assert!(long.height() > short.height());
}

#[test]
fn test_composition_is_deterministic() {
    let entries = vec![
        Entry::image(1, Some(solid(64, 48))).with_comment("first"),
        Entry::text(2).with_comment("second\nwith two lines"),
    ];

    let a = compositor().composite(&entries).unwrap();
    let b = compositor().composite(&entries).unwrap();
    assert_eq!(a.dimensions(), b.dimensions());
    assert_eq!(a, b);
}

#[test]
fn test_image_is_drawn_at_natural_size() {
    let entries = vec![Entry::image(1, Some(solid(40, 30)))];
    let compositor = compositor();
    let plan = compositor.plan(&entries).unwrap();
    let top = plan.sections[0].image.unwrap().top;
    let left = plan.content_left;

    let image = compositor.composite(&entries).unwrap();
    assert_eq!(image.get_pixel(left, top), &TEAL);
    assert_eq!(image.get_pixel(left + 39, top + 29), &TEAL);
    assert_ne!(image.get_pixel(left + 40, top + 30), &TEAL);
    // Frame around the image
    assert_eq!(image.get_pixel(left - 1, top - 1).0, [200, 200, 200, 255]);
}

#[test]
fn test_annotated_image_is_composited() {
    let mut entry = Entry::image(1, Some(RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]))));
    entry.push_stroke(Stroke::new(
        Color32::RED,
        4.0,
        vec![pos2(0.0, 20.0), pos2(40.0, 20.0)],
    ));
    let entries = vec![entry];

    let compositor = compositor();
    let plan = compositor.plan(&entries).unwrap();
    let top = plan.sections[0].image.unwrap().top;
    let left = plan.content_left;

    let image = compositor.composite(&entries).unwrap();
    assert_eq!(image.get_pixel(left + 20, top + 20).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(left + 20, top + 2).0, [255, 255, 255, 255]);
}

#[test]
fn test_canvas_fits_every_section() {
    let entries = vec![
        Entry::image(1, Some(solid(700, 400))).with_comment("x ".repeat(500)),
        Entry::text(2).with_comment("y ".repeat(300)),
        Entry::image(3, Some(solid(10, 10))),
    ];
    let compositor = compositor();
    let plan = compositor.plan(&entries).unwrap();
    let separator = compositor.config().separator_height;

    for section in &plan.sections {
        if let Some(comment) = &section.comment {
            assert!(comment.top + comment.block.height() <= section.separator_top);
        }
        assert!(section.separator_top + separator <= plan.canvas_height);
    }
    let image = compositor.composite(&entries).unwrap();
    assert_eq!(image.dimensions(), (plan.canvas_width, plan.canvas_height));
}

#[test]
fn test_font_follows_largest_image() {
    let compositor = compositor();
    let small = [Entry::image(1, Some(solid(100, 100)))];
    let large = [Entry::image(1, Some(solid(100, 3000)))];

    let small_plan = compositor.plan(&small).unwrap();
    let large_plan = compositor.plan(&large).unwrap();
    assert_eq!(small_plan.metrics.body_size, 16.0);
    assert!(large_plan.metrics.body_size > small_plan.metrics.body_size);
    assert!(large_plan.metrics.title_height > small_plan.metrics.title_height);
}

#[test]
fn test_reused_compositor_renders_like_a_fresh_one() {
    let compositor = compositor();
    let note = [Entry::text(1).with_comment("Hello determinism, same input same pixels")];
    let first = compositor.composite(&note).unwrap();

    // Lots of glyphs at many large sizes in between
    let printable: String = (' '..='~').collect();
    for step in 0..8 {
        let filler = [Entry::image(1, Some(RgbaImage::new(1, 20_000 + step * 1_000)))
            .with_comment(printable.clone())];
        assert!(compositor.plan(&filler).is_some());
    }

    let again = compositor.composite(&note).unwrap();
    assert_eq!(first, again);
    assert_eq!(again, Compositor::default().composite(&note).unwrap());
}

#[test]
fn test_configured_font_is_used_for_comments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.ttf");
    let bytes = egui::FontDefinitions::default().font_data["Hack"].font.to_vec();
    std::fs::write(&path, bytes).unwrap();

    let custom = Compositor::new(LayoutConfig {
        font_path: Some(path),
        ..LayoutConfig::default()
    })
    .unwrap();
    let entries = [Entry::text(1).with_comment("\u{4e2d}\u{6587}\u{6279}\u{6ce8} Latin ok")];

    let with_font = custom.composite(&entries).unwrap();
    let built_in = compositor().composite(&entries).unwrap();
    assert_ne!(with_font, built_in);
}

#[test]
fn test_unusable_font_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ttf");
    std::fs::write(&path, "no glyphs here").unwrap();

    let result = Compositor::new(LayoutConfig {
        font_path: Some(path),
        ..LayoutConfig::default()
    });
    assert!(matches!(result, Err(batch_note::FontError::NotAFont(_))));
}
