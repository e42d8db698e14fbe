use anyhow::Result;
use hud_core::{
    Charset, ColorLinPremul, Direction, EMBEDDED_GRID, Font, FontError, Glyph, GlyphBackend, ImageBackend,
    MissingGlyph, embedded_font, embedded_image,
};

fn load(backend: &mut ImageBackend, factor: u32) -> Result<Font> {
    let (image, charset) = embedded_font(factor)?;
    Ok(Font::from_bitmap(backend, &image, charset)?)
}

fn load_with_direction(backend: &mut ImageBackend, direction: Direction) -> Result<Font> {
    let charset = EMBEDDED_GRID.charset(0, direction)?;
    Ok(Font::from_bitmap(backend, &embedded_image()?, charset)?)
}

fn alpha(backend: &ImageBackend, x: u32, y: u32) -> u8 {
    backend.canvas().get_pixel(x, y).0[3]
}

fn release(font: &mut Font, backend: &mut ImageBackend) -> Result<()> {
    font.release(backend)?;
    Ok(())
}

#[test]
fn embedded_font_has_128_cells_at_scale_one() -> Result<()> {
    let mut backend = ImageBackend::new(64, 64);
    let mut font = load(&mut backend, 1)?;

    assert_eq!(font.charset().len(), 128);
    assert_eq!(font.charset().len() as u32, font.charset().high() - font.charset().low() + 1);
    assert_eq!(font.scale(), 8);
    assert!(font.charset().glyphs().iter().all(|g| g.width == 4 && g.height == 8 && g.advance == 4));
    assert_eq!(font.textures().len(), 128);
    assert_eq!(font.programs().len(), 128);
    assert_eq!(backend.texture_count(), 128);
    assert_eq!(backend.program_count(), 128);

    release(&mut font, &mut backend)
}

#[test]
fn doubled_font_has_doubled_metrics() -> Result<()> {
    let mut backend = ImageBackend::new(64, 64);
    let mut font = load(&mut backend, 2)?;

    assert_eq!(font.scale(), 16);
    assert_eq!(font.charset().glyph('A' as u32), Some(&Glyph::new(8, 32, 8, 16, 8)));
    assert!(font.charset().glyphs().iter().all(|g| g.width == 8 && g.height == 16 && g.advance == 8));

    release(&mut font, &mut backend)
}

#[test]
fn handles_are_distinct() -> Result<()> {
    let mut backend = ImageBackend::new(8, 8);
    let mut font = load(&mut backend, 1)?;

    let mut textures = font.textures().to_vec();
    textures.sort();
    textures.dedup();
    assert_eq!(textures.len(), 128);
    let mut programs = font.programs().to_vec();
    programs.sort();
    programs.dedup();
    assert_eq!(programs.len(), 128);

    release(&mut font, &mut backend)
}

#[test]
fn zero_draws_where_the_image_has_ink() -> Result<()> {
    let mut backend = ImageBackend::new(64, 32);
    let mut font = load(&mut backend, 1)?;

    font.print(&mut backend, 10.0, 20.0, "0")?;
    assert_eq!(backend.canvas().get_pixel(11, 20).0, [255, 255, 255, 255]);
    assert_eq!(alpha(&backend, 10, 20), 0);

    release(&mut font, &mut backend)
}

#[test]
fn pen_advances_by_glyph_width() -> Result<()> {
    let mut backend = ImageBackend::new(64, 32);
    let mut font = load(&mut backend, 1)?;

    font.print(&mut backend, 10.0, 20.0, "00")?;
    assert_eq!(alpha(&backend, 11, 20), 255);
    assert_eq!(alpha(&backend, 14, 20), 0);
    assert_eq!(alpha(&backend, 15, 20), 255);

    release(&mut font, &mut backend)
}

#[test]
fn scaled_font_draws_scaled_pixels() -> Result<()> {
    let mut backend = ImageBackend::new(32, 32);
    let mut font = load(&mut backend, 2)?;

    font.print(&mut backend, 0.0, 0.0, "0")?;
    for (x, y) in [(2, 0), (3, 0), (2, 1), (3, 1)] {
        assert_eq!(alpha(&backend, x, y), 255, "pixel ({x}, {y})");
    }
    assert_eq!(alpha(&backend, 0, 0), 0);
    assert_eq!(alpha(&backend, 1, 1), 0);

    release(&mut font, &mut backend)
}

#[test]
fn space_leaves_the_canvas_untouched() -> Result<()> {
    let mut backend = ImageBackend::new(16, 16);
    let mut font = load(&mut backend, 1)?;

    font.print(&mut backend, 0.0, 0.0, "   ")?;
    assert!(backend.canvas().pixels().all(|p| p.0[3] == 0));

    release(&mut font, &mut backend)
}

#[test]
fn color_tints_the_glyph() -> Result<()> {
    let mut backend = ImageBackend::new(16, 16);
    let mut font = load(&mut backend, 1)?;
    font.set_color(ColorLinPremul::rgba(0, 255, 0, 255));

    font.print(&mut backend, 0.0, 0.0, "0")?;
    assert_eq!(backend.canvas().get_pixel(1, 0).0, [0, 255, 0, 255]);

    release(&mut font, &mut backend)
}

#[test]
fn printf_matches_print() -> Result<()> {
    let mut formatted = ImageBackend::new(64, 16);
    let mut plain = ImageBackend::new(64, 16);
    let mut a = load(&mut formatted, 1)?;
    let mut b = load(&mut plain, 1)?;

    let (mx, my) = (12, 7);
    a.printf(&mut formatted, 1.0, 2.0, format_args!("{mx} x {my}"))?;
    b.print(&mut plain, 1.0, 2.0, "12 x 7")?;
    assert_eq!(formatted.canvas(), plain.canvas());
    assert!(formatted.canvas().pixels().any(|p| p.0[3] == 255));

    release(&mut a, &mut formatted)?;
    release(&mut b, &mut plain)
}

#[test]
fn right_to_left_moves_before_drawing() -> Result<()> {
    let mut backend = ImageBackend::new(32, 16);
    let mut font = load_with_direction(&mut backend, Direction::RightToLeft)?;

    font.print(&mut backend, 20.0, 0.0, "00")?;
    assert_eq!(alpha(&backend, 17, 0), 255);
    assert_eq!(alpha(&backend, 13, 0), 255);
    assert_eq!(alpha(&backend, 21, 0), 0);

    release(&mut font, &mut backend)
}

#[test]
fn top_to_bottom_stacks_lines() -> Result<()> {
    let mut backend = ImageBackend::new(16, 32);
    let mut font = load_with_direction(&mut backend, Direction::TopToBottom)?;

    font.print(&mut backend, 0.0, 0.0, "00")?;
    assert_eq!(alpha(&backend, 1, 0), 255);
    assert_eq!(alpha(&backend, 1, 8), 255);
    assert_eq!(alpha(&backend, 5, 0), 0);

    release(&mut font, &mut backend)
}

#[test]
fn out_of_range_characters_follow_the_policy() -> Result<()> {
    let mut backend = ImageBackend::new(32, 16);
    let mut font = load(&mut backend, 1)?;

    // Default policy skips.
    font.print(&mut backend, 0.0, 0.0, "\u{e9}")?;
    assert!(backend.canvas().pixels().all(|p| p.0[3] == 0));

    font.set_missing_glyph(MissingGlyph::Reject)?;
    let err = font.print(&mut backend, 0.0, 0.0, "a\u{100}").unwrap_err();
    assert!(matches!(err, FontError::UnsupportedGlyph(0x100)));
    assert!(backend.canvas().pixels().all(|p| p.0[3] == 0));

    font.set_missing_glyph(MissingGlyph::Substitute('0'))?;
    font.print(&mut backend, 0.0, 0.0, "\u{e9}")?;
    assert_eq!(alpha(&backend, 1, 0), 255);

    let err = font.set_missing_glyph(MissingGlyph::Substitute('\u{200}')).unwrap_err();
    assert!(matches!(err, FontError::UnsupportedGlyph(0x200)));
    assert_eq!(font.missing_glyph(), MissingGlyph::Substitute('0'));

    release(&mut font, &mut backend)
}

#[test]
fn failed_load_frees_partial_resources() -> Result<()> {
    let mut backend = ImageBackend::new(8, 8);
    let glyphs = vec![Glyph::new(0, 0, 4, 8, 4), Glyph::new(0, 0, 4, 8, 4), Glyph::new(200, 0, 4, 8, 4)];
    let charset = Charset::new(48, 50, Direction::LeftToRight, glyphs)?;

    let err = Font::from_bitmap(&mut backend, &embedded_image()?, charset).unwrap_err();
    assert!(matches!(err, FontError::Rasterize { code: 50, .. }));
    assert_eq!(backend.texture_count(), 0);
    assert_eq!(backend.program_count(), 0);
    Ok(())
}

#[test]
fn oversized_cell_fails_cleanly() -> Result<()> {
    let mut backend = ImageBackend::new(8, 8).with_max_texture_dimension(4);
    let (image, charset) = embedded_font(1)?;

    assert!(Font::from_bitmap(&mut backend, &image, charset).is_err());
    assert_eq!(backend.texture_count(), 0);
    assert_eq!(backend.program_count(), 0);
    Ok(())
}

#[test]
fn released_font_refuses_to_render() -> Result<()> {
    let mut backend = ImageBackend::new(16, 16);
    let mut font = load(&mut backend, 1)?;

    font.release(&mut backend)?;
    assert!(font.is_released());
    assert!(font.textures().is_empty());
    assert_eq!(backend.texture_count(), 0);
    assert_eq!(backend.program_count(), 0);

    assert!(matches!(font.print(&mut backend, 0.0, 0.0, "0"), Err(FontError::Released)));
    assert!(matches!(font.printf(&mut backend, 0.0, 0.0, format_args!("{}", 1)), Err(FontError::Released)));
    assert!(matches!(font.release(&mut backend), Err(FontError::Released)));
    assert!(backend.canvas().pixels().all(|p| p.0[3] == 0));
    Ok(())
}

#[test]
fn releasing_one_font_keeps_the_other() -> Result<()> {
    let mut backend = ImageBackend::new(32, 32);
    let mut small = load(&mut backend, 1)?;
    let mut big = load(&mut backend, 2)?;
    assert_eq!(backend.texture_count(), 256);

    small.release(&mut backend)?;
    assert_eq!(backend.texture_count(), 128);
    big.print(&mut backend, 0.0, 0.0, "0")?;
    assert_eq!(alpha(&backend, 2, 0), 255);

    big.release(&mut backend)?;
    assert_eq!(backend.texture_count(), 0);
    Ok(())
}

#[test]
fn backend_is_usable_as_trait_object() -> Result<()> {
    let mut backend = ImageBackend::new(16, 16);
    let dynamic: &mut dyn GlyphBackend = &mut backend;
    let (image, charset) = embedded_font(1)?;
    let mut font = Font::from_bitmap(dynamic, &image, charset)?;
    font.print(dynamic, 0.0, 0.0, "0")?;
    font.release(dynamic)?;
    assert_eq!(alpha(&backend, 1, 0), 255);
    Ok(())
}
