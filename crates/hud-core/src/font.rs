//! Fonts prepared for rendering through a [`GlyphBackend`].
//!
//! A [`Font`] is created by one of the loaders and owns one texture and one
//! draw procedure per glyph of its [`Charset`]. Loading either succeeds
//! completely or returns an error with every partially created resource
//! already freed. After [`Font::release`] the font refuses to render.
//!
//! Like the backend it renders through, a font is bound to the thread that
//! owns the graphics context and must only be used with the backend that
//! created it.

use std::fmt;
use std::path::Path;

use image::RgbaImage;

use crate::backend::{GlyphBackend, GlyphImage, ProgramId, TextureId};
use crate::bitmap::crop_glyph;
use crate::color::ColorLinPremul;
use crate::display_list::{Command, GlyphProgram};
use crate::error::{FontError, Result};
use crate::glyph::{Charset, Direction, Glyph};
use crate::raster::TrueTypeFace;

/// What printing does with characters outside the loaded range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingGlyph {
    /// Drop the character.
    #[default]
    Skip,
    /// Draw this in-range character instead.
    Substitute(char),
    /// Fail the whole print with [`FontError::UnsupportedGlyph`].
    Reject,
}

/// Parameters for rasterizing a TrueType font.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrueTypeConfig {
    pub low: u32,
    pub high: u32,
    /// Pixel height the glyphs are rasterized at.
    pub scale: u32,
    pub direction: Direction,
}

impl Default for TrueTypeConfig {
    fn default() -> Self {
        Self {
            low: 0,
            high: 127,
            scale: 32,
            direction: Direction::LeftToRight,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontState {
    Ready,
    Released,
}

/// A font whose glyphs live as textures and draw procedures in a backend.
pub struct Font {
    textures: Vec<TextureId>,
    programs: Vec<ProgramId>,
    charset: Charset,
    scale: u32,
    color: ColorLinPremul,
    missing: MissingGlyph,
    state: FontState,
}

/// Resources created during a load; freed again unless the load commits.
struct Allocation<'a, B: GlyphBackend + ?Sized> {
    backend: &'a mut B,
    textures: Vec<TextureId>,
    programs: Vec<ProgramId>,
    committed: bool,
}

impl<'a, B: GlyphBackend + ?Sized> Allocation<'a, B> {
    fn new(backend: &'a mut B, capacity: usize) -> Self {
        Self {
            backend,
            textures: Vec::with_capacity(capacity),
            programs: Vec::with_capacity(capacity),
            committed: false,
        }
    }

    fn texture(&mut self, image: &GlyphImage) -> Result<TextureId> {
        let id = self.backend.create_texture(image)?;
        self.textures.push(id);
        Ok(id)
    }

    fn program(&mut self, program: GlyphProgram) -> Result<ProgramId> {
        let id = self.backend.compile_program(program)?;
        self.programs.push(id);
        Ok(id)
    }

    fn commit(mut self) -> (Vec<TextureId>, Vec<ProgramId>) {
        self.committed = true;
        (std::mem::take(&mut self.textures), std::mem::take(&mut self.programs))
    }
}

impl<B: GlyphBackend + ?Sized> Drop for Allocation<'_, B> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        log::debug!(
            "font load aborted; freeing {} textures and {} programs",
            self.textures.len(),
            self.programs.len()
        );
        for id in self.programs.drain(..) {
            self.backend.delete_program(id);
        }
        for id in self.textures.drain(..) {
            self.backend.delete_texture(id);
        }
    }
}

/// Build the draw procedure for one glyph: bind, draw offset by the bearing,
/// then move the pen along `direction`.
fn glyph_program(
    texture: TextureId,
    size: [f32; 2],
    uv: [f32; 2],
    bearing: [f32; 2],
    advance: f32,
    line_height: f32,
    direction: Direction,
) -> GlyphProgram {
    let mut program = GlyphProgram::new();
    if direction == Direction::RightToLeft {
        program.push(Command::Translate([-advance, 0.0]));
    }
    program.push(Command::BindTexture(texture));
    if bearing == [0.0, 0.0] {
        program.push(Command::DrawQuad { size, uv });
    } else {
        program
            .push(Command::PushTransform)
            .push(Command::Translate(bearing))
            .push(Command::DrawQuad { size, uv })
            .push(Command::PopTransform);
    }
    match direction {
        Direction::LeftToRight => {
            program.push(Command::Translate([advance, 0.0]));
        }
        Direction::TopToBottom => {
            program.push(Command::Translate([0.0, line_height]));
        }
        Direction::RightToLeft => {}
    }
    program
}

impl Font {
    /// Cut every glyph of `charset` out of `image` into its own texture.
    pub fn from_bitmap<B: GlyphBackend + ?Sized>(
        backend: &mut B,
        image: &RgbaImage,
        charset: Charset,
    ) -> Result<Self> {
        let line_height = charset.max_height();
        let mut alloc = Allocation::new(backend, charset.len());
        for (code, glyph) in charset.codes().zip(charset.glyphs()) {
            let cell = crop_glyph(image, glyph, code)?;
            let texture = alloc.texture(&cell)?;
            alloc.program(glyph_program(
                texture,
                [glyph.width as f32, glyph.height as f32],
                [1.0, 1.0],
                [0.0, 0.0],
                glyph.advance as f32,
                line_height as f32,
                charset.direction(),
            ))?;
        }
        let (textures, programs) = alloc.commit();
        log::debug!(
            "loaded bitmap font U+{:04X}..=U+{:04X} ({} glyphs, line height {line_height})",
            charset.low(),
            charset.high(),
            charset.len()
        );
        Ok(Self::ready(textures, programs, charset, line_height))
    }

    /// Read a TrueType file and rasterize it; see [`Font::from_truetype`].
    pub fn from_truetype_file<B: GlyphBackend + ?Sized>(
        backend: &mut B,
        path: impl AsRef<Path>,
        config: &TrueTypeConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Io { path: path.to_path_buf(), source })?;
        Self::from_truetype(backend, &data, config)
    }

    /// Rasterize every rune in `[config.low, config.high]` at `config.scale`
    /// pixels into its own power-of-two texture.
    ///
    /// The supplied font should cover the requested range; runes it lacks
    /// render as the font's `.notdef` glyph.
    pub fn from_truetype<B: GlyphBackend + ?Sized>(
        backend: &mut B,
        data: &[u8],
        config: &TrueTypeConfig,
    ) -> Result<Self> {
        if config.scale == 0 {
            return Err(FontError::InvalidScale("font pixel height must be positive".into()));
        }
        let mut charset = Charset::blank(config.low, config.high, config.direction)?;
        let px = config.scale as f32;
        let face = TrueTypeFace::parse(data, px)?;
        let max_dimension = backend.max_texture_dimension();

        let mut alloc = Allocation::new(backend, charset.len());
        for (index, code) in (config.low..=config.high).enumerate() {
            let glyph = face.rasterize(code, px, max_dimension)?;
            let texture = alloc.texture(&glyph.image)?;
            // Baseline sits `scale` pixels below the top of the text box.
            let bearing = [glyph.left, px + glyph.top];
            alloc.program(glyph_program(
                texture,
                [glyph.width as f32, glyph.height as f32],
                glyph.uv(),
                bearing,
                glyph.advance,
                px,
                config.direction,
            ))?;
            let advance = glyph.advance.round().max(0.0) as u32;
            charset.set_glyph(index, Glyph::new(0, 0, glyph.width, glyph.height, advance));
        }
        let (textures, programs) = alloc.commit();
        log::debug!(
            "loaded TrueType font U+{:04X}..=U+{:04X} at {}px ({} glyphs)",
            config.low,
            config.high,
            config.scale,
            charset.len()
        );
        Ok(Self::ready(textures, programs, charset, config.scale))
    }

    fn ready(textures: Vec<TextureId>, programs: Vec<ProgramId>, charset: Charset, scale: u32) -> Self {
        Self {
            textures,
            programs,
            charset,
            scale,
            color: ColorLinPremul::WHITE,
            missing: MissingGlyph::default(),
            state: FontState::Ready,
        }
    }

    /// Font height in pixels.
    pub fn scale(&self) -> u32 { self.scale }

    /// Character set the font was built from.
    pub fn charset(&self) -> &Charset { &self.charset }

    pub fn state(&self) -> FontState { self.state }
    pub fn is_released(&self) -> bool { self.state == FontState::Released }

    /// Texture handles, one per glyph in charset order. Empty once released.
    pub fn textures(&self) -> &[TextureId] { &self.textures }

    /// Draw procedure handles, one per glyph in charset order. Empty once released.
    pub fn programs(&self) -> &[ProgramId] { &self.programs }

    pub fn color(&self) -> ColorLinPremul { self.color }
    pub fn set_color(&mut self, color: ColorLinPremul) { self.color = color; }

    pub fn missing_glyph(&self) -> MissingGlyph { self.missing }

    /// Choose how out-of-range characters are printed. A substitute must
    /// itself be covered by the charset.
    pub fn set_missing_glyph(&mut self, policy: MissingGlyph) -> Result<()> {
        if let MissingGlyph::Substitute(c) = policy {
            if !self.charset.contains(c as u32) {
                return Err(FontError::UnsupportedGlyph(c as u32));
            }
        }
        self.missing = policy;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            FontState::Ready => Ok(()),
            FontState::Released => Err(FontError::Released),
        }
    }

    /// Map `text` onto draw procedures, applying the missing-glyph policy.
    fn resolve(&self, text: &str) -> Result<Vec<ProgramId>> {
        let mut ids = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let code = ch as u32;
            let index = match self.charset.index_of(code) {
                Some(index) => index,
                None => match self.missing {
                    MissingGlyph::Skip => {
                        log::debug!("skipping U+{code:04X}: outside the loaded range");
                        continue;
                    }
                    MissingGlyph::Substitute(sub) => match self.charset.index_of(sub as u32) {
                        Some(index) => index,
                        None => continue,
                    },
                    MissingGlyph::Reject => return Err(FontError::UnsupportedGlyph(code)),
                },
            };
            ids.push(self.programs[index]);
        }
        Ok(ids)
    }

    /// Draw `text` with the top-left of the text box at `(x, y)` in window
    /// pixels (origin top-left, y down).
    pub fn print<B: GlyphBackend + ?Sized>(&self, backend: &mut B, x: f32, y: f32, text: &str) -> Result<()> {
        self.ensure_ready()?;
        let ids = self.resolve(text)?;
        if ids.is_empty() {
            return Ok(());
        }
        backend.call_programs([x, y], self.color, &ids)
    }

    /// Formatted variant of [`Font::print`]:
    /// `font.printf(&mut backend, x, y, format_args!("{mx} x {my}"))`.
    pub fn printf<B: GlyphBackend + ?Sized>(
        &self,
        backend: &mut B,
        x: f32,
        y: f32,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        match args.as_str() {
            Some(text) => self.print(backend, x, y, text),
            None => self.print(backend, x, y, &args.to_string()),
        }
    }

    /// Free every texture and draw procedure. The font can no longer render.
    pub fn release<B: GlyphBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        self.ensure_ready()?;
        for id in self.programs.drain(..) {
            backend.delete_program(id);
        }
        for id in self.textures.drain(..) {
            backend.delete_texture(id);
        }
        self.state = FontState::Released;
        Ok(())
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        if self.state == FontState::Ready && !self.textures.is_empty() {
            log::warn!(
                "font dropped without release; {} textures and {} programs leaked in the backend",
                self.textures.len(),
                self.programs.len()
            );
        }
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("low", &self.charset.low())
            .field("high", &self.charset.high())
            .field("scale", &self.scale)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ltr_program_draws_then_advances() {
        let p = glyph_program(TextureId(3), [4.0, 8.0], [1.0, 1.0], [0.0, 0.0], 4.0, 8.0, Direction::LeftToRight);
        assert_eq!(
            p.commands,
            vec![
                Command::BindTexture(TextureId(3)),
                Command::DrawQuad { size: [4.0, 8.0], uv: [1.0, 1.0] },
                Command::Translate([4.0, 0.0]),
            ]
        );
    }

    #[test]
    fn rtl_program_moves_before_drawing() {
        let p = glyph_program(TextureId(0), [4.0, 8.0], [1.0, 1.0], [0.0, 0.0], 5.0, 8.0, Direction::RightToLeft);
        assert_eq!(p.commands[0], Command::Translate([-5.0, 0.0]));
        assert!(matches!(p.commands.last(), Some(Command::DrawQuad { .. })));
    }

    #[test]
    fn ttb_program_advances_by_line_height() {
        let p = glyph_program(TextureId(0), [4.0, 8.0], [1.0, 1.0], [0.0, 0.0], 4.0, 10.0, Direction::TopToBottom);
        assert_eq!(p.commands.last(), Some(&Command::Translate([0.0, 10.0])));
    }

    #[test]
    fn bearing_is_scoped_to_the_quad() {
        let p = glyph_program(TextureId(1), [6.0, 9.0], [0.75, 0.5625], [1.0, 20.0], 7.0, 32.0, Direction::LeftToRight);
        assert_eq!(
            p.commands,
            vec![
                Command::BindTexture(TextureId(1)),
                Command::PushTransform,
                Command::Translate([1.0, 20.0]),
                Command::DrawQuad { size: [6.0, 9.0], uv: [0.75, 0.5625] },
                Command::PopTransform,
                Command::Translate([7.0, 0.0]),
            ]
        );
    }
}
