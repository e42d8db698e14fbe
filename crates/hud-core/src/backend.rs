//! Graphics backend seam.
//!
//! A backend owns the textures and compiled draw procedures for every font
//! loaded through it. All calls must happen on the thread that owns the
//! backend's graphics context; backends take `&mut self` and do no locking of
//! their own. A [`crate::Font`] must only be used with the backend that
//! created it.

use crate::color::ColorLinPremul;
use crate::display_list::GlyphProgram;
use crate::error::{FontError, Result};

/// Handle to a texture owned by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Handle to a compiled draw procedure owned by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Storage format for a glyph image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One coverage byte per pixel.
    Gray8,
    /// Straight-alpha RGBA, 4 bytes per pixel.
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// CPU-side glyph pixels, row-major, ready to become a texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl GlyphImage {
    /// Blank (fully transparent) image.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self { width, height, format, data: vec![0; len] }
    }

    /// Expand to straight-alpha RGBA. Gray coverage becomes white with that alpha.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba8 => self.data.clone(),
            PixelFormat::Gray8 => {
                let mut out = Vec::with_capacity(self.data.len() * 4);
                for &g in &self.data {
                    out.extend_from_slice(&[255, 255, 255, g]);
                }
                out
            }
        }
    }

    pub(crate) fn check_len(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize * self.format.bytes_per_pixel();
        if self.data.len() != expected {
            return Err(FontError::Backend(format!(
                "glyph image {}x{} {:?} has {} bytes, expected {expected}",
                self.width,
                self.height,
                self.format,
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Resource and draw interface a [`crate::Font`] renders through.
pub trait GlyphBackend {
    /// Upload `image` into a new texture.
    fn create_texture(&mut self, image: &GlyphImage) -> Result<TextureId>;

    /// Free a texture. Unknown ids are ignored.
    fn delete_texture(&mut self, id: TextureId);

    /// Store a draw procedure for later execution.
    fn compile_program(&mut self, program: GlyphProgram) -> Result<ProgramId>;

    /// Free a draw procedure. Unknown ids are ignored.
    fn delete_program(&mut self, id: ProgramId);

    /// Largest texture edge the backend accepts.
    fn max_texture_dimension(&self) -> u32;

    /// Execute `programs` in order with the pen starting at `origin`
    /// (window pixels, y-down). Translations carry over between programs.
    fn call_programs(
        &mut self,
        origin: [f32; 2],
        color: ColorLinPremul,
        programs: &[ProgramId],
    ) -> Result<()>;
}
