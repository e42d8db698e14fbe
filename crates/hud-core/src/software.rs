//! Headless backend that renders into an in-memory RGBA image.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use crate::backend::{GlyphBackend, GlyphImage, ProgramId, TextureId};
use crate::color::ColorLinPremul;
use crate::display_list::{GlyphProgram, GlyphQuad, build_quads};
use crate::error::{FontError, Result};

const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 8192;

/// CPU backend: textures are RGBA images, draws blit onto `canvas` with
/// nearest sampling and source-over blending.
pub struct ImageBackend {
    canvas: RgbaImage,
    textures: HashMap<TextureId, RgbaImage>,
    programs: HashMap<ProgramId, GlyphProgram>,
    next_texture: u32,
    next_program: u32,
    max_texture_dimension: u32,
}

impl ImageBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            textures: HashMap::new(),
            programs: HashMap::new(),
            next_texture: 0,
            next_program: 0,
            max_texture_dimension: DEFAULT_MAX_TEXTURE_DIMENSION,
        }
    }

    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    pub fn canvas(&self) -> &RgbaImage { &self.canvas }

    /// Fill the canvas with an sRGB colour.
    pub fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.canvas.pixels_mut() {
            *px = Rgba(rgba);
        }
    }

    /// Live textures.
    pub fn texture_count(&self) -> usize { self.textures.len() }

    /// Live draw procedures.
    pub fn program_count(&self) -> usize { self.programs.len() }

    pub fn texture(&self, id: TextureId) -> Option<&RgbaImage> { self.textures.get(&id) }
    pub fn program(&self, id: ProgramId) -> Option<&GlyphProgram> { self.programs.get(&id) }

    fn blit(&mut self, quad: &GlyphQuad, tint: [u8; 4]) -> Result<()> {
        let tex = self
            .textures
            .get(&quad.texture)
            .ok_or_else(|| FontError::Backend(format!("unknown texture {:?}", quad.texture)))?;
        let (cw, ch) = self.canvas.dimensions();
        let (tw, th) = tex.dimensions();
        if tw == 0 || th == 0 {
            return Ok(());
        }
        let r = quad.rect;

        let x0 = r.x.floor().max(0.0) as u32;
        let y0 = r.y.floor().max(0.0) as u32;
        let x1 = ((r.x + r.w).ceil().max(0.0) as u32).min(cw);
        let y1 = ((r.y + r.h).ceil().max(0.0) as u32).min(ch);

        for dy in y0..y1 {
            let v = (dy as f32 + 0.5 - r.y) / r.h;
            if !(0.0..1.0).contains(&v) {
                continue;
            }
            let ty = ((v * quad.uv[1] * th as f32) as u32).min(th - 1);
            for dx in x0..x1 {
                let u = (dx as f32 + 0.5 - r.x) / r.w;
                if !(0.0..1.0).contains(&u) {
                    continue;
                }
                let tx = ((u * quad.uv[0] * tw as f32) as u32).min(tw - 1);
                let src = tex.get_pixel(tx, ty).0;
                let dst = self.canvas.get_pixel_mut(dx, dy);
                *dst = Rgba(blend_over(tinted(src, tint), dst.0));
            }
        }
        Ok(())
    }
}

fn tinted(src: [u8; 4], tint: [u8; 4]) -> [u8; 4] {
    let mul = |a: u8, b: u8| ((a as u32 * b as u32 + 127) / 255) as u8;
    [mul(src[0], tint[0]), mul(src[1], tint[1]), mul(src[2], tint[2]), mul(src[3], tint[3])]
}

/// Straight-alpha source-over.
fn blend_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    out
}

impl GlyphBackend for ImageBackend {
    fn create_texture(&mut self, image: &GlyphImage) -> Result<TextureId> {
        image.check_len()?;
        if image.width > self.max_texture_dimension || image.height > self.max_texture_dimension {
            return Err(FontError::Backend(format!(
                "{}x{} texture exceeds the {} pixel limit",
                image.width, image.height, self.max_texture_dimension
            )));
        }
        let rgba = RgbaImage::from_raw(image.width, image.height, image.to_rgba8())
            .ok_or_else(|| FontError::Backend("glyph image buffer size mismatch".into()))?;
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, rgba);
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
    }

    fn compile_program(&mut self, program: GlyphProgram) -> Result<ProgramId> {
        if let Some(missing) = program.textures().find(|t| !self.textures.contains_key(t)) {
            return Err(FontError::Backend(format!("program binds unknown texture {missing:?}")));
        }
        let id = ProgramId(self.next_program);
        self.next_program += 1;
        self.programs.insert(id, program);
        Ok(id)
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.programs.remove(&id);
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn call_programs(&mut self, origin: [f32; 2], color: ColorLinPremul, programs: &[ProgramId]) -> Result<()> {
        let quads = build_quads(origin, programs, |id| self.programs.get(&id))?;
        let tint = color.to_srgba_u8();
        for quad in &quads {
            self.blit(quad, tint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PixelFormat;
    use crate::display_list::Command;

    fn solid(w: u32, h: u32) -> GlyphImage {
        GlyphImage { width: w, height: h, format: PixelFormat::Gray8, data: vec![255; (w * h) as usize] }
    }

    #[test]
    fn ids_are_unique_and_deletable() {
        let mut b = ImageBackend::new(8, 8);
        let a = b.create_texture(&solid(1, 1)).unwrap();
        let c = b.create_texture(&solid(1, 1)).unwrap();
        assert_ne!(a, c);
        b.delete_texture(a);
        assert_eq!(b.texture_count(), 1);
    }

    #[test]
    fn program_with_unknown_texture_is_rejected() {
        let mut b = ImageBackend::new(8, 8);
        let mut p = GlyphProgram::new();
        p.push(Command::BindTexture(TextureId(42)));
        assert!(b.compile_program(p).is_err());
    }

    #[test]
    fn oversized_texture_is_rejected() {
        let mut b = ImageBackend::new(8, 8).with_max_texture_dimension(4);
        assert!(b.create_texture(&solid(8, 1)).is_err());
    }

    #[test]
    fn quad_lands_at_origin() {
        let mut b = ImageBackend::new(16, 16);
        let tex = b.create_texture(&solid(2, 2)).unwrap();
        let mut p = GlyphProgram::new();
        p.push(Command::BindTexture(tex))
            .push(Command::DrawQuad { size: [2.0, 2.0], uv: [1.0, 1.0] });
        let prog = b.compile_program(p).unwrap();
        b.call_programs([3.0, 5.0], ColorLinPremul::WHITE, &[prog]).unwrap();

        assert_eq!(b.canvas().get_pixel(3, 5).0, [255, 255, 255, 255]);
        assert_eq!(b.canvas().get_pixel(4, 6).0, [255, 255, 255, 255]);
        assert_eq!(b.canvas().get_pixel(5, 5).0[3], 0);
        assert_eq!(b.canvas().get_pixel(2, 5).0[3], 0);
    }

    #[test]
    fn tint_colours_the_texel() {
        let mut b = ImageBackend::new(4, 4);
        let tex = b.create_texture(&solid(1, 1)).unwrap();
        let mut p = GlyphProgram::new();
        p.push(Command::BindTexture(tex))
            .push(Command::DrawQuad { size: [1.0, 1.0], uv: [1.0, 1.0] });
        let prog = b.compile_program(p).unwrap();
        b.call_programs([0.0, 0.0], ColorLinPremul::rgba(255, 0, 0, 255), &[prog]).unwrap();
        assert_eq!(b.canvas().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
