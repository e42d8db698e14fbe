//! TrueType glyph rasterization via `fontdue`.

use crate::backend::{GlyphImage, PixelFormat};
use crate::error::{FontError, Result};

/// Parsed TrueType face.
pub struct TrueTypeFace {
    font: fontdue::Font,
}

/// One rasterized glyph, padded into a power-of-two coverage image.
#[derive(Clone, Debug)]
pub struct RasterGlyph {
    pub image: GlyphImage,
    /// Size of the glyph's ink box inside `image`.
    pub width: u32,
    pub height: u32,
    /// Horizontal offset from the pen to the ink box.
    pub left: f32,
    /// Vertical offset (y-down) from the baseline to the top of the ink box.
    pub top: f32,
    /// Pen advance from the font's horizontal metrics.
    pub advance: f32,
}

impl RasterGlyph {
    /// Fraction of the texture covered by the ink box.
    pub fn uv(&self) -> [f32; 2] {
        [
            self.width as f32 / self.image.width as f32,
            self.height as f32 / self.image.height as f32,
        ]
    }
}

/// Smallest power of two that holds `n` (at least 1).
pub fn next_pow2(n: u32) -> u32 {
    n.max(1).next_power_of_two()
}

impl TrueTypeFace {
    /// Parse TrueType/OpenType data, tuning outline preparation for `px`.
    pub fn parse(bytes: &[u8], px: f32) -> Result<Self> {
        let settings = fontdue::FontSettings {
            scale: px,
            ..fontdue::FontSettings::default()
        };
        let font = fontdue::Font::from_bytes(bytes, settings).map_err(|e| FontError::Parse(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn glyph_count(&self) -> u16 {
        self.font.glyph_count()
    }

    /// Whether the face maps `code` to a real glyph rather than `.notdef`.
    pub fn has_glyph(&self, code: u32) -> bool {
        char::from_u32(code).is_some_and(|ch| self.font.lookup_glyph_index(ch) != 0)
    }

    /// Baseline-relative line metrics at `px`, as `(ascent, descent)`.
    pub fn line_metrics(&self, px: f32) -> Option<(f32, f32)> {
        self.font
            .horizontal_line_metrics(px)
            .map(|lm| (lm.ascent, lm.descent.abs()))
    }

    /// Rasterize `code` at `px`. Missing glyphs fall back to the font's
    /// `.notdef` glyph.
    pub fn rasterize(&self, code: u32, px: f32, max_dimension: u32) -> Result<RasterGlyph> {
        let ch = char::from_u32(code).ok_or_else(|| FontError::Rasterize {
            code,
            reason: "not a Unicode scalar value".into(),
        })?;
        let index = self.font.lookup_glyph_index(ch);
        if index == 0 {
            log::debug!("font has no glyph for U+{code:04X}; using .notdef");
        }
        let (metrics, coverage) = self.font.rasterize_indexed(index, px);

        let width = metrics.width as u32;
        let height = metrics.height as u32;
        let tex_w = next_pow2(width);
        let tex_h = next_pow2(height);
        if tex_w > max_dimension || tex_h > max_dimension {
            return Err(FontError::Rasterize {
                code,
                reason: format!("{tex_w}x{tex_h} texture exceeds the {max_dimension} pixel limit"),
            });
        }

        let mut image = GlyphImage::new(tex_w, tex_h, PixelFormat::Gray8);
        let (w, pitch) = (metrics.width, tex_w as usize);
        for (row, src) in coverage.chunks_exact(w.max(1)).take(metrics.height).enumerate() {
            image.data[row * pitch..row * pitch + w].copy_from_slice(&src[..w]);
        }

        Ok(RasterGlyph {
            image,
            width,
            height,
            left: metrics.xmin as f32,
            top: -(metrics.ymin as f32 + metrics.height as f32),
            advance: metrics.advance_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2_rounds_up() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(3), 4);
        assert_eq!(next_pow2(4), 4);
        assert_eq!(next_pow2(17), 32);
    }

    #[test]
    fn garbage_does_not_parse() {
        let res = TrueTypeFace::parse(b"definitely not a font", 32.0);
        assert!(matches!(res, Err(FontError::Parse(_))));
    }

    #[test]
    fn empty_input_does_not_parse() {
        assert!(TrueTypeFace::parse(&[], 16.0).is_err());
    }
}
