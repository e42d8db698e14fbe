//! Pre-rasterized bitmap fonts laid out on a fixed grid.
//!
//! The crate embeds a 128x32 RGBA image holding characters 0..=127 as a
//! 32x4 grid of 4x8 cells.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};

use crate::backend::{GlyphImage, PixelFormat};
use crate::error::{FontError, Result};
use crate::glyph::{Charset, Direction, Glyph};

const EMBEDDED_FONT_PNG: &[u8] = include_bytes!("../assets/font4x8.png");

/// Grid the embedded image is cut into.
pub const EMBEDDED_GRID: GridLayout = GridLayout {
    columns: 32,
    rows: 4,
    cell_width: 4,
    cell_height: 8,
};

/// Uniform grid of glyph cells, filled row by row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl GridLayout {
    /// Number of cells, or `None` if the product overflows.
    pub fn cells(&self) -> Option<u32> {
        self.columns.checked_mul(self.rows)
    }

    /// Charset starting at `low` with one glyph per cell; each glyph
    /// advances by its cell width.
    pub fn charset(&self, low: u32, direction: Direction) -> Result<Charset> {
        let cells = self
            .cells()
            .ok_or_else(|| FontError::InvalidCharset(format!("{}x{} grid overflows", self.columns, self.rows)))?;
        if cells == 0 {
            return Err(FontError::InvalidCharset("grid has no cells".into()));
        }
        // Every cell offset is below these extents.
        if self.columns.checked_mul(self.cell_width).is_none() || self.rows.checked_mul(self.cell_height).is_none() {
            return Err(FontError::InvalidCharset("grid extent overflows the image coordinate range".into()));
        }
        let high = low
            .checked_add(cells - 1)
            .ok_or_else(|| FontError::InvalidCharset("grid overflows the code range".into()))?;
        let glyphs = (0..cells)
            .map(|i| {
                Glyph::new(
                    (i % self.columns) * self.cell_width,
                    (i / self.columns) * self.cell_height,
                    self.cell_width,
                    self.cell_height,
                    self.cell_width,
                )
            })
            .collect();
        Charset::new(low, high, direction, glyphs)
    }
}

/// Decode PNG bytes into RGBA.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

/// Load any image file `image` can decode and convert it to RGBA.
pub fn load_image_file(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| FontError::Io { path: path.to_path_buf(), source })?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

/// The embedded 128x32 font image.
pub fn embedded_image() -> Result<RgbaImage> {
    decode_png(EMBEDDED_FONT_PNG)
}

/// Nearest-neighbour integer upscale.
pub fn scale_image(image: &RgbaImage, factor: u32) -> Result<RgbaImage> {
    if factor == 0 {
        return Err(FontError::InvalidScale("image scale factor must be positive".into()));
    }
    if factor == 1 {
        return Ok(image.clone());
    }
    let (w, h) = image.dimensions();
    let (sw, sh) = match (w.checked_mul(factor), h.checked_mul(factor)) {
        (Some(sw), Some(sh)) => (sw, sh),
        _ => return Err(FontError::InvalidScale(format!("scaling {w}x{h} by {factor} overflows"))),
    };
    Ok(imageops::resize(image, sw, sh, FilterType::Nearest))
}

/// Embedded image and its glyph table, both scaled by `factor`.
pub fn embedded_font(factor: u32) -> Result<(RgbaImage, Charset)> {
    let image = scale_image(&embedded_image()?, factor)?;
    let mut charset = EMBEDDED_GRID.charset(0, Direction::LeftToRight)?;
    charset.scale(factor)?;
    Ok((image, charset))
}

/// Copy one glyph's rectangle out of `image`.
pub(crate) fn crop_glyph(image: &RgbaImage, glyph: &Glyph, code: u32) -> Result<GlyphImage> {
    let (w, h) = image.dimensions();
    let fits = glyph.x.checked_add(glyph.width).is_some_and(|r| r <= w)
        && glyph.y.checked_add(glyph.height).is_some_and(|b| b <= h);
    if !fits {
        return Err(FontError::Rasterize {
            code,
            reason: format!(
                "rectangle {}x{} at ({}, {}) exceeds the {w}x{h} source image",
                glyph.width, glyph.height, glyph.x, glyph.y
            ),
        });
    }
    let cell = imageops::crop_imm(image, glyph.x, glyph.y, glyph.width, glyph.height).to_image();
    Ok(GlyphImage {
        width: glyph.width,
        height: glyph.height,
        format: PixelFormat::Rgba8,
        data: cell.into_raw(),
    })
}
