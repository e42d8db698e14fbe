//! hud-core: bitmap and TrueType fonts for heads-up text overlays.
//!
//! Fonts are loaded once into a [`GlyphBackend`], which keeps one texture and
//! one draw procedure per glyph. Printing a string runs the procedures of its
//! characters in order; each procedure draws its glyph and moves the pen.
//!
//! Two backends ship with the crate:
//! - [`WgpuBackend`] queues textured quads and draws them in one overlay pass.
//! - [`ImageBackend`] blits into an RGBA image on the CPU, for headless use.

/// Re-export wgpu for downstream crates while avoiding direct dependency leakage.
pub use wgpu;

mod backend;
mod bitmap;
mod color;
mod display_list;
mod error;
mod font;
mod glyph;
mod gpu;
mod raster;
mod software;

pub use backend::{GlyphBackend, GlyphImage, PixelFormat, ProgramId, TextureId};
pub use bitmap::{
    EMBEDDED_GRID, GridLayout, decode_png, embedded_font, embedded_image, load_image_file, scale_image,
};
pub use color::ColorLinPremul;
pub use display_list::{Command, GlyphProgram, GlyphQuad, QuadBuilder, Rect, build_quads};
pub use error::{FontError, Result};
pub use font::{Font, FontState, MissingGlyph, TrueTypeConfig};
pub use glyph::{Charset, Direction, Glyph};
pub use gpu::{GlyphRenderer, GlyphVertex, OwnedTexture, TexKey, TextureAllocator, WgpuBackend};
pub use raster::{RasterGlyph, TrueTypeFace, next_pow2};
pub use software::ImageBackend;

/// Choose an sRGB surface format when available; otherwise, pick the first format.
pub fn choose_srgb_surface_format(adapter: &wgpu::Adapter, surface: &wgpu::Surface) -> wgpu::TextureFormat {
    let caps = surface.get_capabilities(adapter);
    caps.formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .unwrap_or(caps.formats[0])
}

/// Create a surface configuration for the given size, favoring FIFO present mode when present.
pub fn make_surface_config(
    adapter: &wgpu::Adapter,
    surface: &wgpu::Surface,
    width: u32,
    height: u32,
) -> wgpu::SurfaceConfiguration {
    let caps = surface.get_capabilities(adapter);
    let format = choose_srgb_surface_format(adapter, surface);
    let present_mode = caps
        .present_modes
        .iter()
        .copied()
        .find(|m| *m == wgpu::PresentMode::Fifo)
        .unwrap_or(caps.present_modes[0]);
    let alpha_mode = caps
        .alpha_modes
        .iter()
        .copied()
        .find(|m| *m == wgpu::CompositeAlphaMode::Opaque)
        .unwrap_or(caps.alpha_modes[0]);
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 1,
    }
}
