use std::sync::Arc;

use anyhow::Result;
use hud_core::{Font, GlyphBackend, WgpuBackend, embedded_font, wgpu};

/// Headless backend on whatever adapter the machine offers, or `None`
/// when there is none (CI without a GPU or software rasterizer).
fn headless_backend() -> Option<WgpuBackend> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        force_fallback_adapter: false,
        compatible_surface: None,
    }))?;
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()?;
    Some(WgpuBackend::new(
        Arc::new(device),
        Arc::new(queue),
        wgpu::TextureFormat::Rgba8Unorm,
        wgpu::FilterMode::Nearest,
        256,
        64,
    ))
}

macro_rules! require_backend {
    () => {
        match headless_backend() {
            Some(backend) => backend,
            None => {
                eprintln!("no wgpu adapter found; skipping");
                return Ok(());
            }
        }
    };
}

#[test]
fn release_frees_glyph_textures_by_default() -> Result<()> {
    let mut backend = require_backend!();
    assert_eq!(backend.allocator().pool_budget(), 0);

    let (image, charset) = embedded_font(1)?;
    let mut font = Font::from_bitmap(&mut backend, &image, charset)?;
    assert_eq!(backend.live_textures(), 128);

    font.print(&mut backend, 0.0, 0.0, "HUD")?;
    assert_eq!(backend.pending_quads(), 3);

    font.release(&mut backend)?;
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.allocator().pooled(), 0);
    assert_eq!(backend.allocator().pooled_bytes(), 0);
    Ok(())
}

#[test]
fn pool_budget_bounds_reuse() -> Result<()> {
    let mut backend = require_backend!();
    // Room for ten 4x8 RGBA glyph textures.
    backend.set_pool_budget(10 * 4 * 8 * 4);

    let (image, charset) = embedded_font(1)?;
    let mut font = Font::from_bitmap(&mut backend, &image, charset)?;
    font.release(&mut backend)?;
    assert_eq!(backend.allocator().pooled(), 10);
    assert_eq!(backend.allocator().pooled_bytes(), 10 * 4 * 8 * 4);

    let (image, charset) = embedded_font(1)?;
    let mut again = Font::from_bitmap(&mut backend, &image, charset)?;
    assert_eq!(backend.allocator().pooled(), 0);
    again.release(&mut backend)?;

    backend.set_pool_budget(0);
    assert_eq!(backend.allocator().pooled(), 0);
    assert_eq!(backend.allocator().pooled_bytes(), 0);
    assert!(backend.max_texture_dimension() >= 4);
    Ok(())
}
