//! wgpu backend.
//!
//! Glyph textures come from a [`TextureAllocator`], which destroys them on
//! release unless a pool budget is set. Printing only
//! queues quads; [`WgpuBackend::flush`] records them into a render pass that
//! loads (does not clear) the target.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::{GlyphBackend, GlyphImage, ProgramId, TextureId};
use crate::color::ColorLinPremul;
use crate::display_list::{GlyphProgram, GlyphQuad, build_quads};
use crate::error::{FontError, Result};

mod allocator;
mod pipeline;

pub use allocator::{OwnedTexture, TexKey, TextureAllocator};
pub use pipeline::{GlyphRenderer, GlyphVertex};

struct GpuTexture {
    owned: OwnedTexture,
    bind_group: wgpu::BindGroup,
}

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    allocator: TextureAllocator,
    renderer: GlyphRenderer,
    vp_buffer: wgpu::Buffer,
    vp_bind_group: wgpu::BindGroup,
    textures: HashMap<TextureId, GpuTexture>,
    programs: HashMap<ProgramId, GlyphProgram>,
    pending: Vec<(GlyphQuad, [f32; 4])>,
    next_texture: u32,
    next_program: u32,
    viewport: [u32; 2],
}

impl WgpuBackend {
    /// Create a backend drawing into targets of `target_format`, sized
    /// `width` x `height` pixels.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        target_format: wgpu::TextureFormat,
        filter: wgpu::FilterMode,
        width: u32,
        height: u32,
    ) -> Self {
        let renderer = GlyphRenderer::new(device.clone(), target_format, filter);
        let vp_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glyph-viewport-uniform"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let vp_bind_group = renderer.vp_bind_group(&device, &vp_buffer);
        let allocator = TextureAllocator::new(device.clone());
        let mut backend = Self {
            device,
            queue,
            allocator,
            renderer,
            vp_buffer,
            vp_bind_group,
            textures: HashMap::new(),
            programs: HashMap::new(),
            pending: Vec::new(),
            next_texture: 0,
            next_program: 0,
            viewport: [0, 0],
        };
        backend.set_viewport(width, height);
        backend
    }

    /// Update the pixel-to-NDC mapping after the render target is resized.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = [width.max(1), height.max(1)];
        let scale = [
            2.0f32 / (self.viewport[0] as f32),
            -2.0f32 / (self.viewport[1] as f32),
        ];
        let translate = [-1.0f32, 1.0f32];
        let vp_data = [scale[0], scale[1], translate[0], translate[1]];
        self.queue.write_buffer(&self.vp_buffer, 0, bytemuck::bytes_of(&vp_data));
    }

    pub fn viewport(&self) -> [u32; 2] { self.viewport }
    pub fn allocator(&self) -> &TextureAllocator { &self.allocator }
    pub fn allocator_mut(&mut self) -> &mut TextureAllocator { &mut self.allocator }
    /// Keep up to `bytes` of released glyph textures for later loads.
    pub fn set_pool_budget(&mut self, bytes: u64) { self.allocator.set_pool_budget(bytes); }
    pub fn live_textures(&self) -> usize { self.textures.len() }
    pub fn pending_quads(&self) -> usize { self.pending.len() }

    /// Draw every quad queued since the last flush onto `target_view`.
    pub fn flush(&mut self, encoder: &mut wgpu::CommandEncoder, target_view: &wgpu::TextureView) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);

        let mut verts: Vec<GlyphVertex> = Vec::with_capacity(pending.len() * 4);
        let mut idx: Vec<u32> = Vec::with_capacity(pending.len() * 6);
        for (quad, color) in &pending {
            let base = verts.len() as u32;
            let r = quad.rect;
            let [u, v] = quad.uv;
            verts.extend_from_slice(&[
                GlyphVertex { pos: [r.x, r.y], uv: [0.0, 0.0], color: *color },
                GlyphVertex { pos: [r.x + r.w, r.y], uv: [u, 0.0], color: *color },
                GlyphVertex { pos: [r.x + r.w, r.y + r.h], uv: [u, v], color: *color },
                GlyphVertex { pos: [r.x, r.y + r.h], uv: [0.0, v], color: *color },
            ]);
            idx.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let vbytes = (verts.len() * std::mem::size_of::<GlyphVertex>()) as u64;
        let ibytes = (idx.len() * std::mem::size_of::<u32>()) as u64;
        let vbuf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glyph-vbuf"),
            size: vbytes.max(4),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let ibuf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glyph-ibuf"),
            size: ibytes.max(4),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue.write_buffer(&vbuf, 0, bytemuck::cast_slice(&verts));
        self.queue.write_buffer(&ibuf, 0, bytemuck::cast_slice(&idx));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glyph-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.renderer.begin(&mut pass, &self.vp_bind_group, &vbuf, &ibuf);
        for (i, (quad, _)) in pending.iter().enumerate() {
            let Some(tex) = self.textures.get(&quad.texture) else {
                log::warn!("texture {:?} deleted before flush; glyph dropped", quad.texture);
                continue;
            };
            let first = (i * 6) as u32;
            self.renderer.draw_glyph(&mut pass, &tex.bind_group, first..first + 6);
        }
    }
}

impl GlyphBackend for WgpuBackend {
    fn create_texture(&mut self, image: &GlyphImage) -> Result<TextureId> {
        image.check_len()?;
        let max = self.max_texture_dimension();
        if image.width > max || image.height > max {
            return Err(FontError::Backend(format!(
                "{}x{} texture exceeds the {max} pixel limit",
                image.width, image.height
            )));
        }

        let owned = self.allocator.allocate_texture(TexKey::glyph(image.width, image.height));
        // Pooled textures keep old contents, so every texel is rewritten.
        let (width, height, rgba) = if image.width == 0 || image.height == 0 {
            (1, 1, vec![0u8; 4])
        } else {
            (image.width, image.height, image.to_rgba8())
        };
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &owned.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        let bind_group = self.renderer.tex_bind_group(&self.device, &owned.view);

        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, GpuTexture { owned, bind_group });
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        if let Some(tex) = self.textures.remove(&id) {
            self.allocator.release_texture(tex.owned);
        }
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
        self.device.limits().max_texture_dimension_2d
    }

    fn call_programs(&mut self, origin: [f32; 2], color: ColorLinPremul, programs: &[ProgramId]) -> Result<()> {
        let quads = build_quads(origin, programs, |id| self.programs.get(&id))?;
        let color = color.to_array();
        self.pending.extend(quads.into_iter().map(|q| (q, color)));
        Ok(())
    }
}
