use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct OwnedTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub key: TexKey,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TexKey {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

impl TexKey {
    /// Sampled RGBA8 glyph texture that can be written from the CPU.
    pub fn glyph(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        }
    }

    /// Size of one texture with this key, in bytes.
    pub fn bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * 4
    }
}

/// Texture allocator with per-key pooling. Released textures are pooled
/// while the pool stays within its byte budget and destroyed otherwise; the
/// default budget of zero destroys everything on release.
pub struct TextureAllocator {
    device: Arc<wgpu::Device>,
    texture_pool: HashMap<TexKey, Vec<wgpu::Texture>>,
    pool_budget: u64,
    pooled_bytes: u64,
}

/// Whether a released texture of `bytes` fits in the pool.
fn admits(pooled_bytes: u64, bytes: u64, budget: u64) -> bool {
    pooled_bytes.checked_add(bytes).is_some_and(|total| total <= budget)
}

impl TextureAllocator {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self {
            device,
            texture_pool: HashMap::new(),
            pool_budget: 0,
            pooled_bytes: 0,
        }
    }

    /// Keep up to `bytes` of released textures for reuse.
    pub fn with_pool_budget(mut self, bytes: u64) -> Self {
        self.set_pool_budget(bytes);
        self
    }

    /// Change the pool budget, destroying pooled textures that no longer fit.
    pub fn set_pool_budget(&mut self, bytes: u64) {
        self.pool_budget = bytes;
        if self.pooled_bytes > bytes {
            self.purge();
        }
    }

    pub fn pool_budget(&self) -> u64 {
        self.pool_budget
    }

    pub fn allocate_texture(&mut self, key: TexKey) -> OwnedTexture {
        let reused = self.texture_pool.get_mut(&key).and_then(Vec::pop);
        let texture = match reused {
            Some(texture) => {
                self.pooled_bytes -= key.bytes();
                texture
            }
            None => self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("glyph:tex"),
                size: wgpu::Extent3d {
                    width: key.width,
                    height: key.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: key.format,
                usage: key.usage,
                view_formats: &[],
            }),
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        OwnedTexture { texture, view, key }
    }

    pub fn release_texture(&mut self, tex: OwnedTexture) {
        let bytes = tex.key.bytes();
        if admits(self.pooled_bytes, bytes, self.pool_budget) {
            self.pooled_bytes += bytes;
            self.texture_pool.entry(tex.key).or_default().push(tex.texture);
        } else {
            tex.texture.destroy();
        }
    }

    /// Number of pooled textures waiting for reuse.
    pub fn pooled(&self) -> usize {
        self.texture_pool.values().map(Vec::len).sum()
    }

    /// Bytes held by pooled textures.
    pub fn pooled_bytes(&self) -> u64 {
        self.pooled_bytes
    }

    /// Destroy every pooled texture.
    pub fn purge(&mut self) {
        for (_, textures) in self.texture_pool.drain() {
            for texture in textures {
                texture.destroy();
            }
        }
        self.pooled_bytes = 0;
    }
}
