//! rune-hud demo: draws the embedded bitmap font at every configured scale,
//! an optional TrueType font, and the mouse position under the cursor.

use anyhow::Result;
use hud_config::{DirectionSetting, FilterSetting, HudConfig, MissingGlyphSetting};
use hud_core::{ColorLinPremul, Direction, Font, MissingGlyph, TrueTypeConfig, WgpuBackend, embedded_font, wgpu};
use hud_window::winit::dpi::PhysicalSize;
use hud_window::{EventHandler, HudWindow, WindowCtx};

const SAMPLE: &str = "0 1 2 3 4 5 6 7 8 9 A B C D E F";
const MARGIN: f32 = 10.0;

struct HudDemo {
    config: HudConfig,
    backend: Option<WgpuBackend>,
    fonts: Vec<Font>,
}

fn direction(setting: DirectionSetting) -> Direction {
    match setting {
        DirectionSetting::LeftToRight => Direction::LeftToRight,
        DirectionSetting::RightToLeft => Direction::RightToLeft,
        DirectionSetting::TopToBottom => Direction::TopToBottom,
    }
}

fn filter(setting: FilterSetting) -> wgpu::FilterMode {
    match setting {
        FilterSetting::Nearest => wgpu::FilterMode::Nearest,
        FilterSetting::Linear => wgpu::FilterMode::Linear,
    }
}

impl HudDemo {
    fn new(config: HudConfig) -> Self {
        Self { config, backend: None, fonts: Vec::new() }
    }

    fn missing_glyph(&self) -> MissingGlyph {
        match self.config.render.missing_glyph {
            MissingGlyphSetting::Skip => MissingGlyph::Skip,
            MissingGlyphSetting::Substitute => MissingGlyph::Substitute(self.config.render.substitute),
            MissingGlyphSetting::Reject => MissingGlyph::Reject,
        }
    }

    fn load_fonts(&mut self, backend: &mut WgpuBackend) -> Result<()> {
        let policy = self.missing_glyph();

        for &scale in &self.config.bitmap.scales {
            let (image, charset) = embedded_font(scale)?;
            let mut font = Font::from_bitmap(backend, &image, charset)?;
            if let Err(e) = font.set_missing_glyph(policy) {
                log::warn!("bitmap font x{scale}: {e}; keeping {:?}", font.missing_glyph());
            }
            self.fonts.push(font);
        }

        if let Some(path) = &self.config.font.path {
            let tt = TrueTypeConfig {
                low: self.config.font.low,
                high: self.config.font.high,
                scale: self.config.font.scale,
                direction: direction(self.config.font.direction),
            };
            match Font::from_truetype_file(backend, path, &tt) {
                Ok(mut font) => {
                    font.set_color(ColorLinPremul::rgba(255, 220, 120, 255));
                    if let Err(e) = font.set_missing_glyph(policy) {
                        log::warn!("{}: {e}", path.display());
                    }
                    self.fonts.push(font);
                }
                Err(e) => log::error!("skipping TrueType font: {e}"),
            }
        }

        log::info!("loaded {} fonts", self.fonts.len());
        Ok(())
    }
}

impl EventHandler for HudDemo {
    fn init(&mut self, ctx: &mut WindowCtx) -> Result<()> {
        let size = ctx.size();
        let mut backend = WgpuBackend::new(
            ctx.device_arc(),
            ctx.queue_arc(),
            ctx.surface_format(),
            filter(self.config.render.filter),
            size.width,
            size.height,
        );
        let loaded = self.load_fonts(&mut backend);
        self.backend = Some(backend);
        loaded?;
        ctx.request_redraw();
        Ok(())
    }

    fn on_resize(&mut self, _ctx: &mut WindowCtx, size: PhysicalSize<u32>) -> Result<()> {
        if let Some(backend) = self.backend.as_mut() {
            backend.set_viewport(size.width, size.height);
        }
        Ok(())
    }

    fn on_redraw(&mut self, ctx: &mut WindowCtx) -> Result<()> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };
        let frame = ctx.acquire_current_frame()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("hud-frame") });

        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hud-clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r: 0.02, g: 0.02, b: 0.04, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        let mut y = MARGIN;
        for font in &self.fonts {
            font.print(backend, MARGIN, y, SAMPLE)?;
            y += font.scale() as f32 + 4.0;
        }
        if let Some(font) = self.fonts.first() {
            let [mx, my] = ctx.mouse_pos();
            font.printf(backend, mx, my, format_args!("{} x {}", mx as i32, my as i32))?;
        }

        backend.flush(&mut encoder, &view);
        ctx.queue().submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn on_exit(&mut self, _ctx: &mut WindowCtx) -> Result<()> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };
        for font in &mut self.fonts {
            font.release(backend)?;
        }
        self.fonts.clear();
        backend.allocator_mut().purge();
        Ok(())
    }
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();
    let config = HudConfig::load();
    log::debug!("config: {config:?}");

    let window = HudWindow::new(&config.demo.title)?;
    window.run(HudDemo::new(config))
}
