//! hud-window: minimal winit + wgpu window/event wrapper for rune-hud.
//!
//! Responsibilities:
//! - Create window + surface + device/queue.
//! - Manage surface configuration and resizing.
//! - Dispatch basic events (redraw, resize, mouse move/click, exit).
//! - Expose helpers to acquire a frame for drawing and to request redraws.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use hud_core::{make_surface_config, wgpu};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

pub use winit;

pub struct HudWindow {
    // Winit objects
    event_loop: EventLoop<()>,
    // We must leak the window to satisfy wgpu surface lifetime requirements.
    window: &'static Window,
    // Wgpu objects
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    _adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
}

pub struct WindowCtx<'a> {
    window: &'a Window,
    device: &'a Arc<wgpu::Device>,
    queue: &'a Arc<wgpu::Queue>,
    surface: &'a wgpu::Surface<'static>,
    config: &'a mut wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    last_cursor_pos: [f32; 2],
    elwt: &'a EventLoopWindowTarget<()>,
}

impl<'a> WindowCtx<'a> {
    pub fn window(&self) -> &Window { self.window }
    pub fn device(&self) -> &wgpu::Device { self.device }
    pub fn queue(&self) -> &wgpu::Queue { self.queue }
    pub fn device_arc(&self) -> Arc<wgpu::Device> { self.device.clone() }
    pub fn queue_arc(&self) -> Arc<wgpu::Queue> { self.queue.clone() }
    pub fn surface_config(&self) -> &wgpu::SurfaceConfiguration { self.config }
    pub fn surface_format(&self) -> wgpu::TextureFormat { self.config.format }
    pub fn size(&self) -> PhysicalSize<u32> { self.size }
    pub fn mouse_pos(&self) -> [f32; 2] { self.last_cursor_pos }
    pub fn request_redraw(&self) { self.window.request_redraw(); }
    pub fn exit(&self) { self.elwt.exit(); }

    /// Next swapchain image. A lost or outdated surface is reconfigured once
    /// before giving up.
    pub fn acquire_current_frame(&mut self) -> Result<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost; reconfiguring");
                self.surface.configure(self.device, self.config);
                Ok(self.surface.get_current_texture()?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub trait EventHandler {
    fn init(&mut self, _ctx: &mut WindowCtx) -> Result<()> { Ok(()) }
    fn on_resize(&mut self, _ctx: &mut WindowCtx, _size: PhysicalSize<u32>) -> Result<()> { Ok(()) }
    fn on_mouse_move(&mut self, _ctx: &mut WindowCtx, _pos: [f32; 2]) -> Result<()> { Ok(()) }
    fn on_mouse_input(&mut self, _ctx: &mut WindowCtx, _state: ElementState, _button: MouseButton) -> Result<()> { Ok(()) }
    fn on_redraw(&mut self, _ctx: &mut WindowCtx) -> Result<()> { Ok(()) }
    /// Called once when the event loop is shutting down, while the device is
    /// still alive.
    fn on_exit(&mut self, _ctx: &mut WindowCtx) -> Result<()> { Ok(()) }
}

fn report(what: &str, res: Result<()>) {
    if let Err(e) = res {
        log::error!("{what} failed: {e:#}");
    }
}

impl HudWindow {
    pub fn new(title: &str) -> Result<Self> {
        // Create event loop and window
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new().with_title(title).build(&event_loop)?;
        let window: &'static Window = Box::leak(Box::new(window));

        // Create wgpu instance + surface
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        // Request adapter/device
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter found"))?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        // Configure surface
        let size = window.inner_size();
        let config = make_surface_config(&adapter, &surface, size.width, size.height);
        surface.configure(&device, &config);

        Ok(Self {
            event_loop,
            window,
            _instance: instance,
            surface,
            _adapter: adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            size,
        })
    }

    pub fn run(mut self, mut handler: impl EventHandler + 'static) -> Result<()> {
        let mut last_cursor_pos: [f32; 2] = [0.0, 0.0];
        let mut needs_init = true;

        Ok(self.event_loop.run(move |event, elwt| {
            macro_rules! ctx {
                () => {
                    WindowCtx {
                        window: self.window,
                        device: &self.device,
                        queue: &self.queue,
                        surface: &self.surface,
                        config: &mut self.config,
                        size: self.size,
                        last_cursor_pos,
                        elwt,
                    }
                };
            }

            match event {
                Event::Resumed => {
                    if needs_init {
                        needs_init = false;
                        if let Err(e) = handler.init(&mut ctx!()) {
                            log::error!("init failed: {e:#}");
                            elwt.exit();
                        }
                    }
                }
                Event::WindowEvent { window_id, event } if window_id == self.window.id() => match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(new_size) => {
                        self.size = new_size;
                        if new_size.width > 0 && new_size.height > 0 {
                            self.config.width = new_size.width;
                            self.config.height = new_size.height;
                            self.surface.configure(&self.device, &self.config);
                        }
                        report("resize", handler.on_resize(&mut ctx!(), new_size));
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        last_cursor_pos = [position.x as f32, position.y as f32];
                        report("mouse move", handler.on_mouse_move(&mut ctx!(), last_cursor_pos));
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        report("mouse input", handler.on_mouse_input(&mut ctx!(), state, button));
                    }
                    WindowEvent::RedrawRequested => {
                        if self.size.width > 0 && self.size.height > 0 {
                            report("redraw", handler.on_redraw(&mut ctx!()));
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    // Keep the HUD live; the mouse readout changes every frame.
                    self.window.request_redraw();
                }
                Event::LoopExiting => {
                    if !needs_init {
                        report("exit", handler.on_exit(&mut ctx!()));
                    }
                }
                _ => {}
            }
        })?)
    }

    pub fn window(&self) -> &Window { self.window }
}
