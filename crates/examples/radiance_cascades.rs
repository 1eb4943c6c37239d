//! Interactive 2D radiance cascades
//!
//! Controls:
//!   Left mouse  - paint light
//!   Right mouse - paint walls
//!   Escape      - exit
//!
//! `RUST_LOG=info` shows setup progress and the frame rate.

use std::sync::Arc;
use std::time::Instant;

use penumbra_core::{Error, FpsCounter, InputState, MouseButton, PipelineConfig, Result};
use penumbra_render::{Renderer, RendererConfig};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

fn main() {
    env_logger::init();
    log::info!("Starting Penumbra radiance cascades");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("{}", Error::setup("event loop", e));
            std::process::exit(1);
        }
    };
    let mut app = App::new(PipelineConfig::default());

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
}

struct App {
    config: PipelineConfig,
    state: Option<AppState>,
}

struct AppState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    surface_config: wgpu::SurfaceConfiguration,
    renderer: Renderer,
    input: InputState,
    fps: FpsCounter,
}

impl App {
    fn new(config: PipelineConfig) -> Self {
        Self { config, state: None }
    }
}

fn map_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Primary,
        winit::event::MouseButton::Right => MouseButton::Secondary,
        _ => MouseButton::Other,
    }
}

impl AppState {
    fn new(event_loop: &ActiveEventLoop, config: PipelineConfig) -> Result<Self> {
        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title(config.title.clone())
                        .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height))
                        .with_resizable(false),
                )
                .map_err(|e| Error::setup("window", e))?,
        );
        // The cursor pass draws a brush ring instead
        window.set_cursor_visible(false);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| Error::setup("surface", e))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| Error::setup("adapter", "no compatible adapter"))?;
        log::info!("Adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Penumbra Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| Error::setup("device", e))?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let caps = surface.get_capabilities(&adapter);
        // Shader output is written as-is, like a plain canvas
        let surface_format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| Error::setup("surface", "no supported formats"))?;

        let screen_copyable = caps.usages.contains(wgpu::TextureUsages::COPY_SRC);
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if screen_copyable {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let surface_config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: config.width,
            height: config.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let input = InputState::new(config.width, config.height);
        let renderer = Renderer::new(
            device.clone(),
            queue,
            RendererConfig {
                pipeline: config,
                surface_format,
                screen_copyable,
            },
        )?;

        Ok(Self {
            window,
            surface,
            device,
            surface_config,
            renderer,
            input,
            fps: FpsCounter::new(Instant::now()),
        })
    }

    fn render(&mut self) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return;
            }
            Err(e) => {
                log::warn!("Surface error: {:?}", e);
                return;
            }
        };

        let frame = self.input.snapshot();
        if let Err(e) = self.renderer.render(&frame, &output.texture) {
            log::error!("Render error: {}", e);
        }
        self.window.pre_present_notify();
        output.present();
        self.input.end_frame();

        if let Some(fps) = self.fps.tick(Instant::now()) {
            log::info!("FPS: {:.1}", fps);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match AppState::new(event_loop, self.config.clone()) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                log::error!("Setup failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else { return };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                log::info!("Shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                let canvas = (state.surface_config.width, state.surface_config.height);
                if (size.width, size.height) != canvas {
                    log::warn!(
                        "Window is {}x{}, canvas is {}x{}; the canvas is stretched",
                        size.width,
                        size.height,
                        canvas.0,
                        canvas.1
                    );
                }
                state.input.on_resized(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                state.input.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                state
                    .input
                    .on_button(map_button(button), button_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                state.render();
                state.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}
