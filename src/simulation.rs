//! Simulation builder and windowed runner

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::camera::Camera;
use crate::config::{MotionBlurParams, SimulationConfig};
use crate::controller::SimulationController;
use crate::error::SimulationError;
use crate::gpu::compositor::MotionBlurCompositor;
use crate::gpu::{GpuContext, GpuError};

/// A galaxy simulation builder.
///
/// Use method chaining to configure, then call `.run()` to open a window.
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    /// Create a new simulation with default settings.
    pub fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of stars, including the central attractor.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.config.galaxy.particle_count = count;
        self
    }

    /// Use a fixed seed so every restart produces the same galaxy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Configure the motion-blur trail.
    pub fn with_motion_blur(mut self, motion_blur: MotionBlurParams) -> Self {
        self.config.motion_blur = motion_blur;
        self
    }

    /// Run the simulation. This blocks until the window is closed.
    pub fn run(self) -> Result<(), SimulationError> {
        self.config.validate().map_err(crate::error::EpochError::from)?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self.config);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

/// Window-bound GPU state.
struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    gpu: GpuContext,
    compositor: MotionBlurCompositor,
}

impl Renderer {
    async fn new(window: Arc<Window>, motion_blur: &MotionBlurParams) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let gpu = GpuContext::for_surface(&instance, &surface).await?;

        let surface_caps = surface.get_capabilities(&gpu.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &surface_config);

        let compositor = MotionBlurCompositor::new(
            &gpu.device,
            surface_config.width,
            surface_config.height,
            surface_format,
            motion_blur,
        );

        Ok(Self {
            window,
            surface,
            surface_config,
            gpu,
            compositor,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.gpu.device, &self.surface_config);
            self.compositor.resize(&self.gpu.device, width, height);
        }
    }

    fn render(
        &mut self,
        controller: &mut SimulationController,
        camera: &Camera,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        controller.frame(&self.gpu, camera, &mut self.compositor, &view);

        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

struct App {
    controller: SimulationController,
    camera: Camera,
    renderer: Option<Renderer>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// First fatal error, returned from [`Simulation::run`].
    error: Option<SimulationError>,
}

impl App {
    fn new(config: SimulationConfig) -> Self {
        Self {
            controller: SimulationController::new(config),
            camera: Camera::default(),
            renderer: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SimulationError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let window_attrs = Window::default_attributes()
            .with_title("Galaxy")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let motion_blur = self.controller.config().motion_blur;
        let renderer = pollster::block_on(Renderer::new(window.clone(), &motion_blur))?;
        self.controller.restart(&renderer.gpu)?;
        self.renderer = Some(renderer);

        window.request_redraw();
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space => {
                let paused = self.controller.toggle_pause();
                log::info!("{}", if paused { "Paused" } else { "Running" });
            }
            KeyCode::KeyR => {
                if let Some(renderer) = &self.renderer {
                    match self.controller.restart(&renderer.gpu) {
                        Ok(()) => log::info!("Restarted"),
                        Err(e) => log::warn!("Restart failed, current galaxy kept: {}", e),
                    }
                }
            }
            KeyCode::KeyB => {
                if let Some(renderer) = &mut self.renderer {
                    let mix_ratio = if renderer.compositor.mix_ratio() > 0.0 {
                        0.0
                    } else {
                        MotionBlurParams {
                            enabled: true,
                            ..self.controller.config().motion_blur
                        }
                        .effective_mix_ratio()
                    };
                    renderer.compositor.set_mix_ratio(&renderer.gpu.queue, mix_ratio);
                    log::info!("Motion blur mix ratio: {}", mix_ratio);
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size.width, physical_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, key),
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;
                        self.camera.orbit(dx as f32, dy as f32);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.dolly(scroll);
            }
            WindowEvent::RedrawRequested => {
                if let Some(renderer) = &mut self.renderer {
                    match renderer.render(&mut self.controller, &self.camera) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let (width, height) =
                                (renderer.surface_config.width, renderer.surface_config.height);
                            renderer.resize(width, height);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Surface out of memory");
                            event_loop.exit();
                        }
                        Err(e) => log::error!("Render error: {:?}", e),
                    }
                    renderer.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
