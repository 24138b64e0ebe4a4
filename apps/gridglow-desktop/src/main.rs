use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use gridglow_common::{GridConfig, Rgba, Viewport};
use gridglow_render::{AnimationLoop, FrameClock, FrameRequest, FrameStats, GridRenderer};
use gridglow_render_wgpu::{SurfaceError, WgpuSurface, acquire_frame};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "gridglow-desktop", about = "Pointer-lit grid in a desktop window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Grid config file (YAML, or JSON with a .json extension)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Color behind the grid
    #[arg(long, default_value = "#0b1020", value_parser = parse_color)]
    backdrop: Rgba,
}

fn parse_color(s: &str) -> Result<Rgba, String> {
    Rgba::from_hex(s).ok_or_else(|| format!("expected #rrggbb, got {s:?}"))
}

/// Frame clock whose requests are window redraw requests.
///
/// winit has no way to withdraw a redraw, so a cancelled request is simply
/// forgotten and the redraw it triggers presents without rendering.
#[derive(Default)]
struct WinitClock {
    window: Option<Arc<Window>>,
    next_id: u64,
    pending: Option<FrameRequest>,
}

impl WinitClock {
    /// The request a redraw fulfils, if one was outstanding.
    fn take_fired(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }
}

impl FrameClock for WinitClock {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        let window = self.window.as_ref()?;
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.pending = Some(request);
        window.request_redraw();
        Some(request)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}

/// Application state independent of the GPU.
struct GridApp {
    anim: AnimationLoop,
    clock: WinitClock,
    backdrop: wgpu::Color,
    show_panel: bool,
    draft: GridConfig,
    config_error: Option<String>,
    last_stats: FrameStats,
}

impl GridApp {
    fn new(config: GridConfig, backdrop: Rgba) -> Result<Self> {
        let renderer = GridRenderer::with_config(config.clone(), Viewport::default())?;
        let [r, g, b, _] = backdrop.to_f32_array();
        Ok(Self {
            anim: AnimationLoop::new(renderer),
            clock: WinitClock::default(),
            backdrop: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            show_panel: false,
            draft: config,
            config_error: None,
            last_stats: FrameStats::default(),
        })
    }

    fn toggle_running(&mut self) {
        if self.anim.is_running() {
            self.anim.stop(&mut self.clock);
        } else {
            self.anim.start(&mut self.clock);
        }
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::Space => self.toggle_running(),
            KeyCode::F1 => self.show_panel = !self.show_panel,
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        egui::SidePanel::left("tuning")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Grid");
                ui.separator();

                let d = &mut self.draft;
                let mut changed = false;
                changed |= ui
                    .add(egui::Slider::new(&mut d.grid_size, 4.0..=64.0).text("grid size"))
                    .changed();
                changed |= ui
                    .add(
                        egui::Slider::new(&mut d.flashlight_radius, 10.0..=600.0)
                            .text("radius"),
                    )
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut d.max_lift, 1.0..=200.0).text("lift"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut d.smoothing, 0.01..=0.99).text("smoothing"))
                    .changed();
                changed |= ui
                    .add(
                        egui::Slider::new(&mut d.base_opacity, 0.0..=1.0).text("base opacity"),
                    )
                    .changed();

                if changed {
                    self.config_error = self
                        .anim
                        .renderer_mut()
                        .set_config(self.draft.clone())
                        .err()
                        .map(|e| e.to_string());
                }
                if ui.button("Reset").clicked() {
                    self.draft = GridConfig::default();
                    self.config_error = self
                        .anim
                        .renderer_mut()
                        .set_config(self.draft.clone())
                        .err()
                        .map(|e| e.to_string());
                }
                if let Some(err) = &self.config_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.separator();
                let s = &self.last_stats;
                ui.label(format!(
                    "{}  frames: {}",
                    if self.anim.is_running() { "running" } else { "stopped" },
                    self.anim.frames_rendered()
                ));
                ui.label(format!("vertices: {}  segments: {}", s.vertices, s.segments));
                ui.label(format!("lit: {}  panels: {}", s.lit_segments, s.filled_quads));
                ui.label(format!("peak lift: {:.1}", s.peak_lift));

                ui.separator();
                ui.small("Space: Start/Stop | F1: Panel | Esc: Quit");
            });
    }
}

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    floor: WgpuSurface,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Gridglow")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("gridglow_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // Colors are blended in the same space a 2D canvas uses.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let floor = WgpuSurface::new(
            &device,
            surface_format,
            Viewport::new(config.width, config.height),
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            format = ?surface_format,
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            floor,
            egui_winit,
            egui_renderer,
        })
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    fn draw_egui(&mut self, egui_ctx: &EguiContext, view: &wgpu::TextureView, app: &mut GridApp) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| app.draw_ui(ctx));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    app: GridApp,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(app: GridApp) -> Self {
        Self {
            app,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        if let Some(request) = self.app.clock.take_fired() {
            if let Some(stats) = self
                .app
                .anim
                .on_frame(request, &mut self.app.clock, &mut gpu.floor)
            {
                self.app.last_stats = stats;
            }
        }

        let output = match acquire_frame(&gpu.surface) {
            Ok(t) => t,
            Err(SurfaceError::Reconfigure) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                gpu.window.request_redraw();
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.floor
            .present(&gpu.device, &gpu.queue, &view, self.app.backdrop);
        gpu.draw_egui(&self.egui_ctx, &view, &mut self.app);

        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let mut gpu = match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let viewport = gpu.viewport();
        self.app
            .anim
            .renderer_mut()
            .on_resize(viewport, &mut gpu.floor);
        self.app.clock.window = Some(gpu.window.clone());
        self.gpu = Some(gpu);
        self.app.anim.start(&mut self.app.clock);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.repaint {
            gpu.window.request_redraw();
        }
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.config.width = new_size.width.max(1);
                gpu.config.height = new_size.height.max(1);
                gpu.surface.configure(&gpu.device, &gpu.config);
                let viewport = gpu.viewport();
                self.app
                    .anim
                    .renderer_mut()
                    .on_resize(viewport, &mut gpu.floor);
                // A stopped loop still has to show something at the new size.
                if !self.app.anim.is_running() {
                    self.app.last_stats = self.app.anim.renderer_mut().render_frame(&mut gpu.floor);
                    gpu.window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.app
                    .anim
                    .renderer_mut()
                    .on_pointer_move(position.x as f32, position.y as f32);
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
            } => {
                self.app.handle_key(key, event_loop);
                gpu.window.request_redraw();
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("gridglow-desktop starting");

    let config = match &cli.config {
        Some(path) => GridConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GridConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = GpuApp::new(GridApp::new(config, cli.backdrop)?);
    event_loop.run_app(&mut app)?;

    Ok(())
}
