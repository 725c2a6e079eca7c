//! Windowed point cloud viewer shell
//!
//! The Rust analogue of the original DOM shell: a winit window hosting
//! the lifecycle manager, a native file-open dialog, and egui panels
//! showing loading/error/point-count/FPS state polled from the manager.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinHandle;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::Key,
    window::{Window, WindowBuilder},
};

use cloudview_core::{Error, Result};
use cloudview_io::{CloudFetcher, CloudSource, LoadedCloud};
use cloudview_render::{FrameOverlay, PointSurface, RenderConfig};
use cloudview_viewer::{FrameScheduler, LoadTicket, TickHandle, ViewerManager, Viewport};

#[derive(Parser)]
#[command(about = "Interactive point cloud viewer")]
struct Args {
    /// Point cloud to load on startup (PLY, LAS, LAZ or PCD)
    path: Option<PathBuf>,

    /// Upper bound on rendered points
    #[arg(long, default_value_t = 1_000_000)]
    point_budget: usize,

    /// Rendered point size
    #[arg(long, default_value_t = 2.0)]
    point_size: f32,
}

/// Scheduler mapping tick requests onto window redraws
struct RedrawScheduler {
    window: Arc<Window>,
    next_id: u64,
}

impl FrameScheduler for RedrawScheduler {
    fn schedule_tick(&mut self) -> TickHandle {
        self.next_id += 1;
        self.window.request_redraw();
        TickHandle::new(self.next_id)
    }

    fn cancel_tick(&mut self, _handle: TickHandle) {
        // Redraws cannot be revoked; the manager drops stale handles
    }
}

/// egui state shared between the event loop and the render overlay
struct EguiLayer {
    renderer: egui_wgpu::Renderer,
    primitives: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
}

struct SharedOverlay(Rc<RefCell<EguiLayer>>);

impl FrameOverlay for SharedOverlay {
    fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        size: (u32, u32),
    ) {
        let mut layer = self.0.borrow_mut();
        let layer = &mut *layer;

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.0, size.1],
            pixels_per_point: layer.pixels_per_point,
        };

        for (id, delta) in &layer.textures_delta.set {
            layer.renderer.update_texture(device, queue, *id, delta);
        }
        let callback_buffers =
            layer
                .renderer
                .update_buffers(device, queue, encoder, &layer.primitives, &screen);
        if !callback_buffers.is_empty() {
            queue.submit(callback_buffers);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            layer.renderer.render(&mut pass, &layer.primitives, &screen);
        }

        for id in &layer.textures_delta.free {
            layer.renderer.free_texture(id);
        }
        layer.textures_delta = Default::default();
    }
}

type Manager = ViewerManager<PointSurface, RedrawScheduler>;
type PendingLoad = (LoadTicket, JoinHandle<Result<LoadedCloud>>);

fn start_load(
    manager: &mut Manager,
    runtime: &tokio::runtime::Handle,
    pending: &mut Option<PendingLoad>,
    path: PathBuf,
) {
    let display_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("PointCloud")
        .to_string();

    if let Ok(ticket) = manager.begin_load(&display_name) {
        let task = runtime.spawn(async move { CloudFetcher.fetch(&path).await });
        *pending = Some((ticket, task));
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new()?;
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("cloudview")
            .with_inner_size(winit::dpi::LogicalSize::new(1200.0, 800.0))
            .build(&event_loop)?,
    );

    let scheduler = RedrawScheduler {
        window: window.clone(),
        next_id: 0,
    };
    let mut manager: Manager = ViewerManager::new(scheduler);

    let size = window.inner_size();
    let config = RenderConfig {
        point_size: args.point_size,
        point_budget: args.point_budget,
        ..Default::default()
    };
    let build_window = window.clone();
    manager.initialize(Viewport::new(size.width, size.height), move |_| {
        pollster::block_on(PointSurface::new(build_window, config))
    })?;

    // egui overlay wired into the surface
    let egui_ctx = egui::Context::default();
    let mut egui_state = egui_winit::State::new(
        egui_ctx.clone(),
        egui::ViewportId::ROOT,
        window.as_ref(),
        Some(window.scale_factor() as f32),
        None,
    );
    let egui_layer = {
        let surface = manager.surface_mut().expect("initialized above");
        let renderer = egui_wgpu::Renderer::new(
            surface.backend.device(),
            surface.backend.surface_format(),
            None,
            1,
        );
        let layer = Rc::new(RefCell::new(EguiLayer {
            renderer,
            primitives: Vec::new(),
            textures_delta: Default::default(),
            pixels_per_point: window.scale_factor() as f32,
        }));
        surface
            .backend
            .set_overlay(Some(Box::new(SharedOverlay(layer.clone()))));
        layer
    };

    let mut pending_load: Option<PendingLoad> = None;
    if let Some(path) = args.path.clone() {
        start_load(&mut manager, runtime.handle(), &mut pending_load, path);
    }

    let mut ui_point_size = args.point_size;
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;
    let mut mouse_pressed = false;

    event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => {
                let response = egui_state.on_window_event(&window, &event);
                if response.consumed
                    && !matches!(
                        event,
                        WindowEvent::RedrawRequested
                            | WindowEvent::CloseRequested
                            | WindowEvent::Resized(_)
                    )
                {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        manager.destroy();
                        target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        manager.resize(new_size.width, new_size.height);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            mouse_pressed = state == ElementState::Pressed;
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        if let Some(last_pos) = last_mouse_pos {
                            if mouse_pressed {
                                let delta_x = (position.x - last_pos.x) as f32 * 0.01;
                                let delta_y = (position.y - last_pos.y) as f32 * 0.01;
                                if let Some(surface) = manager.surface_mut() {
                                    surface.camera.orbit(delta_x, delta_y);
                                }
                            }
                        }
                        last_mouse_pos = Some(position);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll_delta = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                        };
                        if let Some(surface) = manager.surface_mut() {
                            surface.camera.zoom(scroll_delta * 0.1);
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state == ElementState::Pressed {
                            if let Key::Character(c) = &event.logical_key {
                                match c.as_str() {
                                    "r" | "R" => manager.reset_camera(),
                                    "o" | "O" => {
                                        if let Some(path) = pick_cloud_file() {
                                            start_load(
                                                &mut manager,
                                                runtime.handle(),
                                                &mut pending_load,
                                                path,
                                            );
                                        }
                                    }
                                    _ => {}
                                }
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        // Build the UI, then let the manager render the frame
                        let fps = manager.fps();
                        let point_count = manager.point_count();
                        let cloud_name = manager.resource().map(|r| r.name.clone());
                        let state = manager.state().clone();

                        let mut open_clicked = false;
                        let mut reset_clicked = false;

                        let raw_input = egui_state.take_egui_input(&window);
                        let full_output = egui_ctx.run(raw_input, |ctx| {
                            egui::Window::new("Info")
                                .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
                                .resizable(false)
                                .show(ctx, |ui| {
                                    ui.label(format!(
                                        "Cloud: {}",
                                        cloud_name.as_deref().unwrap_or("-")
                                    ));
                                    ui.label(format!(
                                        "Points: {}",
                                        point_count
                                            .map(|n| n.to_string())
                                            .unwrap_or_else(|| "-".to_string())
                                    ));
                                    ui.label(format!("FPS: {}", fps));
                                    if state.is_loading {
                                        ui.horizontal(|ui| {
                                            ui.spinner();
                                            ui.label("Loading…");
                                        });
                                    }
                                    if let Some(error) = &state.error {
                                        ui.colored_label(egui::Color32::RED, error);
                                    }
                                });

                            egui::Window::new("Controls")
                                .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
                                .resizable(false)
                                .show(ctx, |ui| {
                                    if ui.button("Open point cloud…").clicked() {
                                        open_clicked = true;
                                    }
                                    if ui.button("Reset camera (R)").clicked() {
                                        reset_clicked = true;
                                    }
                                    ui.add(
                                        egui::Slider::new(&mut ui_point_size, 0.5..=10.0)
                                            .text("Point size"),
                                    );
                                });
                        });

                        egui_state.handle_platform_output(&window, full_output.platform_output);
                        let primitives = egui_ctx
                            .tessellate(full_output.shapes, full_output.pixels_per_point);
                        {
                            let mut layer = egui_layer.borrow_mut();
                            layer.primitives = primitives;
                            layer.textures_delta.append(full_output.textures_delta);
                            layer.pixels_per_point = full_output.pixels_per_point;
                        }

                        if reset_clicked {
                            manager.reset_camera();
                        }
                        if let Some(surface) = manager.surface_mut() {
                            if (surface.backend.config().point_size - ui_point_size).abs()
                                > f32::EPSILON
                            {
                                let mut config = surface.backend.config().clone();
                                config.point_size = ui_point_size;
                                surface.backend.set_config(config);
                            }
                        }
                        if open_clicked {
                            if let Some(path) = pick_cloud_file() {
                                start_load(
                                    &mut manager,
                                    runtime.handle(),
                                    &mut pending_load,
                                    path,
                                );
                            }
                        }

                        if let Some(handle) = manager.pending_tick() {
                            manager.tick(handle);
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                // Hand a finished fetch back to the manager
                let finished = pending_load
                    .as_ref()
                    .is_some_and(|(_, task)| task.is_finished());
                if finished {
                    let (ticket, task) = pending_load.take().unwrap();
                    let result = runtime
                        .block_on(task)
                        .unwrap_or_else(|e| Err(Error::Load(e.to_string())));
                    let _ = manager.finish_load(ticket, result);
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn pick_cloud_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Point clouds", &["ply", "las", "laz", "pcd"])
        .pick_file()
}
