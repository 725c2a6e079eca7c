//! wgpu point cloud surface

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

use cloudview_core::{ColoredPoint3f, Error, Result};

use crate::backend::{CameraMatrices, RenderBackend};
use crate::context::GpuContext;

/// Vertex data for point cloud rendering
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
}

impl PointVertex {
    /// Create a vertex from a colored point
    pub fn from_point(point: &ColoredPoint3f, size: f32) -> Self {
        Self {
            position: [point.position.x, point.position.y, point.position.z],
            color: [
                point.color[0] as f32 / 255.0,
                point.color[1] as f32 / 255.0,
                point.color[2] as f32 / 255.0,
            ],
            size,
        }
    }

    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Size
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Camera uniform data
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view_pos: [f32; 3],
    _padding: f32,
}

/// Rendering configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub point_size: f32,
    pub background_color: [f64; 4],
    /// Upper bound on uploaded points; larger clouds are subsampled
    pub point_budget: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            point_size: 2.0,
            background_color: [0.1, 0.1, 0.1, 1.0],
            point_budget: 1_000_000,
        }
    }
}

/// Hook letting a host paint UI into the frame before it is presented
///
/// Invoked once per draw after the point pass, with the frame's target
/// view and the current drawable size in pixels.
pub trait FrameOverlay {
    fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        size: (u32, u32),
    );
}

/// Evenly subsample `points` down to at most `budget` entries
pub fn budget_subsample(points: &[ColoredPoint3f], budget: usize) -> Vec<ColoredPoint3f> {
    if budget == 0 || points.is_empty() {
        return Vec::new();
    }
    if points.len() <= budget {
        return points.to_vec();
    }
    let stride = points.len().div_ceil(budget);
    points.iter().step_by(stride).copied().collect()
}

/// GPU point cloud surface bound to a window
///
/// Implements [`RenderBackend`]; the attached cloud is kept CPU-side so
/// budget or size changes can re-upload without a reload.
pub struct PointSurface {
    context: GpuContext,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    attached: Option<Vec<ColoredPoint3f>>,
    needs_upload: bool,
    overlay: Option<Box<dyn FrameOverlay>>,
    config: RenderConfig,
}

impl PointSurface {
    /// Create a surface for the given window
    pub async fn new(window: Arc<Window>, config: RenderConfig) -> Result<Self> {
        let context = GpuContext::new().await?;

        let surface = context
            .instance
            .create_surface(window.clone())
            .map_err(|e| Error::Gpu(format!("failed to create surface: {:?}", e)))?;

        let surface_caps = surface.get_capabilities(&context.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &surface_config);

        let camera_uniform = CameraUniform {
            view_proj: nalgebra::Matrix4::identity().into(),
            view_pos: [0.0, 0.0, 0.0],
            _padding: 0.0,
        };

        let camera_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("camera buffer"),
                contents: bytemuck::bytes_of(&camera_uniform),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let camera_bind_group_layout =
            context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                    label: Some("camera bind group layout"),
                });

        let camera_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &camera_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }],
                label: Some("camera bind group"),
            });

        let shader = context
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("point cloud shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/point_cloud.wgsl").into()),
            });

        let render_pipeline_layout =
            context
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("point cloud pipeline layout"),
                    bind_group_layouts: &[&camera_bind_group_layout],
                    push_constant_ranges: &[],
                });

        let render_pipeline =
            context
                .device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("point cloud pipeline"),
                    layout: Some(&render_pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: "vs_main",
                        buffers: &[PointVertex::desc()],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: "fs_main",
                        targets: &[Some(wgpu::ColorTargetState {
                            format: surface_config.format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::PointList,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        unclipped_depth: false,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        conservative: false,
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: wgpu::TextureFormat::Depth32Float,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState {
                        count: 1,
                        mask: !0,
                        alpha_to_coverage_enabled: false,
                    },
                    multiview: None,
                });

        let depth_view = Self::create_depth_view(&context.device, &surface_config);

        Ok(Self {
            context,
            surface,
            surface_config,
            render_pipeline,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            depth_view,
            vertex_buffer: None,
            vertex_count: 0,
            attached: None,
            needs_upload: false,
            overlay: None,
            config,
        })
    }

    /// Install or remove the UI overlay painted on top of each frame
    pub fn set_overlay(&mut self, overlay: Option<Box<dyn FrameOverlay>>) {
        self.overlay = overlay;
    }

    /// Current render configuration
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replace the render configuration; the attached cloud is
    /// re-uploaded on the next refresh when budget or size changed
    pub fn set_config(&mut self, config: RenderConfig) {
        if config != self.config {
            self.config = config;
            self.needs_upload = self.attached.is_some();
        }
    }

    /// Number of points currently uploaded to the GPU
    pub fn uploaded_points(&self) -> u32 {
        self.vertex_count
    }

    /// Surface format negotiated with the window, for overlay renderers
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Device handle, for overlay renderers
    pub fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    /// Queue handle, for overlay renderers
    pub fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }

    fn create_depth_view(
        device: &wgpu::Device,
        surface_config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth texture"),
            size: wgpu::Extent3d {
                width: surface_config.width,
                height: surface_config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn upload(&mut self) {
        let Some(points) = self.attached.as_ref() else {
            self.vertex_buffer = None;
            self.vertex_count = 0;
            return;
        };

        let sampled = budget_subsample(points, self.config.point_budget);
        let vertices: Vec<PointVertex> = sampled
            .iter()
            .map(|p| PointVertex::from_point(p, self.config.point_size))
            .collect();

        self.vertex_buffer = Some(self.context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("point cloud vertex buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        self.vertex_count = vertices.len() as u32;
        self.needs_upload = false;
    }
}

impl RenderBackend for PointSurface {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface
                .configure(&self.context.device, &self.surface_config);
            self.depth_view = Self::create_depth_view(&self.context.device, &self.surface_config);
        }
    }

    fn set_camera(&mut self, camera: &CameraMatrices) {
        let view_proj = camera.projection * camera.view;
        self.camera_uniform.view_proj = view_proj.into();
        self.camera_uniform.view_pos = [camera.position.x, camera.position.y, camera.position.z];

        self.context.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera_uniform),
        );
    }

    fn attach_cloud(&mut self, points: &[ColoredPoint3f]) -> Result<()> {
        self.attached = Some(points.to_vec());
        self.upload();
        Ok(())
    }

    fn detach_cloud(&mut self) {
        self.attached = None;
        self.vertex_buffer = None;
        self.vertex_count = 0;
        self.needs_upload = false;
    }

    fn refresh(&mut self) -> Result<()> {
        if self.needs_upload {
            self.upload();
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure and skip the frame; the next tick retries
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface
                    .configure(&self.context.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => {
                return Err(Error::Gpu(format!("failed to get surface texture: {:?}", e)));
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("point cloud encoder"),
                });

        {
            let [r, g, b, a] = self.config.background_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("point cloud pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(vertex_buffer) = &self.vertex_buffer {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                render_pass.draw(0..self.vertex_count, 0..1);
            }
        }

        if let Some(overlay) = self.overlay.as_mut() {
            overlay.paint(
                &self.context.device,
                &self.context.queue,
                &mut encoder,
                &view,
                (self.surface_config.width, self.surface_config.height),
            );
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudview_core::Point3f;

    fn cloud_of(n: usize) -> Vec<ColoredPoint3f> {
        (0..n)
            .map(|i| ColoredPoint3f::from_position(Point3f::new(i as f32, 0.0, 0.0)))
            .collect()
    }

    #[test]
    fn subsample_within_budget_keeps_everything() {
        let points = cloud_of(100);
        let sampled = budget_subsample(&points, 100);
        assert_eq!(sampled.len(), 100);
    }

    #[test]
    fn subsample_over_budget_truncates() {
        let points = cloud_of(1000);
        let sampled = budget_subsample(&points, 100);
        assert!(sampled.len() <= 100);
        assert!(sampled.len() >= 90);
        // First point always survives
        assert_eq!(sampled[0].position, Point3f::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn subsample_zero_budget_is_empty() {
        let points = cloud_of(10);
        assert!(budget_subsample(&points, 0).is_empty());
    }

    #[test]
    fn vertex_conversion_normalizes_color() {
        let point = ColoredPoint3f::new(Point3f::new(1.0, 2.0, 3.0), [255, 0, 128]);
        let vertex = PointVertex::from_point(&point, 2.0);
        assert_eq!(vertex.position, [1.0, 2.0, 3.0]);
        assert_eq!(vertex.color[0], 1.0);
        assert_eq!(vertex.color[1], 0.0);
        assert!((vertex.color[2] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn default_config_matches_viewer_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.point_budget, 1_000_000);
        assert_eq!(config.point_size, 2.0);
    }
}
