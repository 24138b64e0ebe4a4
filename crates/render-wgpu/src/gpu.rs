use glam::Vec2;
use gridglow_common::{Rect, Rgba, Viewport};
use gridglow_render::{Paint, Surface};

use crate::error::SurfaceError;
use crate::shaders;
use crate::tessellate::{ColorVertex, Tessellator};

const INITIAL_VERTEX_CAPACITY: u64 = 4096;

/// Acquire the next swapchain texture, classifying failures.
pub fn acquire_frame(surface: &wgpu::Surface<'_>) -> Result<wgpu::SurfaceTexture, SurfaceError> {
    surface.get_current_texture().map_err(SurfaceError::from)
}

/// GPU-backed [`Surface`]: records draw calls as triangles and draws them
/// with [`present`](Self::present).
pub struct WgpuSurface {
    batch: Tessellator,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
}

impl WgpuSurface {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, viewport: Viewport) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("floor_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::FLOOR_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("floor_pipeline_layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("floor_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_floor"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ColorVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_floor"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = Self::create_vertex_buffer(device, INITIAL_VERTEX_CAPACITY);

        Self {
            batch: Tessellator::new(viewport),
            pipeline,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.batch.vertices().len()
    }

    /// Draw the recorded triangles over `backdrop` into `view` and submit.
    pub fn present(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        backdrop: wgpu::Color,
    ) {
        let vertices = self.batch.vertices();
        let needed = vertices.len() as u64;
        if needed > self.vertex_capacity {
            self.vertex_capacity = needed.next_power_of_two();
            tracing::debug!(capacity = self.vertex_capacity, "growing floor vertex buffer");
            self.vertex_buffer = Self::create_vertex_buffer(device, self.vertex_capacity);
        }
        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("floor_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("floor_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(backdrop),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });

            if !vertices.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.draw(0..needed as u32, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("floor_vertex_buffer"),
            size: capacity * std::mem::size_of::<ColorVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

impl Surface for WgpuSurface {
    fn resize(&mut self, viewport: Viewport) {
        self.batch.resize(viewport);
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.batch.clear_rect(rect);
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.batch.fill_rect(rect, paint);
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.batch.stroke_line(from, to, color, width);
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        self.batch.fill_polygon(points, color);
    }
}
