use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use glam::Mat4;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::compile::{compose_fragment_source, validate_fragment};
use crate::mesh::unit_cube;
use crate::types::Antialiasing;

use super::context::{GpuContext, DEPTH_FORMAT};
use super::pipeline::{CubePipeline, PipelineLayouts};
use super::uniforms::CubeUniforms;

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Everything the GPU needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameInput {
    pub mvp: Mat4,
    pub elapsed: f32,
    pub delta: f32,
    pub cursor: Option<(f32, f32)>,
    pub pressed_at: Option<(f32, f32)>,
}

pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: CubeUniforms,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    depth_target: RenderTarget,
    multisample_target: Option<RenderTarget>,
    current: Option<CubePipeline>,
    stats: FrameStats,
}

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

struct FrameStats {
    since: Instant,
    frames: u32,
}

impl FrameStats {
    fn record(&mut self, now: Instant, elapsed: f32) {
        self.frames += 1;
        let window = now.saturating_duration_since(self.since);
        if window >= Duration::from_secs(1) {
            let fps = self.frames as f32 / window.as_secs_f32();
            debug!(fps = fps.round(), time = elapsed, "render stats");
            self.frames = 0;
            self.since = now;
        }
    }
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, antialiasing)?;
        let layouts = PipelineLayouts::new(&context.device);

        let uniforms = CubeUniforms::new(context.size.width, context.size.height);
        let uniform_buffer =
            context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("uniform buffer"),
                    contents: bytemuck::bytes_of(&uniforms),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let (vertices, indices) = unit_cube();
        let vertex_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cube vertex buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cube index buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let (depth_target, multisample_target) = Self::create_targets(&context);

        Ok(Self {
            context,
            layouts,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            depth_target,
            multisample_target,
            current: None,
            stats: FrameStats {
                since: Instant::now(),
                frames: 0,
            },
        })
    }

    fn create_targets(context: &GpuContext) -> (RenderTarget, Option<RenderTarget>) {
        let depth = RenderTarget::new(
            &context.device,
            "depth target",
            DEPTH_FORMAT,
            context.size,
            context.sample_count,
        );
        let msaa = (context.sample_count > 1).then(|| {
            RenderTarget::new(
                &context.device,
                "msaa color target",
                context.surface_format,
                context.size,
                context.sample_count,
            )
        });
        (depth, msaa)
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn aspect(&self) -> f32 {
        let size = self.size();
        size.width.max(1) as f32 / size.height.max(1) as f32
    }

    pub(crate) fn has_pipeline(&self) -> bool {
        self.current.is_some()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if self.context.resize(new_size) {
            let (depth, msaa) = Self::create_targets(&self.context);
            self.depth_target = depth;
            self.multisample_target = msaa;
        }
    }

    /// Wraps, validates and installs a new fragment body. On error the
    /// previous pipeline stays in place.
    pub(crate) fn set_fragment(&mut self, label: &str, body: &str) -> Result<()> {
        let wrapped = compose_fragment_source(body);
        validate_fragment(&wrapped).with_context(|| format!("shader '{label}' did not compile"))?;

        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = CubePipeline::new(
            device,
            &self.layouts,
            self.context.surface_format,
            self.context.sample_count,
            label,
            wrapped,
        );
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            bail!("wgpu rejected shader '{label}': {err}");
        }

        if let Some(previous) = self.current.replace(pipeline) {
            debug!(previous = %previous.label, current = label, "replaced cube pipeline");
        }
        Ok(())
    }

    pub(crate) fn render(&mut self, frame: &FrameInput) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = self.context.surface.get_current_texture()?;

        let size = self.context.size;
        self.uniforms.set_resolution(size.width, size.height);
        self.uniforms.set_mvp(frame.mvp);
        self.uniforms.advance(frame.elapsed, frame.delta);
        self.uniforms.set_mouse(frame.cursor, frame.pressed_at);
        self.context.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        {
            let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cube pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // Until a shader compiles, only the clear colour is visible.
            if let Some(pipeline) = self.current.as_ref() {
                render_pass.set_pipeline(&pipeline.pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        self.stats.record(Instant::now(), frame.elapsed);
        Ok(())
    }
}
