use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout};

use crate::particles::billboard_geometry::{BillboardGeometry, BillboardVertex};
use crate::particles::state_ring::StateTextureRing;
use crate::renderer::camera::Camera;
use crate::renderer::frame_target::{FrameTarget, DEPTH_FORMAT};
use crate::renderer::video_texture::VideoTexture;
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::bind_resources::BindResources;
use crate::utils::gpu_buffer::GpuBuffer;
use crate::video::VideoFrame;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct BillboardParams {
    discard_threshold: f32,
    _padding: [f32; 3],
}

/// Draws one camera-facing, video-textured quad per particle. Positions are
/// fetched from a state texture in the vertex stage, so the geometry never
/// changes after creation.
pub struct BillboardRenderer {
    render_pipeline: wgpu::RenderPipeline,
    vertices: GpuBuffer<BillboardVertex>,
    // One bind group per ring slot.
    position_bindings: BindResources,
    video_bind_group_layout: BindGroupLayout,
    video_bind_group: BindGroup,
    video_texture: VideoTexture,
    params_buffer: wgpu::Buffer,
}

impl BillboardRenderer {
    pub fn new(
        wgpu_context: &WgpuContext,
        ring: &StateTextureRing,
        camera: &Camera,
        geometry: &BillboardGeometry,
        frame_format: wgpu::TextureFormat,
        discard_threshold: f32,
    ) -> Self {
        let device = wgpu_context.get_device();

        let position_layout = Self::create_position_layout(wgpu_context);
        let position_groups = (0..ring.history() as usize)
            .map(|slot| Self::create_position_group(wgpu_context, &position_layout, ring, slot))
            .collect();
        let position_bindings = BindResources::new(position_layout, position_groups);

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Billboard Params"),
            contents: bytemuck::bytes_of(&BillboardParams { discard_threshold, _padding: [0.0; 3] }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let video_texture = VideoTexture::placeholder(wgpu_context);
        let video_bind_group_layout = Self::create_video_layout(wgpu_context);
        let video_bind_group = Self::create_video_group(wgpu_context, &video_bind_group_layout, &video_texture, &params_buffer);

        let render_pipeline = Self::create_pipeline(
            wgpu_context,
            &[
                camera.camera_bind_group_layout(),
                &position_bindings.bind_group_layout,
                &video_bind_group_layout,
            ],
            frame_format,
        );

        let vertices = GpuBuffer::new(
            wgpu_context,
            "Billboard Vertices",
            geometry.vertices().to_vec(),
            wgpu::BufferUsages::VERTEX,
        );

        Self {
            render_pipeline,
            vertices,
            position_bindings,
            video_bind_group_layout,
            video_bind_group,
            video_texture,
            params_buffer,
        }
    }

    fn create_pipeline(wgpu_context: &WgpuContext, bind_group_layouts: &[&BindGroupLayout], frame_format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        let shader = wgpu_context.get_device().create_shader_module(wgpu::include_wgsl!("billboard.wgsl"));
        let render_pipeline_layout = wgpu_context.get_device().create_pipeline_layout(&wgpu::PipelineLayoutDescriptor{
            label: Some("Billboard Pipeline Layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        wgpu_context.get_device().create_render_pipeline(&wgpu::RenderPipelineDescriptor{
            label: Some("Billboard Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[BillboardVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState{
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState{
                    format: frame_format,
                    // Transparency comes from discard only.
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default()
            }),
            primitive: wgpu::PrimitiveState{
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
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
            cache: None,
        })
    }

    fn create_position_layout(wgpu_context: &WgpuContext) -> BindGroupLayout {
        wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Billboard Position Layout"),
            entries: &[
                // Binding 0: state texture read in the vertex stage
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        })
    }

    fn create_position_group(wgpu_context: &WgpuContext, layout: &BindGroupLayout, ring: &StateTextureRing, slot: usize) -> BindGroup {
        wgpu_context.get_device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Billboard Positions (slot {slot})")),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(ring.slot(slot).view()),
                },
            ],
        })
    }

    fn create_video_layout(wgpu_context: &WgpuContext) -> BindGroupLayout {
        wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Billboard Video Layout"),
            entries: &[
                // Binding 0: current video frame
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Binding 1: video sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Binding 2: chroma key threshold
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        })
    }

    fn create_video_group(wgpu_context: &WgpuContext, layout: &BindGroupLayout, video_texture: &VideoTexture, params_buffer: &wgpu::Buffer) -> BindGroup {
        wgpu_context.get_device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Billboard Video Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(video_texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(video_texture.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Shows `frame` from now on.
    pub fn update_video(&mut self, wgpu_context: &WgpuContext, frame: &VideoFrame) {
        match self.video_texture.upload(wgpu_context, frame) {
            Ok(true) => {
                self.video_bind_group = Self::create_video_group(
                    wgpu_context,
                    &self.video_bind_group_layout,
                    &self.video_texture,
                    &self.params_buffer,
                );
            }
            Ok(false) => {}
            Err(e) => log::warn!("Dropping video frame: {e}"),
        }
    }

    pub fn set_discard_threshold(&self, wgpu_context: &WgpuContext, discard_threshold: f32) {
        wgpu_context.get_queue().write_buffer(
            &self.params_buffer,
            0,
            bytemuck::bytes_of(&BillboardParams { discard_threshold, _padding: [0.0; 3] }),
        );
    }

    /// Records the billboard pass onto `frame_target`, keeping its color and
    /// clearing its depth. Positions come from ring slot `position_slot`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, frame_target: &FrameTarget, camera: &Camera, position_slot: usize) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor{
            label: Some("Billboard Pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment{
                    view: frame_target.color_view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }
                })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: frame_target.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_vertex_buffer(0, self.vertices.buffer().slice(..));
        render_pass.set_bind_group(0, camera.binding_group(), &[]);
        render_pass.set_bind_group(1, self.position_bindings.bind_group(position_slot), &[]);
        render_pass.set_bind_group(2, &self.video_bind_group, &[]);
        render_pass.draw(0..self.vertices.len() as u32, 0..1);
    }
}
