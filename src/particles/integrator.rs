use wgpu::{BindGroup, BindGroupLayout};

use crate::particles::force_field::{shader_with_force_field, ForceField};
use crate::particles::state_ring::StateTextureRing;
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::bind_resources::BindResources;
use crate::utils::compute_shader::ComputeShader;

const WORKGROUP_SIZE: (u32, u32, u32) = (8, 8, 1);

/// Advances the swarm by one Störmer–Verlet step per tick:
/// `next = 2·s0 − s1 + force(s0)`, one invocation per state texel.
pub struct Integrator {
    integration_pass: ComputeShader,
    // One bind group per write slot: reads (slot - 1), (slot - 2), writes slot.
    bind_resources: BindResources,
    grid_size: u32,
}

impl Integrator {
    pub fn new(wgpu_context: &WgpuContext, ring: &StateTextureRing, force_field: &ForceField) -> Self {
        let bind_group_layout = Self::create_bind_group_layout(wgpu_context);
        let bind_groups = Self::create_bind_groups(wgpu_context, &bind_group_layout, ring, force_field);
        let integration_pass = Self::create_integration_pass(wgpu_context, &bind_group_layout);

        Self {
            integration_pass,
            bind_resources: BindResources::new(bind_group_layout, bind_groups),
            grid_size: ring.grid_size(),
        }
    }

    /// Creates the integration kernel
    fn create_integration_pass(wgpu_context: &WgpuContext, bind_group_layout: &BindGroupLayout) -> ComputeShader {
        ComputeShader::new(
            wgpu_context,
            shader_with_force_field("Integrator Shader", include_str!("integrator.wgsl")),
            "verlet_step",
            bind_group_layout,
            WORKGROUP_SIZE,
        )
    }

    /// Records the step for `tick`: reads the two preceding ring slots and
    /// writes `ring.buffer_for_write(tick)`.
    pub fn step(&self, encoder: &mut wgpu::CommandEncoder, ring: &StateTextureRing, tick: u64) {
        let slot = ring.write_slot(tick);
        self.integration_pass.dispatch_by_items(
            encoder,
            (self.grid_size, self.grid_size, 1),
            self.bind_resources.bind_group(slot),
        );
    }

    fn create_bind_groups(wgpu_context: &WgpuContext, bind_group_layout: &BindGroupLayout, ring: &StateTextureRing, force_field: &ForceField) -> Vec<BindGroup> {
        (0..ring.history() as u64)
            .map(|tick| {
                let previous = ring.buffer_for_read(tick, 1);
                let older = ring.buffer_for_read(tick, 2);
                let next = ring.buffer_for_write(tick);
                wgpu_context.get_device().create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("Integrator Bind Group (write slot {tick})")),
                    layout: bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(previous.view()),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(older.view()),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(next.view()),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: force_field.params_buffer().as_entire_binding(),
                        },
                    ],
                })
            })
            .collect()
    }

    fn create_bind_group_layout(wgpu_context: &WgpuContext) -> BindGroupLayout {
        let state_texture = wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        };

        wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Integrator Bind Group Layout"),
            entries: &[
                // Binding 0: state at tick - 1
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: state_texture,
                    count: None,
                },
                // Binding 1: state at tick - 2
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: state_texture,
                    count: None,
                },
                // Binding 2: state being written
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: crate::particles::state_ring::STATE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                // Binding 3: force parameters
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
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
}
