use glam::{Vec3, Vec4};
use wgpu::util::DeviceExt;
use wgpu::BufferAsyncError;

use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::compute_shader::ComputeShader;
use crate::utils::gpu_buffer::GpuBuffer;

const FORCE_FIELD_WGSL: &str = include_str!("force_field.wgsl");

const PROBE_WORKGROUP_SIZE: (u32, u32, u32) = (64, 1, 1);

/// Strengths of the two force terms. Setting both to zero makes the field
/// vanish exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ForceParams {
    /// Scale of the divergence-free curl noise term.
    pub curl_strength: f32,
    /// Scale of the pull towards the unit sphere.
    pub centering_strength: f32,
    /// Step of the central differences taken on the noise field.
    pub curl_epsilon: f32,
    pub _padding: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            curl_strength: 1e-5,
            centering_strength: 5e-6,
            curl_epsilon: 0.1,
            _padding: 0.0,
        }
    }
}

impl ForceParams {
    pub fn zero() -> Self {
        Self {
            curl_strength: 0.0,
            centering_strength: 0.0,
            ..Default::default()
        }
    }
}

/// Builds a shader module from `entry_source` with the force field functions
/// in scope.
pub fn shader_with_force_field<'a>(label: &'a str, entry_source: &str) -> wgpu::ShaderModuleDescriptor<'a> {
    wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(format!("{FORCE_FIELD_WGSL}\n{entry_source}").into()),
    }
}

/// The acceleration field `force(p)`. Evaluated on the GPU only; this side
/// owns the parameters and the uniform buffer kernels bind them from.
pub struct ForceField {
    params: ForceParams,
    params_buffer: wgpu::Buffer,
}

impl ForceField {
    pub fn new(wgpu_context: &WgpuContext, params: ForceParams) -> Self {
        let params_buffer = wgpu_context.get_device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Force Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self { params, params_buffer }
    }

    pub fn set_params(&mut self, wgpu_context: &WgpuContext, params: ForceParams) {
        self.params = params;
        wgpu_context.get_queue().write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
    }

    pub fn params(&self) -> &ForceParams {
        &self.params
    }

    pub fn params_buffer(&self) -> &wgpu::Buffer {
        &self.params_buffer
    }
}

/// Evaluates the force field at arbitrary points with the same WGSL the
/// integrator runs.
pub struct ForceProbe {
    probe_pass: ComputeShader,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl ForceProbe {
    pub fn new(wgpu_context: &WgpuContext) -> Self {
        let bind_group_layout = Self::create_bind_group_layout(wgpu_context);
        let probe_pass = ComputeShader::new(
            wgpu_context,
            shader_with_force_field("Force Probe Shader", include_str!("force_probe.wgsl")),
            "probe_force",
            &bind_group_layout,
            PROBE_WORKGROUP_SIZE,
        );
        Self { probe_pass, bind_group_layout }
    }

    /// Returns `force(p)` for every point, blocking until the GPU is done.
    pub fn evaluate(&self, wgpu_context: &WgpuContext, force_field: &ForceField, points: &[Vec3]) -> Result<Vec<Vec3>, BufferAsyncError> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let inputs = GpuBuffer::new(
            wgpu_context,
            "Force Probe Points",
            points.iter().map(|p| p.extend(1.0)).collect(),
            wgpu::BufferUsages::STORAGE,
        );
        let mut outputs = GpuBuffer::new(
            wgpu_context,
            "Force Probe Results",
            vec![Vec4::ZERO; points.len()],
            wgpu::BufferUsages::STORAGE,
        );

        let bind_group = wgpu_context.get_device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Force Probe Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: inputs.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: outputs.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: force_field.params_buffer().as_entire_binding(),
                },
            ],
        });

        let mut encoder = wgpu_context.get_device().create_command_encoder(
            &wgpu::CommandEncoderDescriptor { label: Some("Force Probe Encoder") }
        );
        self.probe_pass.dispatch_by_items(&mut encoder, (points.len() as u32, 1, 1), &bind_group);
        wgpu_context.get_queue().submit(std::iter::once(encoder.finish()));

        let forces = outputs.download(wgpu_context)?;
        Ok(forces.iter().map(|f| f.truncate()).collect())
    }

    fn create_bind_group_layout(wgpu_context: &WgpuContext) -> wgpu::BindGroupLayout {
        wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Force Probe Bind Group Layout"),
            entries: &[
                // Binding 0: points to evaluate
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding 1: resulting accelerations
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding 2: force parameters
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
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
