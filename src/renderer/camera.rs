use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::renderer::frame_context::FrameContext;
use crate::renderer::wgpu_context::WgpuContext;

/// Orbit and lens parameters of the swarm camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Eye x = `orbit_radius_x * cos(t)`.
    pub orbit_radius_x: f32,
    /// Eye z = `orbit_radius_z * sin(t)`.
    pub orbit_radius_z: f32,
    /// Orbit angle advanced per tick, in radians.
    pub orbit_rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y: std::f32::consts::FRAC_PI_4,
            near: 0.125,
            far: 1000.0,
            orbit_radius_x: 5.0,
            orbit_radius_z: 10.0,
            orbit_rate: 0.001,
        }
    }
}

/// Derives the camera matrices from the frame context. Holds no state
/// besides its configuration, so the same tick always gives the same view.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraController {
    config: CameraConfig,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    pub fn projection(&self, viewport_width: u32, viewport_height: u32) -> Mat4 {
        let aspect = viewport_width as f32 / viewport_height.max(1) as f32;
        Mat4::perspective_rh(self.config.fov_y, aspect, self.config.near, self.config.far)
    }

    pub fn eye(&self, tick: u64) -> Vec3 {
        let t = tick as f32 * self.config.orbit_rate;
        Vec3::new(
            self.config.orbit_radius_x * t.cos(),
            0.0,
            self.config.orbit_radius_z * t.sin(),
        )
    }

    pub fn view(&self, tick: u64) -> Mat4 {
        Mat4::look_at_rh(self.eye(tick), Vec3::ZERO, Vec3::Y)
    }

    pub fn uniform(&self, frame: &FrameContext) -> CameraUniform {
        CameraUniform::new(
            &self.view(frame.tick),
            &self.projection(frame.viewport_width, frame.viewport_height),
        )
    }
}

#[repr(C)]
// `bytemuck` is used to easily convert the struct to a byte slice for the GPU buffer.
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // The billboard offset is applied between the two, so they stay separate.
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view: &Mat4, projection: &Mat4) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection)
    }
}

/// GPU side of the camera: the uniform buffer and its bind group.
pub struct Camera {
    controller: CameraController,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    camera_bind_group_layout: wgpu::BindGroupLayout,
}

impl Camera {
    pub fn new(config: CameraConfig, wgpu_context: &WgpuContext) -> Self {
        let camera_uniform = CameraUniform::new(&Mat4::IDENTITY, &Mat4::IDENTITY);

        let camera_buffer = wgpu_context.get_device().create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                // COPY_DST allows us to update the buffer every tick.
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }
        );

        let camera_bind_group_layout = wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    // Only the billboard vertex stage needs the matrices.
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }
            ],
            label: Some("Camera Bind Group Layout"),
        });

        let camera_bind_group = wgpu_context.get_device().create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }
            ],
            label: Some("Camera Bind Group"),
        });

        Self {
            controller: CameraController::new(config),
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            camera_bind_group_layout,
        }
    }

    /// Recomputes the matrices for this frame and uploads them.
    pub fn update(&mut self, wgpu_context: &WgpuContext, frame: &FrameContext) {
        self.set_uniform(wgpu_context, self.controller.uniform(frame));
    }

    /// Overrides the matrices, bypassing the orbit.
    pub fn set_uniform(&mut self, wgpu_context: &WgpuContext, camera_uniform: CameraUniform) {
        self.camera_uniform = camera_uniform;
        wgpu_context.get_queue().write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
    }

    pub fn binding_group(&self) -> &wgpu::BindGroup {
        &self.camera_bind_group
    }

    pub fn camera_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.camera_bind_group_layout
    }
}
