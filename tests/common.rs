// Not every test file will use every function.
#![allow(dead_code)]

use glam::{Vec3, Vec4};
use verlet_swarm::particles::force_field::{ForceField, ForceParams};
use verlet_swarm::particles::integrator::Integrator;
use verlet_swarm::particles::state_ring::{StateTextureRing, sphere_seed};
use verlet_swarm::renderer::wgpu_context::WgpuContext;
use verlet_swarm::utils::readback::download_texture;

// Frame targets in tests use the production format, which is always renderable.
pub const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

// A struct to hold all the common objects for a test.
pub struct TestSetup {
    pub wgpu_context: WgpuContext,
}

// The main setup function.
pub async fn setup() -> TestSetup {
    let wgpu_context = WgpuContext::new_for_test().await.unwrap();

    TestSetup {
        wgpu_context,
    }
}

// Reads back an Rgba16Float texture as f32 texels.
pub fn download_frame(wgpu_context: &WgpuContext, texture: &wgpu::Texture) -> Vec<Vec4> {
    assert_eq!(texture.format(), FRAME_FORMAT);
    let halves: Vec<half::f16> = download_texture(wgpu_context, texture).unwrap();
    halves
        .chunks_exact(4)
        .map(|texel| Vec4::new(texel[0].to_f32(), texel[1].to_f32(), texel[2].to_f32(), texel[3].to_f32()))
        .collect()
}

// Rounds like a store into a half-float target does.
pub fn to_half(value: f32) -> f32 {
    half::f16::from_f32(value).to_f32()
}

// A ring, force field and integrator wired together the way the pipeline does it.
pub struct TestSwarm {
    pub ring: StateTextureRing,
    pub force_field: ForceField,
    pub integrator: Integrator,
}

impl TestSwarm {
    pub fn new(wgpu_context: &WgpuContext, grid_size: u32, params: ForceParams, seed_fn: impl Fn(u32, u32) -> Vec4) -> Self {
        let ring = pollster::block_on(StateTextureRing::allocate(wgpu_context, 3, grid_size, seed_fn)).unwrap();
        let force_field = ForceField::new(wgpu_context, params);
        let integrator = Integrator::new(wgpu_context, &ring, &force_field);
        Self { ring, force_field, integrator }
    }

    pub fn on_sphere(wgpu_context: &WgpuContext, grid_size: u32, params: ForceParams) -> Self {
        Self::new(wgpu_context, grid_size, params, sphere_seed(grid_size))
    }

    // Runs the integrator for every tick in `ticks`, one submission each.
    pub fn run(&self, wgpu_context: &WgpuContext, ticks: std::ops::Range<u64>) {
        for tick in ticks {
            let mut encoder = wgpu_context.get_device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Test Integration Encoder"),
            });
            self.integrator.step(&mut encoder, &self.ring, tick);
            wgpu_context.get_queue().submit([encoder.finish()]);
        }
    }

    pub fn positions(&self, wgpu_context: &WgpuContext, slot: usize) -> Vec<Vec3> {
        self.ring
            .download(wgpu_context, slot)
            .unwrap()
            .iter()
            .map(|texel| texel.truncate())
            .collect()
    }
}

pub fn assert_close(actual: Vec3, expected: Vec3, tolerance: f32) {
    assert!(
        actual.abs_diff_eq(expected, tolerance),
        "expected {expected:?}, got {actual:?} (tolerance {tolerance})"
    );
}
