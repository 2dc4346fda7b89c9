use glam::Vec4;
use wgpu_profiler::GpuProfiler;

use crate::config::SimulationConfig;
use crate::error::PipelineError;
use crate::particles::billboard_geometry::BillboardGeometry;
use crate::particles::billboard_renderer::BillboardRenderer;
use crate::particles::force_field::{ForceField, ForceParams};
use crate::particles::integrator::Integrator;
use crate::particles::state_ring::StateTextureRing;
use crate::renderer::background_fader::BackgroundFader;
use crate::renderer::camera::Camera;
use crate::renderer::frame_context::FrameContext;
use crate::renderer::frame_target::FrameTarget;
use crate::renderer::wgpu_context::WgpuContext;
use crate::video::VideoFrame;

/// Everything one tick of the swarm touches, recorded into a single encoder:
/// fade, draw, integrate, capture.
pub struct ParticlePipeline {
    config: SimulationConfig,
    ring: StateTextureRing,
    force_field: ForceField,
    integrator: Integrator,
    billboards: BillboardRenderer,
    camera: Camera,
    frame_target: FrameTarget,
    fader: BackgroundFader,
}

impl ParticlePipeline {
    pub async fn new(
        wgpu_context: &WgpuContext,
        config: SimulationConfig,
        width: u32,
        height: u32,
        seed_fn: impl Fn(u32, u32) -> Vec4,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let ring = StateTextureRing::allocate(wgpu_context, config.history, config.grid_size, seed_fn).await?;
        let force_field = ForceField::new(wgpu_context, config.force);
        let integrator = Integrator::new(wgpu_context, &ring, &force_field);

        let camera = Camera::new(config.camera, wgpu_context);
        let frame_target = FrameTarget::new(wgpu_context, width, height, config.frame_format)?;

        let geometry = BillboardGeometry::random(config.grid_size, config.max_billboard_size, config.size_seed);
        let billboards = BillboardRenderer::new(
            wgpu_context,
            &ring,
            &camera,
            &geometry,
            config.frame_format,
            config.discard_threshold,
        );

        let fader = BackgroundFader::new(wgpu_context, &frame_target, config.decay);
        fader.fill(wgpu_context, config.clear_color);

        log::info!(
            "Created particle pipeline: {} particles, {} history slots, {}x{} {:?} frame",
            config.particle_count(),
            config.history,
            width,
            height,
            config.frame_format,
        );

        Ok(Self {
            config,
            ring,
            force_field,
            integrator,
            billboards,
            camera,
            frame_target,
            fader,
        })
    }

    /// Records one tick. With `integrate` off the swarm is drawn but the ring
    /// is left untouched. The caller resolves the profiler queries once the
    /// encoder holds everything for the frame.
    pub fn step(
        &mut self,
        wgpu_context: &WgpuContext,
        frame: &FrameContext,
        encoder: &mut wgpu::CommandEncoder,
        gpu_profiler: &mut GpuProfiler,
        integrate: bool,
    ) {
        self.camera.update(wgpu_context, frame);

        {
            let mut scope = gpu_profiler.scope("Background fade", encoder);
            self.fader.fade(&mut scope, &self.frame_target);
        }
        {
            // Drawn before integration so the slot still holds a completed state.
            let mut scope = gpu_profiler.scope("Billboard pass", encoder);
            self.billboards.render(&mut scope, &self.frame_target, &self.camera, self.ring.write_slot(frame.tick));
        }
        if integrate {
            let mut scope = gpu_profiler.scope("Verlet integration", encoder);
            self.integrator.step(&mut scope, &self.ring, frame.tick);
        }
        {
            let mut scope = gpu_profiler.scope("Background capture", encoder);
            self.fader.capture(&mut scope, &self.frame_target);
        }
    }

    /// Recreates the frame target and the background at the new viewport size.
    pub fn resize(&mut self, wgpu_context: &WgpuContext, width: u32, height: u32) -> Result<(), PipelineError> {
        self.frame_target = FrameTarget::new(wgpu_context, width, height, self.config.frame_format)?;
        self.fader.resize(wgpu_context, &self.frame_target);
        self.fader.fill(wgpu_context, self.config.clear_color);
        log::debug!("Resized frame target to {width}x{height}");
        Ok(())
    }

    /// Restarts the swarm at rest from `seed_fn`.
    pub fn reseed(&self, wgpu_context: &WgpuContext, seed_fn: impl Fn(u32, u32) -> Vec4) {
        self.ring.reseed(wgpu_context, seed_fn);
        log::debug!("Reseeded {} state slots", self.ring.history());
    }

    pub fn update_video(&mut self, wgpu_context: &WgpuContext, frame: &VideoFrame) {
        self.billboards.update_video(wgpu_context, frame);
    }

    pub fn set_force_params(&mut self, wgpu_context: &WgpuContext, params: ForceParams) {
        self.force_field.set_params(wgpu_context, params);
        self.config.force = params;
    }

    /// Sets the trail decay, clamped to [0, 1]. Returns the value in use.
    pub fn set_decay(&mut self, wgpu_context: &WgpuContext, decay: f32) -> f32 {
        let decay = decay.clamp(0.0, 1.0);
        self.fader.set_decay(wgpu_context, decay);
        self.config.decay = decay;
        decay
    }

    /// Sets the chroma-key threshold, clamped to [0, 1]. Returns the value in use.
    pub fn set_discard_threshold(&mut self, wgpu_context: &WgpuContext, discard_threshold: f32) -> f32 {
        let discard_threshold = discard_threshold.clamp(0.0, 1.0);
        self.billboards.set_discard_threshold(wgpu_context, discard_threshold);
        self.config.discard_threshold = discard_threshold;
        discard_threshold
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn ring(&self) -> &StateTextureRing {
        &self.ring
    }

    pub fn force_field(&self) -> &ForceField {
        &self.force_field
    }

    pub fn frame_target(&self) -> &FrameTarget {
        &self.frame_target
    }

    pub fn fader(&self) -> &BackgroundFader {
        &self.fader
    }
}
