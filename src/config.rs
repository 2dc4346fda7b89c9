use crate::error::PipelineError;
use crate::particles::force_field::ForceParams;
use crate::renderer::camera::CameraConfig;

/// Tunable constants of the swarm.
///
/// `Default` reproduces the tuned look: a 32×32 lattice, three history slots,
/// a 0.99 trail decay and a 0.8 chroma-key threshold.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Lattice side length N. The swarm has N² particles.
    pub grid_size: u32,
    /// Number of state textures kept in the ring (T).
    pub history: u32,
    pub force: ForceParams,
    /// Billboard half sizes are drawn from `[0, max_billboard_size)`.
    pub max_billboard_size: f32,
    /// Fixes the billboard sizes when set, otherwise they come from the thread rng.
    pub size_seed: Option<u64>,
    /// Per-tick multiplier applied to the previous frame.
    pub decay: f32,
    /// Fragments whose smallest color channel reaches this value are discarded.
    pub discard_threshold: f32,
    pub camera: CameraConfig,
    /// Format of the offscreen frame target and the background accumulator.
    pub frame_format: wgpu::TextureFormat,
    pub clear_color: wgpu::Color,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 32,
            history: 3,
            force: ForceParams::default(),
            max_billboard_size: 0.125,
            size_seed: None,
            decay: 0.99,
            discard_threshold: 0.8,
            camera: CameraConfig::default(),
            frame_format: wgpu::TextureFormat::Rgba16Float,
            clear_color: wgpu::Color::BLACK,
        }
    }
}

impl SimulationConfig {
    pub fn particle_count(&self) -> u32 {
        self.grid_size * self.grid_size
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.grid_size == 0 {
            return Err(PipelineError::InvalidConfig("grid size must be at least 1".into()));
        }
        // The write slot of a tick must differ from both slots it reads.
        if self.history < 3 {
            return Err(PipelineError::InvalidConfig(format!(
                "history must hold at least 3 states, got {}",
                self.history
            )));
        }
        if !(self.max_billboard_size >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "billboard size bound must be non-negative, got {}",
                self.max_billboard_size
            )));
        }
        if !(self.force.curl_epsilon > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "curl epsilon must be positive, got {}",
                self.force.curl_epsilon
            )));
        }
        if !(0.0..=1.0).contains(&self.decay) {
            return Err(PipelineError::InvalidConfig(format!(
                "decay must lie in [0, 1], got {}",
                self.decay
            )));
        }
        Ok(())
    }
}
