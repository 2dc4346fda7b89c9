pub mod state_ring;
pub mod force_field;
pub mod integrator;
pub mod billboard_geometry;
pub mod billboard_renderer;
pub mod particle_pipeline;
