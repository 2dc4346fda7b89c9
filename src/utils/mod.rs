pub mod gpu_buffer;
pub mod compute_shader;
pub mod bind_resources;
pub mod readback;
