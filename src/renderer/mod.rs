pub mod wgpu_context;
pub mod surface_manager;
pub mod camera;
pub mod frame_context;
pub mod frame_target;
pub mod fullscreen_pass;
pub mod background_fader;
pub mod video_texture;
