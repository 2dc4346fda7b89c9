use std::sync::Arc;
use glam::UVec2;
use wgpu::Adapter;
use winit::window::Window;

use crate::error::PipelineError;
use crate::particles::state_ring::STATE_FORMAT;
use crate::renderer::surface_manager::SurfaceManager;

pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_manager: Option<SurfaceManager>,
    adapter: Adapter,
}

impl WgpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, PipelineError> {
        // The instance is a handle to our GPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions{
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            }).await?;
        log::info!("Using adapter {:?}", adapter.get_info());

        let limits = WgpuContext::get_limits(&adapter);
        Self::check_compute_support(adapter.get_downlevel_capabilities().flags, &limits)?;
        Self::check_state_format_support(&adapter)?;

        let surface_manager = Some(SurfaceManager::new(window, surface, &adapter));

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor{
                label: Some("Swarm Device"),
                required_features: Self::get_optional_features(&adapter),
                required_limits: limits,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            }).await?;

        Ok(Self {
            device,
            queue,
            surface_manager,
            adapter,
        })
    }

    pub async fn new_for_test() -> Result<Self, PipelineError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None, // <-- NO SURFACE
                force_fallback_adapter: false,
            })
            .await?;

        let limits = WgpuContext::get_limits(&adapter);
        Self::check_compute_support(adapter.get_downlevel_capabilities().flags, &limits)?;
        Self::check_state_format_support(&adapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Test Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                    ..Default::default()
                },
            )
            .await?;

        Ok(Self {
            device,
            queue,
            surface_manager: None,
            adapter,
        })
    }

    fn get_limits(adapter: &Adapter) -> wgpu::Limits {
        if cfg!(target_arch = "wasm32") {
            // When on web, request the browser's supported limits
            wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
        } else {
            // For native, use the adapter's reported limits
            adapter.limits()
        }
    }

    /// Timestamp queries are only used for profiling, so ask for them when offered.
    fn get_optional_features(adapter: &Adapter) -> wgpu::Features {
        adapter.features() & (wgpu::Features::TIMESTAMP_QUERY | wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS)
    }

    /// The integrator is a compute pass writing one storage texture. WebGL2
    /// offers neither.
    pub fn check_compute_support(flags: wgpu::DownlevelFlags, limits: &wgpu::Limits) -> Result<(), PipelineError> {
        if !flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
            return Err(PipelineError::MissingDownlevelCapability("compute shaders"));
        }
        if limits.max_storage_textures_per_shader_stage < 1 {
            return Err(PipelineError::MissingDownlevelCapability("storage textures"));
        }
        Ok(())
    }

    /// The simulation state lives in float textures that are written from a
    /// compute pass and fetched from the vertex stage.
    fn check_state_format_support(adapter: &Adapter) -> Result<(), PipelineError> {
        Self::require_format_usages(
            adapter,
            STATE_FORMAT,
            wgpu::TextureUsages::STORAGE_BINDING,
            "storage writes",
        )?;
        Self::require_format_usages(
            adapter,
            STATE_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING,
            "sampling",
        )
    }

    pub fn require_format_usages(
        adapter: &Adapter,
        format: wgpu::TextureFormat,
        usages: wgpu::TextureUsages,
        missing: &'static str,
    ) -> Result<(), PipelineError> {
        let features = adapter.get_texture_format_features(format);
        if features.allowed_usages.contains(usages) {
            Ok(())
        } else {
            Err(PipelineError::UnsupportedCapability { format, missing })
        }
    }

    pub fn window_size(&self) -> UVec2 {
        match &self.surface_manager {
            Some(surface_manager) => {
                let size = surface_manager.window_size();
                UVec2::new(size.width, size.height)
            }
            None => UVec2::ZERO,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_manager.as_mut().expect("No surface in this context").resize(width, height, &self.device);
    }

    pub fn get_window(&self) -> &Arc<Window> {
        self.surface_manager.as_ref().expect("No surface in this context").get_window()
    }

    pub fn get_surface(&self) -> &wgpu::Surface<'static> {
        self.surface_manager.as_ref().expect("No surface manager in this context").get_surface()
    }

    pub fn is_surface_configured(&self) -> bool {
        self.surface_manager.as_ref().is_some_and(|surface_manager| surface_manager.is_surface_configured())
    }

    pub fn get_device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn get_queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn get_adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn get_surface_config(&self) -> &wgpu::SurfaceConfiguration{
        self.surface_manager.as_ref().expect("No surface in this context").get_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webgl2_cannot_run_the_integrator() {
        let result = WgpuContext::check_compute_support(
            wgpu::DownlevelFlags::empty(),
            &wgpu::Limits::downlevel_webgl2_defaults(),
        );
        assert!(matches!(result, Err(PipelineError::MissingDownlevelCapability("compute shaders"))));
    }

    #[test]
    fn storage_textures_are_required() {
        let result = WgpuContext::check_compute_support(
            wgpu::DownlevelFlags::all(),
            &wgpu::Limits::downlevel_webgl2_defaults(),
        );
        assert!(matches!(result, Err(PipelineError::MissingDownlevelCapability("storage textures"))));
    }

    #[test]
    fn default_limits_run_the_integrator() {
        assert!(WgpuContext::check_compute_support(wgpu::DownlevelFlags::all(), &wgpu::Limits::default()).is_ok());
    }
}
