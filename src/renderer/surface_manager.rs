use std::sync::Arc;
use wgpu::Adapter;
use winit::dpi;
use winit::window::Window;

pub struct SurfaceManager {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    is_surface_configured: bool,
    config: wgpu::SurfaceConfiguration,
}

impl SurfaceManager {
    pub fn new(window: Arc<Window>, surface: wgpu::Surface<'static>, adapter: &Adapter) -> Self {
        let surface_caps = surface.get_capabilities(adapter);
        // Frames are presented as-is, so prefer a linear surface: the chroma key
        // and the trail decay work on raw channel values.
        let surface_format = surface_caps.formats.iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        Self { window, surface, is_surface_configured: false, config }
    }

    pub fn window_size(&self) -> dpi::PhysicalSize<u32> {
        self.window.inner_size()
    }

    pub fn resize(&mut self, width: u32, height: u32, device: &wgpu::Device){
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(device, &self.config);
            self.is_surface_configured = true;
        }
    }

    pub fn get_window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn get_surface(&self) -> &wgpu::Surface<'static> {
        &self.surface
    }

    pub fn is_surface_configured(&self) -> bool {
        self.is_surface_configured
    }

    pub fn get_config(&self) -> &wgpu::SurfaceConfiguration {
        &self.config
    }
}
