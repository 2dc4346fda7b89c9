use crate::error::PipelineError;
use crate::renderer::wgpu_context::WgpuContext;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Offscreen color and depth the swarm is drawn into. The color is later
/// copied into the background accumulator and presented on the surface.
pub struct FrameTarget {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl FrameTarget {
    pub fn new(wgpu_context: &WgpuContext, width: u32, height: u32, format: wgpu::TextureFormat) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidConfig(format!("frame target of {width}x{height}")));
        }
        WgpuContext::require_format_usages(
            wgpu_context.get_adapter(),
            format,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            "rendering",
        )?;

        let device = wgpu_context.get_device();
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self { color, color_view, depth_view })
    }

    pub fn color(&self) -> &wgpu::Texture {
        &self.color
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.color.format()
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }
}
