use crate::renderer::wgpu_context::WgpuContext;
use crate::video::{VideoFrame, VideoFrameError};

const VIDEO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// The sampled texture billboards are shaded with. Starts as a 1×1 white
/// placeholder, which the chroma key discards entirely.
pub struct VideoTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl VideoTexture {
    pub fn placeholder(wgpu_context: &WgpuContext) -> Self {
        let video_texture = Self::with_size(wgpu_context, 1, 1);
        video_texture.write(wgpu_context, &VideoFrame::solid(1, 1, [255, 255, 255, 255]));
        video_texture
    }

    fn with_size(wgpu_context: &WgpuContext, width: u32, height: u32) -> Self {
        let device = wgpu_context.get_device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Video Texture"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: VIDEO_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Video Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self { texture, view, sampler }
    }

    /// Uploads `frame`. Returns true when the texture had to be recreated
    /// because the frame size changed, in which case bind groups holding the
    /// old view are stale. A malformed frame leaves the texture as it was.
    pub fn upload(&mut self, wgpu_context: &WgpuContext, frame: &VideoFrame) -> Result<bool, VideoFrameError> {
        frame.validate(wgpu_context.get_device().limits().max_texture_dimension_2d)?;
        let resized = frame.width != self.texture.width() || frame.height != self.texture.height();
        if resized {
            log::debug!("Video texture resized to {}x{}", frame.width, frame.height);
            *self = Self::with_size(wgpu_context, frame.width, frame.height);
        }
        self.write(wgpu_context, frame);
        Ok(resized)
    }

    fn write(&self, wgpu_context: &WgpuContext, frame: &VideoFrame) {
        wgpu_context.get_queue().write_texture(
            self.texture.as_image_copy(),
            &frame.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: Some(frame.height),
            },
            self.texture.size(),
        );
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}
