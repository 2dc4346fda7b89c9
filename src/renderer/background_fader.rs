use crate::renderer::frame_target::FrameTarget;
use crate::renderer::fullscreen_pass::FullscreenPass;
use crate::renderer::wgpu_context::WgpuContext;

/// Motion trail: every tick the previous frame is redrawn darkened by
/// `decay`, then the finished frame is captured for the next tick.
pub struct BackgroundFader {
    fade_pass: FullscreenPass,
    accumulator: wgpu::Texture,
    accumulator_view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl BackgroundFader {
    pub fn new(wgpu_context: &WgpuContext, frame_target: &FrameTarget, decay: f32) -> Self {
        let fade_pass = FullscreenPass::new(wgpu_context, "Background Fade", frame_target.format(), decay);
        let (accumulator, accumulator_view) = Self::create_accumulator(wgpu_context, frame_target);
        let bind_group = fade_pass.bind(wgpu_context, &accumulator_view);

        Self {
            fade_pass,
            accumulator,
            accumulator_view,
            bind_group,
        }
    }

    fn create_accumulator(wgpu_context: &WgpuContext, frame_target: &FrameTarget) -> (wgpu::Texture, wgpu::TextureView) {
        let accumulator = wgpu_context.get_device().create_texture(&wgpu::TextureDescriptor {
            label: Some("Background Accumulator"),
            size: frame_target.color().size(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: frame_target.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let accumulator_view = accumulator.create_view(&wgpu::TextureViewDescriptor::default());
        (accumulator, accumulator_view)
    }

    /// Follows a recreated frame target. The trail restarts from black.
    pub fn resize(&mut self, wgpu_context: &WgpuContext, frame_target: &FrameTarget) {
        let (accumulator, accumulator_view) = Self::create_accumulator(wgpu_context, frame_target);
        self.bind_group = self.fade_pass.bind(wgpu_context, &accumulator_view);
        self.accumulator = accumulator;
        self.accumulator_view = accumulator_view;
    }

    /// Writes `accumulator.rgb * decay` (alpha 1) over the whole frame target.
    pub fn fade(&self, encoder: &mut wgpu::CommandEncoder, frame_target: &FrameTarget) {
        self.fade_pass.run(encoder, frame_target.color_view(), &self.bind_group);
    }

    /// Copies the finished frame into the accumulator, to be faded next tick.
    pub fn capture(&self, encoder: &mut wgpu::CommandEncoder, frame_target: &FrameTarget) {
        encoder.copy_texture_to_texture(
            frame_target.color().as_image_copy(),
            self.accumulator.as_image_copy(),
            self.accumulator.size(),
        );
    }

    /// Sets every accumulator pixel to `color`.
    pub fn fill(&self, wgpu_context: &WgpuContext, color: wgpu::Color) {
        let mut encoder = wgpu_context.get_device().create_command_encoder(
            &wgpu::CommandEncoderDescriptor { label: Some("Background Fill Encoder") }
        );
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Background Fill"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.accumulator_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        wgpu_context.get_queue().submit(std::iter::once(encoder.finish()));
    }

    pub fn set_decay(&self, wgpu_context: &WgpuContext, decay: f32) {
        self.fade_pass.set_factor(wgpu_context, decay);
    }

    pub fn accumulator(&self) -> &wgpu::Texture {
        &self.accumulator
    }
}
