use std::sync::Arc;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;
use wgpu_profiler::{GpuProfiler, GpuProfilerSettings};

use crate::config::SimulationConfig;
use crate::particles::force_field::ForceParams;
use crate::particles::particle_pipeline::ParticlePipeline;
use crate::particles::state_ring::sphere_seed;
use crate::renderer::frame_context::FrameContext;
use crate::renderer::fullscreen_pass::FullscreenPass;
use crate::renderer::wgpu_context::WgpuContext;
use crate::video::{ProceduralClip, VideoSource};

const CLIP_SIZE: u32 = 128;
const CLIP_FRAMES: u32 = 240;
const THRESHOLD_STEP: f32 = 0.05;
const DECAY_STEP: f32 = 0.005;

// Drives the swarm: one tick per redraw, then the frame target is presented.
pub struct State {
    wgpu_context: WgpuContext,
    pipeline: ParticlePipeline,
    presenter: FullscreenPass,
    present_bind_group: wgpu::BindGroup,
    gpu_profiler: GpuProfiler,
    video: Box<dyn VideoSource>,
    frame: FrameContext,
    paused: bool,
    // Force restored when the field is switched back on.
    force: ForceParams,
    force_enabled: bool,
}

impl State {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let mut wgpu_context = WgpuContext::new(window).await?;
        let size = wgpu_context.window_size();
        wgpu_context.resize(size.x, size.y);

        // The canvas may still be zero-sized on the web; the first resize fixes it.
        let (width, height) = (size.x.max(1), size.y.max(1));
        let config = SimulationConfig::default();
        let pipeline = ParticlePipeline::new(
            &wgpu_context,
            config,
            width,
            height,
            sphere_seed(config.grid_size),
        ).await?;

        let presenter = FullscreenPass::new(&wgpu_context, "Present", wgpu_context.get_surface_config().format, 1.0);
        let present_bind_group = presenter.bind(&wgpu_context, pipeline.frame_target().color_view());

        let gpu_profiler = GpuProfiler::new(wgpu_context.get_device(), GpuProfilerSettings::default())?;

        Ok(Self {
            wgpu_context,
            pipeline,
            presenter,
            present_bind_group,
            gpu_profiler,
            video: Box::new(ProceduralClip::new(CLIP_SIZE, CLIP_FRAMES)),
            frame: FrameContext::new(0, width, height),
            paused: false,
            force: config.force,
            force_enabled: true,
        })
    }

    pub fn render_loop(&mut self, event: &WindowEvent, event_loop: &ActiveEventLoop){
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                match self.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = self.wgpu_context.window_size();
                        self.wgpu_context.resize(size.x, size.y);
                    }
                    Err(e) => {
                        log::error!("Unable to render: {:?}", e);
                    }
                }
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                match (code, key_state.is_pressed()) {
                    (KeyCode::Escape, true) => event_loop.exit(),
                    (KeyCode::Space, true) => {
                        self.paused = !self.paused;
                        log::info!("Simulation {}", if self.paused { "paused" } else { "resumed" });
                    }
                    (KeyCode::KeyR, true) => {
                        let grid_size = self.pipeline.config().grid_size;
                        self.pipeline.reseed(&self.wgpu_context, sphere_seed(grid_size));
                    }
                    (KeyCode::KeyF, true) => {
                        self.force_enabled = !self.force_enabled;
                        let params = if self.force_enabled { self.force } else { ForceParams::zero() };
                        self.pipeline.set_force_params(&self.wgpu_context, params);
                        log::info!("Force field {}", if self.force_enabled { "on" } else { "off" });
                    }
                    (KeyCode::ArrowUp | KeyCode::ArrowDown, true) => {
                        let step = if *code == KeyCode::ArrowUp { THRESHOLD_STEP } else { -THRESHOLD_STEP };
                        let threshold = self.pipeline.config().discard_threshold + step;
                        let threshold = self.pipeline.set_discard_threshold(&self.wgpu_context, threshold);
                        log::info!("Discard threshold {threshold:.2}");
                    }
                    (KeyCode::BracketLeft | KeyCode::BracketRight, true) => {
                        let step = if *code == KeyCode::BracketRight { DECAY_STEP } else { -DECAY_STEP };
                        let decay = self.pipeline.config().decay + step;
                        let decay = self.pipeline.set_decay(&self.wgpu_context, decay);
                        log::info!("Trail decay {decay:.3}");
                    }
                    _ => {}
                }
            },
            _ => {}
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.wgpu_context.resize(width, height);
        if let Err(e) = self.pipeline.resize(&self.wgpu_context, width, height) {
            log::error!("Unable to resize the frame target: {e}");
            return;
        }
        self.present_bind_group = self.presenter.bind(&self.wgpu_context, self.pipeline.frame_target().color_view());
        self.frame.viewport_width = width;
        self.frame.viewport_height = height;
    }

    pub fn get_window(&self) -> &Arc<Window> {
        self.wgpu_context.get_window()
    }

    pub fn window_size(&self) -> glam::UVec2 {
        self.wgpu_context.window_size()
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.wgpu_context.get_window().request_redraw();

        // We can't render unless the window is configured
        if !self.wgpu_context.is_surface_configured() {
            return Ok(());
        }
        // Nothing is simulated before the video can be shown.
        if !self.video.is_ready() {
            return Ok(());
        }

        if !self.paused {
            match self.video.next_frame() {
                Some(video_frame) => self.pipeline.update_video(&self.wgpu_context, &video_frame),
                None => log::warn!("No video frame for tick {}", self.frame.tick),
            }
        }

        let output = self.wgpu_context.get_surface().get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.wgpu_context.get_device().create_command_encoder(&wgpu::CommandEncoderDescriptor{
            label: Some("Frame Encoder"),
        });

        // Paused ticks keep fading and drawing a frozen swarm.
        self.pipeline.step(&self.wgpu_context, &self.frame, &mut encoder, &mut self.gpu_profiler, !self.paused);
        {
            let mut scope = self.gpu_profiler.scope("Present", &mut encoder);
            self.presenter.run(&mut scope, &view, &self.present_bind_group);
        }
        self.gpu_profiler.resolve_queries(&mut encoder);

        self.wgpu_context.get_queue().submit(std::iter::once(encoder.finish()));
        output.present();

        self.report_gpu_timings();
        if !self.paused {
            self.frame = self.frame.next();
        }
        Ok(())
    }

    fn report_gpu_timings(&mut self) {
        if let Err(e) = self.gpu_profiler.end_frame() {
            log::warn!("Profiler frame dropped: {e}");
            return;
        }
        let period = self.wgpu_context.get_queue().get_timestamp_period();
        if let Some(results) = self.gpu_profiler.process_finished_frame(period) {
            for result in results {
                if let Some(time) = result.time {
                    log::trace!("{}: {:.3} ms", result.label, (time.end - time.start) * 1000.0);
                }
            }
        }
    }
}
