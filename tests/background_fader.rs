use glam::Vec4;
use verlet_swarm::renderer::background_fader::BackgroundFader;
use verlet_swarm::renderer::frame_target::FrameTarget;
use verlet_swarm::renderer::wgpu_context::WgpuContext;

mod common;

use common::{FRAME_FORMAT, download_frame, to_half};

fn fade_and_capture(wgpu_context: &WgpuContext, fader: &BackgroundFader, frame_target: &FrameTarget, ticks: u32) {
    for _ in 0..ticks {
        let mut encoder = wgpu_context.get_device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Test Fade Encoder"),
        });
        fader.fade(&mut encoder, frame_target);
        fader.capture(&mut encoder, frame_target);
        wgpu_context.get_queue().submit([encoder.finish()]);
    }
}

#[test]
fn background_decays_geometrically() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let frame_target = FrameTarget::new(wgpu_context, 4, 4, FRAME_FORMAT).unwrap();
    let fader = BackgroundFader::new(wgpu_context, &frame_target, 0.99);
    fader.fill(wgpu_context, wgpu::Color { r: 1.0, g: 0.5, b: 0.25, a: 1.0 });

    let ticks = 50;
    fade_and_capture(wgpu_context, &fader, &frame_target, ticks);

    // Every tick the product is stored back at half precision.
    let mut expected = Vec4::new(1.0, 0.5, 0.25, 1.0);
    for _ in 0..ticks {
        expected = (expected.truncate() * 0.99).map(to_half).extend(1.0);
    }
    let exact = Vec4::new(1.0, 0.5, 0.25, 0.0) * 0.99f32.powi(ticks as i32);
    assert!(expected.truncate().abs_diff_eq(exact.truncate(), 1e-2));

    let background = download_frame(wgpu_context, fader.accumulator());
    let frame = download_frame(wgpu_context, frame_target.color());
    assert_eq!(background.len(), 16);
    for (pixel, shown) in background.iter().zip(&frame) {
        assert!(pixel.abs_diff_eq(expected, 1e-2), "expected {expected:?}, got {pixel:?}");
        assert_eq!(pixel.w, 1.0);
        assert_eq!(pixel, shown);
    }
}

#[test]
fn unit_decay_keeps_the_background() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let frame_target = FrameTarget::new(wgpu_context, 3, 2, FRAME_FORMAT).unwrap();
    let fader = BackgroundFader::new(wgpu_context, &frame_target, 0.5);
    fader.set_decay(wgpu_context, 1.0);
    fader.fill(wgpu_context, wgpu::Color { r: 0.2, g: 0.4, b: 0.6, a: 1.0 });

    fade_and_capture(wgpu_context, &fader, &frame_target, 10);

    let background = download_frame(wgpu_context, fader.accumulator());
    let expected = Vec4::new(to_half(0.2), to_half(0.4), to_half(0.6), 1.0);
    for pixel in background {
        assert!(pixel.abs_diff_eq(expected, 1e-3), "{pixel:?}");
    }
}

#[test]
fn zero_decay_clears_to_black_with_opaque_alpha() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let frame_target = FrameTarget::new(wgpu_context, 2, 2, FRAME_FORMAT).unwrap();
    let fader = BackgroundFader::new(wgpu_context, &frame_target, 0.0);
    fader.fill(wgpu_context, wgpu::Color { r: 1.0, g: 1.0, b: 1.0, a: 0.0 });

    fade_and_capture(wgpu_context, &fader, &frame_target, 1);

    let frame = download_frame(wgpu_context, frame_target.color());
    for pixel in frame {
        assert_eq!(pixel, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }
}

#[test]
fn resize_follows_the_frame_target() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let frame_target = FrameTarget::new(wgpu_context, 2, 2, FRAME_FORMAT).unwrap();
    let mut fader = BackgroundFader::new(wgpu_context, &frame_target, 0.99);

    let resized = FrameTarget::new(wgpu_context, 7, 5, FRAME_FORMAT).unwrap();
    fader.resize(wgpu_context, &resized);
    fade_and_capture(wgpu_context, &fader, &resized, 2);

    assert_eq!(fader.accumulator().width(), 7);
    assert_eq!(fader.accumulator().height(), 5);
    let background = download_frame(wgpu_context, fader.accumulator());
    assert!(background.iter().all(|pixel| *pixel == Vec4::new(0.0, 0.0, 0.0, 1.0)));
}

#[test]
fn empty_frame_target_is_rejected() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    assert!(FrameTarget::new(wgpu_context, 0, 4, FRAME_FORMAT).is_err());
}
