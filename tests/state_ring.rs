use glam::Vec4;
use verlet_swarm::error::PipelineError;
use verlet_swarm::particles::state_ring::{read_slot, seed_texels, sphere_seed, write_slot, StateTextureRing};

mod common;

#[test]
fn write_slot_never_aliases_read_slots() {
    for history in 3..6 {
        for tick in 0..1000 {
            let write = write_slot(tick, history);
            assert_ne!(write, read_slot(tick, 1, history), "tick {tick}, history {history}");
            assert_ne!(write, read_slot(tick, 2, history), "tick {tick}, history {history}");
            assert_ne!(read_slot(tick, 1, history), read_slot(tick, 2, history));
        }
    }
}

#[test]
fn slots_follow_the_tick() {
    assert_eq!(write_slot(0, 3), 0);
    assert_eq!(write_slot(4, 3), 1);
    // Tick 0 wraps around to the end of the ring.
    assert_eq!(read_slot(0, 1, 3), 2);
    assert_eq!(read_slot(0, 2, 3), 1);
    assert_eq!(read_slot(7, 1, 3), 0);
    assert_eq!(read_slot(7, 2, 3), 2);
}

#[test]
fn state_written_at_a_tick_is_read_on_the_next() {
    for tick in 0..50 {
        assert_eq!(write_slot(tick, 3), read_slot(tick + 1, 1, 3));
        assert_eq!(write_slot(tick, 3), read_slot(tick + 2, 2, 3));
    }
}

#[test]
#[cfg(debug_assertions)]
#[should_panic]
fn read_offset_must_stay_inside_the_ring() {
    read_slot(5, 3, 3);
}

#[test]
fn sphere_seed_lies_on_the_unit_sphere() {
    let n = 16;
    for texel in seed_texels(n, sphere_seed(n)) {
        assert!((texel.truncate().length() - 1.0).abs() < 1e-5, "{texel:?}");
        assert_eq!(texel.w, 1.0);
    }
}

#[test]
fn sphere_seed_starts_at_the_x_axis() {
    let seed = sphere_seed(8);
    assert!(seed(0, 0).abs_diff_eq(Vec4::new(1.0, 0.0, 0.0, 1.0), 1e-6));
    // θ = π/2 rotates towards +y.
    assert!(seed(2, 0).abs_diff_eq(Vec4::new(0.0, 1.0, 0.0, 1.0), 1e-6));
    // φ = π/2 lifts to the +z pole.
    assert!(seed(0, 2).abs_diff_eq(Vec4::new(0.0, 0.0, 1.0, 1.0), 1e-6));
}

#[test]
fn texels_are_laid_out_by_row() {
    let texels = seed_texels(3, |i, j| Vec4::new(i as f32, j as f32, 0.0, 1.0));
    assert_eq!(texels.len(), 9);
    // Texel index is j * N + i.
    assert_eq!(texels[1], Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(texels[3], Vec4::new(0.0, 1.0, 0.0, 1.0));
    assert_eq!(texels[8], Vec4::new(2.0, 2.0, 0.0, 1.0));
}

#[test]
fn allocated_slots_hold_the_seed() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let n = 5;
    let ring = pollster::block_on(StateTextureRing::allocate(wgpu_context, 4, n, sphere_seed(n))).unwrap();
    let expected = seed_texels(n, sphere_seed(n));

    assert_eq!(ring.history(), 4);
    for slot in 0..ring.history() as usize {
        assert_eq!(ring.download(wgpu_context, slot).unwrap(), expected, "slot {slot}");
    }
}

#[test]
fn reseed_restores_every_slot() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let n = 4;
    let ring = pollster::block_on(StateTextureRing::allocate(wgpu_context, 3, n, sphere_seed(n))).unwrap();
    ring.write_slot_texels(wgpu_context, 1, &[Vec4::new(9.0, 9.0, 9.0, 1.0); 16]);
    ring.reseed(wgpu_context, sphere_seed(n));

    let expected = seed_texels(n, sphere_seed(n));
    for slot in 0..3 {
        assert_eq!(ring.download(wgpu_context, slot).unwrap(), expected);
    }
}

#[test]
fn short_ring_is_rejected() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let result = pollster::block_on(StateTextureRing::allocate(wgpu_context, 2, 4, sphere_seed(4)));
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));

    let result = pollster::block_on(StateTextureRing::allocate(wgpu_context, 3, 0, sphere_seed(1)));
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
}
