use glam::{Vec3, Vec4};
use verlet_swarm::particles::force_field::{ForceParams, ForceProbe};
use verlet_swarm::particles::state_ring::{seed_texels, sphere_seed};

mod common;
use common::{assert_close, TestSwarm};

// Lattice positions of the 2×2 cold start case, in texel order.
const COLD_START: [Vec3; 4] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(-1.0, 0.0, 0.0),
];

fn cold_start_seed(i: u32, j: u32) -> Vec4 {
    COLD_START[(j * 2 + i) as usize].extend(1.0)
}

#[test]
fn particle_at_rest_without_force_stays_put() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let swarm = TestSwarm::on_sphere(wgpu_context, 8, ForceParams::zero());
    swarm.run(wgpu_context, 0..1);

    let seed = seed_texels(8, sphere_seed(8));
    assert_eq!(swarm.ring.download(wgpu_context, 0).unwrap(), seed);
}

#[test]
fn zero_force_does_not_drift_over_a_hundred_ticks() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let swarm = TestSwarm::on_sphere(wgpu_context, 16, ForceParams::zero());
    swarm.run(wgpu_context, 0..100);

    let seed = seed_texels(16, sphere_seed(16));
    for slot in 0..3 {
        assert_eq!(swarm.ring.download(wgpu_context, slot).unwrap(), seed, "slot {slot}");
    }
}

#[test]
fn cold_start_moves_by_one_force_step() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let swarm = TestSwarm::new(wgpu_context, 2, ForceParams::default(), cold_start_seed);
    let probe = ForceProbe::new(wgpu_context);
    let seed_forces = probe.evaluate(wgpu_context, &swarm.force_field, &COLD_START).unwrap();

    swarm.run(wgpu_context, 0..1);
    let after_tick_0 = swarm.positions(wgpu_context, 0);
    for (index, position) in after_tick_0.iter().enumerate() {
        assert_close(*position, COLD_START[index] + seed_forces[index], 1e-6);
    }

    // Tick 1 writes slot 1, so slot 0 keeps the first update.
    swarm.run(wgpu_context, 1..2);
    assert_eq!(swarm.positions(wgpu_context, 0), after_tick_0);

    let forces = probe.evaluate(wgpu_context, &swarm.force_field, &after_tick_0).unwrap();
    let after_tick_1 = swarm.positions(wgpu_context, 1);
    for index in 0..COLD_START.len() {
        let expected = 2.0 * after_tick_0[index] - COLD_START[index] + forces[index];
        assert_close(after_tick_1[index], expected, 1e-6);
    }
}

#[test]
fn step_only_writes_its_own_slot() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let n = 4;
    let swarm = TestSwarm::on_sphere(wgpu_context, n, ForceParams::default());
    let staged: Vec<Vec<Vec4>> = (0..3)
        .map(|slot| seed_texels(n, |i, j| Vec4::new(i as f32, j as f32, slot as f32, 1.0)))
        .collect();
    for (slot, texels) in staged.iter().enumerate() {
        swarm.ring.write_slot_texels(wgpu_context, slot, texels);
    }

    // Tick 3 reads slots 2 and 1 and writes slot 0.
    swarm.run(wgpu_context, 3..4);

    assert_eq!(swarm.ring.download(wgpu_context, 1).unwrap(), staged[1]);
    assert_eq!(swarm.ring.download(wgpu_context, 2).unwrap(), staged[2]);
    assert_ne!(swarm.ring.download(wgpu_context, 0).unwrap(), staged[0]);
}

#[test]
fn constant_velocity_is_preserved_without_force() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let swarm = TestSwarm::on_sphere(wgpu_context, 2, ForceParams::zero());
    let older = seed_texels(2, |_, _| Vec4::new(0.0, 0.0, 0.0, 1.0));
    let previous = seed_texels(2, |_, _| Vec4::new(0.25, 0.5, -0.5, 1.0));
    // Tick 0 reads slot 2 as the previous state and slot 1 as the older one.
    swarm.ring.write_slot_texels(wgpu_context, 2, &previous);
    swarm.ring.write_slot_texels(wgpu_context, 1, &older);

    swarm.run(wgpu_context, 0..1);

    for position in swarm.positions(wgpu_context, 0) {
        assert_eq!(position, Vec3::new(0.5, 1.0, -1.0));
    }
}

#[test]
fn force_is_deterministic() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let swarm = TestSwarm::on_sphere(wgpu_context, 2, ForceParams::default());
    let probe = ForceProbe::new(wgpu_context);
    let points: Vec<Vec3> = seed_texels(8, sphere_seed(8)).iter().map(|p| p.truncate() * 1.5).collect();

    let first = probe.evaluate(wgpu_context, &swarm.force_field, &points).unwrap();
    let second = probe.evaluate(wgpu_context, &swarm.force_field, &points).unwrap();
    assert_eq!(first, second);
    assert!(first.iter().all(|f| f.is_finite()));
}

#[test]
fn zero_strengths_give_exactly_zero_force() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let swarm = TestSwarm::on_sphere(wgpu_context, 2, ForceParams::zero());
    let probe = ForceProbe::new(wgpu_context);
    let points = [Vec3::ZERO, Vec3::new(3.0, -2.0, 0.5), Vec3::new(0.0, 0.0, 1.0)];

    for force in probe.evaluate(wgpu_context, &swarm.force_field, &points).unwrap() {
        assert_eq!(force, Vec3::ZERO);
    }
}

#[test]
fn centering_pulls_towards_the_unit_sphere() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let params = ForceParams { curl_strength: 0.0, ..Default::default() };
    let swarm = TestSwarm::on_sphere(wgpu_context, 2, params);
    let probe = ForceProbe::new(wgpu_context);
    let points = [Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0)];

    let forces = probe.evaluate(wgpu_context, &swarm.force_field, &points).unwrap();
    let strength = params.centering_strength;
    assert_close(forces[0], Vec3::new(-strength, 0.0, 0.0), 1e-9);
    assert_close(forces[1], Vec3::new(0.0, 0.5 * strength, 0.0), 1e-9);
}

#[test]
fn curl_term_has_the_configured_magnitude() {
    let setup = pollster::block_on(common::setup());
    let wgpu_context = &setup.wgpu_context;

    let params = ForceParams { centering_strength: 0.0, ..Default::default() };
    let swarm = TestSwarm::on_sphere(wgpu_context, 2, params);
    let probe = ForceProbe::new(wgpu_context);
    let points = [Vec3::new(0.3, 0.7, -0.2), Vec3::new(1.1, -0.4, 0.9)];

    for force in probe.evaluate(wgpu_context, &swarm.force_field, &points).unwrap() {
        // The curl is normalized before scaling.
        assert!((force.length() - params.curl_strength).abs() < 1e-8, "{force:?}");
    }
}
