//! Trajectory properties across seeds and stress multipliers

use smoke_predict::config::Config;
use smoke_predict::obstacle::{KinematicsParams, RandomSource, RangeWarning, Trajectory};

fn params(scale: f32) -> KinematicsParams {
    let mut config = Config::default();
    config.run.obs_rotation_max_scale = scale;
    KinematicsParams::from_config(&config.scene, &config.run)
}

#[test]
fn test_trajectory_is_deterministic_for_every_seed() {
    for seed in [0u64, 1, 10, 12345, u64::MAX] {
        let (a, wa) = Trajectory::generate(&params(1.0), 2, 60, &RandomSource::new(seed));
        let (b, wb) = Trajectory::generate(&params(1.0), 2, 60, &RandomSource::new(seed));
        assert_eq!(a, b, "seed {}", seed);
        assert_eq!(wa, wb);
    }
}

#[test]
fn test_scenes_differ_within_a_run() {
    let (traj, _) = Trajectory::generate(&params(1.0), 2, 60, &RandomSource::new(10));
    assert_ne!(traj.rotations(0), traj.rotations(1));
    assert_ne!(traj.positions(0), traj.positions(1));
}

#[test]
fn test_nominal_ranges_under_default_scale() {
    let p = params(1.0);
    for seed in 0..5 {
        let (traj, warnings) = Trajectory::generate(&p, 3, 150, &RandomSource::new(seed));
        assert!(warnings.is_empty());
        for scene in 0..3 {
            for frame in 0..150 {
                let c = traj.control(scene, frame);
                assert!(c.rotation.abs() <= p.max_obstacle_rot);
                assert!(c.position >= p.min_src_pos && c.position <= p.max_src_pos);
            }
        }
    }
}

#[test]
fn test_scaled_rotation_stays_within_scaled_bound_and_warns() {
    let scale = 10.0;
    let p = params(scale);
    let mut total_outside = 0;
    for seed in 0..8 {
        let (traj, warnings) = Trajectory::generate(&p, 2, 200, &RandomSource::new(seed));
        let mut outside = 0;
        for scene in 0..2 {
            for &r in traj.rotations(scene) {
                assert!(r.abs() <= p.max_obstacle_rot * scale + 1e-6);
                if r.abs() > p.max_obstacle_rot {
                    outside += 1;
                }
            }
        }
        let rotation_warnings = warnings
            .iter()
            .filter(|w| matches!(w, RangeWarning::Rotation { .. }))
            .count();
        assert_eq!(rotation_warnings, outside);
        total_outside += outside;
    }
    assert!(total_outside > 0, "a scale of 10 should leave the nominal range somewhere");
}

#[test]
fn test_flat_index_matches_scene_slices() {
    let (traj, _) = Trajectory::generate(&params(1.0), 3, 20, &RandomSource::new(4));
    assert_eq!(traj.index(2, 5), 45);
    assert_eq!(traj.control(2, 5).rotation, traj.rotations(2)[5]);
    assert_eq!(traj.control(1, 19).position, traj.positions(1)[19]);
}
