//! Noise-driven obstacle trajectory
//!
//! The whole trajectory is generated once before any scene runs so the
//! physical baseline and every prediction run see the same motion, frame
//! for frame.

use std::f32::consts::PI;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::random::{RandomSource, Stream, TileableNoise};
use crate::config::{RunConfig, SceneConfig};
use crate::constants::kinematics::NOISE_OFFSET_RANGE;

/// Inputs of the trajectory generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicsParams {
    /// Nominal rotation limit, in units of π
    pub max_obstacle_rot: f32,
    pub min_src_pos: f32,
    pub max_src_pos: f32,
    pub nscale: f64,
    pub nrepeat: u32,
    /// Multiplier on the per-scene rotation maximum; values above 1 probe
    /// rotations outside the nominal range
    pub rotation_max_scale: f32,
}

impl KinematicsParams {
    pub fn from_config(scene: &SceneConfig, run: &RunConfig) -> Self {
        Self {
            max_obstacle_rot: scene.max_obstacle_rot,
            min_src_pos: scene.min_src_pos,
            max_src_pos: scene.max_src_pos,
            nscale: scene.nscale,
            nrepeat: scene.nrepeat,
            rotation_max_scale: run.obs_rotation_max_scale,
        }
    }
}

/// A kinematic value outside its nominal range
///
/// Collected and reported at the end of the run, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RangeWarning {
    Rotation { scene: usize, frame: usize, value: f32, limit: f32 },
    Position { scene: usize, frame: usize, value: f32, min: f32, max: f32 },
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeWarning::Rotation { scene, frame, value, limit } => write!(
                f,
                "rotation {} not in range [{},{}] (scene {}, frame {})",
                value, -limit, limit, scene, frame
            ),
            RangeWarning::Position { scene, frame, value, min, max } => write!(
                f,
                "position {} not in range [{},{}] (scene {}, frame {})",
                value, min, max, scene, frame
            ),
        }
    }
}

/// Normalization ranges of the two control parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRanges {
    pub min_rot: f32,
    pub max_rot: f32,
    pub min_pos: f32,
    pub max_pos: f32,
}

impl ParamRanges {
    pub fn from_config(scene: &SceneConfig) -> Self {
        Self {
            min_rot: scene.min_obstacle_rot,
            max_rot: scene.max_obstacle_rot,
            min_pos: scene.min_src_pos,
            max_pos: scene.max_src_pos,
        }
    }
}

/// Control parameters of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlParams {
    /// Rotation angle in units of π
    pub rotation: f32,
    /// Source/obstacle x position, normalized to the domain
    pub position: f32,
}

impl ControlParams {
    /// Rotation angle in radians
    pub fn angle(&self) -> f32 {
        self.rotation * PI
    }

    /// Both parameters shifted from their individual ranges to [-1, 1]
    pub fn normalized(&self, ranges: &ParamRanges) -> [f32; 2] {
        [
            (self.rotation - ranges.min_rot) / (ranges.max_rot - ranges.min_rot) * 2.0 - 1.0,
            (self.position - ranges.min_pos) / (ranges.max_pos - ranges.min_pos) * 2.0 - 1.0,
        ]
    }
}

/// Precomputed rotation and position for every (scene, frame)
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    num_frames: usize,
    rotations: Vec<f32>,
    positions: Vec<f32>,
    rotation_max: Vec<f32>,
}

impl Trajectory {
    /// Generate the trajectory of every scene
    ///
    /// Per scene, each channel gets its own noise permutation and offsets
    /// from its own stream; the rotation maximum is drawn once per scene.
    pub fn generate(
        params: &KinematicsParams,
        num_scenes: usize,
        num_frames: usize,
        random: &RandomSource,
    ) -> (Self, Vec<RangeWarning>) {
        let period = params.nrepeat as f64;
        let mut trajectory = Trajectory {
            num_frames,
            rotations: Vec::with_capacity(num_scenes * num_frames),
            positions: Vec::with_capacity(num_scenes * num_frames),
            rotation_max: Vec::with_capacity(num_scenes),
        };
        let mut warnings = Vec::new();

        for scene in 0..num_scenes {
            let mut rot_rng = random.stream(Stream::Rotation, scene);
            let rot_noise = TileableNoise::seeded(&mut rot_rng, period);
            let rot_fixed = [
                rot_rng.gen_range(0..NOISE_OFFSET_RANGE) as f64 * params.nscale,
                rot_rng.gen_range(0..NOISE_OFFSET_RANGE) as f64 * params.nscale,
            ];
            let rot_max = rot_rng.gen::<f32>() * params.max_obstacle_rot * params.rotation_max_scale;
            trajectory.rotation_max.push(rot_max);

            let mut pos_rng = random.stream(Stream::Position, scene);
            let pos_noise = TileableNoise::seeded(&mut pos_rng, period);
            let pos_fixed = [
                pos_rng.gen_range(0..NOISE_OFFSET_RANGE) as f64 * params.nscale,
                pos_rng.gen_range(0..NOISE_OFFSET_RANGE) as f64 * params.nscale,
            ];

            for frame in 0..num_frames {
                let t = frame as f64 * params.nscale;

                let rotation = rot_noise.sample(t, rot_fixed) as f32 * rot_max;
                if rotation.abs() > params.max_obstacle_rot {
                    warnings.push(RangeWarning::Rotation {
                        scene,
                        frame,
                        value: rotation,
                        limit: params.max_obstacle_rot,
                    });
                }
                trajectory.rotations.push(rotation);

                let s = (pos_noise.sample(t, pos_fixed) + 1.0) * 0.5;
                let position = (params.min_src_pos as f64 * (1.0 - s) + params.max_src_pos as f64 * s) as f32;
                if position > params.max_src_pos || position < params.min_src_pos {
                    warnings.push(RangeWarning::Position {
                        scene,
                        frame,
                        value: position,
                        min: params.min_src_pos,
                        max: params.max_src_pos,
                    });
                }
                trajectory.positions.push(position);
            }
        }

        (trajectory, warnings)
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_scenes(&self) -> usize {
        self.rotation_max.len()
    }

    /// Flat index `scene * num_frames + frame`
    pub fn index(&self, scene: usize, frame: usize) -> usize {
        scene * self.num_frames + frame
    }

    pub fn control(&self, scene: usize, frame: usize) -> ControlParams {
        let i = self.index(scene, frame);
        ControlParams {
            rotation: self.rotations[i],
            position: self.positions[i],
        }
    }

    /// Per-scene rotation maximum, in units of π
    pub fn rotation_max(&self, scene: usize) -> f32 {
        self.rotation_max[scene]
    }

    /// Rotations of one scene, in units of π
    pub fn rotations(&self, scene: usize) -> &[f32] {
        let start = self.index(scene, 0);
        &self.rotations[start..start + self.num_frames]
    }

    /// Positions of one scene
    pub fn positions(&self, scene: usize) -> &[f32] {
        let start = self.index(scene, 0);
        &self.positions[start..start + self.num_frames]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(scale: f32) -> KinematicsParams {
        KinematicsParams {
            max_obstacle_rot: 0.5,
            min_src_pos: 0.2,
            max_src_pos: 0.8,
            nscale: 0.03,
            nrepeat: 1000,
            rotation_max_scale: scale,
        }
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let (a, _) = Trajectory::generate(&params(1.0), 3, 40, &RandomSource::new(10));
        let (b, _) = Trajectory::generate(&params(1.0), 3, 40, &RandomSource::new(10));
        assert_eq!(a, b);
        let (c, _) = Trajectory::generate(&params(1.0), 3, 40, &RandomSource::new(11));
        assert_ne!(a.rotations, c.rotations);
    }

    #[test]
    fn test_default_scale_stays_in_range_without_warnings() {
        let (traj, warnings) = Trajectory::generate(&params(1.0), 4, 100, &RandomSource::new(3));
        assert!(warnings.is_empty(), "{:?}", warnings);
        for scene in 0..4 {
            assert!(traj.rotation_max(scene) <= 0.5);
            assert!(traj.rotations(scene).iter().all(|r| r.abs() <= 0.5));
            assert!(traj.positions(scene).iter().all(|p| (0.2..=0.8).contains(p)));
        }
    }

    #[test]
    fn test_large_scale_warns_instead_of_clamping() {
        let p = params(50.0);
        let (traj, warnings) = Trajectory::generate(&p, 4, 200, &RandomSource::new(5));
        let outside = (0..4)
            .flat_map(|s| traj.rotations(s).to_vec())
            .filter(|r| r.abs() > 0.5)
            .count();
        assert!(outside > 0);
        let rotation_warnings = warnings
            .iter()
            .filter(|w| matches!(w, RangeWarning::Rotation { .. }))
            .count();
        assert_eq!(rotation_warnings, outside);
        for scene in 0..4 {
            let bound = 0.5 * 50.0;
            assert!(traj.rotations(scene).iter().all(|r| r.abs() <= bound));
        }
    }

    #[test]
    fn test_normalization_maps_range_ends() {
        let ranges = ParamRanges { min_rot: -0.5, max_rot: 0.5, min_pos: 0.2, max_pos: 0.8 };
        let low = ControlParams { rotation: -0.5, position: 0.2 }.normalized(&ranges);
        let high = ControlParams { rotation: 0.5, position: 0.8 }.normalized(&ranges);
        assert_eq!(low, [-1.0, -1.0]);
        assert!((high[0] - 1.0).abs() < 1e-6 && (high[1] - 1.0).abs() < 1e-6);
    }
}
