//! Moving obstacle
//!
//! Scripted rigid motion of the obstacle mesh: a deterministic
//! noise-driven trajectory, the box-union mesh it moves, and the two-slot
//! pose ring the obstacle velocity is differenced from.

pub mod random;
pub mod kinematics;
pub mod mesh;
pub mod ring;

pub use random::{RandomSource, Stream, TileableNoise};
pub use kinematics::{ControlParams, KinematicsParams, ParamRanges, RangeWarning, Trajectory};
pub use mesh::{LocalBox, MeshPose, ObstacleMesh};
pub use ring::{MeshRing, PoseTransition};
