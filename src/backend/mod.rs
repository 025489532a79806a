//! Physics engine boundary
//!
//! `FluidBackend` is every grid operation the field update step issues,
//! one blocking call per sub-step. `GridSolver` is the CPU implementation
//! over an owned `GridState`.

pub mod solver;

pub use solver::GridSolver;

use glam::Vec3;

use crate::config::OpenBoundary;
use crate::error::SimResult;
use crate::grid::{FieldArray, GridDims, SolveStats, Sphere};
use crate::obstacle::{MeshPose, ObstacleMesh, PoseTransition};

/// Grid operations consumed by the field update step and the bridge
pub trait FluidBackend {
    fn dims(&self) -> GridDims;

    /// Frames stepped since the last reset
    fn frame(&self) -> usize;

    /// Zero every field and the clock
    fn reset(&mut self);

    fn apply_source(&mut self, source: &Sphere, value: f32);

    /// Zero obstacle velocity everywhere, then pin the outer `width` ring
    fn reset_obstacle_velocity(&mut self, width: usize);

    /// Zero obstacle velocity in the outer `width` ring only
    fn pin_obstacle_velocity(&mut self, width: usize);

    /// Advect density, then self-advect velocity, both along the current velocity
    fn advect(&mut self, density_order: u8, velocity_order: u8);

    fn reset_outflow(&mut self);

    /// Solid ring of `b_width`, fluid interior, open faces as outflow
    fn init_domain(&mut self, b_width: usize, open: &OpenBoundary);

    fn clear_levelset(&mut self);

    fn compute_obstacle_velocity(&mut self, mesh: &ObstacleMesh, transition: &PoseTransition);

    fn compute_levelset(&mut self, mesh: &ObstacleMesh, pose: &MeshPose);

    /// Mark levelset-occupied cells as obstacle and refill the rest
    fn set_obstacle_flags(&mut self);

    /// Set density to `value` inside the mesh at `pose`
    fn apply_mesh_to_density(&mut self, mesh: &ObstacleMesh, pose: &MeshPose, value: f32);

    fn set_wall_bcs(&mut self);

    fn add_buoyancy(&mut self, gravity: Vec3);

    fn solve_pressure(&mut self) -> SolveStats;

    fn extrapolate_obstacle_velocity(&mut self, distance: usize);

    /// Overwrite velocity inside obstacle cells with the obstacle velocity
    fn copy_obstacle_velocity(&mut self, b_width: usize);

    fn velocity_array(&self) -> FieldArray;

    fn density_array(&self) -> FieldArray;

    fn import_velocity(&mut self, array: &FieldArray) -> SimResult<()>;

    fn import_density(&mut self, array: &FieldArray) -> SimResult<()>;

    /// Advance the clock by one frame
    fn step(&mut self);

    /// Drop transient solver state between scenes
    fn release_transients(&mut self);
}
