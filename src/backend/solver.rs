use glam::Vec3;

use super::FluidBackend;
use crate::config::{OpenBoundary, SceneConfig};
use crate::error::SimResult;
use crate::grid::advection::{advect_mac, advect_real};
use crate::grid::boundary::{add_buoyancy, copy_mac_data, reset_outflow, set_wall_bcs};
use crate::grid::extrapolation::extrapolate_mac_simple;
use crate::grid::{cell, FieldArray, GridDims, GridState, PressureSolver, SolveStats, Sphere};
use crate::obstacle::{MeshPose, ObstacleMesh, PoseTransition};

/// CPU grid backend
#[derive(Debug)]
pub struct GridSolver {
    state: GridState,
    pressure: PressureSolver,
    time_step: f32,
    frame: usize,
    unconverged: usize,
}

impl GridSolver {
    pub fn new(dims: GridDims, time_step: f32, cg_accuracy: f32, cg_max_iterations: usize) -> Self {
        log::debug!("[GridSolver] Allocating {}x{}x{} grid", dims.x, dims.y, dims.z);
        Self {
            state: GridState::new(dims),
            pressure: PressureSolver::new(cg_accuracy, cg_max_iterations),
            time_step,
            frame: 0,
            unconverged: 0,
        }
    }

    pub fn from_config(scene: &SceneConfig) -> Self {
        Self::new(scene.dims(), scene.time_step, scene.cg_accuracy, scene.cg_max_iterations)
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GridState {
        &mut self.state
    }

    /// Pressure solves that hit the iteration cap since the last reset
    pub fn unconverged_solves(&self) -> usize {
        self.unconverged
    }
}

impl FluidBackend for GridSolver {
    fn dims(&self) -> GridDims {
        self.state.dims
    }

    fn frame(&self) -> usize {
        self.frame
    }

    fn reset(&mut self) {
        self.state.clear();
        self.frame = 0;
        self.unconverged = 0;
    }

    fn apply_source(&mut self, source: &Sphere, value: f32) {
        source.apply_to_grid(&mut self.state.density, value);
    }

    fn reset_obstacle_velocity(&mut self, width: usize) {
        self.state.obs_vel.set_const(Vec3::ZERO);
        self.state.obs_vel.set_bound(Vec3::ZERO, width);
    }

    fn pin_obstacle_velocity(&mut self, width: usize) {
        self.state.obs_vel.set_bound(Vec3::ZERO, width);
    }

    fn advect(&mut self, density_order: u8, velocity_order: u8) {
        let s = &mut self.state;
        advect_real(&s.flags, &s.vel, &mut s.density, self.time_step, density_order);
        let source = s.vel.clone();
        advect_mac(&s.flags, &source, &mut s.vel, self.time_step, velocity_order);
    }

    fn reset_outflow(&mut self) {
        reset_outflow(&self.state.flags, &mut self.state.density);
    }

    fn init_domain(&mut self, b_width: usize, open: &OpenBoundary) {
        let flags = &mut self.state.flags;
        flags.init_domain(b_width);
        flags.fill_grid();
        flags.set_open_bound(b_width, open, cell::OUTFLOW | cell::EMPTY);
    }

    fn clear_levelset(&mut self) {
        self.state.phi_obs.clear();
    }

    fn compute_obstacle_velocity(&mut self, mesh: &ObstacleMesh, transition: &PoseTransition) {
        mesh.compute_velocity(&transition.current, &transition.previous, &mut self.state.obs_vel, self.time_step);
    }

    fn compute_levelset(&mut self, mesh: &ObstacleMesh, pose: &MeshPose) {
        mesh.compute_levelset(pose, &mut self.state.phi_obs);
    }

    fn set_obstacle_flags(&mut self) {
        self.state.flags.set_obstacle_flags(&self.state.phi_obs);
        self.state.flags.fill_grid();
    }

    fn apply_mesh_to_density(&mut self, mesh: &ObstacleMesh, pose: &MeshPose, value: f32) {
        mesh.apply_to_grid(pose, &mut self.state.density, value);
    }

    fn set_wall_bcs(&mut self) {
        set_wall_bcs(&self.state.flags, &mut self.state.vel, &self.state.obs_vel);
    }

    fn add_buoyancy(&mut self, gravity: Vec3) {
        let s = &mut self.state;
        add_buoyancy(&s.flags, &s.density, &mut s.vel, gravity, self.time_step);
    }

    fn solve_pressure(&mut self) -> SolveStats {
        let s = &mut self.state;
        let stats = self.pressure.solve(&s.flags, &mut s.vel, &mut s.pressure);
        if !stats.converged {
            self.unconverged += 1;
            log::warn!(
                "[GridSolver] Pressure solve stopped at residual {:.3e} after {} iterations (frame {})",
                stats.residual,
                stats.iterations,
                self.frame
            );
        }
        stats
    }

    fn extrapolate_obstacle_velocity(&mut self, distance: usize) {
        extrapolate_mac_simple(&self.state.flags, &mut self.state.obs_vel, distance);
    }

    fn copy_obstacle_velocity(&mut self, b_width: usize) {
        let s = &mut self.state;
        copy_mac_data(&s.obs_vel, &mut s.vel, &s.flags, cell::OBSTACLE, b_width);
    }

    fn velocity_array(&self) -> FieldArray {
        FieldArray::from_mac(&self.state.vel)
    }

    fn density_array(&self) -> FieldArray {
        FieldArray::from_real(&self.state.density)
    }

    fn import_velocity(&mut self, array: &FieldArray) -> SimResult<()> {
        array.write_mac(&mut self.state.vel)
    }

    fn import_density(&mut self, array: &FieldArray) -> SimResult<()> {
        array.write_real(&mut self.state.density)
    }

    fn step(&mut self) {
        self.frame += 1;
    }

    fn release_transients(&mut self) {
        self.pressure.release();
    }
}
