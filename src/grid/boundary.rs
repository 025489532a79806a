//! Boundary conditions, forcing and sources

use glam::Vec3;

use super::{FlagGrid, MacGrid, RealGrid};

/// Zero a scalar in every outflow cell
pub fn reset_outflow(flags: &FlagGrid, grid: &mut RealGrid) {
    for idx in 0..grid.data().len() {
        if flags.is_outflow(idx) {
            grid.set(idx, 0.0);
        }
    }
}

/// Impose the obstacle velocity on every face between fluid and solid
///
/// Faces where both sides are fluid, or both are solid, are left alone.
/// Outer walls carry zero obstacle velocity, so they come out static.
pub fn set_wall_bcs(flags: &FlagGrid, vel: &mut MacGrid, obs_vel: &MacGrid) {
    let dims = vel.dims();
    for idx in 0..dims.cells() {
        for axis in 0..dims.dim() {
            let Some(lower) = dims.neighbor(idx, axis, false) else {
                continue;
            };
            let solid_here = flags.is_obstacle(idx);
            let solid_below = flags.is_obstacle(lower);
            let fluid_pair = (solid_here && flags.is_fluid(lower)) || (solid_below && flags.is_fluid(idx));
            if fluid_pair {
                vel.set_component(idx, axis, obs_vel.component(idx, axis));
            }
        }
    }
}

/// Buoyancy force proportional to the density on each fluid face
///
/// `gravity` points opposite to the rise direction; it is scaled by the
/// time step and the grid resolution, so the same value gives the same
/// motion at any resolution.
pub fn add_buoyancy(flags: &FlagGrid, density: &RealGrid, vel: &mut MacGrid, gravity: Vec3, dt: f32) {
    let dims = vel.dims();
    let factor = -gravity * dt * dims.max_res() as f32;
    for idx in 0..dims.cells() {
        if !flags.is_fluid(idx) {
            continue;
        }
        for axis in 0..dims.dim() {
            if factor[axis] == 0.0 {
                continue;
            }
            let Some(lower) = dims.neighbor(idx, axis, false) else {
                continue;
            };
            if !flags.is_fluid(lower) {
                continue;
            }
            let rho = 0.5 * (density.get(idx) + density.get(lower));
            let v = vel.component(idx, axis) + factor[axis] * rho;
            vel.set_component(idx, axis, v);
        }
    }
}

/// Copy `source` into `target` for cells matching `cell_type`, skipping the boundary ring
pub fn copy_mac_data(source: &MacGrid, target: &mut MacGrid, flags: &FlagGrid, cell_type: u32, b_width: usize) {
    let dims = target.dims();
    for idx in 0..dims.cells() {
        if dims.in_ring(idx, b_width) {
            continue;
        }
        if flags.get(idx) & cell_type != 0 {
            target.set(idx, source.get(idx));
        }
    }
}

/// Spherical smoke source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center in grid units
    pub center: Vec3,
    /// Radius in grid units
    pub radius: f32,
}

impl Sphere {
    pub fn contains(&self, p: Vec3) -> bool {
        p.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Set `value` in every cell whose center lies inside the sphere
    pub fn apply_to_grid(&self, grid: &mut RealGrid, value: f32) -> usize {
        let dims = grid.dims();
        let mut touched = 0;
        for idx in 0..dims.cells() {
            if self.contains(dims.center(idx)) {
                grid.set(idx, value);
                touched += 1;
            }
        }
        touched
    }
}
