//! Semi-Lagrangian advection
//!
//! Order 1 is a plain linear backtrace. Order 2 is MacCormack: a forward
//! and a backward backtrace whose error estimate corrects the first-order
//! result, clamped to the values around the backtraced point so the
//! correction cannot create new extrema.

use glam::Vec3;

use super::{lattice_bounds, map_cells, FlagGrid, GridDims, MacGrid, RealGrid};

/// Advect a cell-centered scalar along `vel`
pub fn advect_real(flags: &FlagGrid, vel: &MacGrid, grid: &mut RealGrid, dt: f32, order: u8) {
    let dims = grid.dims();
    let old = grid.clone();

    let forward = backtrace_real(flags, vel, &old, dt);
    let result = if order >= 2 {
        let fwd = RealGrid::from_values(dims, forward);
        let backward = backtrace_real(flags, vel, &fwd, -dt);
        map_cells(dims.cells(), |idx| {
            if flags.is_obstacle(idx) {
                return old.get(idx);
            }
            let corrected = fwd.get(idx) + 0.5 * (old.get(idx) - backward[idx]);
            let departure = dims.center(idx) - dt * vel.sample(dims.center(idx));
            let (min, max) = lattice_bounds(dims, departure - Vec3::splat(0.5), |i| old.get(i));
            corrected.clamp(min, max)
        })
    } else {
        forward
    };

    grid.data_mut().copy_from_slice(&result);
}

/// Advect every velocity component along `vel`
///
/// `target` may hold the same values as `vel` (self-advection); `vel` is
/// only read.
pub fn advect_mac(flags: &FlagGrid, vel: &MacGrid, target: &mut MacGrid, dt: f32, order: u8) {
    let dims = target.dims();
    let old = target.clone();

    let forward = backtrace_mac(flags, vel, &old, dt);
    let result = if order >= 2 {
        let fwd = MacGrid::from_values(dims, forward);
        let backward = backtrace_mac(flags, vel, &fwd, -dt);
        map_cells(dims.cells(), |idx| {
            let mut v = old.get(idx);
            for axis in 0..dims.dim() {
                if !face_is_open(flags, dims, idx, axis) {
                    continue;
                }
                let corrected = fwd.component(idx, axis)
                    + 0.5 * (old.component(idx, axis) - backward[idx][axis]);
                let face = dims.face(idx, axis);
                let departure = face - dt * vel.sample(face);
                let mut offset = Vec3::splat(0.5);
                offset[axis] = 0.0;
                let (min, max) =
                    lattice_bounds(dims, departure - offset, |i| old.component(i, axis));
                v[axis] = corrected.clamp(min, max);
            }
            v
        })
    } else {
        forward
    };

    target.data_mut().copy_from_slice(&result);
}

fn backtrace_real(flags: &FlagGrid, vel: &MacGrid, src: &RealGrid, dt: f32) -> Vec<f32> {
    let dims = src.dims();
    map_cells(dims.cells(), |idx| {
        if flags.is_obstacle(idx) {
            return src.get(idx);
        }
        let p = dims.center(idx);
        src.sample(p - dt * vel.sample(p))
    })
}

fn backtrace_mac(flags: &FlagGrid, vel: &MacGrid, src: &MacGrid, dt: f32) -> Vec<Vec3> {
    let dims = src.dims();
    map_cells(dims.cells(), |idx| {
        let mut v = src.get(idx);
        for axis in 0..dims.dim() {
            if !face_is_open(flags, dims, idx, axis) {
                continue;
            }
            let p = dims.face(idx, axis);
            v[axis] = src.sample_component(axis, p - dt * vel.sample(p));
        }
        v
    })
}

/// A face is advected when neither adjacent cell is solid
fn face_is_open(flags: &FlagGrid, dims: GridDims, idx: usize, axis: usize) -> bool {
    match dims.neighbor(idx, axis, false) {
        Some(lower) => !flags.is_obstacle(idx) && !flags.is_obstacle(lower),
        None => false,
    }
}

impl RealGrid {
    pub(crate) fn from_values(dims: GridDims, data: Vec<f32>) -> Self {
        let mut grid = RealGrid::new(dims);
        grid.data_mut().copy_from_slice(&data);
        grid
    }
}

impl MacGrid {
    pub(crate) fn from_values(dims: GridDims, data: Vec<Vec3>) -> Self {
        let mut grid = MacGrid::new(dims);
        grid.data_mut().copy_from_slice(&data);
        grid
    }
}
