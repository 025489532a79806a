//! Grid-based smoke fields
//!
//! Fixed-resolution cell grids (2D when `z == 1`) with a staggered MAC
//! velocity layout, plus the per-cell operators the field update step is
//! built from: advection, boundary handling, buoyancy, pressure projection
//! and velocity extrapolation.

pub mod fields;
pub mod flags;
pub mod array;
pub mod advection;
pub mod boundary;
pub mod pressure;
pub mod extrapolation;
pub mod state;

pub use array::FieldArray;
pub use boundary::Sphere;
pub use fields::{MacGrid, RealGrid};
pub use flags::{cell, FlagGrid};
pub use pressure::{PressureSolver, SolveStats};
pub use state::GridState;

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::grid::PARALLEL_CELL_THRESHOLD;

/// Grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridDims {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Total cell count
    pub fn cells(&self) -> usize {
        self.x * self.y * self.z
    }

    pub fn is_3d(&self) -> bool {
        self.z > 1
    }

    /// Number of active axes (2 or 3)
    pub fn dim(&self) -> usize {
        if self.is_3d() { 3 } else { 2 }
    }

    /// Extent along an axis
    pub fn axis(&self, axis: usize) -> usize {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Index offset of one step along an axis
    pub fn stride(&self, axis: usize) -> usize {
        match axis {
            0 => 1,
            1 => self.x,
            _ => self.x * self.y,
        }
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.x + k * self.x * self.y
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let plane = self.x * self.y;
        [idx % self.x, (idx % plane) / self.x, idx / plane]
    }

    /// Grid size as a vector, the scale of normalized domain positions
    pub fn gs(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Largest extent; one cell is `1 / max_res` of the domain
    pub fn max_res(&self) -> usize {
        self.x.max(self.y).max(self.z)
    }

    /// Cell center in grid units
    pub fn center(&self, idx: usize) -> Vec3 {
        let [i, j, k] = self.coords(idx);
        Vec3::new(i as f32 + 0.5, j as f32 + 0.5, k as f32 + 0.5)
    }

    /// Position of the lower face along `axis`, where that velocity component lives
    pub fn face(&self, idx: usize, axis: usize) -> Vec3 {
        let mut p = self.center(idx);
        p[axis] -= 0.5;
        p
    }

    /// Whether a cell lies within `width` cells of the domain edge
    ///
    /// The z axis only counts for 3D grids.
    pub fn in_ring(&self, idx: usize, width: usize) -> bool {
        let c = self.coords(idx);
        (0..self.dim()).any(|a| c[a] < width || c[a] + width >= self.axis(a))
    }

    /// Neighbor along an axis, if inside the grid
    pub fn neighbor(&self, idx: usize, axis: usize, positive: bool) -> Option<usize> {
        let c = self.coords(idx)[axis];
        if positive {
            (c + 1 < self.axis(axis)).then(|| idx + self.stride(axis))
        } else {
            (c > 0).then(|| idx - self.stride(axis))
        }
    }
}

/// Parallel when the grid is large enough, sequential otherwise
pub(crate) fn should_parallel(len: usize) -> bool {
    len >= PARALLEL_CELL_THRESHOLD
}

/// Build a per-cell vector from an index function
pub(crate) fn map_cells<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if should_parallel(len) {
        (0..len).into_par_iter().map(f).collect()
    } else {
        (0..len).map(f).collect()
    }
}

/// Trilinear interpolation on a lattice whose nodes sit at integer coordinates
pub(crate) fn trilinear(dims: GridDims, u: Vec3, fetch: impl Fn(usize) -> f32) -> f32 {
    let mut lo = [0usize; 3];
    let mut hi = [0usize; 3];
    let mut t = [0.0f32; 3];
    for a in 0..3 {
        let n = dims.axis(a);
        let max = (n - 1) as f32;
        let x = u[a].clamp(0.0, max);
        let i0 = (x.floor() as usize).min(n - 1);
        lo[a] = i0;
        hi[a] = (i0 + 1).min(n - 1);
        t[a] = x - i0 as f32;
    }

    let v = |i: usize, j: usize, k: usize| fetch(dims.index(i, j, k));
    let c00 = v(lo[0], lo[1], lo[2]) * (1.0 - t[0]) + v(hi[0], lo[1], lo[2]) * t[0];
    let c10 = v(lo[0], hi[1], lo[2]) * (1.0 - t[0]) + v(hi[0], hi[1], lo[2]) * t[0];
    let c01 = v(lo[0], lo[1], hi[2]) * (1.0 - t[0]) + v(hi[0], lo[1], hi[2]) * t[0];
    let c11 = v(lo[0], hi[1], hi[2]) * (1.0 - t[0]) + v(hi[0], hi[1], hi[2]) * t[0];
    let c0 = c00 * (1.0 - t[1]) + c10 * t[1];
    let c1 = c01 * (1.0 - t[1]) + c11 * t[1];
    c0 * (1.0 - t[2]) + c1 * t[2]
}

/// Min and max of the lattice nodes surrounding `u`
pub(crate) fn lattice_bounds(dims: GridDims, u: Vec3, fetch: impl Fn(usize) -> f32) -> (f32, f32) {
    let mut lo = [0usize; 3];
    let mut hi = [0usize; 3];
    for a in 0..3 {
        let n = dims.axis(a);
        let x = u[a].clamp(0.0, (n - 1) as f32);
        lo[a] = (x.floor() as usize).min(n - 1);
        hi[a] = (lo[a] + 1).min(n - 1);
    }

    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for &k in &[lo[2], hi[2]] {
        for &j in &[lo[1], hi[1]] {
            for &i in &[lo[0], hi[0]] {
                let value = fetch(dims.index(i, j, k));
                min = min.min(value);
                max = max.max(value);
            }
        }
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let dims = GridDims::new(5, 4, 3);
        let idx = dims.index(3, 2, 1);
        assert_eq!(dims.coords(idx), [3, 2, 1]);
        assert_eq!(dims.neighbor(idx, 1, true), Some(dims.index(3, 3, 1)));
        assert_eq!(dims.neighbor(dims.index(0, 0, 0), 0, false), None);
    }

    #[test]
    fn test_ring_ignores_z_in_2d() {
        let dims = GridDims::new(6, 6, 1);
        assert!(!dims.in_ring(dims.index(2, 2, 0), 1));
        assert!(dims.in_ring(dims.index(0, 2, 0), 1));
        assert!(dims.in_ring(dims.index(2, 5, 0), 1));
    }

    #[test]
    fn test_trilinear_midpoint() {
        let dims = GridDims::new(2, 2, 1);
        let data = [0.0, 1.0, 2.0, 3.0];
        let value = trilinear(dims, Vec3::new(0.5, 0.5, 0.0), |i| data[i]);
        assert!((value - 1.5).abs() < 1e-6);
    }
}
