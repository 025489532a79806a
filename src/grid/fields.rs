use glam::Vec3;

use super::{trilinear, GridDims};

/// Scalar field stored at cell centers
#[derive(Debug, Clone, PartialEq)]
pub struct RealGrid {
    dims: GridDims,
    data: Vec<f32>,
}

impl RealGrid {
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            data: vec![0.0; dims.cells()],
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    pub fn set_const(&mut self, value: f32) {
        self.data.fill(value);
    }

    #[inline]
    pub fn get(&self, idx: usize) -> f32 {
        self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: f32) {
        self.data[idx] = value;
    }

    pub fn at(&self, i: usize, j: usize, k: usize) -> f32 {
        self.data[self.dims.index(i, j, k)]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Linear sample at a position in grid units (cell centers at `i + 0.5`)
    pub fn sample(&self, pos: Vec3) -> f32 {
        trilinear(self.dims, pos - Vec3::splat(0.5), |i| self.data[i])
    }

    /// Overwrite every cell within `width` of the domain edge
    pub fn set_bound(&mut self, value: f32, width: usize) {
        for idx in 0..self.data.len() {
            if self.dims.in_ring(idx, width) {
                self.data[idx] = value;
            }
        }
    }

    /// Largest absolute value
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |m, v| m.max(v.abs()))
    }
}

/// Staggered velocity field
///
/// Component `c` of cell `(i, j, k)` lives on the lower face of that cell
/// along axis `c`. All components share the cell grid's dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct MacGrid {
    dims: GridDims,
    data: Vec<Vec3>,
}

impl MacGrid {
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            data: vec![Vec3::ZERO; dims.cells()],
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn clear(&mut self) {
        self.data.fill(Vec3::ZERO);
    }

    pub fn set_const(&mut self, value: Vec3) {
        self.data.fill(value);
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Vec3 {
        self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: Vec3) {
        self.data[idx] = value;
    }

    #[inline]
    pub fn component(&self, idx: usize, axis: usize) -> f32 {
        self.data[idx][axis]
    }

    #[inline]
    pub fn set_component(&mut self, idx: usize, axis: usize, value: f32) {
        self.data[idx][axis] = value;
    }

    pub fn data(&self) -> &[Vec3] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Vec3] {
        &mut self.data
    }

    /// Overwrite every cell within `width` of the domain edge
    pub fn set_bound(&mut self, value: Vec3, width: usize) {
        for idx in 0..self.data.len() {
            if self.dims.in_ring(idx, width) {
                self.data[idx] = value;
            }
        }
    }

    /// Linear sample of one component at a position in grid units
    pub fn sample_component(&self, axis: usize, pos: Vec3) -> f32 {
        let mut offset = Vec3::splat(0.5);
        offset[axis] = 0.0;
        trilinear(self.dims, pos - offset, |i| self.data[i][axis])
    }

    /// Full velocity at a position in grid units
    pub fn sample(&self, pos: Vec3) -> Vec3 {
        let mut v = Vec3::ZERO;
        for axis in 0..self.dims.dim() {
            v[axis] = self.sample_component(axis, pos);
        }
        v
    }

    /// Face-averaged velocity at a cell center
    pub fn centered(&self, idx: usize) -> Vec3 {
        let mut v = Vec3::ZERO;
        for axis in 0..self.dims.dim() {
            let lower = self.data[idx][axis];
            let upper = self
                .dims
                .neighbor(idx, axis, true)
                .map(|n| self.data[n][axis])
                .unwrap_or(lower);
            v[axis] = 0.5 * (lower + upper);
        }
        v
    }

    /// Largest absolute component
    pub fn max_abs(&self) -> f32 {
        self.data
            .iter()
            .fold(0.0f32, |m, v| m.max(v.abs().max_element()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_sample_constant_field() {
        let dims = GridDims::new(8, 8, 8);
        let mut vel = MacGrid::new(dims);
        vel.set_const(Vec3::new(1.0, -2.0, 0.5));
        let v = vel.sample(Vec3::new(3.3, 4.7, 2.1));
        assert!((v - Vec3::new(1.0, -2.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_mac_sample_2d_leaves_z_zero() {
        let dims = GridDims::new(8, 8, 1);
        let mut vel = MacGrid::new(dims);
        vel.set_const(Vec3::new(1.0, 1.0, 5.0));
        assert_eq!(vel.sample(Vec3::new(4.0, 4.0, 0.5)).z, 0.0);
    }

    #[test]
    fn test_set_bound_only_touches_ring() {
        let dims = GridDims::new(6, 6, 6);
        let mut grid = RealGrid::new(dims);
        grid.set_const(1.0);
        grid.set_bound(0.0, 2);
        assert_eq!(grid.at(0, 3, 3), 0.0);
        assert_eq!(grid.at(1, 3, 3), 0.0);
        assert_eq!(grid.at(2, 2, 3), 1.0);
        assert_eq!(grid.at(3, 3, 4), 0.0);
    }

    #[test]
    fn test_real_sample_at_center() {
        let dims = GridDims::new(4, 4, 1);
        let mut grid = RealGrid::new(dims);
        grid.set(dims.index(2, 1, 0), 3.0);
        assert!((grid.sample(Vec3::new(2.5, 1.5, 0.5)) - 3.0).abs() < 1e-6);
    }
}
