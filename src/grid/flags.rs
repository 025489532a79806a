use super::{GridDims, RealGrid};
use crate::config::OpenBoundary;

/// Cell type bits
pub mod cell {
    pub const FLUID: u32 = 1;
    pub const OBSTACLE: u32 = 2;
    pub const EMPTY: u32 = 4;
    pub const INFLOW: u32 = 8;
    pub const OUTFLOW: u32 = 16;
    pub const OPEN: u32 = 32;
}

/// Per-cell classification
///
/// Rebuilt every frame from the domain and the current obstacle levelset;
/// nothing in it outlives the frame it was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagGrid {
    dims: GridDims,
    data: Vec<u32>,
}

impl FlagGrid {
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            data: vec![cell::FLUID; dims.cells()],
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn get(&self, idx: usize) -> u32 {
        self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, flags: u32) {
        self.data[idx] = flags;
    }

    #[inline]
    pub fn is_fluid(&self, idx: usize) -> bool {
        self.data[idx] & cell::FLUID != 0
    }

    #[inline]
    pub fn is_obstacle(&self, idx: usize) -> bool {
        self.data[idx] & cell::OBSTACLE != 0
    }

    #[inline]
    pub fn is_empty(&self, idx: usize) -> bool {
        self.data[idx] & cell::EMPTY != 0
    }

    #[inline]
    pub fn is_outflow(&self, idx: usize) -> bool {
        self.data[idx] & cell::OUTFLOW != 0
    }

    /// Solid ring of `b_width` cells around an empty interior
    pub fn init_domain(&mut self, b_width: usize) {
        let dims = self.dims;
        for (idx, flags) in self.data.iter_mut().enumerate() {
            *flags = if dims.in_ring(idx, b_width) {
                cell::OBSTACLE
            } else {
                cell::EMPTY
            };
        }
    }

    /// Turn every cell that is not solid, inflow, outflow or open into fluid
    pub fn fill_grid(&mut self) {
        let keep = cell::OBSTACLE | cell::INFLOW | cell::OUTFLOW | cell::OPEN;
        for flags in self.data.iter_mut() {
            if *flags & keep == 0 {
                *flags = (*flags & !cell::EMPTY) | cell::FLUID;
            }
        }
    }

    /// Reclassify the boundary slabs of the open faces as `cell_type`
    pub fn set_open_bound(&mut self, b_width: usize, open: &OpenBoundary, cell_type: u32) {
        let dims = self.dims;
        for axis in 0..dims.dim() {
            let (lower, upper) = open.faces(axis);
            let n = dims.axis(axis);
            for idx in 0..self.data.len() {
                let c = dims.coords(idx)[axis];
                if (lower && c < b_width) || (upper && c + b_width >= n) {
                    self.data[idx] = cell_type;
                }
            }
        }
    }

    /// Mark cells whose center lies inside the obstacle levelset
    pub fn set_obstacle_flags(&mut self, phi_obs: &RealGrid) {
        for (idx, flags) in self.data.iter_mut().enumerate() {
            if phi_obs.get(idx) < 0.0 && *flags & cell::OUTFLOW == 0 {
                *flags = cell::OBSTACLE;
            }
        }
    }

    /// Number of cells carrying all bits of `mask`
    pub fn count(&self, mask: u32) -> usize {
        self.data.iter().filter(|f| **f & mask == mask).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_and_fill() {
        let dims = GridDims::new(6, 6, 6);
        let mut flags = FlagGrid::new(dims);
        flags.init_domain(1);
        flags.fill_grid();
        assert!(flags.is_obstacle(dims.index(0, 3, 3)));
        assert!(flags.is_fluid(dims.index(3, 3, 3)));
        assert_eq!(flags.count(cell::FLUID), 4 * 4 * 4);
    }

    #[test]
    fn test_open_bound_floor_and_top() {
        let dims = GridDims::new(6, 6, 1);
        let mut flags = FlagGrid::new(dims);
        flags.init_domain(1);
        flags.fill_grid();
        let open = OpenBoundary::parse("yY").unwrap();
        flags.set_open_bound(1, &open, cell::OUTFLOW | cell::EMPTY);
        assert!(flags.is_outflow(dims.index(3, 0, 0)));
        assert!(flags.is_outflow(dims.index(0, 5, 0)));
        assert!(flags.is_obstacle(dims.index(0, 3, 0)));
        assert!(flags.is_fluid(dims.index(3, 3, 0)));
    }

    #[test]
    fn test_obstacle_flags_from_levelset() {
        let dims = GridDims::new(4, 4, 1);
        let mut flags = FlagGrid::new(dims);
        let mut phi = RealGrid::new(dims);
        phi.set_const(1.0);
        phi.set(dims.index(1, 1, 0), -0.5);
        flags.set_obstacle_flags(&phi);
        assert!(flags.is_obstacle(dims.index(1, 1, 0)));
        assert!(flags.is_fluid(dims.index(2, 1, 0)));
    }
}
