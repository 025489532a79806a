use super::{FlagGrid, GridDims, MacGrid, RealGrid};

/// Every field of one scene, all sharing the same dimensions
#[derive(Debug, Clone)]
pub struct GridState {
    pub dims: GridDims,
    pub flags: FlagGrid,
    pub vel: MacGrid,
    pub density: RealGrid,
    pub pressure: RealGrid,
    pub obs_vel: MacGrid,
    pub phi_obs: RealGrid,
}

impl GridState {
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            flags: FlagGrid::new(dims),
            vel: MacGrid::new(dims),
            density: RealGrid::new(dims),
            pressure: RealGrid::new(dims),
            obs_vel: MacGrid::new(dims),
            phi_obs: RealGrid::new(dims),
        }
    }

    /// Zero every field (flags are rebuilt by the domain setup)
    pub fn clear(&mut self) {
        self.vel.clear();
        self.density.clear();
        self.pressure.clear();
        self.obs_vel.clear();
        self.phi_obs.clear();
    }
}
