// Smoke Predict Constants
//
// Fixed numerical constants shared by the grid solver, the obstacle
// kinematics and the prediction bridge. Tunable values live in the
// configuration structs instead.

/// Grid and solver constants
pub mod grid {
    /// Extra cells added to the boundary width when pinning obstacle velocity to zero
    pub const OBSTACLE_VELOCITY_BOUND_PADDING: usize = 1;

    /// Layers used when extrapolating obstacle velocity into the solid
    pub const OBSTACLE_EXTRAPOLATION_DISTANCE: usize = 3;

    /// Advection order for density (first order, stable against oscillation)
    pub const DENSITY_ADVECTION_ORDER: u8 = 1;

    /// Advection order for velocity (MacCormack, keeps vortices)
    pub const VELOCITY_ADVECTION_ORDER: u8 = 2;

    /// Cell count above which per-cell loops go parallel
    pub const PARALLEL_CELL_THRESHOLD: usize = 32 * 32 * 32;

    /// Band around the obstacle surface (in cells) that receives mesh velocity
    pub const OBSTACLE_VELOCITY_BAND: f32 = 1.0;
}

/// Obstacle kinematics constants
pub mod kinematics {
    /// Exclusive upper bound of the integer noise offsets drawn per scene
    pub const NOISE_OFFSET_RANGE: u32 = 200;

    /// Vertical squash applied to the obstacle mesh scale
    pub const MESH_Y_SCALE: f32 = 0.9;

    /// Obstacle and source depth, in normalized domain units
    pub const DEPTH_CENTER: f32 = 0.5;
}

/// Prediction bridge constants
pub mod prediction {
    /// Number of supervised control parameters (rotation, position)
    pub const SUPERVISED_PARAM_COUNT: usize = 2;

    /// Default history window handed to the predictor
    pub const DEFAULT_HISTORY_WINDOW: usize = 2;
}
