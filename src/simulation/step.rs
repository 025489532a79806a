//! Physical field update
//!
//! One frame is split in three phases so the caller can time transport
//! separately from the solve and skip the solve in predicted frames:
//! `transport`, `place_obstacle`, then optionally `solve`. Their order
//! inside a frame is fixed.

use glam::Vec3;

use crate::backend::FluidBackend;
use crate::config::{OpenBoundary, SceneConfig};
use crate::constants::grid::{
    DENSITY_ADVECTION_ORDER, OBSTACLE_EXTRAPOLATION_DISTANCE, OBSTACLE_VELOCITY_BOUND_PADDING,
    VELOCITY_ADVECTION_ORDER,
};
use crate::constants::kinematics::{DEPTH_CENTER, MESH_Y_SCALE};
use crate::grid::{GridDims, SolveStats, Sphere};
use crate::obstacle::{ControlParams, MeshPose, MeshRing, ObstacleMesh, PoseTransition};

/// Scene constants the update step reads every frame
#[derive(Debug, Clone, PartialEq)]
pub struct StepSettings {
    pub dims: GridDims,
    pub b_width: usize,
    pub open_bound: OpenBoundary,
    pub gravity: Vec3,
    /// Source radius in grid units
    pub smoke_radius: f32,
    pub smoke_pos_y: f32,
    pub obstacle_pos_y: f32,
    /// Mesh scale in grid units
    pub mesh_scale: Vec3,
}

impl StepSettings {
    pub fn from_config(scene: &SceneConfig) -> Self {
        let dims = scene.dims();
        let gs = dims.gs();
        let mut mesh_scale = Vec3::splat(gs.x * scene.obstacle_size);
        mesh_scale.y *= MESH_Y_SCALE;
        Self {
            dims,
            b_width: scene.b_width,
            open_bound: scene.open_bound,
            gravity: Vec3::new(0.0, scene.buoyancy, 0.0),
            smoke_radius: gs.x * scene.smoke_radius,
            smoke_pos_y: scene.smoke_pos_y,
            obstacle_pos_y: scene.obstacle_pos_y,
            mesh_scale,
        }
    }

    /// Obstacle pose for a frame's control parameters
    pub fn pose(&self, control: &ControlParams) -> MeshPose {
        let offset = self.dims.gs() * Vec3::new(control.position, self.obstacle_pos_y, DEPTH_CENTER);
        MeshPose::new(self.mesh_scale, control.angle(), offset)
    }

    /// Smoke source below the obstacle, following its x position
    pub fn source(&self, control: &ControlParams) -> Sphere {
        Sphere {
            center: self.dims.gs() * Vec3::new(control.position, self.smoke_pos_y, DEPTH_CENTER),
            radius: self.smoke_radius,
        }
    }

    fn obstacle_bound_width(&self) -> usize {
        self.b_width + OBSTACLE_VELOCITY_BOUND_PADDING
    }
}

/// Per-frame physical update of the grid state
#[derive(Debug, Clone)]
pub struct FieldUpdateStep {
    settings: StepSettings,
    mesh: ObstacleMesh,
    ring: MeshRing,
}

impl FieldUpdateStep {
    pub fn new(settings: StepSettings, mesh: ObstacleMesh) -> Self {
        let ring = MeshRing::new(settings.pose(&ControlParams { rotation: 0.0, position: 0.5 }));
        Self { settings, mesh, ring }
    }

    pub fn from_config(scene: &SceneConfig) -> Self {
        let settings = StepSettings::from_config(scene);
        let mesh = ObstacleMesh::load(scene.obstacle_shape, settings.dims.is_3d());
        Self::new(settings, mesh)
    }

    pub fn settings(&self) -> &StepSettings {
        &self.settings
    }

    pub fn mesh(&self) -> &ObstacleMesh {
        &self.mesh
    }

    pub fn ring(&self) -> &MeshRing {
        &self.ring
    }

    /// Zero the backend and put both pose slots at the scene's first pose
    pub fn begin_scene(&mut self, backend: &mut dyn FluidBackend, initial: &ControlParams) {
        let s = &self.settings;
        backend.reset();
        backend.init_domain(s.b_width, &s.open_bound);
        backend.reset_obstacle_velocity(s.obstacle_bound_width());
        self.ring.reset(s.pose(initial));
    }

    /// Inject smoke, transport both fields and rebuild the domain flags
    pub fn transport(&mut self, backend: &mut dyn FluidBackend, control: &ControlParams) {
        let s = &self.settings;
        backend.apply_source(&s.source(control), 1.0);
        backend.reset_obstacle_velocity(s.obstacle_bound_width());

        backend.advect(DENSITY_ADVECTION_ORDER, VELOCITY_ADVECTION_ORDER);
        backend.reset_outflow();

        backend.init_domain(s.b_width, &s.open_bound);
        backend.clear_levelset();
    }

    /// Move the obstacle and enforce its boundary conditions
    ///
    /// The velocity comes from the transition into this frame's pose while
    /// flags and density clearing use the previous pose.
    pub fn place_obstacle(&mut self, backend: &mut dyn FluidBackend, control: &ControlParams) -> PoseTransition {
        let s = &self.settings;
        let transition = self.ring.advance(s.pose(control));

        backend.compute_obstacle_velocity(&self.mesh, &transition);
        backend.pin_obstacle_velocity(s.obstacle_bound_width());
        backend.compute_levelset(&self.mesh, &transition.previous);

        backend.set_obstacle_flags();
        backend.apply_mesh_to_density(&self.mesh, self.ring.active(), 0.0);

        backend.set_wall_bcs();
        transition
    }

    /// Buoyancy, pressure projection and obstacle velocity inside solids
    pub fn solve(&mut self, backend: &mut dyn FluidBackend) -> SolveStats {
        backend.add_buoyancy(self.settings.gravity);
        let stats = backend.solve_pressure();

        backend.extrapolate_obstacle_velocity(OBSTACLE_EXTRAPOLATION_DISTANCE);
        backend.copy_obstacle_velocity(self.settings.b_width);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_and_source_follow_position() {
        let mut scene = SceneConfig::default();
        scene.resolution_z = 1;
        let settings = StepSettings::from_config(&scene);
        let control = ControlParams { rotation: 0.25, position: 0.5 };
        let pose = settings.pose(&control);
        assert_eq!(pose.offset, Vec3::new(32.0, 32.0, 0.5));
        assert!((pose.scale.x - 12.8).abs() < 1e-5);
        assert!((pose.scale.y - 12.8 * 0.9).abs() < 1e-5);
        assert!((pose.angle - std::f32::consts::FRAC_PI_4).abs() < 1e-6);

        let source = settings.source(&control);
        assert!((source.center - Vec3::new(32.0, 64.0 * 0.14, 0.5)).length() < 1e-4);
        assert!((source.radius - 64.0 * 0.14).abs() < 1e-4);
    }
}
