//! The field update step issues backend operations in a fixed order

use glam::Vec3;
use smoke_predict::backend::FluidBackend;
use smoke_predict::config::{OpenBoundary, SceneConfig};
use smoke_predict::grid::{FieldArray, GridDims, SolveStats, Sphere};
use smoke_predict::obstacle::{ControlParams, MeshPose, ObstacleMesh, PoseTransition};
use smoke_predict::simulation::FieldUpdateStep;
use smoke_predict::SimResult;

/// Backend that only records which operations were issued
#[derive(Default)]
struct RecordingBackend {
    calls: Vec<String>,
    transitions: Vec<PoseTransition>,
    levelset_poses: Vec<MeshPose>,
    cleared_poses: Vec<MeshPose>,
}

impl RecordingBackend {
    fn log(&mut self, name: &str) {
        self.calls.push(name.to_string());
    }
}

impl FluidBackend for RecordingBackend {
    fn dims(&self) -> GridDims {
        GridDims::new(16, 16, 1)
    }
    fn frame(&self) -> usize {
        0
    }
    fn reset(&mut self) {
        self.log("reset");
    }
    fn apply_source(&mut self, _source: &Sphere, _value: f32) {
        self.log("apply_source");
    }
    fn reset_obstacle_velocity(&mut self, width: usize) {
        self.log(&format!("reset_obstacle_velocity({})", width));
    }
    fn pin_obstacle_velocity(&mut self, width: usize) {
        self.log(&format!("pin_obstacle_velocity({})", width));
    }
    fn advect(&mut self, density_order: u8, velocity_order: u8) {
        self.log(&format!("advect({},{})", density_order, velocity_order));
    }
    fn reset_outflow(&mut self) {
        self.log("reset_outflow");
    }
    fn init_domain(&mut self, b_width: usize, _open: &OpenBoundary) {
        self.log(&format!("init_domain({})", b_width));
    }
    fn clear_levelset(&mut self) {
        self.log("clear_levelset");
    }
    fn compute_obstacle_velocity(&mut self, _mesh: &ObstacleMesh, transition: &PoseTransition) {
        self.transitions.push(*transition);
        self.log("compute_obstacle_velocity");
    }
    fn compute_levelset(&mut self, _mesh: &ObstacleMesh, pose: &MeshPose) {
        self.levelset_poses.push(*pose);
        self.log("compute_levelset");
    }
    fn set_obstacle_flags(&mut self) {
        self.log("set_obstacle_flags");
    }
    fn apply_mesh_to_density(&mut self, _mesh: &ObstacleMesh, pose: &MeshPose, _value: f32) {
        self.cleared_poses.push(*pose);
        self.log("apply_mesh_to_density");
    }
    fn set_wall_bcs(&mut self) {
        self.log("set_wall_bcs");
    }
    fn add_buoyancy(&mut self, _gravity: Vec3) {
        self.log("add_buoyancy");
    }
    fn solve_pressure(&mut self) -> SolveStats {
        self.log("solve_pressure");
        SolveStats { iterations: 0, residual: 0.0, converged: true, unknowns: 0 }
    }
    fn extrapolate_obstacle_velocity(&mut self, distance: usize) {
        self.log(&format!("extrapolate_obstacle_velocity({})", distance));
    }
    fn copy_obstacle_velocity(&mut self, b_width: usize) {
        self.log(&format!("copy_obstacle_velocity({})", b_width));
    }
    fn velocity_array(&self) -> FieldArray {
        FieldArray::zeros(self.dims(), 3)
    }
    fn density_array(&self) -> FieldArray {
        FieldArray::zeros(self.dims(), 1)
    }
    fn import_velocity(&mut self, _array: &FieldArray) -> SimResult<()> {
        Ok(())
    }
    fn import_density(&mut self, _array: &FieldArray) -> SimResult<()> {
        Ok(())
    }
    fn step(&mut self) {
        self.log("step");
    }
    fn release_transients(&mut self) {
        self.log("release_transients");
    }
}

fn scene() -> SceneConfig {
    SceneConfig {
        resolution_x: 16,
        resolution_y: 16,
        resolution_z: 1,
        b_width: 2,
        ..Default::default()
    }
}

#[test]
fn test_physical_frame_order() {
    let mut step = FieldUpdateStep::from_config(&scene());
    let mut backend = RecordingBackend::default();
    let control = ControlParams { rotation: 0.1, position: 0.5 };

    step.begin_scene(&mut backend, &control);
    backend.calls.clear();

    step.transport(&mut backend, &control);
    step.place_obstacle(&mut backend, &control);
    step.solve(&mut backend);

    let expected = [
        "apply_source",
        "reset_obstacle_velocity(3)",
        "advect(1,2)",
        "reset_outflow",
        "init_domain(2)",
        "clear_levelset",
        "compute_obstacle_velocity",
        "pin_obstacle_velocity(3)",
        "compute_levelset",
        "set_obstacle_flags",
        "apply_mesh_to_density",
        "set_wall_bcs",
        "add_buoyancy",
        "solve_pressure",
        "extrapolate_obstacle_velocity(3)",
        "copy_obstacle_velocity(2)",
    ];
    assert_eq!(backend.calls, expected);
}

#[test]
fn test_levelset_and_clearing_lag_one_frame() {
    let settings_scene = scene();
    let mut step = FieldUpdateStep::from_config(&settings_scene);
    let mut backend = RecordingBackend::default();
    let controls: Vec<ControlParams> = (0..4)
        .map(|t| ControlParams { rotation: 0.1 * t as f32, position: 0.3 + 0.1 * t as f32 })
        .collect();

    step.begin_scene(&mut backend, &controls[0]);
    for control in &controls {
        step.transport(&mut backend, control);
        step.place_obstacle(&mut backend, control);
    }

    let pose = |t: usize| step.settings().pose(&controls[t]);
    for t in 0..4usize {
        let previous = pose(t.saturating_sub(1));
        assert_eq!(backend.transitions[t].current, pose(t));
        assert_eq!(backend.transitions[t].previous, previous);
        assert_eq!(backend.levelset_poses[t], previous);
        assert_eq!(backend.cleared_poses[t], previous);
    }
}
