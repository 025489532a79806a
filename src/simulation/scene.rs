use serde::{Deserialize, Serialize};

use super::params::SupervisedParamHistory;
use super::step::FieldUpdateStep;
use crate::backend::FluidBackend;
use crate::bridge::{Predictor, StateBridge, StepMode};
use crate::config::Config;
use crate::error::{invalid_config, SimResult};
use crate::export::{FrameExporter, FrameRecord};
use crate::obstacle::{KinematicsParams, ParamRanges, RandomSource, RangeWarning, Trajectory};
use crate::profiling::{FrameTimer, RunProfile, SceneProfile};

/// What happened in one scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneReport {
    pub scene: usize,
    /// Mode of every frame, in order
    pub modes: Vec<StepMode>,
    /// Pressure solves that stopped at the iteration cap
    pub unconverged_solves: usize,
    /// Per-scene rotation maximum, in units of π
    pub rotation_max: f32,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub warnings: Vec<RangeWarning>,
    pub scenes: Vec<SceneReport>,
    pub profile: RunProfile,
}

impl RunReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Drives every scene of a run through the per-frame pipeline
///
/// Owns the backend state, the obstacle pose ring and the latent history
/// for the whole run; all three are reset at the start of each scene.
pub struct SceneRunner<B: FluidBackend, E: FrameExporter> {
    config: Config,
    backend: B,
    exporter: E,
    step: FieldUpdateStep,
    bridge: StateBridge,
    random: RandomSource,
    ranges: ParamRanges,
    params: SupervisedParamHistory,
}

impl<B: FluidBackend, E: FrameExporter> SceneRunner<B, E> {
    /// Validate everything a run depends on before any scene starts
    pub fn new(config: Config, backend: B, predictor: Box<dyn Predictor>, exporter: E) -> SimResult<Self> {
        config.validate()?;
        if backend.dims() != config.scene.dims() {
            return Err(invalid_config(
                "resolution",
                format!("backend grid {:?} differs from {:?}", backend.dims(), config.scene.dims()),
            ));
        }
        let bridge = StateBridge::new(predictor, &config.predictor)?;

        Ok(Self {
            step: FieldUpdateStep::from_config(&config.scene),
            random: RandomSource::new(config.run.seed),
            ranges: ParamRanges::from_config(&config.scene),
            params: SupervisedParamHistory::new(),
            config,
            backend,
            exporter,
            bridge,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub fn into_exporter(self) -> E {
        self.exporter
    }

    pub fn step(&self) -> &FieldUpdateStep {
        &self.step
    }

    pub fn bridge(&self) -> &StateBridge {
        &self.bridge
    }

    /// Trajectory of every scene of this run, with its range warnings
    pub fn trajectory(&self) -> (Trajectory, Vec<RangeWarning>) {
        let params = KinematicsParams::from_config(&self.config.scene, &self.config.run);
        Trajectory::generate(&params, self.config.run.num_scenes, self.config.run.num_frames, &self.random)
    }

    /// Run every scene
    pub fn run(&mut self) -> SimResult<RunReport> {
        let (trajectory, warnings) = self.trajectory();
        log::info!(
            "[SceneRunner] {} scene(s) of {} frames, {:?} after {} warmup steps",
            self.config.run.num_scenes,
            self.config.run.num_frames,
            self.config.run.prediction_type,
            self.config.run.warmup_steps
        );
        for warning in &warnings {
            log::debug!("[SceneRunner] {}", warning);
        }

        let mut report = RunReport { warnings, ..Default::default() };
        for scene in 0..self.config.run.num_scenes {
            let (scene_report, profile) = self.run_scene(scene, &trajectory)?;
            report.scenes.push(scene_report);
            report.profile.scenes.push(profile);
        }
        Ok(report)
    }

    /// Run one scene from a clean state
    pub fn run_scene(&mut self, scene: usize, trajectory: &Trajectory) -> SimResult<(SceneReport, SceneProfile)> {
        let run = &self.config.run;
        let num_frames = run.num_frames.min(trajectory.num_frames());
        let has_density = self.config.predictor.has_density();

        let initial = trajectory.control(scene, 0);
        self.step.begin_scene(&mut self.backend, &initial);
        self.bridge.reset();
        self.params.clear();

        let settings = self.step.settings();
        log::info!("[SceneRunner] Scene {}", scene);
        log::info!("[SceneRunner] Obs Pos: {}", settings.pose(&initial).offset);
        log::info!("[SceneRunner] Obs Rot Max: {}", trajectory.rotation_max(scene));
        log::info!("[SceneRunner] Smoke Pos: {}", settings.source(&initial).center);
        log::info!("[SceneRunner] Smoke Radius: {}", settings.smoke_radius);

        let mut modes = Vec::with_capacity(num_frames);
        let mut unconverged_solves = 0;
        let mut profile = SceneProfile::default();

        for frame in 0..num_frames {
            log::debug!("[SceneRunner] Frame {}", frame);
            let control = trajectory.control(scene, frame);
            let mut timer = FrameTimer::start();

            self.step.transport(&mut self.backend, &control);
            timer.end_transport();

            self.step.place_obstacle(&mut self.backend, &control);
            let normalized = control.normalized(&self.ranges);
            let mode = StepMode::select(frame, run.warmup_steps, run.prediction_type, has_density);

            timer.start_solve();
            if mode.is_physical() {
                let stats = self.step.solve(&mut self.backend);
                if !stats.converged {
                    unconverged_solves += 1;
                }
                self.bridge.record_physical(mode, &mut self.backend, normalized)?;
            } else {
                self.bridge.predict(mode, &mut self.backend, normalized)?;
            }

            if !run.profile {
                let velocity = self.backend.velocity_array();
                let density = self.backend.density_array();
                self.exporter.write_frame(&FrameRecord {
                    scene,
                    frame,
                    velocity: &velocity,
                    density: &density,
                    params: &self.params,
                })?;
            }

            let (transport, solve) = timer.finish();
            if frame > run.warmup_steps {
                profile.transport.push(transport);
                profile.solve.push(solve);
            }

            self.params.push(control);
            self.backend.step();
            modes.push(mode);
        }

        self.backend.release_transients();

        let report = SceneReport {
            scene,
            modes,
            unconverged_solves,
            rotation_max: trajectory.rotation_max(scene),
        };
        Ok((report, profile))
    }
}
