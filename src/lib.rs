//! Smoke simulation with latent-space state substitution
//!
//! A smoke plume rises past a scripted rotating and translating obstacle.
//! Each frame is either solved physically on the grid or produced by a
//! latent predictor, with the obstacle's control parameters written into
//! the latent state so the predicted fields follow the scripted motion.

pub mod backend;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod grid;
pub mod obstacle;
pub mod profiling;
pub mod simulation;

use std::path::PathBuf;

pub use backend::{FluidBackend, GridSolver};
pub use bridge::{PoolingPredictor, Predictor, StateBridge, StepMode};
pub use config::{Config, PredictionType};
pub use error::{SimError, SimResult};
pub use export::{FieldStore, FrameExporter, MemoryExporter, RunDirectory};
pub use grid::{FieldArray, GridDims};
pub use obstacle::{RandomSource, RangeWarning, Trajectory};
pub use simulation::{RunReport, SceneRunner};

/// Run a full configuration with the CPU backend and the pooling predictor
///
/// Fields are written below a fresh run directory, which is returned with
/// the report.
pub fn run(config: Config) -> SimResult<(RunReport, PathBuf)> {
    config.validate()?;
    let run_dir = RunDirectory::create(&config)?;

    let backend = GridSolver::from_config(&config.scene);
    let predictor = PoolingPredictor::new(config.scene.dims(), &config.predictor)?;
    let store = FieldStore::new(run_dir.path(), config.export.clone());

    let profile = config.run.profile;
    let mut runner = SceneRunner::new(config, backend, Box::new(predictor), store)?;
    let report = runner.run()?;

    if profile {
        report.profile.write(run_dir.path())?;
    }
    Ok((report, run_dir.path().to_path_buf()))
}
