//! Scene loop
//!
//! `FieldUpdateStep` advances the grid physically, `SceneRunner` sequences
//! it with the state substitution bridge and the exporter for every frame
//! of every scene.

pub mod params;
pub mod step;
pub mod scene;

pub use params::SupervisedParamHistory;
pub use scene::{RunReport, SceneReport, SceneRunner};
pub use step::{FieldUpdateStep, StepSettings};
