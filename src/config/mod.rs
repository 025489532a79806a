//! Run configuration
//!
//! `SceneConfig` carries the dataset parameters the scene was generated
//! with, `RunConfig` the per-invocation prediction settings. Everything is
//! loaded from one TOML file and validated before any scene runs.

mod boundary;
mod overrides;

pub use boundary::OpenBoundary;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::prediction::{DEFAULT_HISTORY_WINDOW, SUPERVISED_PARAM_COUNT};
use crate::error::{invalid_config, SimErrorContext, SimResult};
use crate::grid::GridDims;

/// Full configuration for one invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scene: SceneConfig,
    pub run: RunConfig,
    pub predictor: PredictorConfig,
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .sim_context(&format!("reading config {}", path.display()))?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(raw: &str) -> SimResult<Self> {
        let config: Config = toml::from_str(raw)?;
        Ok(config)
    }

    /// Check every value the simulation relies on
    pub fn validate(&self) -> SimResult<()> {
        self.scene.validate()?;
        self.run.validate()?;
        self.predictor.validate()?;
        Ok(())
    }
}

/// Dataset parameters shared by simulation and prediction runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub resolution_x: usize,
    pub resolution_y: usize,
    /// 1 for 2D scenes
    pub resolution_z: usize,
    /// Domain boundary width in cells
    pub b_width: usize,
    /// Faces left open, as letters `x X y Y z Z`
    pub open_bound: OpenBoundary,
    pub time_step: f32,
    pub buoyancy: f32,
    pub smoke_radius: f32,
    pub smoke_pos_y: f32,
    pub obstacle_pos_y: f32,
    pub obstacle_size: f32,
    pub obstacle_shape: ObstacleShape,
    pub min_obstacle_rot: f32,
    pub max_obstacle_rot: f32,
    pub min_src_pos: f32,
    pub max_src_pos: f32,
    pub nscale: f64,
    pub nrepeat: u32,
    pub cg_accuracy: f32,
    pub cg_max_iterations: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            resolution_x: 64,
            resolution_y: 64,
            resolution_z: 64,
            b_width: 1,
            open_bound: OpenBoundary::parse("yY").unwrap_or_default(),
            time_step: 1.0,
            buoyancy: -4e-3,
            smoke_radius: 0.14,
            smoke_pos_y: 0.14,
            obstacle_pos_y: 0.5,
            obstacle_size: 0.2,
            obstacle_shape: ObstacleShape::Cup,
            min_obstacle_rot: -0.5,
            max_obstacle_rot: 0.5,
            min_src_pos: 0.2,
            max_src_pos: 0.8,
            nscale: 0.03,
            nrepeat: 1000,
            cg_accuracy: 1e-3,
            cg_max_iterations: 1000,
        }
    }
}

impl SceneConfig {
    pub fn dims(&self) -> GridDims {
        GridDims::new(self.resolution_x, self.resolution_y, self.resolution_z)
    }

    fn validate(&self) -> SimResult<()> {
        let dims = self.dims();
        if dims.x == 0 || dims.y == 0 || dims.z == 0 {
            return Err(invalid_config("resolution", "all axes must be at least 1"));
        }
        let smallest = if dims.is_3d() { dims.x.min(dims.y).min(dims.z) } else { dims.x.min(dims.y) };
        if 2 * self.b_width + 1 > smallest {
            return Err(invalid_config(
                "b_width",
                format!("boundary width {} leaves no interior in {:?}", self.b_width, dims),
            ));
        }
        if self.max_obstacle_rot <= self.min_obstacle_rot {
            return Err(invalid_config("max_obstacle_rot", "must exceed min_obstacle_rot"));
        }
        if self.max_src_pos <= self.min_src_pos {
            return Err(invalid_config("max_src_pos", "must exceed min_src_pos"));
        }
        if self.time_step <= 0.0 {
            return Err(invalid_config("time_step", "must be positive"));
        }
        if self.obstacle_size <= 0.0 {
            return Err(invalid_config("obstacle_size", "must be positive"));
        }
        if self.nrepeat == 0 {
            return Err(invalid_config("nrepeat", "must be positive"));
        }
        Ok(())
    }
}

/// Built-in obstacle shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleShape {
    Cup,
    Box,
}

/// How frames after warmup are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionType {
    /// Physical solve for every frame
    Simulation,
    /// Physical solve, then an encode/decode round trip after warmup
    EncDec,
    /// Latent prediction of the velocity, density stays physically advected
    VelPrediction,
    /// Latent prediction of the full state
    Prediction,
}

impl std::str::FromStr for PredictionType {
    type Err = crate::error::SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simulation" => Ok(PredictionType::Simulation),
            "enc_dec" => Ok(PredictionType::EncDec),
            "vel_prediction" => Ok(PredictionType::VelPrediction),
            "prediction" => Ok(PredictionType::Prediction),
            other => Err(invalid_config("prediction_type", format!("unknown mode '{}'", other))),
        }
    }
}

/// Per-invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub seed: u64,
    pub num_scenes: usize,
    pub num_frames: usize,
    pub warmup_steps: usize,
    /// Stress-test multiplier for the per-scene rotation maximum
    pub obs_rotation_max_scale: f32,
    pub prediction_type: PredictionType,
    /// Skip export and record timings
    pub profile: bool,
    pub output_dir: PathBuf,
    pub run_name: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 10,
            num_scenes: 1,
            num_frames: 100,
            warmup_steps: 10,
            obs_rotation_max_scale: 1.0,
            prediction_type: PredictionType::VelPrediction,
            profile: false,
            output_dir: PathBuf::from("output"),
            run_name: "pred_smoke_rotating_cup_mov".to_string(),
        }
    }
}

impl RunConfig {
    fn validate(&self) -> SimResult<()> {
        if self.num_frames == 0 {
            return Err(invalid_config("num_frames", "must be positive"));
        }
        if !self.obs_rotation_max_scale.is_finite() {
            return Err(invalid_config("obs_rotation_max_scale", "must be finite"));
        }
        // predicted frames extrapolate from at least one encoded physical frame
        let predicts = matches!(
            self.prediction_type,
            PredictionType::VelPrediction | PredictionType::Prediction
        );
        if predicts && self.warmup_steps == 0 {
            return Err(invalid_config(
                "warmup_steps",
                format!("{:?} needs at least one warmup step", self.prediction_type),
            ));
        }
        Ok(())
    }
}

/// Channels stored in the latent representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataChannel {
    Velocity,
    Density,
}

/// Where a control parameter lives in the latent vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotIndex {
    /// Counted back from the end: `FromEnd(1)` is the last entry
    FromEnd(usize),
    /// Absolute offset
    At(usize),
}

/// Rotation/position slot pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSlots {
    pub rotation: SlotIndex,
    pub position: SlotIndex,
}

impl ParamSlots {
    /// The trailing pair every latent layout reserves
    pub const TRAILING: ParamSlots = ParamSlots {
        rotation: SlotIndex::FromEnd(2),
        position: SlotIndex::FromEnd(1),
    };
}

/// Settings of the predictor collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Supervised parameter count the predictor was trained with
    pub supervised_param_count: usize,
    pub data_type: Vec<DataChannel>,
    /// Slot pairs overwritten with the current control parameters
    pub param_slots: Vec<ParamSlots>,
    pub history_window: usize,
    /// Pooling block edge of the reference predictor, in cells
    pub block_size: usize,
    /// Weight of the last latent delta in the reference predictor
    pub momentum: f32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            supervised_param_count: SUPERVISED_PARAM_COUNT,
            data_type: vec![DataChannel::Velocity, DataChannel::Density],
            param_slots: vec![ParamSlots::TRAILING],
            history_window: DEFAULT_HISTORY_WINDOW,
            block_size: 4,
            momentum: 0.0,
        }
    }
}

impl PredictorConfig {
    pub fn has_density(&self) -> bool {
        self.data_type.contains(&DataChannel::Density)
    }

    fn validate(&self) -> SimResult<()> {
        if self.param_slots.is_empty() {
            return Err(invalid_config("param_slots", "at least one slot pair is required"));
        }
        if self.history_window == 0 {
            return Err(invalid_config("history_window", "must be positive"));
        }
        if self.block_size == 0 {
            return Err(invalid_config("block_size", "must be positive"));
        }
        if !self.data_type.contains(&DataChannel::Velocity) {
            return Err(invalid_config("data_type", "velocity channel is required"));
        }
        Ok(())
    }
}

/// On-disk encoding of exported fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFormat {
    Bincode,
    Json,
    Raw,
}

impl FieldFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FieldFormat::Bincode => "bin",
            FieldFormat::Json => "json",
            FieldFormat::Raw => "raw",
        }
    }
}

/// Frame export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: FieldFormat,
    pub compress: bool,
    /// File name template; `{kind}` and `{frame}` are substituted
    pub field_path_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: FieldFormat::Bincode,
            compress: false,
            field_path_format: "{kind}_{frame}".to_string(),
        }
    }
}
