use std::path::PathBuf;

use super::Config;
use crate::error::{invalid_config, SimResult};

impl Config {
    /// Apply a `key=value` override from the command line
    ///
    /// Only run-level settings may be overridden; scene parameters belong to
    /// the dataset and stay in the config file.
    pub fn apply_override(&mut self, pair: &str) -> SimResult<()> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| invalid_config(pair, "expected key=value"))?;
        let value = value.trim();
        let run = &mut self.run;

        match key.trim() {
            "seed" => run.seed = parse(key, value)?,
            "num_scenes" => run.num_scenes = parse(key, value)?,
            "num_frames" => run.num_frames = parse(key, value)?,
            "warmup_steps" => run.warmup_steps = parse(key, value)?,
            "obs_rotation_max_scale" | "obsRotationMaxScale" => {
                run.obs_rotation_max_scale = parse(key, value)?
            }
            "prediction_type" => run.prediction_type = value.parse()?,
            "profile" => run.profile = parse(key, value)?,
            "output_dir" => run.output_dir = PathBuf::from(value),
            "run_name" => run.run_name = value.to_string(),
            other => return Err(invalid_config(other, "not an overridable run setting")),
        }
        Ok(())
    }
}

fn parse<T>(key: &str, value: &str) -> SimResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| invalid_config(key, format!("'{}': {}", value, e)))
}
