use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::Config;
use crate::error::{SimErrorContext, SimResult};

/// Timestamped output directory of one invocation
#[derive(Debug, Clone)]
pub struct RunDirectory {
    path: PathBuf,
}

impl RunDirectory {
    /// Create `<output_dir>/<run_name>_<%m%d_%H%M%S>` and store the resolved
    /// configuration in it as `params.json`
    pub fn create(config: &Config) -> SimResult<Self> {
        let timestamp = Local::now().format("%m%d_%H%M%S");
        let name = format!("{}_{}", config.run.run_name, timestamp);
        let path = config.run.output_dir.join(name);
        Self::create_at(path, config)
    }

    /// Same as `create` with an explicit path
    pub fn create_at(path: impl Into<PathBuf>, config: &Config) -> SimResult<Self> {
        let path = path.into();
        fs::create_dir_all(&path).sim_context(&format!("creating {}", path.display()))?;

        let params = serde_json::to_string_pretty(config)?;
        let params_path = path.join("params.json");
        fs::write(&params_path, params).sim_context(&format!("writing {}", params_path.display()))?;

        log::info!("[RunDirectory] Writing to {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_directory_holds_params() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.run.output_dir = tmp.path().to_path_buf();
        config.run.seed = 42;
        let dir = RunDirectory::create(&config).unwrap();

        let name = dir.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("pred_smoke_rotating_cup_mov_"));
        let raw = fs::read_to_string(dir.path().join("params.json")).unwrap();
        let back: Config = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.run.seed, 42);
    }
}
