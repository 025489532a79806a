//! Frame timing
//!
//! Each frame has two timed phases: transport (source, advection, domain
//! rebuild) and solve (pressure solve or prediction, then export). Obstacle
//! placement between them is not timed. Only frames after the warmup
//! prefix are recorded.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{SimErrorContext, SimResult};

/// Timings of one scene, in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneProfile {
    pub transport: Vec<f64>,
    pub solve: Vec<f64>,
}

impl SceneProfile {
    /// Per-frame totals
    pub fn total(&self) -> Vec<f64> {
        self.transport.iter().zip(&self.solve).map(|(a, b)| a + b).collect()
    }

    pub fn mean_total(&self) -> Option<f64> {
        let total = self.total();
        (!total.is_empty()).then(|| total.iter().sum::<f64>() / total.len() as f64)
    }
}

/// Timings of every scene of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunProfile {
    pub scenes: Vec<SceneProfile>,
}

#[derive(Serialize)]
struct ProfileSummary<'a> {
    mean_frame_seconds: Option<f64>,
    frames: usize,
    scenes: &'a [SceneProfile],
}

impl RunProfile {
    pub fn frames(&self) -> usize {
        self.scenes.iter().map(|s| s.transport.len()).sum()
    }

    pub fn mean_frame(&self) -> Option<f64> {
        let frames = self.frames();
        let sum: f64 = self.scenes.iter().flat_map(|s| s.total()).sum();
        (frames > 0).then(|| sum / frames as f64)
    }

    /// Write the timings and their mean as `profile.json`
    pub fn write(&self, dir: &Path) -> SimResult<()> {
        let summary = ProfileSummary {
            mean_frame_seconds: self.mean_frame(),
            frames: self.frames(),
            scenes: &self.scenes,
        };
        let json = serde_json::to_string_pretty(&summary)?;
        let path = dir.join("profile.json");
        std::fs::write(&path, json).sim_context(&format!("writing {}", path.display()))?;
        log::info!("[Profiler] Wrote {}", path.display());
        Ok(())
    }
}

/// Splits one frame into its two timed phases
#[derive(Debug)]
pub struct FrameTimer {
    start: Instant,
    transport: Option<Duration>,
}

impl FrameTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            transport: None,
        }
    }

    pub fn end_transport(&mut self) {
        self.transport = Some(self.start.elapsed());
    }

    pub fn start_solve(&mut self) {
        self.start = Instant::now();
    }

    /// End the solve phase, returning (transport, solve) seconds
    pub fn finish(self) -> (f64, f64) {
        let solve = self.start.elapsed();
        (self.transport.unwrap_or_default().as_secs_f64(), solve.as_secs_f64())
    }
}
