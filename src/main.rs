//! Smoke prediction driver
//!
//! Usage: pred_smoke [config.toml] [key=value ...]
//! Overrides apply to the run section (seed, num_scenes, num_frames,
//! warmup_steps, obs_rotation_max_scale, prediction_type, profile,
//! output_dir, run_name).

use anyhow::{Context, Result};
use smoke_predict::Config;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1).peekable();
    let mut config = match args.peek() {
        Some(first) if !first.contains('=') => {
            let path = first.clone();
            args.next();
            Config::load(&path).with_context(|| format!("Failed to load config {}", path))?
        }
        _ => Config::default(),
    };
    for pair in args {
        config
            .apply_override(&pair)
            .with_context(|| format!("Invalid argument '{}'", pair))?;
    }

    let (report, run_dir) = smoke_predict::run(config)?;
    log::info!("[Main] Output in {}", run_dir.display());

    if report.has_warnings() {
        println!("Warnings");
        for warning in &report.warnings {
            println!("\t{}", warning);
        }
        println!("Done with warnings!");
    } else {
        println!("Done");
    }
    Ok(())
}
