mod app;
use app::WindowSurface;

use anyhow::{Context, Result};
use log::{info, warn};
use mot_core::{SessionPhase, SurfaceError};
use mot_experiment::response::collect_text;
use mot_experiment::{ExperimentConfig, ExperimentError, Session, session_date};
use mot_render::find_font;
use mot_timing::HighPrecisionTimer;
use std::path::Path;

/// Environment variable pointing at a JSON file of config overrides.
const CONFIG_ENV: &str = "MOT_CONFIG";

fn load_config() -> Result<ExperimentConfig> {
    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = Path::new(&path);
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ExperimentConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== MULTIPLE OBJECT TRACKING ===");
    info!("Platform: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    info!("Press ESC at any prompt to abort.");

    let mut rng = rand::rng();
    let config = load_config()?.with_random_attended_color(&mut rng);
    info!("configuration: {}", serde_json::to_string(&config)?);

    let font = find_font(None);
    let mut surface = WindowSurface::open(&config, font)?;

    let subject_id = match collect_text(&mut surface, "Subject ID:") {
        Ok(id) => id,
        Err(ExperimentError::Surface(SurfaceError::Aborted)) => {
            warn!("aborted before the session started");
            surface.close();
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut session = Session::new(subject_id, session_date(), config)?;
    let mut timer = HighPrecisionTimer::new();
    let result = session.run(&mut surface, &mut timer, &mut rng);
    surface.close();

    match result {
        Ok(path) => info!("Experiment completed: {}", path.display()),
        Err(ExperimentError::Surface(SurfaceError::Aborted)) if session.phase() == SessionPhase::Debrief => {
            info!("Debrief skipped; data saved to {}", session.output_path().display());
        }
        Err(ExperimentError::Surface(SurfaceError::Aborted)) => {
            warn!("session aborted in phase {:?}; no data written", session.phase());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
