use engine::{resolve_app_paths, LoopConfig, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, HauntedScene, LevelError, ScriptedInput};

const LEVEL_ENV_VAR: &str = "HAUNT_LEVEL";
const REALTIME_ENV_VAR: &str = "HAUNT_REALTIME";
const DEFAULT_LEVEL_NAME: &str = "demo";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("level '{name}': {source}")]
    Level {
        name: String,
        #[source]
        source: LevelError,
    },
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: HauntedScene,
    pub(crate) input: ScriptedInput,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Haunt Startup ===");

    let paths = resolve_app_paths()?;
    let level_name = level_name_from_env();
    let level_path = paths.level_file(&level_name);
    let level_error = |source| BootstrapError::Level {
        name: level_name.clone(),
        source,
    };

    let level = gameplay::load_level_file(&level_path).map_err(level_error)?;
    let (scene, input) = gameplay::build_session(&level).map_err(level_error)?;
    info!(
        level = %level.name,
        path = %level_path.display(),
        groups = level.platform_groups.len(),
        script_steps = level.script.len(),
        "level_loaded"
    );

    let config = LoopConfig {
        target_tps: level.session.target_tps,
        max_session_ticks: Some(level.session.max_ticks),
        realtime: realtime_from_env(),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene,
        input,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn level_name_from_env() -> String {
    std::env::var(LEVEL_ENV_VAR)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL_NAME.to_string())
}

fn realtime_from_env() -> bool {
    std::env::var(REALTIME_ENV_VAR)
        .map(|raw| matches!(raw.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
