use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::gameplay::{
    ConfigError, NavError, NavMesh, PlatformConfig, PursuitConfig, SensorCapabilities,
};
use engine::EntityId;
use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse level json: {0}")]
    ParseRoot(#[source] serde_json::Error),
    #[error("parse level json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid nav mesh: {0}")]
    NavMesh(#[from] NavError),
    #[error("invalid tuning: {0}")]
    Config(#[from] ConfigError),
    #[error(
        "agent_start {agent_start:?} is within kill_distance {kill_distance} of player_start {player_start:?}"
    )]
    AgentStartsInKillRange {
        agent_start: Vec3,
        player_start: Vec3,
        kill_distance: f32,
    },
    #[error("{entity} is bound to more than one platform")]
    DuplicatePlatformEntity { entity: EntityId },
    #[error("script step at tick {tick} interacts with {entity}, which is not a platform")]
    UnknownScriptTarget { tick: u64, entity: EntityId },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelFile {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) session: SessionSettings,
    #[serde(default)]
    pub(crate) sensors: SensorSettings,
    pub(crate) player_start: Vec3,
    /// Where the agent waits while dormant; it must be out of kill range.
    pub(crate) agent_start: Vec3,
    pub(crate) nav_mesh: NavMeshDef,
    pub(crate) platform_groups: Vec<PlatformGroupDef>,
    #[serde(default)]
    pub(crate) pursuit: PursuitConfig,
    #[serde(default)]
    pub(crate) script: Vec<ScriptStep>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionSettings {
    pub(crate) target_tps: u32,
    pub(crate) max_ticks: u64,
    /// Ticks a movement input waits while inputs are delayed.
    pub(crate) input_delay_ticks: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: 3_600,
            input_delay_ticks: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SensorSettings {
    pub(crate) gyroscope: bool,
    pub(crate) accelerometer: bool,
    /// Reading reported by the accelerometer while the device lies still.
    pub(crate) resting_acceleration: Vec3,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            gyroscope: true,
            accelerometer: true,
            resting_acceleration: Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

impl SensorSettings {
    pub(crate) fn capabilities(&self) -> SensorCapabilities {
        SensorCapabilities {
            gyroscope: self.gyroscope,
            accelerometer: self.accelerometer,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NavMeshDef {
    pub(crate) vertices: Vec<Vec3>,
    pub(crate) indices: Vec<u32>,
}

impl NavMeshDef {
    pub(crate) fn build(&self) -> Result<NavMesh, NavError> {
        NavMesh::new(self.vertices.clone(), self.indices.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlatformGroupDef {
    pub(crate) tag: String,
    pub(crate) platforms: Vec<PlatformDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlatformDef {
    pub(crate) entity: u64,
    #[serde(default)]
    pub(crate) config: PlatformConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub(crate) struct ScriptStep {
    pub(crate) tick: u64,
    #[serde(flatten)]
    pub(crate) action: ScriptAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum ScriptAction {
    Interact { entity: u64 },
    Rotate,
    Gyro { rate: Vec3 },
    Tilt { acceleration: Vec3 },
    MovePlayer { delta: Vec3 },
    StartHaunt,
    StopHaunt,
    InvertInputs { enabled: bool },
    DelayInputs { enabled: bool },
    Quit,
}

impl ScriptAction {
    /// Whether the step is read by the input source rather than the scene.
    pub(crate) fn is_device_input(&self) -> bool {
        matches!(
            self,
            ScriptAction::Interact { .. }
                | ScriptAction::Rotate
                | ScriptAction::Gyro { .. }
                | ScriptAction::Tilt { .. }
                | ScriptAction::Quit
        )
    }
}

pub(crate) fn load_level_file(path: &Path) -> Result<LevelFile, LevelError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level_json(&raw)
}

pub(crate) fn parse_level_json(raw: &str) -> Result<LevelFile, LevelError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let level = match serde_path_to_error::deserialize::<_, LevelFile>(&mut deserializer) {
        Ok(level) => level,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            // Syntax errors carry no location and report "?".
            return if path.is_empty() || path == "." || path == "?" {
                Err(LevelError::ParseRoot(source))
            } else {
                Err(LevelError::Parse { path, source })
            };
        }
    };
    validate_level(&level)?;
    Ok(level)
}

fn validate_level(level: &LevelFile) -> Result<(), LevelError> {
    let kill_distance = level.pursuit.kill_distance;
    if level.agent_start.distance(level.player_start) <= kill_distance {
        return Err(LevelError::AgentStartsInKillRange {
            agent_start: level.agent_start,
            player_start: level.player_start,
            kill_distance,
        });
    }
    let mut platform_entities = HashSet::new();
    for group in &level.platform_groups {
        for platform in &group.platforms {
            let entity = EntityId(platform.entity);
            if !platform_entities.insert(entity) {
                return Err(LevelError::DuplicatePlatformEntity { entity });
            }
        }
    }
    for step in &level.script {
        if let ScriptAction::Interact { entity } = step.action {
            let entity = EntityId(entity);
            if !platform_entities.contains(&entity) {
                return Err(LevelError::UnknownScriptTarget {
                    tick: step.tick,
                    entity,
                });
            }
        }
    }
    Ok(())
}
