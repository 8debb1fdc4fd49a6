mod level;
mod scene;
mod script;

pub(crate) use level::{load_level_file, LevelError};
pub(crate) use scene::{build_session, HauntedScene};
pub(crate) use script::ScriptedInput;
