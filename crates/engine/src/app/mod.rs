mod input;
mod loop_runner;
mod scene;

pub use input::{InputAction, InputSnapshot, InputSource};
pub use loop_runner::{run_headless, LoopConfig, LoopExit, LoopSummary};
pub use scene::{EntityId, Scene, SceneCommand};
