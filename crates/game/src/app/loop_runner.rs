use std::process::ExitCode;

use engine::{run_headless, LoopExit};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    let summary = run_headless(&app.config, &mut app.scene, &mut app.input);
    if app.scene.is_faulted() {
        error!(ticks = summary.ticks, "session_aborted");
        return ExitCode::FAILURE;
    }

    let outcome = match summary.exit {
        LoopExit::SceneQuit if app.scene.is_player_dead() => "player_died",
        LoopExit::SceneQuit | LoopExit::InputQuit => "quit",
        LoopExit::TickCapReached => "tick_cap",
    };
    info!(
        ticks = summary.ticks,
        outcome,
        player = ?app.scene.player_position(),
        agent = ?app.scene.agent_position(),
        agent_speed = app.scene.agent().speed(),
        deaths_reported = app.scene.deaths_reported(),
        "session_finished"
    );
    ExitCode::SUCCESS
}
