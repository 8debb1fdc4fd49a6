use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::input::InputSource;
use super::scene::{Scene, SceneCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    /// Stop after this many ticks even if the scene keeps going.
    pub max_session_ticks: Option<u64>,
    /// Pace ticks against the wall clock instead of running them back to back.
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_session_ticks: None,
            realtime: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    SceneQuit,
    InputQuit,
    TickCapReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub exit: LoopExit,
}

/// Drives `scene` at a fixed timestep until it quits, input asks to quit, or
/// the session tick cap is hit.
pub fn run_headless(
    config: &LoopConfig,
    scene: &mut dyn Scene,
    input: &mut dyn InputSource,
) -> LoopSummary {
    let target_tps = config.target_tps.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let mut driver = TickDriver {
        fixed_dt_seconds: fixed_dt.as_secs_f32(),
        max_session_ticks: config.max_session_ticks,
        ticks: 0,
    };

    scene.load();
    info!(
        target_tps,
        realtime = config.realtime,
        scene = scene.debug_title().as_deref().unwrap_or("untitled"),
        "loop_started"
    );

    let exit = if config.realtime {
        let max_frame_delta =
            normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
        driver.run_realtime(
            scene,
            input,
            fixed_dt,
            max_frame_delta,
            config.max_ticks_per_frame.max(1),
        )
    } else {
        driver.run_stepped(scene, input)
    };

    scene.unload();
    info!(ticks = driver.ticks, exit = ?exit, "loop_finished");
    LoopSummary {
        ticks: driver.ticks,
        exit,
    }
}

struct TickDriver {
    fixed_dt_seconds: f32,
    max_session_ticks: Option<u64>,
    ticks: u64,
}

impl TickDriver {
    fn run_stepped(&mut self, scene: &mut dyn Scene, input: &mut dyn InputSource) -> LoopExit {
        loop {
            if let Some(exit) = self.run_tick(scene, input) {
                return exit;
            }
        }
    }

    fn run_realtime(
        &mut self,
        scene: &mut dyn Scene,
        input: &mut dyn InputSource,
        fixed_dt: Duration,
        max_frame_delta: Duration,
        max_ticks_per_frame: u32,
    ) -> LoopExit {
        let mut accumulator = Duration::ZERO;
        let mut last_frame = Instant::now();
        loop {
            let frame_start = Instant::now();
            let frame_dt = clamp_frame_delta(
                frame_start.saturating_duration_since(last_frame),
                max_frame_delta,
            );
            last_frame = frame_start;
            accumulator = accumulator.saturating_add(frame_dt);

            let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
            if !step_plan.dropped_backlog.is_zero() {
                warn!(
                    dropped_ms = step_plan.dropped_backlog.as_millis() as u64,
                    "sim_backlog_dropped"
                );
            }
            for _ in 0..step_plan.ticks_to_run {
                if let Some(exit) = self.run_tick(scene, input) {
                    return exit;
                }
            }
            accumulator = step_plan.remaining_accumulator;

            let elapsed = frame_start.elapsed();
            if elapsed < fixed_dt {
                thread::sleep(fixed_dt - elapsed);
            }
        }
    }

    fn run_tick(&mut self, scene: &mut dyn Scene, input: &mut dyn InputSource) -> Option<LoopExit> {
        if self
            .max_session_ticks
            .is_some_and(|max_ticks| self.ticks >= max_ticks)
        {
            return Some(LoopExit::TickCapReached);
        }
        let snapshot = input.snapshot_for_tick(self.ticks);
        if snapshot.quit_requested() {
            return Some(LoopExit::InputQuit);
        }
        let command = scene.update(self.fixed_dt_seconds, &snapshot);
        self.ticks = self.ticks.saturating_add(1);
        match command {
            SceneCommand::Quit => Some(LoopExit::SceneQuit),
            SceneCommand::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::{InputAction, InputSnapshot};

    #[derive(Default)]
    struct CountingScene {
        loads: u32,
        unloads: u32,
        updates: u32,
        quit_after: Option<u32>,
        last_dt: f32,
    }

    impl Scene for CountingScene {
        fn load(&mut self) {
            self.loads += 1;
        }

        fn update(&mut self, fixed_dt_seconds: f32, _input: &InputSnapshot) -> SceneCommand {
            self.updates += 1;
            self.last_dt = fixed_dt_seconds;
            if self.quit_after == Some(self.updates) {
                SceneCommand::Quit
            } else {
                SceneCommand::None
            }
        }

        fn unload(&mut self) {
            self.unloads += 1;
        }
    }

    struct QuitAt(u64);

    impl InputSource for QuitAt {
        fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
            InputSnapshot::empty().with_action_down(InputAction::Quit, tick == self.0)
        }
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn stepped_loop_stops_at_tick_cap() {
        let mut scene = CountingScene::default();
        let config = LoopConfig {
            max_session_ticks: Some(12),
            ..LoopConfig::default()
        };

        let summary = run_headless(&config, &mut scene, &mut QuitAt(u64::MAX));

        assert_eq!(summary.exit, LoopExit::TickCapReached);
        assert_eq!(summary.ticks, 12);
        assert_eq!(scene.updates, 12);
        assert_eq!((scene.loads, scene.unloads), (1, 1));
        assert!((scene.last_dt - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn scene_quit_ends_loop() {
        let mut scene = CountingScene {
            quit_after: Some(3),
            ..CountingScene::default()
        };

        let summary = run_headless(&LoopConfig::default(), &mut scene, &mut QuitAt(u64::MAX));

        assert_eq!(summary.exit, LoopExit::SceneQuit);
        assert_eq!(summary.ticks, 3);
    }

    #[test]
    fn input_quit_skips_the_scene_update() {
        let mut scene = CountingScene::default();

        let summary = run_headless(&LoopConfig::default(), &mut scene, &mut QuitAt(5));

        assert_eq!(summary.exit, LoopExit::InputQuit);
        assert_eq!(scene.updates, 5);
        assert_eq!(scene.unloads, 1);
    }

    #[test]
    fn realtime_loop_honours_tick_cap() {
        let mut scene = CountingScene::default();
        let config = LoopConfig {
            target_tps: 240,
            max_session_ticks: Some(4),
            realtime: true,
            ..LoopConfig::default()
        };

        let summary = run_headless(&config, &mut scene, &mut QuitAt(u64::MAX));

        assert_eq!(summary.exit, LoopExit::TickCapReached);
        assert_eq!(scene.updates, 4);
    }
}
