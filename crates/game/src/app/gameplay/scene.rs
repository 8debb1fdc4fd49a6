use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use engine::gameplay::{
    EventBus, GameEvent, InteractOutcome, KinematicBody, MotionSystem, NavMesh, PlatformGroup,
    PlatformId, PursuitAgent,
};
use engine::{EntityId, InputSnapshot, Scene, SceneCommand};
use glam::Vec3;
use tracing::{debug, error, info, warn};

use super::level::{LevelError, LevelFile, ScriptAction, ScriptStep};
use super::script::ScriptedInput;

/// Player-facing input effects driven by bus events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct InputModifiers {
    pub(crate) inverted: bool,
    pub(crate) delayed: bool,
    /// Movement is blocked while a platform is armed.
    pub(crate) gated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingMove {
    due_tick: u64,
    delta: Vec3,
}

pub(crate) struct HauntedScene {
    level_name: String,
    bus: EventBus,
    modifiers: Rc<Cell<InputModifiers>>,
    deaths_reported: Rc<Cell<u32>>,
    player_dead: bool,
    faulted: bool,
    groups: Vec<PlatformGroup>,
    platform_entities: HashMap<EntityId, (usize, PlatformId)>,
    agent: PursuitAgent,
    agent_body: KinematicBody,
    nav: NavMesh,
    player_position: Vec3,
    input_delay_ticks: u64,
    pending_moves: VecDeque<PendingMove>,
    timeline: Vec<ScriptStep>,
    timeline_cursor: usize,
    tick: u64,
}

/// Builds the scene and its input source from a parsed level.
pub(crate) fn build_session(level: &LevelFile) -> Result<(HauntedScene, ScriptedInput), LevelError> {
    let nav = level.nav_mesh.build()?;
    let capabilities = level.sensors.capabilities();

    let mut groups = Vec::with_capacity(level.platform_groups.len());
    let mut platform_entities = HashMap::new();
    for (group_index, group_def) in level.platform_groups.iter().enumerate() {
        let configs = group_def
            .platforms
            .iter()
            .map(|platform| {
                let mut config = platform.config.clone();
                config.group = group_def.tag.clone();
                config
            })
            .collect::<Vec<_>>();
        groups.push(PlatformGroup::from_configs(
            group_def.tag.clone(),
            &configs,
            capabilities,
        )?);
        for (platform_index, platform) in group_def.platforms.iter().enumerate() {
            platform_entities.insert(
                EntityId(platform.entity),
                (group_index, PlatformId(platform_index)),
            );
        }
    }

    let agent = PursuitAgent::new(level.pursuit.clone())?;
    let mut timeline = level
        .script
        .iter()
        .copied()
        .filter(|step| !step.action.is_device_input())
        .collect::<Vec<_>>();
    timeline.sort_by_key(|step| step.tick);

    let scene = HauntedScene {
        level_name: level.name.clone(),
        bus: EventBus::new(),
        modifiers: Rc::new(Cell::new(InputModifiers::default())),
        deaths_reported: Rc::new(Cell::new(0)),
        player_dead: false,
        faulted: false,
        groups,
        platform_entities,
        agent,
        agent_body: KinematicBody::at(level.agent_start),
        nav,
        player_position: level.player_start,
        input_delay_ticks: level.session.input_delay_ticks,
        pending_moves: VecDeque::new(),
        timeline,
        timeline_cursor: 0,
        tick: 0,
    };
    let input = ScriptedInput::new(level.sensors, &level.script);
    Ok((scene, input))
}

impl HauntedScene {
    #[cfg(test)]
    pub(crate) fn modifiers(&self) -> InputModifiers {
        self.modifiers.get()
    }

    pub(crate) fn player_position(&self) -> Vec3 {
        self.player_position
    }

    pub(crate) fn is_player_dead(&self) -> bool {
        self.player_dead
    }

    /// True once a script step or the pursuit hit an error and ended the session.
    pub(crate) fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub(crate) fn deaths_reported(&self) -> u32 {
        self.deaths_reported.get()
    }

    pub(crate) fn agent(&self) -> &PursuitAgent {
        &self.agent
    }

    pub(crate) fn agent_position(&self) -> Vec3 {
        self.agent_body.position()
    }

    #[cfg(test)]
    pub(crate) fn groups(&self) -> &[PlatformGroup] {
        &self.groups
    }

    #[cfg(test)]
    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn subscribe_handlers(&mut self) {
        let modifiers = Rc::clone(&self.modifiers);
        self.bus.on_input_inversion(move |enabled| {
            let mut current = modifiers.get();
            current.inverted = enabled;
            modifiers.set(current);
        });
        let modifiers = Rc::clone(&self.modifiers);
        self.bus.on_input_delay(move |enabled| {
            let mut current = modifiers.get();
            current.delayed = enabled;
            modifiers.set(current);
        });
        let modifiers = Rc::clone(&self.modifiers);
        self.bus.on_inputs_gated(move |gated| {
            let mut current = modifiers.get();
            current.gated = gated;
            modifiers.set(current);
        });
        let deaths_reported = Rc::clone(&self.deaths_reported);
        self.bus.on_player_died(move || {
            deaths_reported.set(deaths_reported.get().saturating_add(1));
        });
    }

    fn run_timeline(&mut self) -> Result<(), LevelError> {
        while let Some(step) = self.timeline.get(self.timeline_cursor).copied() {
            if step.tick > self.tick {
                break;
            }
            self.timeline_cursor += 1;
            self.apply_world_action(step.action)?;
        }
        Ok(())
    }

    fn apply_world_action(&mut self, action: ScriptAction) -> Result<(), LevelError> {
        match action {
            ScriptAction::MovePlayer { delta } => self.queue_player_move(delta),
            ScriptAction::StartHaunt => {
                self.agent
                    .spawn_and_haunt(self.player_position, &self.nav, &mut self.agent_body)?;
            }
            ScriptAction::StopHaunt => {
                self.agent.stop_haunting();
                self.agent_body.stop();
            }
            ScriptAction::InvertInputs { enabled } => {
                self.bus.publish(GameEvent::InputInversionChanged(enabled));
            }
            ScriptAction::DelayInputs { enabled } => {
                self.bus.publish(GameEvent::InputDelayChanged(enabled));
            }
            ScriptAction::Interact { .. }
            | ScriptAction::Rotate
            | ScriptAction::Gyro { .. }
            | ScriptAction::Tilt { .. }
            | ScriptAction::Quit => {}
        }
        Ok(())
    }

    fn queue_player_move(&mut self, delta: Vec3) {
        let modifiers = self.modifiers.get();
        if modifiers.gated {
            debug!(tick = self.tick, "player_move_ignored_inputs_gated");
            return;
        }
        let delta = if modifiers.inverted { -delta } else { delta };
        let due_tick = if modifiers.delayed {
            self.tick.saturating_add(self.input_delay_ticks)
        } else {
            self.tick
        };
        self.pending_moves.push_back(PendingMove { due_tick, delta });
    }

    fn apply_due_moves(&mut self) {
        while let Some(pending) = self.pending_moves.front().copied() {
            if pending.due_tick > self.tick {
                break;
            }
            self.pending_moves.pop_front();
            self.player_position += pending.delta;
        }
    }

    fn handle_interaction(&mut self, input: &InputSnapshot) {
        let Some(entity) = input.interact_target() else {
            return;
        };
        let Some(&(group_index, platform_id)) = self.platform_entities.get(&entity) else {
            debug!(entity = %entity, "interaction_target_not_a_platform");
            return;
        };
        let Some(group) = self.groups.get_mut(group_index) else {
            return;
        };
        let outcome = group.interact(platform_id, input, &mut self.bus);
        if outcome == InteractOutcome::UnknownPlatform {
            warn!(entity = %entity, platform = %platform_id, "platform_binding_stale");
        }
    }

    fn handle_death(&mut self) -> SceneCommand {
        if self.deaths_reported.get() == 0 {
            return SceneCommand::None;
        }
        if !self.player_dead {
            self.player_dead = true;
            self.agent.stop_haunting();
            self.agent_body.stop();
            info!(
                tick = self.tick,
                agent_speed = self.agent.speed(),
                retargets = self.agent.retarget_count(),
                "player_died"
            );
        }
        SceneCommand::Quit
    }
}

impl Scene for HauntedScene {
    fn load(&mut self) {
        self.subscribe_handlers();
        info!(
            level = %self.level_name,
            groups = self.groups.len(),
            platforms = self.platform_entities.len(),
            "scene_loaded"
        );
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if self.player_dead || self.faulted {
            return SceneCommand::Quit;
        }
        if let Err(err) = self.run_timeline() {
            error!(error = %err, tick = self.tick, "script_step_failed");
            self.faulted = true;
            return SceneCommand::Quit;
        }

        self.handle_interaction(input);
        let manual_trigger = input.rotate_pressed();
        for group in &mut self.groups {
            group.update(fixed_dt_seconds, input, manual_trigger);
        }

        self.apply_due_moves();
        self.agent_body.step(fixed_dt_seconds);
        if let Err(err) = self.agent.update(
            fixed_dt_seconds,
            self.player_position,
            &self.nav,
            &mut self.agent_body,
            &mut self.bus,
        ) {
            error!(error = %err, tick = self.tick, "pursuit_failed");
            self.faulted = true;
            return SceneCommand::Quit;
        }

        let command = self.handle_death();
        self.tick = self.tick.saturating_add(1);
        command
    }

    fn unload(&mut self) {
        self.agent.stop_haunting();
        self.agent_body.stop();
        let counts = self.bus.counts();
        self.bus.clear();
        info!(
            level = %self.level_name,
            ticks = self.tick,
            events = counts.total,
            deaths_reported = self.deaths_reported.get(),
            "scene_unloaded"
        );
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!("haunt:{}", self.level_name))
    }
}
