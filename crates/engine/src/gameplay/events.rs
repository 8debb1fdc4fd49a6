use std::fmt;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEventKind {
    InputInversionChanged,
    InputDelayChanged,
    InputsGatedChanged,
    PlayerDied,
}

const EVENT_KIND_COUNT: usize = 4;

impl GameEventKind {
    pub const ALL: [GameEventKind; EVENT_KIND_COUNT] = [
        GameEventKind::InputInversionChanged,
        GameEventKind::InputDelayChanged,
        GameEventKind::InputsGatedChanged,
        GameEventKind::PlayerDied,
    ];

    const fn index(self) -> usize {
        match self {
            GameEventKind::InputInversionChanged => 0,
            GameEventKind::InputDelayChanged => 1,
            GameEventKind::InputsGatedChanged => 2,
            GameEventKind::PlayerDied => 3,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            GameEventKind::InputInversionChanged => "input_inversion_changed",
            GameEventKind::InputDelayChanged => "input_delay_changed",
            GameEventKind::InputsGatedChanged => "inputs_gated_changed",
            GameEventKind::PlayerDied => "player_died",
        }
    }
}

impl fmt::Display for GameEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Signals carried between otherwise independent gameplay systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Player inputs should (or should no longer) be inverted.
    InputInversionChanged(bool),
    /// Player inputs should (or should no longer) be delayed.
    InputDelayChanged(bool),
    /// A platform took (or released) exclusive use of the motion inputs.
    InputsGatedChanged(bool),
    PlayerDied,
}

impl GameEvent {
    pub fn kind(self) -> GameEventKind {
        match self {
            Self::InputInversionChanged(_) => GameEventKind::InputInversionChanged,
            Self::InputDelayChanged(_) => GameEventKind::InputDelayChanged,
            Self::InputsGatedChanged(_) => GameEventKind::InputsGatedChanged,
            Self::PlayerDied => GameEventKind::PlayerDied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub total: u32,
    pub input_inversion_changed: u32,
    pub input_delay_changed: u32,
    pub inputs_gated_changed: u32,
    pub player_died: u32,
}

impl EventCounts {
    fn record(&mut self, kind: GameEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            GameEventKind::InputInversionChanged => &mut self.input_inversion_changed,
            GameEventKind::InputDelayChanged => &mut self.input_delay_changed,
            GameEventKind::InputsGatedChanged => &mut self.inputs_gated_changed,
            GameEventKind::PlayerDied => &mut self.player_died,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn for_kind(&self, kind: GameEventKind) -> u32 {
        match kind {
            GameEventKind::InputInversionChanged => self.input_inversion_changed,
            GameEventKind::InputDelayChanged => self.input_delay_changed,
            GameEventKind::InputsGatedChanged => self.inputs_gated_changed,
            GameEventKind::PlayerDied => self.player_died,
        }
    }
}

type Handler = Box<dyn FnMut(GameEvent)>;

struct Subscriber {
    id: SubscriptionId,
    handler: Handler,
}

/// Synchronous publish/subscribe hub shared by the gameplay systems of a level.
///
/// Handlers run on the publishing thread, in registration order, before
/// `publish` returns. Nothing is queued: a handler registered after a publish
/// never observes it. `publish` borrows the bus mutably, so handlers cannot
/// subscribe or unsubscribe while a dispatch is in flight.
#[derive(Default)]
pub struct EventBus {
    subscribers: [Vec<Subscriber>; EVENT_KIND_COUNT],
    next_subscription_id: u64,
    counts: EventCounts,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in GameEventKind::ALL {
            map.entry(&kind.as_token(), &self.subscriber_count(kind));
        }
        map.finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: GameEventKind,
        handler: impl FnMut(GameEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id = self.next_subscription_id.saturating_add(1);
        self.subscribers[kind.index()].push(Subscriber {
            id,
            handler: Box::new(handler),
        });
        id
    }

    pub fn on_input_inversion(&mut self, mut handler: impl FnMut(bool) + 'static) -> SubscriptionId {
        self.subscribe(GameEventKind::InputInversionChanged, move |event| {
            if let GameEvent::InputInversionChanged(inverted) = event {
                handler(inverted);
            }
        })
    }

    pub fn on_input_delay(&mut self, mut handler: impl FnMut(bool) + 'static) -> SubscriptionId {
        self.subscribe(GameEventKind::InputDelayChanged, move |event| {
            if let GameEvent::InputDelayChanged(delayed) = event {
                handler(delayed);
            }
        })
    }

    pub fn on_inputs_gated(&mut self, mut handler: impl FnMut(bool) + 'static) -> SubscriptionId {
        self.subscribe(GameEventKind::InputsGatedChanged, move |event| {
            if let GameEvent::InputsGatedChanged(gated) = event {
                handler(gated);
            }
        })
    }

    pub fn on_player_died(&mut self, mut handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe(GameEventKind::PlayerDied, move |_| handler())
    }

    /// Removes a handler. Returns false when the id is unknown or already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for list in &mut self.subscribers {
            if let Some(position) = list.iter().position(|subscriber| subscriber.id == id) {
                list.remove(position);
                return true;
            }
        }
        false
    }

    pub fn publish(&mut self, event: GameEvent) {
        let kind = event.kind();
        self.counts.record(kind);
        let list = &mut self.subscribers[kind.index()];
        trace!(kind = %kind, subscribers = list.len(), "event_published");
        for subscriber in list.iter_mut() {
            (subscriber.handler)(event);
        }
    }

    pub fn subscriber_count(&self, kind: GameEventKind) -> usize {
        self.subscribers[kind.index()].len()
    }

    pub fn counts(&self) -> EventCounts {
        self.counts
    }

    /// Drops every handler and resets counters; used when a level unloads.
    pub fn clear(&mut self) {
        for list in &mut self.subscribers {
            list.clear();
        }
        self.counts = EventCounts::default();
    }
}
