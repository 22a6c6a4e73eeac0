//! Combat lifecycle notifications.
//!
//! Every observable moment of a session is a [`CombatEvent`] dispatched
//! through the [`EventBus`]: an ordered, synchronous multicast. Subscribers
//! run in registration order with no isolation; a panicking subscriber
//! unwinds through the engine and aborts the current turn, which is
//! documented caller error. Events involving a specific character are also
//! re-raised to that character's mirrored subscribers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::field::character::CharacterId;
use crate::field::geom::Vec2;
use crate::field::zone::ZoneId;

/// Which of the two per-turn movement windows a movement event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementPhase {
    Before,
    After,
}

/// A notification raised by the combat core.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    RoundStarting {
        round: u32,
    },
    RoundEnded {
        round: u32,
    },
    TurnStarted {
        combatant: CharacterId,
    },
    TurnEnded {
        combatant: CharacterId,
    },
    MoveSelected {
        combatant: CharacterId,
        move_index: usize,
    },
    /// Fired once per selected target, before movement and again
    /// (additively) for targets gained by post-move re-targeting.
    Targeted {
        combatant: CharacterId,
        target: CharacterId,
    },
    MovementApplied {
        combatant: CharacterId,
        phase: MovementPhase,
        from: Vec2,
        to: Vec2,
    },
    BeforeAction {
        combatant: CharacterId,
        targets: Vec<CharacterId>,
    },
    AfterAction {
        combatant: CharacterId,
        executed: bool,
    },
    CharacterAdded {
        character: CharacterId,
    },
    CharacterRemoved {
        character: CharacterId,
    },
    ZoneEntered {
        zone: ZoneId,
        character: CharacterId,
    },
    ZoneExited {
        zone: ZoneId,
        character: CharacterId,
    },
    Missed {
        attacker: CharacterId,
    },
    Dodged {
        attacker: CharacterId,
        target: CharacterId,
    },
    PreDamage {
        attacker: CharacterId,
        target: CharacterId,
        amount: f32,
    },
    PreReceive {
        attacker: CharacterId,
        target: CharacterId,
        amount: f32,
    },
    PostDamage {
        attacker: CharacterId,
        target: CharacterId,
        amount: f32,
        remaining_health: f32,
    },
    PreRecoil {
        attacker: CharacterId,
        target: CharacterId,
    },
    Recoil {
        attacker: CharacterId,
        target: CharacterId,
        displacement: Vec2,
    },
}

impl CombatEvent {
    /// Characters an event should be mirrored to.
    pub fn subjects(&self) -> Vec<CharacterId> {
        use CombatEvent::*;
        match *self {
            RoundStarting { .. } | RoundEnded { .. } => Vec::new(),
            TurnStarted { combatant }
            | TurnEnded { combatant }
            | MoveSelected { combatant, .. }
            | MovementApplied { combatant, .. }
            | AfterAction { combatant, .. } => vec![combatant],
            Targeted { combatant, target } => vec![combatant, target],
            BeforeAction { combatant, .. } => vec![combatant],
            CharacterAdded { character }
            | CharacterRemoved { character }
            | ZoneEntered { character, .. }
            | ZoneExited { character, .. } => vec![character],
            Missed { attacker } => vec![attacker],
            Dodged { attacker, target }
            | PreDamage {
                attacker, target, ..
            }
            | PreReceive {
                attacker, target, ..
            }
            | PostDamage {
                attacker, target, ..
            }
            | PreRecoil { attacker, target }
            | Recoil {
                attacker, target, ..
            } => vec![attacker, target],
        }
    }
}

type Subscriber = Box<dyn FnMut(&CombatEvent)>;

/// Ordered synchronous event dispatch.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    mirrors: HashMap<CharacterId, Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Registers a session-wide subscriber. Subscribers run in
    /// registration order.
    pub fn subscribe(&mut self, f: impl FnMut(&CombatEvent) + 'static) {
        self.subscribers.push(Box::new(f));
    }

    /// Registers a subscriber that only receives events involving `id`.
    pub fn subscribe_character(&mut self, id: CharacterId, f: impl FnMut(&CombatEvent) + 'static) {
        self.mirrors.entry(id).or_default().push(Box::new(f));
    }

    /// Dispatches an event to all session subscribers, then mirrors it to
    /// the per-character subscribers of every involved character.
    pub fn emit(&mut self, event: &CombatEvent) {
        for sub in self.subscribers.iter_mut() {
            sub(event);
        }
        if self.mirrors.is_empty() {
            return;
        }
        for id in event.subjects() {
            if let Some(subs) = self.mirrors.get_mut(&id) {
                for sub in subs.iter_mut() {
                    sub(event);
                }
            }
        }
    }

    /// Subscribes a recorder and returns the shared log, for tests and
    /// host-side tracing.
    pub fn record(&mut self) -> Rc<RefCell<Vec<CombatEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        self.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        log
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("mirrored_characters", &self.mirrors.len())
            .finish()
    }
}
