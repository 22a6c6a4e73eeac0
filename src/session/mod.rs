//! Combat session orchestration.
//!
//! A [`CombatSession`] owns the roster, the event bus, zones, history, and
//! the dice, and drives rounds and turns through a small state machine:
//! idle until started, active while opposing factions remain, over after.
//! Roster mutations requested mid-round are deferred to settlement points
//! between turns; with simultaneous turns enabled, settlement is further
//! deferred across consecutive equal-speed turns so a speed tie resolves
//! against a consistent roster.

pub mod history;
pub mod order;
mod turn;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{CombatEvent, EventBus};
use crate::field::character::{Character, CharacterId};
use crate::field::roster::Roster;
use crate::field::zone::ZoneTracker;
use crate::rng::{DiceRoll, Roll};
use crate::session::history::{RoundHistory, RoundSnapshot, DEFAULT_HISTORY_LIMIT};
use crate::session::order::{assign_speed, compute_order, sort_by_speed, speed_floor};

/// Session-level tunables, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bank per-round speed leads and order by the bank.
    pub speed_carryover: bool,
    /// Defer settlement across consecutive equal-speed turns.
    pub simultaneous_turns: bool,
    /// Master switch for the pre- and post-action movement windows.
    pub movement_enabled: bool,
    /// Completed rounds retained for history lookups.
    pub history_limit: usize,
    /// Dice seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            speed_carryover: true,
            simultaneous_turns: false,
            movement_enabled: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parses a config from its JSON representation. Hosts typically ship
    /// the config alongside character data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Errors surfaced by the session state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,
    #[error("session is over")]
    Over,
    #[error("cannot start a session with an empty roster")]
    EmptyRoster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Active,
    Over,
}

/// A full combat encounter from start to resolution.
pub struct CombatSession {
    pub config: EngineConfig,
    pub roster: Roster,
    pub events: EventBus,
    pub zones: ZoneTracker,
    pub history: RoundHistory,
    pending: VecDeque<CharacterId>,
    state: SessionState,
    round: u32,
    roll: Box<dyn Roll>,
}

impl CombatSession {
    pub fn new(config: EngineConfig) -> Self {
        let roll: Box<dyn Roll> = match config.seed {
            Some(seed) => Box::new(DiceRoll::seeded(seed)),
            None => Box::new(DiceRoll::from_entropy()),
        };
        Self::with_roll(config, roll)
    }

    /// Builds a session around an explicit dice source.
    pub fn with_roll(config: EngineConfig, roll: Box<dyn Roll>) -> Self {
        CombatSession {
            config,
            roster: Roster::new(),
            events: EventBus::new(),
            zones: ZoneTracker::new(),
            history: RoundHistory::new(config.history_limit),
            pending: VecDeque::new(),
            state: SessionState::Idle,
            round: 0,
            roll,
        }
    }

    /// Queues a character to join; before the session starts they join at
    /// `start`, afterwards at the next settlement point.
    pub fn add_character(&mut self, character: Character) {
        self.roster.enqueue_add(character);
    }

    /// Queues a combatant to leave at the next settlement point.
    pub fn remove_character(&mut self, id: CharacterId) {
        self.roster.enqueue_remove(id);
    }

    /// Completed round count. Zero until the first round finishes.
    #[inline]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Moves the session from idle to active, admitting every queued
    /// character. Starting an already-active session is a no-op.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Active => return Ok(()),
            SessionState::Over => return Err(SessionError::Over),
            SessionState::Idle => {}
        }
        self.roster.flush_additions(&mut self.events);
        // Removals queued before the session exists are stale; a fresh
        // session starts with empty queues.
        self.roster.clear_queues();
        if self.roster.is_empty() {
            return Err(SessionError::EmptyRoster);
        }
        self.zones.update(&self.roster, &mut self.events);
        self.state = SessionState::Active;
        log::info!("session started with {} combatants", self.roster.len());
        Ok(())
    }

    /// True while another round can run. Pure: calling this never advances
    /// anything.
    pub fn has_next_round(&self) -> bool {
        self.state == SessionState::Active && self.roster.has_opposition()
    }

    /// True while the current round has turns left. Pure.
    pub fn has_next_turn(&self) -> bool {
        self.state == SessionState::Active && !self.pending.is_empty()
    }

    /// Runs one full round: ordering, every turn, settlement, snapshot.
    /// Returns the completed round number.
    pub fn execute_round(&mut self) -> Result<u32, SessionError> {
        self.check_active()?;
        if self.pending.is_empty() {
            self.begin_round();
        }
        while let Some(actor) = self.pending.pop_front() {
            self.take_turn(actor);
        }
        self.finish_round();
        Ok(self.round)
    }

    /// Runs a single turn, opening a new round first if the previous one
    /// is exhausted. Returns the acting combatant.
    pub fn execute_turn(&mut self) -> Result<CharacterId, SessionError> {
        self.check_active()?;
        if self.pending.is_empty() {
            self.begin_round();
        }
        // A started session always has at least one pending turn here.
        let actor = self
            .pending
            .pop_front()
            .ok_or(SessionError::EmptyRoster)?;
        self.take_turn(actor);
        if self.pending.is_empty() {
            self.finish_round();
        }
        Ok(actor)
    }

    /// Runs rounds until the session resolves or `max_rounds` complete.
    /// Returns the number of completed rounds.
    pub fn run(&mut self, max_rounds: u32) -> Result<u32, SessionError> {
        let mut completed = 0;
        while self.has_next_round() && completed < max_rounds {
            self.execute_round()?;
            completed += 1;
        }
        Ok(self.round)
    }

    fn check_active(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => Err(SessionError::NotStarted),
            SessionState::Over => Err(SessionError::Over),
            SessionState::Active => Ok(()),
        }
    }

    fn begin_round(&mut self) {
        self.round += 1;
        self.events
            .emit(&CombatEvent::RoundStarting { round: self.round });
        for c in self.roster.iter_mut() {
            c.turn_targets.clear();
        }
        let order = compute_order(&mut self.roster, &self.history, self.config.speed_carryover);
        log::debug!("round {} order: {:?}", self.round, order);
        self.pending = order.into();
    }

    fn take_turn(&mut self, actor: CharacterId) {
        self.run_turn(actor);
        if self.settles_after(actor) {
            self.settle();
        }
    }

    /// Settlement is deferred only when simultaneous turns are on and the
    /// next pending combatant tied the actor's speed this round.
    fn settles_after(&self, actor: CharacterId) -> bool {
        if !self.config.simultaneous_turns {
            return true;
        }
        let acted = match self.roster.get(actor) {
            Some(c) => c.current_speed,
            None => return true,
        };
        let next = self
            .pending
            .front()
            .and_then(|&id| self.roster.get(id))
            .map(|c| c.current_speed);
        next != Some(acted)
    }

    /// Applies deferred roster mutations: defeated combatants leave, queued
    /// characters join at a speed computed like round ordering and slot
    /// into the working order, zone membership catches up.
    fn settle(&mut self) {
        let defeated: Vec<CharacterId> = self
            .roster
            .iter()
            .filter(|c| c.is_defeated())
            .map(|c| c.id())
            .collect();
        for id in defeated {
            self.roster.enqueue_remove(id);
        }
        for id in self.roster.flush_removals(&mut self.events) {
            self.pending.retain(|&p| p != id);
        }
        let added = self.roster.flush_additions(&mut self.events);
        if !added.is_empty() {
            // The floor includes the arrivals themselves, so the slowest
            // arrival banks nothing this round.
            let floor = speed_floor(&self.roster, &self.history);
            for &id in &added {
                if let Some(c) = self.roster.get_mut(id) {
                    assign_speed(c, &self.history, self.config.speed_carryover, floor);
                }
            }
            self.pending.extend(added);
            let mut working: Vec<(CharacterId, f32)> = self
                .pending
                .iter()
                .map(|&id| (id, self.roster.get(id).map_or(0.0, |c| c.current_speed)))
                .collect();
            sort_by_speed(&mut working);
            self.pending = working.into_iter().map(|(id, _)| id).collect();
        }
        self.zones.update(&self.roster, &mut self.events);
    }

    fn finish_round(&mut self) {
        self.events
            .emit(&CombatEvent::RoundEnded { round: self.round });
        self.history
            .push(RoundSnapshot::capture(self.round, &self.roster));
        self.settle();
        // Arrivals flushed by the round-end settlement act from the next
        // round on.
        self.pending.clear();
        if !self.roster.has_opposition() {
            self.state = SessionState::Over;
            log::info!("session over after round {}", self.round);
        }
    }
}

impl std::fmt::Debug for CombatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatSession")
            .field("state", &self.state)
            .field("round", &self.round)
            .field("combatants", &self.roster.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::character::FactionId;
    use crate::field::stat::Stat;
    use crate::rng::ScriptRoll;

    fn fighter(id: u32, faction: u8, speed: f32) -> Character {
        let mut c = Character::new(CharacterId(id), FactionId(faction));
        c.stats.move_speed = Stat::new(speed);
        c.stats.health = Stat::new(10.0);
        c
    }

    fn session(characters: Vec<Character>) -> CombatSession {
        let mut s = CombatSession::with_roll(
            EngineConfig {
                speed_carryover: false,
                ..EngineConfig::default()
            },
            Box::new(ScriptRoll::new()),
        );
        for c in characters {
            s.add_character(c);
        }
        s
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig {
            seed: Some(99),
            simultaneous_turns: true,
            ..EngineConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn round_before_start_is_an_error() {
        let mut s = session(vec![fighter(1, 0, 1.0)]);
        assert_eq!(s.execute_round(), Err(SessionError::NotStarted));
        assert_eq!(s.execute_turn(), Err(SessionError::NotStarted));
    }

    #[test]
    fn empty_roster_cannot_start() {
        let mut s = session(Vec::new());
        assert_eq!(s.start(), Err(SessionError::EmptyRoster));
    }

    #[test]
    fn start_admits_queued_characters() {
        let mut s = session(vec![fighter(1, 0, 1.0), fighter(2, 1, 2.0)]);
        let log = s.events.record();
        s.start().unwrap();
        assert_eq!(s.roster.len(), 2);
        assert_eq!(
            log.borrow()
                .iter()
                .filter(|e| matches!(e, CombatEvent::CharacterAdded { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn start_is_idempotent_while_active() {
        let mut s = session(vec![fighter(1, 0, 1.0), fighter(2, 1, 2.0)]);
        s.start().unwrap();
        assert_eq!(s.start(), Ok(()));
    }

    #[test]
    fn predicates_are_pure() {
        let mut s = session(vec![fighter(1, 0, 1.0), fighter(2, 1, 2.0)]);
        s.start().unwrap();
        for _ in 0..5 {
            assert!(s.has_next_round());
            assert!(!s.has_next_turn());
        }
        assert_eq!(s.round(), 0);
    }

    #[test]
    fn execute_round_completes_every_turn() {
        let mut s = session(vec![fighter(1, 0, 1.0), fighter(2, 1, 2.0)]);
        let log = s.events.record();
        s.start().unwrap();
        assert_eq!(s.execute_round(), Ok(1));

        let seen = log.borrow();
        let turns = seen
            .iter()
            .filter(|e| matches!(e, CombatEvent::TurnStarted { .. }))
            .count();
        assert_eq!(turns, 2);
        assert!(seen.contains(&CombatEvent::RoundStarting { round: 1 }));
        assert!(seen.contains(&CombatEvent::RoundEnded { round: 1 }));
    }

    #[test]
    fn faster_combatant_acts_first() {
        let mut s = session(vec![fighter(1, 0, 1.0), fighter(2, 1, 2.0)]);
        let log = s.events.record();
        s.start().unwrap();
        s.execute_round().unwrap();

        let seen = log.borrow();
        let order: Vec<CharacterId> = seen
            .iter()
            .filter_map(|e| match e {
                CombatEvent::TurnStarted { combatant } => Some(*combatant),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![CharacterId(2), CharacterId(1)]);
    }

    #[test]
    fn execute_turn_steps_through_a_round() {
        let mut s = session(vec![fighter(1, 0, 1.0), fighter(2, 1, 2.0)]);
        s.start().unwrap();
        assert_eq!(s.execute_turn(), Ok(CharacterId(2)));
        assert!(s.has_next_turn());
        assert_eq!(s.execute_turn(), Ok(CharacterId(1)));
        assert!(!s.has_next_turn());
        assert_eq!(s.round(), 1);
    }

    #[test]
    fn session_ends_without_opposition() {
        let mut s = session(vec![fighter(1, 0, 1.0)]);
        s.start().unwrap();
        // One faction only: the first round resolves the session.
        s.execute_round().unwrap();
        assert!(!s.has_next_round());
        assert_eq!(s.execute_round(), Err(SessionError::Over));
    }

    #[test]
    fn history_records_each_round() {
        let mut s = session(vec![fighter(1, 0, 1.0), fighter(2, 1, 2.0)]);
        s.start().unwrap();
        for _ in 0..3 {
            s.execute_round().unwrap();
        }
        assert_eq!(s.history.len(), 3);
        assert_eq!(s.history.round(1).unwrap().round, 3);
    }

    #[test]
    fn mid_round_additions_join_the_working_order() {
        let mut s = session(vec![fighter(1, 0, 5.0), fighter(2, 1, 1.0)]);
        let log = s.events.record();
        s.start().unwrap();
        s.add_character(fighter(3, 1, 9.0));
        s.execute_round().unwrap();

        // Admitted at the settlement after the first turn; the arrival
        // outspeeds the remaining combatant and acts before it.
        let seen = log.borrow();
        let order: Vec<CharacterId> = seen
            .iter()
            .filter_map(|e| match e {
                CombatEvent::TurnStarted { combatant } => Some(*combatant),
                _ => None,
            })
            .collect();
        assert_eq!(
            order,
            vec![CharacterId(1), CharacterId(3), CharacterId(2)]
        );
        assert_eq!(s.roster.len(), 3);
    }

    #[test]
    fn start_discards_pre_session_removals() {
        let mut s = session(vec![fighter(1, 0, 1.0), fighter(2, 1, 2.0)]);
        s.remove_character(CharacterId(2));
        s.start().unwrap();
        s.execute_round().unwrap();

        // The stale removal never reaches the first settlement.
        assert_eq!(s.roster.len(), 2);
        assert!(s.roster.get(CharacterId(2)).is_some());
    }

    #[test]
    fn round_end_flush_lands_after_the_snapshot() {
        let mut s = session(vec![fighter(1, 0, 2.0), fighter(2, 1, 1.0)]);
        s.start().unwrap();
        s.begin_round();
        while let Some(actor) = s.pending.pop_front() {
            s.run_turn(actor);
        }
        // Queued after the round's last settlement: applied by the
        // round-end flush, visible only from the next round on.
        s.add_character(fighter(3, 1, 4.0));
        let log = s.events.record();
        s.finish_round();

        let seen = log.borrow();
        let ended = seen
            .iter()
            .position(|e| matches!(e, CombatEvent::RoundEnded { .. }))
            .unwrap();
        let added = seen
            .iter()
            .position(|e| matches!(e, CombatEvent::CharacterAdded { .. }))
            .unwrap();
        assert!(ended < added);
        assert_eq!(s.roster.len(), 3);
        assert!(s.history.round(1).unwrap().find(CharacterId(3)).is_none());
        assert!(!s.has_next_turn());
    }
}
