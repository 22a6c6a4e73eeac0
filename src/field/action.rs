//! Combat actions ("moves").
//!
//! A [`Move`] is the data side of an action: cooldown, per-turn uses,
//! multi-turn charge progress, motive tags, optional targeting/movement
//! overrides, and the executable effect. Execution gating and bookkeeping
//! live in [`crate::resolve`].

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ai::movement::MovementPlan;
use crate::ai::targeting::TargetingConfig;
use crate::resolve::ActionEffect;

/// Classifies an action's intent, used by selection policies to filter
/// which moves they will consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motive {
    DamageHealth,
    LowerStats,
    RaiseStats,
    Reposition,
    Summon,
}

/// An action a combatant can take on its turn.
pub struct Move {
    pub name: String,
    pub enabled: bool,
    /// Cooldown in turns once the move fires. Zero means no cooldown.
    pub cooldown: u32,
    pub cooldown_remaining: u32,
    /// Contribution to the owner's ordering speed while this move is the
    /// selected action.
    pub speed_bonus: f32,
    pub motives: Vec<Motive>,
    /// Portion of a turn the move consumes; values above 1.0 require
    /// charging across multiple turns before the move fires.
    pub turn_fraction: f32,
    /// Remaining charge turns. Zero when not charging.
    pub charge_progress: u32,
    /// Set when a charge has completed and the move is ready to fire.
    pub charged: bool,
    pub uses_per_turn: u32,
    pub uses_remaining: u32,
    /// When false, the move may be re-invoked while per-turn uses remain.
    pub ends_turn: bool,
    /// Overrides the owner's default targeting when present.
    pub targeting_override: Option<TargetingConfig>,
    /// Overrides the owner's default pre-action movement when present.
    pub movement_before_override: Option<MovementPlan>,
    /// Overrides the owner's default post-action movement when present.
    pub movement_after_override: Option<MovementPlan>,
    pub effect: Rc<dyn ActionEffect>,
}

impl Move {
    /// Creates an enabled single-use, full-turn move with no cooldown.
    pub fn new(name: impl Into<String>, effect: Rc<dyn ActionEffect>) -> Self {
        Move {
            name: name.into(),
            enabled: true,
            cooldown: 0,
            cooldown_remaining: 0,
            speed_bonus: 0.0,
            motives: Vec::new(),
            turn_fraction: 1.0,
            charge_progress: 0,
            charged: false,
            uses_per_turn: 1,
            uses_remaining: 0,
            ends_turn: true,
            targeting_override: None,
            movement_before_override: None,
            movement_after_override: None,
            effect,
        }
    }

    /// True when the turn fraction requires charge turns before firing.
    #[inline]
    pub fn requires_charge(&self) -> bool {
        self.turn_fraction > 1.0
    }

    /// Number of charge turns the turn fraction costs.
    #[inline]
    pub fn charge_turns(&self) -> u32 {
        self.turn_fraction.ceil() as u32
    }

    /// True when any motive tag matches.
    pub fn matches_motive(&self, motive: Motive) -> bool {
        self.motives.contains(&motive)
    }

    /// Sets the per-turn uses counter, clamped to the allowance.
    pub fn set_uses_remaining(&mut self, uses: u32) {
        self.uses_remaining = uses.min(self.uses_per_turn);
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Move")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("cooldown_remaining", &self.cooldown_remaining)
            .field("charge_progress", &self.charge_progress)
            .field("uses_remaining", &self.uses_remaining)
            .finish()
    }
}
