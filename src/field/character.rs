//! Character definitions.
//!
//! A [`Character`] is the host-owned entity that enters combat: identity,
//! faction, position, a stat block, its move list, and the default AI
//! policies (move selection, targeting, pre-/post-move movement) that the
//! turn pipeline falls back to when the chosen move carries no override.

use std::fmt;

use crate::ai::move_select::{FirstReady, MovePicker};
use crate::ai::movement::MovementPlan;
use crate::ai::targeting::TargetingConfig;
use crate::field::action::Move;
use crate::field::geom::Vec2;
use crate::field::stat::StatBlock;

/// Host-assigned character identity, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId(pub u32);

/// Team identifier. Combatants with different faction ids oppose each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactionId(pub u8);

/// Per-character combat toggles read by the turn pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatFlags {
    /// Allow movement before the action resolves.
    pub move_before: bool,
    /// Allow movement after the action resolves.
    pub move_after: bool,
    /// Allow the targeting heuristic to run at all.
    pub targeting: bool,
}

impl Default for CombatFlags {
    fn default() -> Self {
        CombatFlags {
            move_before: true,
            move_after: true,
            targeting: true,
        }
    }
}

/// A character as seen by the combat core.
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub faction: FactionId,
    pub position: Vec2,
    pub flags: CombatFlags,
    pub stats: StatBlock,
    /// Hit-status policy: skip the hit roll entirely.
    pub always_hit: bool,
    /// Critical hits against this character use the non-crit damage array.
    pub crit_immune: bool,
    /// Remove from the live roster at the next settlement once health <= 0.
    pub remove_at_zero: bool,
    pub moves: Vec<Move>,
    /// Default move-selection policy.
    pub picker: Box<dyn MovePicker>,
    /// Default targeting behavior.
    pub targeting: TargetingConfig,
    /// Default pre-action movement rules.
    pub movement_before: MovementPlan,
    /// Default post-action movement rules.
    pub movement_after: MovementPlan,
}

impl Character {
    /// Creates a character with default flags, policies, and stats.
    pub fn new(id: CharacterId, faction: FactionId) -> Self {
        Character {
            id,
            name: String::new(),
            faction,
            position: Vec2::ZERO,
            flags: CombatFlags::default(),
            stats: StatBlock::default(),
            always_hit: false,
            crit_immune: false,
            remove_at_zero: true,
            moves: Vec::new(),
            picker: Box::new(FirstReady),
            targeting: TargetingConfig::default(),
            movement_before: MovementPlan::default(),
            movement_after: MovementPlan::default(),
        }
    }

    #[inline]
    pub fn health(&self) -> f32 {
        self.stats.health.current()
    }
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Character")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("faction", &self.faction)
            .field("position", &self.position)
            .field("health", &self.health())
            .field("moves", &self.moves.len())
            .finish()
    }
}
