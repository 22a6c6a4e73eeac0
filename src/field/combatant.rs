//! In-combat character wrapper.
//!
//! A [`Combatant`] carries the per-session bookkeeping the character itself
//! does not own: the speed used for this round's ordering, the speed
//! carried over between rounds, and the targets recorded this round.
//! Health is read and written only through the wrapped character.

use crate::field::character::{Character, CharacterId, FactionId};
use crate::field::geom::Vec2;

/// A character participating in the current combat session.
#[derive(Debug)]
pub struct Combatant {
    pub character: Character,
    /// Effective speed used for this round's ordering.
    pub current_speed: f32,
    /// Unused speed carried across rounds when carryover is enabled.
    pub accumulated_speed: f32,
    /// Targets this combatant selected during the current round.
    pub turn_targets: Vec<CharacterId>,
}

impl Combatant {
    pub fn new(character: Character) -> Self {
        Combatant {
            character,
            current_speed: 0.0,
            accumulated_speed: 0.0,
            turn_targets: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> CharacterId {
        self.character.id
    }

    #[inline]
    pub fn faction(&self) -> FactionId {
        self.character.faction
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.character.position
    }

    #[inline]
    pub fn health(&self) -> f32 {
        self.character.health()
    }

    /// True when the remove-at-zero policy applies and health is depleted.
    #[inline]
    pub fn is_defeated(&self) -> bool {
        self.character.remove_at_zero && self.health() <= 0.0
    }
}
