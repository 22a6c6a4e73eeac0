//! Battlefield representation and combat-state types.
//!
//! Contains the core data structures for geometry, stats, characters,
//! combatants, the live roster with its deferred mutation queues, actions,
//! and zones.

pub mod action;
pub mod character;
pub mod combatant;
pub mod geom;
pub mod roster;
pub mod stat;
pub mod zone;

pub use action::{Motive, Move};
pub use character::{Character, CharacterId, CombatFlags, FactionId};
pub use combatant::Combatant;
pub use geom::Vec2;
pub use roster::Roster;
pub use stat::{ChannelStats, Stat, StatBlock, CHANNEL_COUNT};
pub use zone::{ZoneId, ZoneShape, ZoneTracker};
