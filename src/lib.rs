//! Skirmish combat engine library.
//!
//! Exposes the battlefield data model, action resolution, decision
//! policies, and the session orchestrator for use by integration tests
//! and host applications.

pub mod ai;
pub mod events;
pub mod field;
pub mod resolve;
pub mod rng;
pub mod session;

pub use events::{CombatEvent, EventBus, MovementPhase};
pub use field::{Character, CharacterId, FactionId, Move, Roster, Vec2};
pub use resolve::{ActionEffect, DamageEffect, EffectContext};
pub use rng::{DiceRoll, Roll, ScriptRoll};
pub use session::{CombatSession, EngineConfig, SessionError};
