//! Action resolution.
//!
//! Gates, invokes, and ticks moves, and provides the default probabilistic
//! damage pipeline (hit/dodge, crits, range falloff, reductions and
//! resistance, knockback, recoil).

pub mod damage;
pub mod executor;

pub use damage::{resistance_multiplier, resolve_damage, DamageEffect};
pub use executor::{can_execute, invoke, next_turn, prime_uses, ActionEffect, EffectContext};
