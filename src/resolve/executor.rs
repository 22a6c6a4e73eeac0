//! Move execution gating and bookkeeping.
//!
//! A move fires only when enabled, off cooldown, fully charged, and with
//! per-turn uses remaining. Multi-turn moves spend their first invocation
//! starting a charge; the charge ticks down once per elapsed turn of the
//! owner and the move fires when it completes. Cooldowns likewise tick per
//! elapsed turn, not per round.

use std::rc::Rc;

use crate::events::EventBus;
use crate::field::action::Move;
use crate::field::character::CharacterId;
use crate::field::roster::Roster;
use crate::rng::Roll;

/// The executable body of a move.
///
/// Effects receive full mutable access to the roster and the event bus;
/// the engine guarantees single-threaded, run-to-completion invocation.
pub trait ActionEffect {
    fn apply(&self, ctx: &mut EffectContext<'_>);
}

/// Everything an effect may touch while it runs.
pub struct EffectContext<'a> {
    pub actor: CharacterId,
    pub targets: &'a [CharacterId],
    pub roster: &'a mut Roster,
    pub events: &'a mut EventBus,
    pub roll: &'a mut dyn Roll,
}

/// True when the move can fire right now: enabled, off cooldown, not
/// charging (and charged, if it needs a charge), with uses remaining.
pub fn can_execute(m: &Move) -> bool {
    m.enabled
        && m.cooldown_remaining == 0
        && m.charge_progress == 0
        && m.uses_remaining > 0
        && (!m.requires_charge() || m.charged)
}

/// Restores the per-turn uses counter to its full allowance.
pub fn prime_uses(m: &mut Move) {
    m.uses_remaining = m.uses_per_turn;
}

/// Advances a move by one elapsed turn of its owner: uses reset to zero
/// (to be re-primed at execution time), cooldown and charge each tick down
/// by one. A charge reaching zero marks the move ready to fire.
pub fn next_turn(m: &mut Move) {
    m.uses_remaining = 0;
    if m.cooldown_remaining > 0 {
        m.cooldown_remaining -= 1;
    }
    if m.charge_progress > 0 {
        m.charge_progress -= 1;
        if m.charge_progress == 0 {
            m.charged = true;
        }
    }
}

/// Invokes the actor's move at `move_index` against `targets`.
///
/// A multi-turn move with no charge in progress begins charging instead of
/// firing. An executable move spends a use, runs its effect, and starts its
/// cooldown if it has one and none is running. Returns whether the effect
/// ran.
pub fn invoke(
    roster: &mut Roster,
    actor: CharacterId,
    move_index: usize,
    targets: &[CharacterId],
    events: &mut EventBus,
    roll: &mut dyn Roll,
) -> bool {
    let effect = {
        let Some(combatant) = roster.get_mut(actor) else {
            return false;
        };
        let Some(m) = combatant.character.moves.get_mut(move_index) else {
            return false;
        };

        if m.requires_charge() && m.charge_progress == 0 && !m.charged {
            m.charge_progress = m.charge_turns();
            log::debug!(
                "{:?} begins charging '{}' for {} turns",
                actor,
                m.name,
                m.charge_progress
            );
            return false;
        }

        if !can_execute(m) {
            return false;
        }

        m.uses_remaining -= 1;
        if m.requires_charge() {
            m.charged = false;
        }
        Rc::clone(&m.effect)
    };

    effect.apply(&mut EffectContext {
        actor,
        targets,
        roster,
        events,
        roll,
    });

    if let Some(combatant) = roster.get_mut(actor) {
        if let Some(m) = combatant.character.moves.get_mut(move_index) {
            if m.cooldown > 0 && m.cooldown_remaining == 0 {
                m.cooldown_remaining = m.cooldown;
            }
        }
    }
    true
}
