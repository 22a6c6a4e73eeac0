//! Move selection policies.
//!
//! Each turn the pipeline asks the actor's picker which move to take. A
//! picker sees the whole combatant plus the round history and returns the
//! index of a move, or `None` to pass the turn. A move mid-charge is
//! always preferred: abandoning a charge would waste the turns already
//! spent on it.

use crate::field::action::Motive;
use crate::field::combatant::Combatant;
use crate::session::history::RoundHistory;

/// Chooses which of a combatant's moves to take this turn.
pub trait MovePicker {
    /// Index into `actor.character.moves`, or `None` to pass.
    fn pick(&self, actor: &Combatant, history: &RoundHistory) -> Option<usize>;
}

/// Default policy: continue a charge in progress, otherwise the first
/// enabled move that is off cooldown.
pub struct FirstReady;

impl MovePicker for FirstReady {
    fn pick(&self, actor: &Combatant, _history: &RoundHistory) -> Option<usize> {
        first_ready(actor, |_| true)
    }
}

/// Like [`FirstReady`] but restricted to moves tagged with one motive.
pub struct ByMotive(pub Motive);

impl MovePicker for ByMotive {
    fn pick(&self, actor: &Combatant, _history: &RoundHistory) -> Option<usize> {
        first_ready(actor, |m| m.matches_motive(self.0))
    }
}

fn first_ready(
    actor: &Combatant,
    admit: impl Fn(&crate::field::action::Move) -> bool,
) -> Option<usize> {
    let moves = &actor.character.moves;

    // A charge in progress (or completed and waiting) wins outright.
    if let Some(idx) = moves
        .iter()
        .position(|m| admit(m) && (m.charge_progress > 0 || m.charged))
    {
        return Some(idx);
    }

    // Uses are primed at execution time, so readiness here is just
    // enabled and off cooldown.
    moves
        .iter()
        .position(|m| admit(m) && m.enabled && m.cooldown_remaining == 0)
}
