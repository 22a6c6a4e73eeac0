//! Round ordering.
//!
//! Turn order within a round is descending by effective speed: the move
//! speed stat plus the speed bonus of the move the combatant's picker
//! would take right now. The sort is stable, so equal speeds keep roster
//! (insertion) order across rounds.
//!
//! With speed carryover enabled, each round every combatant banks its
//! speed advantage over the round's slowest member, and the bank is the
//! effective speed. A temporary speed buff therefore keeps paying off in
//! later rounds until the rest of the roster catches up.

use crate::field::character::CharacterId;
use crate::field::combatant::Combatant;
use crate::field::roster::Roster;
use crate::session::history::RoundHistory;

/// Computes this round's turn order, updating each combatant's
/// `current_speed` and (with carryover) `accumulated_speed`.
pub fn compute_order(
    roster: &mut Roster,
    history: &RoundHistory,
    carryover: bool,
) -> Vec<CharacterId> {
    let floor = speed_floor(roster, history);
    let ids = roster.ids();
    let mut speeds: Vec<(CharacterId, f32)> = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(c) = roster.get_mut(id) {
            speeds.push((id, assign_speed(c, history, carryover, floor)));
        }
    }
    sort_by_speed(&mut speeds);
    speeds.into_iter().map(|(id, _)| id).collect()
}

/// The roster's minimum base speed this round, the floor carryover banks
/// against.
pub fn speed_floor(roster: &Roster, history: &RoundHistory) -> f32 {
    let min = roster
        .iter()
        .map(|c| base_speed(c, history))
        .fold(f32::INFINITY, f32::min);
    if min.is_finite() {
        min
    } else {
        0.0
    }
}

/// Assigns a combatant's effective speed exactly as round ordering does,
/// so mid-round arrivals slot into the working order consistently.
pub fn assign_speed(
    combatant: &mut Combatant,
    history: &RoundHistory,
    carryover: bool,
    floor: f32,
) -> f32 {
    let base = base_speed(combatant, history);
    if carryover {
        combatant.accumulated_speed += base - floor;
        combatant.current_speed = combatant.accumulated_speed;
    } else {
        combatant.accumulated_speed = 0.0;
        combatant.current_speed = base;
    }
    combatant.current_speed
}

/// Stable descending by speed: ties keep insertion order.
pub fn sort_by_speed(order: &mut [(CharacterId, f32)]) {
    order.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
}

/// Move speed plus the speed bonus of the move the picker would take.
fn base_speed(combatant: &Combatant, history: &RoundHistory) -> f32 {
    let bonus = combatant
        .character
        .picker
        .pick(combatant, history)
        .and_then(|idx| combatant.character.moves.get(idx))
        .map(|m| m.speed_bonus)
        .unwrap_or(0.0);
    combatant.character.stats.move_speed.current() + bonus
}
