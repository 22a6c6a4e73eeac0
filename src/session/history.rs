//! Bounded round history.
//!
//! At the end of every round the orchestrator stores a deep, independent
//! snapshot of the roster. Snapshots are plain data: mutating the live
//! roster afterwards never affects stored history. Age 0 is the current
//! (live) round and is not stored here; age N >= 1 looks N completed
//! rounds back. The oldest snapshot is evicted once the retention limit is
//! exceeded.

use crate::field::character::{CharacterId, FactionId};
use crate::field::combatant::Combatant;
use crate::field::geom::Vec2;
use crate::field::roster::Roster;
use crate::field::stat::StatBlock;

/// Default number of completed rounds retained.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Value state of one combatant at the end of a round.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatantSnapshot {
    pub id: CharacterId,
    pub faction: FactionId,
    pub position: Vec2,
    pub stats: StatBlock,
    pub current_speed: f32,
    pub accumulated_speed: f32,
    /// Targets this combatant selected during the snapshotted round.
    pub targets: Vec<CharacterId>,
}

impl CombatantSnapshot {
    /// Deep-copies the value state of a live combatant.
    pub fn capture(combatant: &Combatant) -> Self {
        CombatantSnapshot {
            id: combatant.id(),
            faction: combatant.faction(),
            position: combatant.position(),
            stats: combatant.character.stats,
            current_speed: combatant.current_speed,
            accumulated_speed: combatant.accumulated_speed,
            targets: combatant.turn_targets.clone(),
        }
    }

    #[inline]
    pub fn health(&self) -> f32 {
        self.stats.health.current()
    }

    /// True when this combatant targeted `other` during the round.
    #[inline]
    pub fn targeted(&self, other: CharacterId) -> bool {
        self.targets.contains(&other)
    }
}

/// The roster as it stood at the end of one round.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoundSnapshot {
    pub round: u32,
    pub combatants: Vec<CombatantSnapshot>,
}

impl RoundSnapshot {
    /// Deep-copies the live roster.
    pub fn capture(round: u32, roster: &Roster) -> Self {
        RoundSnapshot {
            round,
            combatants: roster.iter().map(CombatantSnapshot::capture).collect(),
        }
    }

    /// Looks up a combatant's record. Absent records are a valid empty
    /// case: the combatant may not have existed that round.
    pub fn find(&self, id: CharacterId) -> Option<&CombatantSnapshot> {
        self.combatants.iter().find(|c| c.id == id)
    }
}

/// Completed-round snapshots, newest first, bounded by a retention limit.
#[derive(Debug, Clone, Default)]
pub struct RoundHistory {
    snapshots: Vec<RoundSnapshot>,
    limit: usize,
}

impl RoundHistory {
    pub fn new(limit: usize) -> Self {
        RoundHistory {
            snapshots: Vec::new(),
            limit,
        }
    }

    /// Number of completed rounds retained.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Stores a completed round, evicting the oldest beyond the limit.
    pub fn push(&mut self, snapshot: RoundSnapshot) {
        self.snapshots.insert(0, snapshot);
        if self.snapshots.len() > self.limit {
            let evicted = self.snapshots.pop();
            if let Some(s) = evicted {
                log::trace!("evicting round {} from history", s.round);
            }
        }
    }

    /// The snapshot `age` completed rounds back; age 1 is the most recent
    /// completed round. Age 0 is the live roster, which is not stored here.
    pub fn round(&self, age: usize) -> Option<&RoundSnapshot> {
        if age == 0 {
            return None;
        }
        self.snapshots.get(age - 1)
    }

    /// True when `attacker` targeted `victim` in the most recent completed
    /// round.
    pub fn targeted_last_round(&self, attacker: CharacterId, victim: CharacterId) -> bool {
        self.round(1)
            .and_then(|r| r.find(attacker))
            .map(|s| s.targeted(victim))
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
