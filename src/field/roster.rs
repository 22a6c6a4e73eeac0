//! The live combatant roster.
//!
//! The roster owns the combatants currently in the fight plus two mutation
//! queues. The live list is never edited directly while turns are running:
//! additions and removals are queued and flushed only at settlement points,
//! which keeps iteration over a turn batch safe.

use crate::events::{CombatEvent, EventBus};
use crate::field::character::{Character, CharacterId, FactionId};
use crate::field::combatant::Combatant;
use crate::field::geom::Vec2;

/// Live combatant list with deferred add/remove queues.
#[derive(Debug, Default)]
pub struct Roster {
    live: Vec<Combatant>,
    add_queue: Vec<Character>,
    remove_queue: Vec<CharacterId>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.live.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.live.iter_mut()
    }

    /// Roster ids in roster order.
    pub fn ids(&self) -> Vec<CharacterId> {
        self.live.iter().map(|c| c.id()).collect()
    }

    pub fn index_of(&self, id: CharacterId) -> Option<usize> {
        self.live.iter().position(|c| c.id() == id)
    }

    pub fn get(&self, id: CharacterId) -> Option<&Combatant> {
        self.live.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Combatant> {
        self.live.iter_mut().find(|c| c.id() == id)
    }

    pub fn position_of(&self, id: CharacterId) -> Option<Vec2> {
        self.get(id).map(|c| c.position())
    }

    /// Queues a character to join at the next settlement point.
    pub fn enqueue_add(&mut self, character: Character) {
        self.add_queue.push(character);
    }

    /// Queues a combatant for removal at the next settlement point.
    pub fn enqueue_remove(&mut self, id: CharacterId) {
        if !self.remove_queue.contains(&id) {
            self.remove_queue.push(id);
        }
    }

    pub fn has_queued_additions(&self) -> bool {
        !self.add_queue.is_empty()
    }

    /// Drops every queued-for-removal combatant from the live list, firing
    /// a removed notification per character. Returns the removed ids.
    pub fn flush_removals(&mut self, events: &mut EventBus) -> Vec<CharacterId> {
        let queue = std::mem::take(&mut self.remove_queue);
        let mut removed = Vec::with_capacity(queue.len());
        for id in queue {
            if let Some(idx) = self.index_of(id) {
                self.live.remove(idx);
                events.emit(&CombatEvent::CharacterRemoved { character: id });
                removed.push(id);
            }
        }
        removed
    }

    /// Moves every queued character into the live list, firing an added
    /// notification per character. Returns the new combatants' ids.
    pub fn flush_additions(&mut self, events: &mut EventBus) -> Vec<CharacterId> {
        let queue = std::mem::take(&mut self.add_queue);
        let mut added = Vec::with_capacity(queue.len());
        for character in queue {
            let id = character.id;
            self.live.push(Combatant::new(character));
            events.emit(&CombatEvent::CharacterAdded { character: id });
            added.push(id);
        }
        added
    }

    /// Discards both queues without applying them.
    pub fn clear_queues(&mut self) {
        self.add_queue.clear();
        self.remove_queue.clear();
    }

    /// Positions of all combatants in factions other than `faction`.
    pub fn opposing_positions(&self, faction: FactionId) -> Vec<Vec2> {
        self.live
            .iter()
            .filter(|c| c.faction() != faction)
            .map(|c| c.position())
            .collect()
    }

    /// True while at least two opposing factions remain.
    pub fn has_opposition(&self) -> bool {
        match self.live.first() {
            None => false,
            Some(first) => {
                let f = first.faction();
                self.live.iter().any(|c| c.faction() != f)
            }
        }
    }
}
