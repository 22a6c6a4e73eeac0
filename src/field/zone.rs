//! Battlefield zones.
//!
//! A zone is a static geometric region whose combatant membership is
//! tracked across movement. The core only computes membership changes and
//! forwards them as enter/exit notifications.

use serde::{Deserialize, Serialize};

use crate::events::{CombatEvent, EventBus};
use crate::field::character::CharacterId;
use crate::field::geom::Vec2;
use crate::field::roster::Roster;

/// Zone identity, assigned on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneId(pub u32);

/// Geometric shape of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZoneShape {
    Circle { center: Vec2, radius: f32 },
    Rect { min: Vec2, max: Vec2 },
}

impl ZoneShape {
    /// Point-containment test.
    pub fn contains(&self, p: Vec2) -> bool {
        match *self {
            ZoneShape::Circle { center, radius } => center.distance(p) <= radius,
            ZoneShape::Rect { min, max } => {
                p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
            }
        }
    }
}

/// Tracks per-zone membership and fires enter/exit notifications.
#[derive(Debug, Default)]
pub struct ZoneTracker {
    shapes: Vec<ZoneShape>,
    members: Vec<Vec<CharacterId>>,
}

impl ZoneTracker {
    pub fn new() -> Self {
        ZoneTracker::default()
    }

    /// Registers a zone and returns its id.
    pub fn add_zone(&mut self, shape: ZoneShape) -> ZoneId {
        self.shapes.push(shape);
        self.members.push(Vec::new());
        ZoneId(self.shapes.len() as u32 - 1)
    }

    pub fn zone_count(&self) -> usize {
        self.shapes.len()
    }

    /// Current members of a zone, in roster entry order.
    pub fn members(&self, zone: ZoneId) -> &[CharacterId] {
        &self.members[zone.0 as usize]
    }

    /// Recomputes membership for every zone against the live roster and
    /// fires entered/exited notifications for the differences.
    pub fn update(&mut self, roster: &Roster, events: &mut EventBus) {
        for (zi, shape) in self.shapes.iter().enumerate() {
            let current: Vec<CharacterId> = roster
                .iter()
                .filter(|c| shape.contains(c.position()))
                .map(|c| c.id())
                .collect();
            let previous = &self.members[zi];
            let zone = ZoneId(zi as u32);

            for &id in previous.iter() {
                if !current.contains(&id) {
                    events.emit(&CombatEvent::ZoneExited {
                        zone,
                        character: id,
                    });
                }
            }
            for &id in current.iter() {
                if !previous.contains(&id) {
                    events.emit(&CombatEvent::ZoneEntered {
                        zone,
                        character: id,
                    });
                }
            }
            self.members[zi] = current;
        }
    }
}
