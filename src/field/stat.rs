//! Mutable stat storage.
//!
//! Every gameplay number is read and written through [`Stat`], a small
//! raw/current pair: `raw` is the cloning source (what the character was
//! defined with), `current` is the in-combat value a host may buff or
//! debuff. The combat core never touches `raw` except when snapshotting.

use serde::{Deserialize, Serialize};

/// Number of damage channels. Channel 0 is conventionally "physical".
pub const CHANNEL_COUNT: usize = 4;

/// A per-channel array of stats.
pub type ChannelStats = [Stat; CHANNEL_COUNT];

/// A single mutable gameplay value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stat {
    raw: f32,
    current: f32,
}

impl Stat {
    /// Creates a stat whose raw and current values both start at `value`.
    pub const fn new(value: f32) -> Self {
        Stat {
            raw: value,
            current: value,
        }
    }

    /// The defining value, used when cloning for history snapshots.
    #[inline]
    pub fn raw(self) -> f32 {
        self.raw
    }

    /// The live in-combat value.
    #[inline]
    pub fn current(self) -> f32 {
        self.current
    }

    /// Overwrites the live value. `raw` is unaffected.
    #[inline]
    pub fn set_current(&mut self, value: f32) {
        self.current = value;
    }

    /// Adds `delta` to the live value.
    #[inline]
    pub fn adjust(&mut self, delta: f32) {
        self.current += delta;
    }
}

/// The full stat block of a character.
///
/// Chance stats (`hit_chance`, `dodge_chance`, `crit_chance`) are percentages
/// in `[0, 100]`; values at or above 100 always pass, at or below 0 never do.
/// Resistances are percentages where negative values amplify incoming damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub min_damage: ChannelStats,
    pub max_damage: ChannelStats,
    pub crit_multiplier: ChannelStats,
    pub damage_reduction: ChannelStats,
    pub resistance: ChannelStats,
    pub min_range: Stat,
    pub max_range: Stat,
    pub movement_rate: Stat,
    pub move_speed: Stat,
    pub hit_chance: Stat,
    pub dodge_chance: Stat,
    pub crit_chance: Stat,
    /// Fraction of dealt damage bounced back at the attacker.
    pub knockback_factor: Stat,
    pub constant_knockback: Stat,
    pub recoil_min: Stat,
    pub recoil_max: Stat,
    pub health: Stat,
}

impl Default for StatBlock {
    fn default() -> Self {
        StatBlock {
            min_damage: [Stat::new(0.0); CHANNEL_COUNT],
            max_damage: [Stat::new(0.0); CHANNEL_COUNT],
            crit_multiplier: [Stat::new(1.0); CHANNEL_COUNT],
            damage_reduction: [Stat::new(0.0); CHANNEL_COUNT],
            resistance: [Stat::new(0.0); CHANNEL_COUNT],
            min_range: Stat::new(0.0),
            max_range: Stat::new(f32::MAX),
            movement_rate: Stat::new(0.0),
            move_speed: Stat::new(0.0),
            hit_chance: Stat::new(100.0),
            dodge_chance: Stat::new(0.0),
            crit_chance: Stat::new(0.0),
            knockback_factor: Stat::new(0.0),
            constant_knockback: Stat::new(0.0),
            recoil_min: Stat::new(0.0),
            recoil_max: Stat::new(0.0),
            health: Stat::new(1.0),
        }
    }
}

impl StatBlock {
    /// Midpoint of the attack range band.
    pub fn range_midpoint(&self) -> f32 {
        (self.min_range.current() + self.max_range.current()) / 2.0
    }
}
