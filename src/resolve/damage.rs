//! Default damage pipeline.
//!
//! Resolves an attack per target in a fixed order: hit/dodge resolution,
//! per-channel damage rolls with crits, range falloff, flat reduction and
//! resistance, health application with its surrounding notifications,
//! knockback against the attacker, and recoil displacement of the target.
//!
//! Resistance is a percentage: 50 halves damage, 0 leaves it unchanged,
//! and negative values amplify beyond 100%. Values at or above 100 are
//! full immunity.

use serde::{Deserialize, Serialize};

use crate::events::CombatEvent;
use crate::field::character::CharacterId;
use crate::field::geom::Vec2;
use crate::field::stat::{StatBlock, CHANNEL_COUNT};
use crate::resolve::executor::{ActionEffect, EffectContext};

/// The built-in attack effect.
///
/// The range multipliers shape falloff: below minimum required range all
/// channels are scaled by `min_range_multiplier`, beyond maximum allowed
/// range by `max_range_multiplier`, and in between the two are linearly
/// interpolated by `distance / max_range`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEffect {
    pub min_range_multiplier: f32,
    pub max_range_multiplier: f32,
}

impl Default for DamageEffect {
    fn default() -> Self {
        DamageEffect {
            min_range_multiplier: 1.0,
            max_range_multiplier: 1.0,
        }
    }
}

impl ActionEffect for DamageEffect {
    fn apply(&self, ctx: &mut EffectContext<'_>) {
        resolve_damage(self, ctx);
    }
}

/// Multiplier derived from a resistance percentage, clamped at immunity.
#[inline]
pub fn resistance_multiplier(resistance: f32) -> f32 {
    ((100.0 - resistance) / 100.0).max(0.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

struct AttackerProfile {
    id: CharacterId,
    position: Vec2,
    stats: StatBlock,
    always_hit: bool,
}

/// Runs the full damage pipeline for the context's actor and targets.
pub fn resolve_damage(effect: &DamageEffect, ctx: &mut EffectContext<'_>) {
    let attacker = match ctx.roster.get(ctx.actor) {
        Some(c) => AttackerProfile {
            id: c.id(),
            position: c.position(),
            stats: c.character.stats,
            always_hit: c.character.always_hit,
        },
        None => return,
    };

    // 1. Hit resolution. A single miss aborts against every target.
    if !attacker.always_hit && !ctx.roll.chance(attacker.stats.hit_chance.current()) {
        ctx.events.emit(&CombatEvent::Missed {
            attacker: attacker.id,
        });
        return;
    }

    // Dodge is rolled independently per target; dodgers are excluded.
    let mut hit_targets = Vec::with_capacity(ctx.targets.len());
    for &target in ctx.targets {
        let Some(tc) = ctx.roster.get(target) else {
            continue;
        };
        if ctx.roll.chance(tc.character.stats.dodge_chance.current()) {
            ctx.events.emit(&CombatEvent::Dodged {
                attacker: attacker.id,
                target,
            });
            continue;
        }
        hit_targets.push(target);
    }

    // 2. One damage roll per channel, shared by all targets. The crit
    // array is the channel maximum amplified by its crit multiplier.
    let crit_chance = attacker.stats.crit_chance.current();
    let mut crit = [false; CHANNEL_COUNT];
    let mut rolled = [0.0f32; CHANNEL_COUNT];
    let mut crit_damage = [0.0f32; CHANNEL_COUNT];
    for c in 0..CHANNEL_COUNT {
        let min = attacker.stats.min_damage[c].current();
        let max = attacker.stats.max_damage[c].current();
        crit[c] = ctx.roll.chance(crit_chance);
        rolled[c] = ctx.roll.between(min, max);
        crit_damage[c] = max * attacker.stats.crit_multiplier[c].current();
    }

    let min_range = attacker.stats.min_range.current();
    let max_range = attacker.stats.max_range.current();

    for &target in &hit_targets {
        let (target_stats, target_pos, crit_immune) = match ctx.roster.get(target) {
            Some(tc) => (
                tc.character.stats,
                tc.position(),
                tc.character.crit_immune,
            ),
            None => continue,
        };

        // 4. Range modifier over all channels.
        let distance = attacker.position.distance(target_pos);
        let range_mult = if distance < min_range {
            effect.min_range_multiplier
        } else if distance > max_range {
            effect.max_range_multiplier
        } else {
            let t = if max_range > 0.0 {
                distance / max_range
            } else {
                1.0
            };
            lerp(effect.min_range_multiplier, effect.max_range_multiplier, t)
        };

        // 3 + 5. Crit selection per target, then flat reduction (floored
        // at zero) and resistance per channel.
        let mut total = 0.0f32;
        for c in 0..CHANNEL_COUNT {
            let base = if crit[c] && !crit_immune {
                crit_damage[c]
            } else {
                rolled[c]
            };
            let reduced = (base * range_mult - target_stats.damage_reduction[c].current()).max(0.0);
            total += reduced * resistance_multiplier(target_stats.resistance[c].current());
        }

        // 6. Apply, with the notification sandwich around the mutation.
        ctx.events.emit(&CombatEvent::PreDamage {
            attacker: attacker.id,
            target,
            amount: total,
        });
        ctx.events.emit(&CombatEvent::PreReceive {
            attacker: attacker.id,
            target,
            amount: total,
        });
        let remaining = match ctx.roster.get_mut(target) {
            Some(tc) => {
                tc.character.stats.health.adjust(-total);
                tc.health()
            }
            None => continue,
        };
        ctx.events.emit(&CombatEvent::PostDamage {
            attacker: attacker.id,
            target,
            amount: total,
            remaining_health: remaining,
        });

        // 7. Knockback drains the attacker's own health.
        let knockback_raw = total * target_stats.knockback_factor.current()
            + target_stats.constant_knockback.current()
            - attacker.stats.damage_reduction[0].current();
        let knockback = knockback_raw.max(0.0)
            * resistance_multiplier(attacker.stats.resistance[0].current());
        if knockback > 0.0 {
            if let Some(ac) = ctx.roster.get_mut(attacker.id) {
                ac.character.stats.health.adjust(-knockback);
            }
        }

        // 8. Recoil shoves the target along the attack direction. The
        // recoil vector is an offset added to the target's position.
        if attacker.stats.recoil_min.current() > 0.0 {
            let magnitude = ctx.roll.between(
                attacker.stats.recoil_min.current(),
                attacker.stats.recoil_max.current(),
            );
            let angle = (target_pos - attacker.position).angle();
            let displacement = Vec2::from_angle(angle, magnitude);
            ctx.events.emit(&CombatEvent::PreRecoil {
                attacker: attacker.id,
                target,
            });
            ctx.events.emit(&CombatEvent::Recoil {
                attacker: attacker.id,
                target,
                displacement,
            });
            if let Some(tc) = ctx.roster.get_mut(target) {
                tc.character.position += displacement;
            }
        }
    }
}
