//! Movement resolution.
//!
//! A [`MovementPlan`] is an ordered rule list. The first rule whose
//! predicate holds (a rule without one always holds) decides where the
//! combatant moves this phase: an origin policy condenses the target pool
//! into one reference point, and a motion policy says how to move relative
//! to it. Displacement per phase is capped by the mover's movement rate.
//!
//! The target pool is resolved in precedence order: the plan's explicit
//! targets, then the targets selected this turn, then every combatant of
//! an opposing faction.

use std::fmt;

use crate::field::character::CharacterId;
use crate::field::geom::Vec2;
use crate::field::roster::Roster;

/// Condenses the target pool into a single reference point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OriginPolicy {
    /// First point in the pool.
    #[default]
    First,
    /// Closest point to the mover.
    Nearest,
    /// Furthest point from the mover.
    Furthest,
    /// Point whose distance is closest to the mover's attack-range midpoint.
    RangeMidpoint,
    /// Mean of all points in the pool.
    Centroid,
}

/// How to move relative to the origin point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MotionPolicy {
    /// Close the full distance, capped by the movement rate.
    #[default]
    Toward,
    /// Open distance by the full movement rate.
    Away,
    /// Approach, but never closer than `min_distance`.
    TowardBounded { min_distance: f32 },
    /// Retreat, but never further than `max_distance`.
    AwayBounded { max_distance: f32 },
    /// Hold a distance band: step out when inside `near`, step in when
    /// outside `far`, stand still in between. Corrections aim at the
    /// nearest band edge.
    Band { near: f32, far: f32 },
    /// Band whose corrections aim at the near edge.
    BandNear { near: f32, far: f32 },
    /// Band whose corrections aim at the far edge.
    BandFar { near: f32, far: f32 },
    /// Band whose corrections aim at the band midpoint.
    BandCentered { near: f32, far: f32 },
}

/// Predicate deciding whether a rule applies to the mover this phase.
pub type MovementPredicate = Box<dyn Fn(&Roster, CharacterId) -> bool>;

/// One prioritized movement rule.
pub struct MovementRule {
    /// `None` always applies.
    pub predicate: Option<MovementPredicate>,
    pub origin: OriginPolicy,
    pub motion: MotionPolicy,
}

impl MovementRule {
    pub fn new(origin: OriginPolicy, motion: MotionPolicy) -> Self {
        MovementRule {
            predicate: None,
            origin,
            motion,
        }
    }

    pub fn when(mut self, predicate: MovementPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

impl fmt::Debug for MovementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementRule")
            .field("predicate", &self.predicate.is_some())
            .field("origin", &self.origin)
            .field("motion", &self.motion)
            .finish()
    }
}

/// Ordered movement rules plus an optional explicit target pool.
#[derive(Debug, Default)]
pub struct MovementPlan {
    /// First matching rule wins; no match falls back to approaching the
    /// first target.
    pub rules: Vec<MovementRule>,
    /// Overrides the target pool when present.
    pub targets: Option<Vec<CharacterId>>,
}

impl MovementPlan {
    /// A plan with one unconditional rule.
    pub fn rule(origin: OriginPolicy, motion: MotionPolicy) -> Self {
        MovementPlan {
            rules: vec![MovementRule::new(origin, motion)],
            targets: None,
        }
    }
}

/// Computes the mover's new position for this phase.
///
/// Returns the current position unchanged when the mover is unknown, the
/// target pool is empty, or no rule applies.
pub fn resolve_motion(
    roster: &Roster,
    actor: CharacterId,
    plan: &MovementPlan,
    selected: &[CharacterId],
) -> Vec2 {
    let Some(mover) = roster.get(actor) else {
        return Vec2::ZERO;
    };
    let position = mover.position();

    let pool = target_points(roster, actor, plan, selected);
    if pool.is_empty() {
        return position;
    }

    // No matching rule falls back to the default pair: head straight at
    // the first target.
    let fallback;
    let rule = match plan
        .rules
        .iter()
        .find(|r| r.predicate.as_ref().map_or(true, |p| p(roster, actor)))
    {
        Some(rule) => rule,
        None => {
            fallback = MovementRule::new(OriginPolicy::First, MotionPolicy::Toward);
            &fallback
        }
    };

    let origin = origin_point(&pool, position, mover.character.stats.range_midpoint(), rule.origin);
    let rate = mover.character.stats.movement_rate.current();
    apply_motion(position, origin, rate, rule.motion)
}

fn target_points(
    roster: &Roster,
    actor: CharacterId,
    plan: &MovementPlan,
    selected: &[CharacterId],
) -> Vec<Vec2> {
    if let Some(ids) = &plan.targets {
        return ids
            .iter()
            .filter_map(|&id| roster.position_of(id))
            .collect();
    }
    if !selected.is_empty() {
        return selected
            .iter()
            .filter_map(|&id| roster.position_of(id))
            .collect();
    }
    let faction = match roster.get(actor) {
        Some(c) => c.faction(),
        None => return Vec::new(),
    };
    roster.opposing_positions(faction)
}

fn origin_point(pool: &[Vec2], from: Vec2, range_midpoint: f32, policy: OriginPolicy) -> Vec2 {
    debug_assert!(!pool.is_empty());
    match policy {
        OriginPolicy::First => pool[0],
        OriginPolicy::Nearest => extremum(pool, |p| from.distance(p), f32::lt),
        OriginPolicy::Furthest => extremum(pool, |p| from.distance(p), f32::gt),
        OriginPolicy::RangeMidpoint => extremum(
            pool,
            |p| (from.distance(p) - range_midpoint).abs(),
            f32::lt,
        ),
        OriginPolicy::Centroid => {
            let mut sum = Vec2::ZERO;
            for &p in pool {
                sum += p;
            }
            sum.scaled(1.0 / pool.len() as f32)
        }
    }
}

fn extremum(pool: &[Vec2], key: impl Fn(Vec2) -> f32, better: impl Fn(&f32, &f32) -> bool) -> Vec2 {
    let mut best = pool[0];
    let mut best_key = key(best);
    for &p in &pool[1..] {
        let k = key(p);
        if better(&k, &best_key) {
            best = p;
            best_key = k;
        }
    }
    best
}

fn apply_motion(from: Vec2, origin: Vec2, rate: f32, motion: MotionPolicy) -> Vec2 {
    let distance = from.distance(origin);
    let toward = (origin - from).normalized();

    let step = match motion {
        MotionPolicy::Toward => distance.min(rate),
        MotionPolicy::Away => -rate,
        MotionPolicy::TowardBounded { min_distance } => {
            if distance <= min_distance {
                0.0
            } else {
                (distance - min_distance).min(rate)
            }
        }
        MotionPolicy::AwayBounded { max_distance } => {
            if distance >= max_distance {
                0.0
            } else {
                -(max_distance - distance).min(rate)
            }
        }
        MotionPolicy::Band { near, far } => {
            band_step(distance, near, far, distance.clamp(near, far), rate)
        }
        MotionPolicy::BandNear { near, far } => band_step(distance, near, far, near, rate),
        MotionPolicy::BandFar { near, far } => band_step(distance, near, far, far, rate),
        MotionPolicy::BandCentered { near, far } => {
            band_step(distance, near, far, (near + far) * 0.5, rate)
        }
    };

    if step == 0.0 {
        return from;
    }
    // A mover standing exactly on the origin has no direction to retreat in.
    from + toward.scaled(step)
}

/// Signed rate-capped step (positive closes distance) correcting toward
/// `desired` whenever the mover is outside the band.
fn band_step(distance: f32, near: f32, far: f32, desired: f32, rate: f32) -> f32 {
    if distance >= near && distance <= far {
        return 0.0;
    }
    let delta = distance - desired;
    if delta > 0.0 {
        delta.min(rate)
    } else {
        -(-delta).min(rate)
    }
}
