//! Weighted target selection.
//!
//! Targets are chosen by scoring every qualifying enemy against a bundle
//! of weighted factors. Scoring runs in two phases: the pre-move pass
//! ranks all qualifying enemies (with a movement-slackened range filter),
//! and the post-move refinement re-evaluates the position-dependent terms
//! against the actor's final position, applies the strict range filter,
//! and truncates to the per-move target cap.
//!
//! Each score splits into a position-independent component (threat,
//! grudges, focus fire, random jitter) and a position-dependent component
//! (distance, in-range and no-counter bonuses). Only the dependent
//! component is recomputed after movement, so randomness rolled in the
//! pre-move pass stays stable across refinement. Any factor with a zero
//! weight is skipped entirely and consumes no randomness.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::character::CharacterId;
use crate::field::combatant::Combatant;
use crate::field::geom::Vec2;
use crate::field::roster::Roster;
use crate::field::stat::{StatBlock, CHANNEL_COUNT};
use crate::resolve::resistance_multiplier;
use crate::rng::Roll;
use crate::session::history::RoundHistory;

/// Restricts the candidate pool to a circular battlefield region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaPoint {
    pub center: Vec2,
    pub radius: f32,
}

impl AreaPoint {
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance(point) <= self.radius
    }
}

/// The scoring knobs. A weight of zero disables its factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetWeights {
    /// Expected damage to the candidate relative to its health.
    pub damage_factor: f32,
    /// Worst-case threat the candidate poses to any ally, relative to that
    /// ally's health.
    pub ally_damage_factor: f32,
    /// Threat the candidate poses to the actor, relative to actor health.
    pub retaliation_factor: f32,
    /// Damage-to-health ratio capped at 1.0: finishing blows.
    pub kill_factor: f32,
    /// Per ally already targeting the candidate this round.
    pub focus_factor: f32,
    /// Closer candidates score higher. Position-dependent.
    pub distance_factor: f32,
    /// Uniform jitter in `[0, random_factor)`.
    pub random_factor: f32,
    /// Candidate currently inside the attack range band. Position-dependent.
    pub bonus_in_range: f32,
    /// Candidate targeted the actor last round.
    pub bonus_attacked_me: f32,
    /// Candidate targeted an ally last round.
    pub bonus_attacked_ally: f32,
    /// An ally targeted the candidate last round.
    pub bonus_marked_by_ally: f32,
    /// Peak damage would finish the candidate outright.
    pub bonus_one_shot: f32,
    /// Candidate cannot reach back at the actor even after moving.
    /// Position-dependent.
    pub bonus_no_counter: f32,
    /// Candidates scoring below this are dropped; the boundary is kept.
    /// Zero disables the filter, so sub-zero scores stay in play.
    pub min_score_threshold: f32,
    /// Post-refinement cap on returned targets. Zero means unlimited.
    pub max_targets: usize,
    /// Ignore factions: everyone qualifies as a target.
    pub neutral: bool,
    /// Never reclassify allies as enemies over past betrayals.
    pub loyal: bool,
    /// Allow the actor itself into the candidate pool.
    pub allow_self_target: bool,
    /// Score allies instead of enemies (support moves).
    pub swap_allegiance: bool,
}

impl Default for TargetWeights {
    fn default() -> Self {
        TargetWeights {
            damage_factor: 1.0,
            ally_damage_factor: 0.0,
            retaliation_factor: 0.0,
            kill_factor: 0.0,
            focus_factor: 0.0,
            distance_factor: 0.0,
            random_factor: 0.0,
            bonus_in_range: 0.0,
            bonus_attacked_me: 0.0,
            bonus_attacked_ally: 0.0,
            bonus_marked_by_ally: 0.0,
            bonus_one_shot: 0.0,
            bonus_no_counter: 0.0,
            min_score_threshold: 0.0,
            max_targets: 1,
            neutral: false,
            loyal: false,
            allow_self_target: false,
            swap_allegiance: false,
        }
    }
}

/// Inputs handed to a custom scoring hook.
pub struct ScoreArgs<'a> {
    pub actor: &'a Combatant,
    pub candidate: &'a Combatant,
    pub roster: &'a Roster,
    pub history: &'a RoundHistory,
}

/// Host-supplied scoring term added to the weighted sum.
pub type ScoreHook = Box<dyn Fn(&ScoreArgs<'_>) -> f32>;

/// Full targeting behavior of a character or move.
#[derive(Default)]
pub struct TargetingConfig {
    pub weights: TargetWeights,
    /// Non-empty restricts candidates to these regions.
    pub area_points: Vec<AreaPoint>,
    /// Bypasses scoring entirely in both phases when present.
    pub override_targets: Option<Vec<CharacterId>>,
    /// Custom position-independent terms.
    pub independent_hooks: Vec<ScoreHook>,
    /// Custom position-dependent terms, re-run at refinement.
    pub dependent_hooks: Vec<ScoreHook>,
}

impl fmt::Debug for TargetingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetingConfig")
            .field("weights", &self.weights)
            .field("area_points", &self.area_points)
            .field("override_targets", &self.override_targets)
            .field("independent_hooks", &self.independent_hooks.len())
            .field("dependent_hooks", &self.dependent_hooks.len())
            .finish()
    }
}

/// A scored candidate. `independent` never changes after the pre-move
/// pass; `dependent` is recomputed at refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedTarget {
    pub id: CharacterId,
    pub independent: f32,
    pub dependent: f32,
}

impl WeightedTarget {
    #[inline]
    pub fn combined(&self) -> f32 {
        self.independent + self.dependent
    }
}

/// Ratio with a forgiving denominator: a zero denominator counts as one.
#[inline]
fn ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 {
        numerator
    } else {
        numerator / denominator
    }
}

/// Expected (average) damage after the defender's mitigation.
fn expected_damage(attacker: &StatBlock, defender: &StatBlock) -> f32 {
    let mut total = 0.0;
    for c in 0..CHANNEL_COUNT {
        let avg = (attacker.min_damage[c].current() + attacker.max_damage[c].current()) / 2.0;
        let after = (avg - defender.damage_reduction[c].current()).max(0.0);
        total += after * resistance_multiplier(defender.resistance[c].current());
    }
    total
}

/// Best-case (non-crit) damage after the defender's mitigation.
fn peak_damage(attacker: &StatBlock, defender: &StatBlock) -> f32 {
    let mut total = 0.0;
    for c in 0..CHANNEL_COUNT {
        let after =
            (attacker.max_damage[c].current() - defender.damage_reduction[c].current()).max(0.0);
        total += after * resistance_multiplier(defender.resistance[c].current());
    }
    total
}

/// Pre-move pass: scores every qualifying candidate and returns them in
/// descending combined-score order. No cap is applied yet; refinement
/// trims after movement has settled positions.
pub fn select_targets(
    roster: &Roster,
    history: &RoundHistory,
    actor: CharacterId,
    config: &TargetingConfig,
    roll: &mut dyn Roll,
) -> Vec<WeightedTarget> {
    if let Some(ids) = &config.override_targets {
        return ids
            .iter()
            .map(|&id| WeightedTarget {
                id,
                independent: 0.0,
                dependent: 0.0,
            })
            .collect();
    }

    let Some(actor_ref) = roster.get(actor) else {
        return Vec::new();
    };

    let (candidates, allies) = partition(roster, history, actor_ref, config);
    let w = &config.weights;
    let reach = actor_ref.character.stats.max_range.current()
        + actor_ref.character.stats.movement_rate.current();
    let min_reach = (actor_ref.character.stats.min_range.current()
        - actor_ref.character.stats.movement_rate.current())
    .max(0.0);

    let mut scored = Vec::with_capacity(candidates.len());
    for id in candidates {
        let Some(candidate) = roster.get(id) else {
            continue;
        };
        // Movement-slackened range filter: unreachable even after moving.
        let distance = actor_ref.position().distance(candidate.position());
        if distance > reach || distance < min_reach {
            continue;
        }

        let independent =
            independent_score(actor_ref, candidate, &allies, roster, history, config, roll);
        let dependent = dependent_score(actor_ref, candidate, roster, history, config);
        let target = WeightedTarget {
            id,
            independent,
            dependent,
        };
        if w.min_score_threshold == 0.0 || target.combined() >= w.min_score_threshold {
            scored.push(target);
        }
    }

    sort_descending(&mut scored);
    log::trace!("{:?} scored {} candidates", actor, scored.len());
    scored
}

/// Post-move refinement: re-evaluates position-dependent terms against the
/// actor's settled position, enforces the strict range band, and trims to
/// the target cap.
pub fn refine_targets(
    roster: &Roster,
    history: &RoundHistory,
    actor: CharacterId,
    config: &TargetingConfig,
    prior: &[WeightedTarget],
) -> Vec<WeightedTarget> {
    if config.override_targets.is_some() {
        return prior.to_vec();
    }
    let Some(actor_ref) = roster.get(actor) else {
        return Vec::new();
    };

    let w = &config.weights;
    let min_range = actor_ref.character.stats.min_range.current();
    let max_range = actor_ref.character.stats.max_range.current();

    let mut refined = Vec::with_capacity(prior.len());
    for target in prior {
        let Some(candidate) = roster.get(target.id) else {
            continue;
        };
        let distance = actor_ref.position().distance(candidate.position());
        if distance < min_range || distance > max_range {
            continue;
        }
        let rescored = WeightedTarget {
            id: target.id,
            independent: target.independent,
            dependent: dependent_score(actor_ref, candidate, roster, history, config),
        };
        if w.min_score_threshold == 0.0 || rescored.combined() >= w.min_score_threshold {
            refined.push(rescored);
        }
    }

    sort_descending(&mut refined);
    if w.max_targets > 0 {
        refined.truncate(w.max_targets);
    }
    refined
}

/// Splits the pool into (candidates, allies) according to the allegiance
/// knobs: neutral mode targets everyone, betrayal reclassifies allies who
/// attacked the actor last round, and swap-allegiance flips the two lists.
fn partition(
    roster: &Roster,
    history: &RoundHistory,
    actor: &Combatant,
    config: &TargetingConfig,
) -> (Vec<CharacterId>, Vec<CharacterId>) {
    let w = &config.weights;
    let in_area = |c: &Combatant| {
        config.area_points.is_empty()
            || config.area_points.iter().any(|a| a.contains(c.position()))
    };

    let mut enemies = Vec::new();
    let mut allies = Vec::new();
    for c in roster.iter() {
        if !in_area(c) {
            continue;
        }
        if c.id() == actor.id() {
            if w.allow_self_target {
                if w.neutral {
                    enemies.push(c.id());
                } else {
                    allies.push(c.id());
                }
            }
            continue;
        }
        if w.neutral || c.faction() != actor.faction() {
            enemies.push(c.id());
        } else {
            allies.push(c.id());
        }
    }

    // Betrayal outranks allegiance: an ally who targeted the actor last
    // round is scored like an enemy, unless loyalty is pinned.
    if !w.loyal {
        let mut i = 0;
        while i < allies.len() {
            if allies[i] != actor.id() && history.targeted_last_round(allies[i], actor.id()) {
                enemies.push(allies.remove(i));
            } else {
                i += 1;
            }
        }
    }

    if w.swap_allegiance {
        std::mem::swap(&mut enemies, &mut allies);
    }

    (enemies, allies)
}

fn independent_score(
    actor: &Combatant,
    candidate: &Combatant,
    allies: &[CharacterId],
    roster: &Roster,
    history: &RoundHistory,
    config: &TargetingConfig,
    roll: &mut dyn Roll,
) -> f32 {
    let w = &config.weights;
    let actor_stats = &actor.character.stats;
    let cand_stats = &candidate.character.stats;
    let mut score = 0.0;

    if w.damage_factor != 0.0 {
        let dealt = expected_damage(actor_stats, cand_stats);
        score += w.damage_factor * ratio(dealt, candidate.health());
    }
    if w.kill_factor != 0.0 {
        let dealt = expected_damage(actor_stats, cand_stats);
        score += w.kill_factor * ratio(dealt, candidate.health()).min(1.0);
    }
    if w.retaliation_factor != 0.0 {
        let threat = expected_damage(cand_stats, actor_stats);
        score += w.retaliation_factor * ratio(threat, actor.health());
    }
    if w.ally_damage_factor != 0.0 {
        let mut worst = 0.0_f32;
        for &ally in allies {
            if let Some(a) = roster.get(ally) {
                let threat = expected_damage(cand_stats, &a.character.stats);
                worst = worst.max(ratio(threat, a.health()));
            }
        }
        score += w.ally_damage_factor * worst;
    }
    if w.focus_factor != 0.0 {
        let marks = allies
            .iter()
            .filter_map(|&ally| roster.get(ally))
            .filter(|a| a.turn_targets.contains(&candidate.id()))
            .count();
        score += w.focus_factor * marks as f32;
    }
    if w.bonus_attacked_me != 0.0 && history.targeted_last_round(candidate.id(), actor.id()) {
        score += w.bonus_attacked_me;
    }
    if w.bonus_attacked_ally != 0.0
        && allies
            .iter()
            .any(|&a| history.targeted_last_round(candidate.id(), a))
    {
        score += w.bonus_attacked_ally;
    }
    if w.bonus_marked_by_ally != 0.0
        && allies
            .iter()
            .any(|&a| history.targeted_last_round(a, candidate.id()))
    {
        score += w.bonus_marked_by_ally;
    }
    if w.bonus_one_shot != 0.0 && peak_damage(actor_stats, cand_stats) >= candidate.health() {
        score += w.bonus_one_shot;
    }
    if w.random_factor != 0.0 {
        score += roll.unit() * w.random_factor;
    }

    if !config.independent_hooks.is_empty() {
        let args = ScoreArgs {
            actor,
            candidate,
            roster,
            history,
        };
        for hook in &config.independent_hooks {
            score += hook(&args);
        }
    }

    score
}

fn dependent_score(
    actor: &Combatant,
    candidate: &Combatant,
    roster: &Roster,
    history: &RoundHistory,
    config: &TargetingConfig,
) -> f32 {
    let w = &config.weights;
    let actor_stats = &actor.character.stats;
    let cand_stats = &candidate.character.stats;
    let distance = actor.position().distance(candidate.position());
    let mut score = 0.0;

    if w.distance_factor != 0.0 {
        let reach = actor_stats.max_range.current() + actor_stats.movement_rate.current();
        score += w.distance_factor * (1.0 - ratio(distance, reach));
    }
    if w.bonus_in_range != 0.0
        && distance >= actor_stats.min_range.current()
        && distance <= actor_stats.max_range.current()
    {
        score += w.bonus_in_range;
    }
    if w.bonus_no_counter != 0.0 {
        let counter_reach = cand_stats.max_range.current() + cand_stats.movement_rate.current();
        if distance > counter_reach {
            score += w.bonus_no_counter;
        }
    }

    if !config.dependent_hooks.is_empty() {
        let args = ScoreArgs {
            actor,
            candidate,
            roster,
            history,
        };
        for hook in &config.dependent_hooks {
            score += hook(&args);
        }
    }

    score
}

/// Stable descending sort by combined score: equal scores keep roster
/// order.
fn sort_descending(targets: &mut [WeightedTarget]) {
    targets.sort_by(|a, b| {
        b.combined()
            .partial_cmp(&a.combined())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::field::character::{Character, FactionId};
    use crate::field::stat::Stat;
    use crate::rng::ScriptRoll;
    use crate::session::history::{RoundHistory, RoundSnapshot};

    fn build(entries: &[(u32, u8, Vec2)], tweak: impl Fn(&mut Character)) -> Roster {
        let mut roster = Roster::new();
        let mut events = EventBus::new();
        for &(id, faction, position) in entries {
            let mut c = Character::new(CharacterId(id), FactionId(faction));
            c.position = position;
            c.stats.health = Stat::new(10.0);
            tweak(&mut c);
            roster.enqueue_add(c);
        }
        roster.flush_additions(&mut events);
        roster
    }

    fn ids(targets: &[WeightedTarget]) -> Vec<u32> {
        targets.iter().map(|t| t.id.0).collect()
    }

    fn config(tweak: impl FnOnce(&mut TargetWeights)) -> TargetingConfig {
        let mut config = TargetingConfig::default();
        tweak(&mut config.weights);
        config
    }

    #[test]
    fn only_enemies_are_scored() {
        let roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 0, Vec2::new(1.0, 0.0)),
                (3, 1, Vec2::new(2.0, 0.0)),
            ],
            |_| {},
        );
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let targets = select_targets(
            &roster,
            &history,
            CharacterId(1),
            &TargetingConfig::default(),
            &mut roll,
        );
        assert_eq!(ids(&targets), vec![3]);
    }

    #[test]
    fn ranking_is_descending() {
        // Equal damage against both; the wounded enemy has the higher
        // damage-to-health ratio and must come first.
        let mut roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 1, Vec2::new(1.0, 0.0)),
                (3, 1, Vec2::new(2.0, 0.0)),
            ],
            |c| {
                c.stats.min_damage[0] = Stat::new(4.0);
                c.stats.max_damage[0] = Stat::new(4.0);
            },
        );
        roster
            .get_mut(CharacterId(3))
            .unwrap()
            .character
            .stats
            .health
            .set_current(2.0);

        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let targets = select_targets(
            &roster,
            &history,
            CharacterId(1),
            &config(|_| {}),
            &mut roll,
        );
        assert_eq!(ids(&targets), vec![3, 2]);
        assert!(targets[0].combined() >= targets[1].combined());
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let roster = build(&[(1, 0, Vec2::ZERO), (2, 1, Vec2::new(1.0, 0.0))], |c| {
            c.stats.max_range = Stat::new(5.0);
        });
        let history = RoundHistory::default();

        let mut exactly = config(|w| {
            w.damage_factor = 0.0;
            w.bonus_in_range = 10.0;
            w.min_score_threshold = 10.0;
        });
        let mut roll = ScriptRoll::new();
        let hit = select_targets(&roster, &history, CharacterId(1), &exactly, &mut roll);
        assert_eq!(ids(&hit), vec![2]);

        exactly.weights.bonus_in_range = 9.0;
        let miss = select_targets(&roster, &history, CharacterId(1), &exactly, &mut roll);
        assert!(miss.is_empty());
    }

    #[test]
    fn zero_threshold_keeps_negative_scores() {
        let roster = build(&[(1, 0, Vec2::ZERO), (2, 1, Vec2::new(1.0, 0.0))], |_| {});
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let mut cfg = config(|w| w.damage_factor = 0.0);
        cfg.independent_hooks.push(Box::new(|_| -1.0));

        // A zero threshold means no filter at all, in both phases.
        let selected = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(ids(&selected), vec![2]);
        assert_eq!(selected[0].combined(), -1.0);
        let refined = refine_targets(&roster, &history, CharacterId(1), &cfg, &selected);
        assert_eq!(ids(&refined), vec![2]);
    }

    #[test]
    fn unreachable_enemies_are_prefiltered() {
        let roster = build(&[(1, 0, Vec2::ZERO), (2, 1, Vec2::new(100.0, 0.0))], |c| {
            c.stats.max_range = Stat::new(5.0);
            c.stats.movement_rate = Stat::new(3.0);
        });
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let targets = select_targets(
            &roster,
            &history,
            CharacterId(1),
            &config(|_| {}),
            &mut roll,
        );
        // 100 > 5 + 3: even after moving the enemy stays out of reach.
        assert!(targets.is_empty());
    }

    #[test]
    fn betrayal_reclassifies_an_ally() {
        let mut roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 0, Vec2::new(1.0, 0.0)),
                (3, 1, Vec2::new(2.0, 0.0)),
            ],
            |_| {},
        );
        // Teammate 2 targeted the actor last round.
        roster
            .get_mut(CharacterId(2))
            .unwrap()
            .turn_targets
            .push(CharacterId(1));
        let mut history = RoundHistory::new(10);
        history.push(RoundSnapshot::capture(1, &roster));
        roster.get_mut(CharacterId(2)).unwrap().turn_targets.clear();

        let mut roll = ScriptRoll::new();
        let cfg = config(|w| w.max_targets = 0);
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert!(targets.iter().any(|t| t.id == CharacterId(2)));

        let loyal = config(|w| w.loyal = true);
        let targets = select_targets(&roster, &history, CharacterId(1), &loyal, &mut roll);
        assert_eq!(ids(&targets), vec![3]);
    }

    #[test]
    fn swap_allegiance_targets_allies() {
        let roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 0, Vec2::new(1.0, 0.0)),
                (3, 1, Vec2::new(2.0, 0.0)),
            ],
            |_| {},
        );
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let cfg = config(|w| w.swap_allegiance = true);
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(ids(&targets), vec![2]);
    }

    #[test]
    fn neutral_targets_everyone_but_self() {
        let roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 0, Vec2::new(1.0, 0.0)),
                (3, 1, Vec2::new(2.0, 0.0)),
            ],
            |_| {},
        );
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let cfg = config(|w| w.neutral = true);
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        let mut seen = ids(&targets);
        seen.sort_unstable();
        assert_eq!(seen, vec![2, 3]);
    }

    #[test]
    fn self_target_requires_permission() {
        let roster = build(&[(1, 0, Vec2::ZERO), (2, 0, Vec2::new(1.0, 0.0))], |_| {});
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let cfg = config(|w| {
            w.swap_allegiance = true;
            w.allow_self_target = true;
        });
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        let mut seen = ids(&targets);
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn focus_fire_counts_marking_allies() {
        let mut roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 0, Vec2::new(1.0, 0.0)),
                (3, 0, Vec2::new(2.0, 0.0)),
                (4, 1, Vec2::new(3.0, 0.0)),
                (5, 1, Vec2::new(4.0, 0.0)),
            ],
            |_| {},
        );
        for ally in [CharacterId(2), CharacterId(3)] {
            roster
                .get_mut(ally)
                .unwrap()
                .turn_targets
                .push(CharacterId(5));
        }

        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let cfg = config(|w| {
            w.damage_factor = 0.0;
            w.focus_factor = 2.0;
        });
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(ids(&targets), vec![5, 4]);
        assert_eq!(targets[0].combined(), 4.0);
        assert_eq!(targets[1].combined(), 0.0);
    }

    #[test]
    fn one_shot_bonus_applies_when_peak_finishes() {
        let mut roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 1, Vec2::new(1.0, 0.0)),
                (3, 1, Vec2::new(2.0, 0.0)),
            ],
            |c| c.stats.max_damage[0] = Stat::new(10.0),
        );
        roster
            .get_mut(CharacterId(3))
            .unwrap()
            .character
            .stats
            .health
            .set_current(50.0);

        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let cfg = config(|w| {
            w.damage_factor = 0.0;
            w.bonus_one_shot = 7.0;
        });
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(ids(&targets), vec![2, 3]);
        assert_eq!(targets[0].combined(), 7.0);
        assert_eq!(targets[1].combined(), 0.0);
    }

    #[test]
    fn no_counter_bonus_for_out_of_reach_enemies() {
        let mut roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 1, Vec2::new(4.0, 0.0)),
                (3, 1, Vec2::new(5.0, 0.0)),
            ],
            |c| {
                c.stats.max_range = Stat::new(10.0);
                c.stats.movement_rate = Stat::new(0.0);
            },
        );
        // Enemy 2 can reach back; enemy 3 cannot.
        roster
            .get_mut(CharacterId(3))
            .unwrap()
            .character
            .stats
            .max_range = Stat::new(2.0);

        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let cfg = config(|w| {
            w.damage_factor = 0.0;
            w.bonus_no_counter = 3.0;
        });
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(ids(&targets), vec![3, 2]);
        assert_eq!(targets[0].combined(), 3.0);
    }

    #[test]
    fn random_factor_draws_from_the_roll() {
        let roster = build(&[(1, 0, Vec2::ZERO), (2, 1, Vec2::new(1.0, 0.0))], |_| {});
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        roll.push_value(0.5);
        let cfg = config(|w| {
            w.damage_factor = 0.0;
            w.random_factor = 10.0;
        });
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(targets[0].combined(), 5.0);
    }

    #[test]
    fn zero_weights_skip_their_factors_and_consume_no_randomness() {
        let roster = build(&[(1, 0, Vec2::ZERO), (2, 1, Vec2::new(1.0, 0.0))], |_| {});
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        roll.push_value(0.9);
        let cfg = config(|w| w.damage_factor = 0.0);
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(targets[0].combined(), 0.0);
        // The queued value is untouched.
        assert_eq!(roll.between(0.0, 1.0), 0.9);
    }

    #[test]
    fn area_points_restrict_the_pool() {
        let roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 1, Vec2::new(1.0, 0.0)),
                (3, 1, Vec2::new(50.0, 0.0)),
            ],
            |_| {},
        );
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let mut cfg = config(|_| {});
        cfg.area_points.push(AreaPoint {
            center: Vec2::ZERO,
            radius: 5.0,
        });
        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(ids(&targets), vec![2]);
    }

    #[test]
    fn override_bypasses_scoring_in_both_phases() {
        let roster = build(&[(1, 0, Vec2::ZERO), (2, 0, Vec2::new(1.0, 0.0))], |_| {});
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let mut cfg = config(|_| {});
        // Even a teammate, even out of scoring consideration.
        cfg.override_targets = Some(vec![CharacterId(2)]);

        let selected = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(ids(&selected), vec![2]);
        let refined = refine_targets(&roster, &history, CharacterId(1), &cfg, &selected);
        assert_eq!(ids(&refined), vec![2]);
    }

    #[test]
    fn refinement_enforces_strict_range_and_cap() {
        let roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 1, Vec2::new(4.0, 0.0)),
                (3, 1, Vec2::new(6.0, 0.0)),
                (4, 1, Vec2::new(9.0, 0.0)),
            ],
            |c| {
                c.stats.max_range = Stat::new(7.0);
                c.stats.movement_rate = Stat::new(5.0);
            },
        );
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let cfg = config(|w| {
            w.damage_factor = 0.0;
            w.distance_factor = 1.0;
            w.max_targets = 1;
        });

        // Pre-move: all three are reachable with movement slack.
        let selected = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(selected.len(), 3);

        // Post-move: 9.0 is beyond strict range, and the cap keeps only
        // the closest of the rest.
        let refined = refine_targets(&roster, &history, CharacterId(1), &cfg, &selected);
        assert_eq!(ids(&refined), vec![2]);
    }

    #[test]
    fn refinement_rescores_dependent_terms_only() {
        let mut roster = build(
            &[
                (1, 0, Vec2::ZERO),
                (2, 1, Vec2::new(4.0, 0.0)),
                (3, 1, Vec2::new(8.0, 0.0)),
            ],
            |c| {
                c.stats.max_range = Stat::new(10.0);
                c.stats.movement_rate = Stat::new(0.0);
            },
        );
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let cfg = config(|w| {
            w.damage_factor = 0.0;
            w.distance_factor = 10.0;
            w.max_targets = 0;
        });

        let selected = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(ids(&selected), vec![2, 3]);

        // The actor ends up past both enemies; now 3 is the closer one.
        roster.get_mut(CharacterId(1)).unwrap().character.position = Vec2::new(7.0, 0.0);
        let refined = refine_targets(&roster, &history, CharacterId(1), &cfg, &selected);
        assert_eq!(ids(&refined), vec![3, 2]);
    }

    #[test]
    fn hooks_contribute_to_their_phase() {
        let roster = build(&[(1, 0, Vec2::ZERO), (2, 1, Vec2::new(1.0, 0.0))], |_| {});
        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let mut cfg = config(|w| w.damage_factor = 0.0);
        cfg.independent_hooks
            .push(Box::new(|args| args.candidate.health()));
        cfg.dependent_hooks.push(Box::new(|_| 0.5));

        let targets = select_targets(&roster, &history, CharacterId(1), &cfg, &mut roll);
        assert_eq!(targets[0].independent, 10.0);
        assert_eq!(targets[0].dependent, 0.5);
    }

    #[test]
    fn zero_health_candidate_does_not_divide_by_zero() {
        let mut roster = build(&[(1, 0, Vec2::ZERO), (2, 1, Vec2::new(1.0, 0.0))], |c| {
            c.stats.min_damage[0] = Stat::new(4.0);
            c.stats.max_damage[0] = Stat::new(4.0);
            c.remove_at_zero = false;
        });
        roster
            .get_mut(CharacterId(2))
            .unwrap()
            .character
            .stats
            .health
            .set_current(0.0);

        let history = RoundHistory::default();
        let mut roll = ScriptRoll::new();
        let targets = select_targets(
            &roster,
            &history,
            CharacterId(1),
            &config(|_| {}),
            &mut roll,
        );
        // Zero denominator counts as one: the score is the raw damage.
        assert_eq!(targets[0].combined(), 4.0);
    }
}
