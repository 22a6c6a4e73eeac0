//! The per-turn pipeline.
//!
//! A turn runs in a fixed order: tick the actor's moves, select a move,
//! pick targets, move in, re-check targets against the settled position,
//! act (re-invoking while the move does not end the turn), move out. Every
//! stage announces itself on the event bus, and a stage that comes up
//! empty (no move ready, no targets in range) still lets the rest of the
//! turn proceed.

use crate::ai::movement::resolve_motion;
use crate::ai::targeting::{refine_targets, select_targets, WeightedTarget};
use crate::events::{CombatEvent, MovementPhase};
use crate::field::character::CharacterId;
use crate::field::geom::Vec2;
use crate::resolve::{can_execute, invoke, next_turn, prime_uses};
use crate::session::CombatSession;

impl CombatSession {
    /// Runs one combatant's turn. A combatant that left the roster since
    /// ordering is skipped silently.
    pub(super) fn run_turn(&mut self, actor: CharacterId) {
        if self.roster.get(actor).is_none() {
            return;
        }

        // Cooldowns and charges tick at the start of the owner's turn, so
        // a one-turn cooldown is ready again exactly one turn later.
        if let Some(c) = self.roster.get_mut(actor) {
            for m in c.character.moves.iter_mut() {
                next_turn(m);
            }
        }

        self.events.emit(&CombatEvent::TurnStarted { combatant: actor });

        let picked = match self.roster.get(actor) {
            Some(c) => c.character.picker.pick(c, &self.history),
            None => None,
        };
        let valid = picked.is_some_and(|idx| {
            self.roster
                .get(actor)
                .is_some_and(|c| c.character.moves.get(idx).is_some())
        });
        let Some(move_index) = picked.filter(|_| valid) else {
            log::debug!("{:?} has no ready move, passing", actor);
            self.events.emit(&CombatEvent::TurnEnded { combatant: actor });
            return;
        };
        self.events.emit(&CombatEvent::MoveSelected {
            combatant: actor,
            move_index,
        });

        let selected = self.select_phase(actor, move_index);
        let selected_ids: Vec<CharacterId> = selected.iter().map(|t| t.id).collect();
        if let Some(c) = self.roster.get_mut(actor) {
            c.turn_targets.extend(selected_ids.iter().copied());
        }
        for &target in &selected_ids {
            self.events.emit(&CombatEvent::Targeted {
                combatant: actor,
                target,
            });
        }

        self.movement_phase(actor, move_index, MovementPhase::Before, &selected_ids);

        let refined = self.refine_phase(actor, move_index, &selected);
        let target_ids: Vec<CharacterId> = refined.iter().map(|t| t.id).collect();
        for &target in &target_ids {
            // Only targets gained by re-targeting are announced again.
            if !selected_ids.contains(&target) {
                if let Some(c) = self.roster.get_mut(actor) {
                    c.turn_targets.push(target);
                }
                self.events.emit(&CombatEvent::Targeted {
                    combatant: actor,
                    target,
                });
            }
        }

        self.events.emit(&CombatEvent::BeforeAction {
            combatant: actor,
            targets: target_ids.clone(),
        });

        let executed = self.action_phase(actor, move_index, &target_ids);

        self.events.emit(&CombatEvent::AfterAction {
            combatant: actor,
            executed,
        });

        self.movement_phase(actor, move_index, MovementPhase::After, &target_ids);

        self.events.emit(&CombatEvent::TurnEnded { combatant: actor });
    }

    /// Pre-move target scoring with the move's override, if any.
    fn select_phase(&mut self, actor: CharacterId, move_index: usize) -> Vec<WeightedTarget> {
        let Some(c) = self.roster.get(actor) else {
            return Vec::new();
        };
        if !c.character.flags.targeting {
            return Vec::new();
        }
        let config = c.character.moves[move_index]
            .targeting_override
            .as_ref()
            .unwrap_or(&c.character.targeting);
        select_targets(
            &self.roster,
            &self.history,
            actor,
            config,
            self.roll.as_mut(),
        )
    }

    /// Post-move re-scoring against the settled position.
    fn refine_phase(
        &self,
        actor: CharacterId,
        move_index: usize,
        selected: &[WeightedTarget],
    ) -> Vec<WeightedTarget> {
        let Some(c) = self.roster.get(actor) else {
            return Vec::new();
        };
        if !c.character.flags.targeting {
            return Vec::new();
        }
        let config = c.character.moves[move_index]
            .targeting_override
            .as_ref()
            .unwrap_or(&c.character.targeting);
        refine_targets(&self.roster, &self.history, actor, config, selected)
    }

    /// One movement window. Applies the move's plan override over the
    /// character default, announces the displacement, and refreshes zones.
    fn movement_phase(
        &mut self,
        actor: CharacterId,
        move_index: usize,
        phase: MovementPhase,
        targets: &[CharacterId],
    ) {
        if !self.config.movement_enabled {
            return;
        }
        let motion: Option<(Vec2, Vec2)> = {
            let Some(c) = self.roster.get(actor) else {
                return;
            };
            let allowed = match phase {
                MovementPhase::Before => c.character.flags.move_before,
                MovementPhase::After => c.character.flags.move_after,
            };
            if !allowed {
                None
            } else {
                let m = &c.character.moves[move_index];
                let plan = match phase {
                    MovementPhase::Before => m
                        .movement_before_override
                        .as_ref()
                        .unwrap_or(&c.character.movement_before),
                    MovementPhase::After => m
                        .movement_after_override
                        .as_ref()
                        .unwrap_or(&c.character.movement_after),
                };
                let from = c.position();
                let to = resolve_motion(&self.roster, actor, plan, targets);
                (to != from).then_some((from, to))
            }
        };

        if let Some((from, to)) = motion {
            if let Some(c) = self.roster.get_mut(actor) {
                c.character.position = to;
            }
            self.events.emit(&CombatEvent::MovementApplied {
                combatant: actor,
                phase,
                from,
                to,
            });
            self.zones.update(&self.roster, &mut self.events);
        }
    }

    /// Primes uses and invokes the move, re-invoking while it does not end
    /// the turn and stays executable. A charge begun this turn counts as
    /// not executed.
    fn action_phase(
        &mut self,
        actor: CharacterId,
        move_index: usize,
        targets: &[CharacterId],
    ) -> bool {
        if let Some(c) = self.roster.get_mut(actor) {
            if let Some(m) = c.character.moves.get_mut(move_index) {
                prime_uses(m);
            }
        }

        let mut executed = false;
        loop {
            let fired = invoke(
                &mut self.roster,
                actor,
                move_index,
                targets,
                &mut self.events,
                self.roll.as_mut(),
            );
            executed |= fired;
            if !fired {
                break;
            }
            let again = self
                .roster
                .get(actor)
                .and_then(|c| c.character.moves.get(move_index))
                .map(|m| !m.ends_turn && can_execute(m))
                .unwrap_or(false);
            if !again {
                break;
            }
        }
        executed
    }
}
