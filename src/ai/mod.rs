//! Combat decision policies.
//!
//! The turn pipeline delegates its three decisions here: which move to
//! take ([`move_select`]), whom to aim it at ([`targeting`]), and where to
//! stand while doing it ([`movement`]). All three are pure over the roster
//! and round history, apart from the explicit dice seam.

pub mod move_select;
pub mod movement;
pub mod targeting;

pub use move_select::{ByMotive, FirstReady, MovePicker};
pub use movement::{
    resolve_motion, MotionPolicy, MovementPlan, MovementRule, OriginPolicy,
};
pub use targeting::{
    refine_targets, select_targets, AreaPoint, ScoreArgs, ScoreHook, TargetWeights,
    TargetingConfig, WeightedTarget,
};
