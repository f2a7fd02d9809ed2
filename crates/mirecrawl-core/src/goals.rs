//! Goal evaluation seam. Goal trees live outside the core; the engine
//! hands the collaborator a context after each tick and passes its
//! description through untouched.

use hecs::World;

use crate::components::Inventory;

/// What the evaluator gets to look at.
pub struct GoalContext<'a> {
    pub world: &'a World,
    pub player: Option<hecs::Entity>,
    pub inventory: &'a Inventory,
}

/// External goal-evaluation collaborator. Returns the human-readable
/// remaining-goal string; empty means everything is satisfied. The engine
/// treats the result as opaque.
pub trait GoalEvaluator {
    fn evaluate(&self, ctx: &GoalContext<'_>) -> String;
}

/// Reference evaluator used by fixtures: satisfied when the player stands
/// on an exit tile.
#[derive(Debug, Default)]
pub struct ExitGoal;

impl GoalEvaluator for ExitGoal {
    fn evaluate(&self, ctx: &GoalContext<'_>) -> String {
        if crate::view::player_on_exit(ctx.world, ctx.player) {
            String::new()
        } else {
            ":exit".to_string()
        }
    }
}
