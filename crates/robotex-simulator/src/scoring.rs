use robotex_core::{BallId, Side};

use crate::physics::EntityTag;

/// What a contact between two tagged colliders means for the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEffect {
    /// A ball started touching a goal sensor. Counts if the ball is still active.
    BallEnteredGoal { ball: BallId, goal: Side },
    /// A ball stopped touching a goal sensor. The ball is deactivated.
    BallLeftGoal { ball: BallId, goal: Side },
}

/// Resolves a begin (`started`) or end contact between two entities. Pairs that do
/// not involve a ball and a goal have no effect.
pub fn resolve_contact(a: EntityTag, b: EntityTag, started: bool) -> Option<ContactEffect> {
    let (ball, goal) = match (a, b) {
        (EntityTag::Ball(ball), EntityTag::Goal(goal))
        | (EntityTag::Goal(goal), EntityTag::Ball(ball)) => (ball, goal),
        _ => return None,
    };
    Some(if started {
        ContactEffect::BallEnteredGoal { ball, goal }
    } else {
        ContactEffect::BallLeftGoal { ball, goal }
    })
}
