use rapier2d_f64::prelude::RigidBodyHandle;
use robotex_core::{BallId, Side, Vector2};

use crate::physics::PhysicsWorld;

/// A ball as seen by step listeners at the start of a tick.
#[derive(Debug, Clone, Copy)]
pub struct BallState {
    pub id: BallId,
    pub body: RigidBodyHandle,
    pub position: Vector2,
    pub active: bool,
}

/// A goal as seen by step listeners.
#[derive(Debug, Clone, Copy)]
pub struct GoalState {
    pub side: Side,
    pub position: Vector2,
}

/// Shared state handed to every step listener during a tick.
pub struct StepContext<'a> {
    pub physics: &'a mut PhysicsWorld,
    pub balls: &'a [BallState],
    pub goals: &'a [GoalState],
}

/// A participant in the fixed-timestep loop.
///
/// All `step_before_physics` hooks of a tick run before the physics step and all
/// `step_after_physics` hooks run after it, in registration order. A listener must
/// not rely on side effects of other listeners within the same tick.
pub trait StepListener {
    fn step_before_physics(&mut self, ctx: &mut StepContext<'_>, dt: f64);

    fn step_after_physics(&mut self, _ctx: &mut StepContext<'_>, _dt: f64) {}
}
