use std::f64::consts::PI;

use rapier2d_f64::prelude::*;
use robotex_core::{BallId, Vector2};

use crate::physics::{EntityTag, PhysicsWorld};

/// Ball radius in meters (43 mm diameter).
pub const BALL_RADIUS: f64 = 0.043 / 2.0;
/// Ball mass in kilograms.
pub const BALL_MASS: f64 = 0.046;

const BALL_RESTITUTION: f64 = 0.5;
const BALL_FRICTION: f64 = 0.3;
const BALL_DAMPING: f64 = 0.5;

/// A ball on the field.
///
/// Once a ball leaves a goal sensor it is deactivated. It stays in the physics world
/// but can no longer score.
#[derive(Debug)]
pub struct Ball {
    id: BallId,
    body: RigidBodyHandle,
    active: bool,
}

impl Ball {
    pub(crate) fn spawn(physics: &mut PhysicsWorld, id: BallId, position: Vector2) -> Ball {
        let density = BALL_MASS / (PI * BALL_RADIUS * BALL_RADIUS);
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .linear_damping(BALL_DAMPING)
            .angular_damping(BALL_DAMPING)
            .ccd_enabled(true);
        let collider = ColliderBuilder::ball(BALL_RADIUS)
            .density(density)
            .restitution(BALL_RESTITUTION)
            .friction(BALL_FRICTION)
            .user_data(EntityTag::Ball(id).to_user_data());
        let (body, _) = physics.insert(body, collider);

        Ball {
            id,
            body,
            active: true,
        }
    }

    pub fn id(&self) -> BallId {
        self.id
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn radius(&self) -> f64 {
        BALL_RADIUS
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Marks the ball inert. Returns `true` only on the first call.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Option<Vector2> {
        physics.translation(self.body)
    }

    pub fn velocity(&self, physics: &PhysicsWorld) -> Option<Vector2> {
        physics.body(self.body).map(|body| *body.linvel())
    }
}
