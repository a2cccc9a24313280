use rapier2d_f64::prelude::*;
use robotex_core::{Side, Vector2};

use crate::physics::{EntityTag, PhysicsWorld};

/// A goal pocket. Its sensor region never pushes anything; it only reports balls
/// entering and leaving.
#[derive(Debug)]
pub struct Goal {
    side: Side,
    position: Vector2,
    width: f64,
    depth: f64,
    ball_count: u32,
}

impl Goal {
    pub(crate) fn spawn(
        physics: &mut PhysicsWorld,
        side: Side,
        position: Vector2,
        width: f64,
        depth: f64,
    ) -> Goal {
        let body = RigidBodyBuilder::fixed().translation(position);
        let collider = ColliderBuilder::cuboid(depth / 2.0, width / 2.0)
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(EntityTag::Goal(side).to_user_data());
        physics.insert(body, collider);

        Goal {
            side,
            position,
            width,
            depth,
            ball_count: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Number of balls that have entered this goal.
    pub fn ball_count(&self) -> u32 {
        self.ball_count
    }

    pub(crate) fn record_ball(&mut self) {
        self.ball_count += 1;
    }
}
