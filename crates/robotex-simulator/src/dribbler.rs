use rapier2d_f64::prelude::*;

use crate::{
    step::StepContext,
    zone::{Zone, ZoneSpec},
};

/// Holds a ball against the front of the robot.
///
/// Every tick, each ball whose center lies in the zone is pulled toward the mount
/// point. A ball in the zone counts as retained even while the dribbler is disabled.
#[derive(Debug, Clone)]
pub struct Dribbler {
    zone: Zone,
    strength: f64,
    enabled: bool,
    has_ball: bool,
}

impl Dribbler {
    pub fn new(spec: &ZoneSpec, strength: f64, ball_radius: f64) -> Self {
        Dribbler {
            zone: Zone::new(spec, ball_radius),
            strength,
            enabled: true,
            has_ball: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn has_ball(&self) -> bool {
        self.has_ball
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn step_before_physics(&mut self, pose: &Isometry<Real>, ctx: &mut StepContext<'_>, dt: f64) {
        self.has_ball = false;

        let outline = self.zone.world_outline(pose);
        let mount = self.zone.mount_world(pose);
        for ball in ctx.balls.iter() {
            if !self.zone.contains(&outline, ball.position) {
                continue;
            }
            if self.enabled {
                if let Some(direction) = (ball.position - mount).try_normalize(f64::EPSILON) {
                    let force = direction * (-self.strength * dt);
                    ctx.physics
                        .apply_force_at_point(ball.body, force, ball.position);
                }
            }
            self.has_ball = true;
        }
    }
}
