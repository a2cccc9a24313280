use rapier2d_f64::prelude::*;
use robotex_core::Vector2;

use crate::{
    step::StepContext,
    zone::{Zone, ZoneSpec},
};

/// Minimum simulated time between two kicks \[s].
pub const KICK_DELAY: f64 = 0.1;

/// Kicks a ball in the zone straight ahead with a single impulse.
///
/// A kick request only lives for one tick: if no ball is in the zone, or the last
/// kick was less than [`KICK_DELAY`] ago, the request is dropped.
#[derive(Debug, Clone)]
pub struct Coilgun {
    zone: Zone,
    armed: Option<f64>,
    elapsed: f64,
    last_kick_time: f64,
    kicks: u32,
}

impl Coilgun {
    pub fn new(spec: &ZoneSpec, ball_radius: f64) -> Self {
        Coilgun {
            zone: Zone::new(spec, ball_radius),
            armed: None,
            elapsed: 0.0,
            last_kick_time: 0.0,
            kicks: 0,
        }
    }

    /// Arms the coilgun for the next tick with the given strength.
    pub fn kick(&mut self, strength: f64) {
        self.armed = Some(strength);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Number of impulses fired so far.
    pub fn kicks(&self) -> u32 {
        self.kicks
    }

    /// Simulated time of the last impulse.
    pub fn last_kick_time(&self) -> f64 {
        self.last_kick_time
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn step_before_physics(&mut self, pose: &Isometry<Real>, ctx: &mut StepContext<'_>, dt: f64) {
        self.elapsed += dt;

        let Some(strength) = self.armed else {
            return;
        };
        let outline = self.zone.world_outline(pose);
        let forward = pose.rotation * Vector2::new(0.0, -1.0);
        for ball in ctx.balls.iter() {
            if !self.zone.contains(&outline, ball.position) {
                continue;
            }
            if self.elapsed - self.last_kick_time >= KICK_DELAY {
                log::debug!("Kicking ball #{} at t={:.2}", ball.id, self.elapsed);
                ctx.physics
                    .apply_impulse_at_point(ball.body, forward * strength * dt, ball.position);
                self.last_kick_time = self.elapsed;
                self.kicks += 1;
            }
        }
    }

    pub fn step_after_physics(&mut self) {
        self.armed = None;
    }
}
