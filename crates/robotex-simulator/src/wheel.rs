use std::f64::consts::FRAC_PI_2;

use rapier2d_f64::prelude::*;
use robotex_core::Vector2;

use crate::physics::{world_point, PhysicsWorld};

/// Mounting and motor parameters of a wheel.
#[derive(Debug, Clone, Copy)]
pub struct WheelSpec {
    /// Position on the chassis \[m]
    pub position: Vector2,
    /// Drive direction relative to the chassis \[deg]
    pub angle: f64,
    /// Motor torque \[N m]
    pub max_torque: f64,
    /// \[m]
    pub radius: f64,
    /// Coefficient of the force opposing sideways sliding
    pub lateral_grip: f64,
}

/// A driven wheel with an idealized skid model.
///
/// The wheel pushes along its drive direction in proportion to its power and resists
/// sideways motion in proportion to the lateral velocity at its contact point.
#[derive(Debug, Clone)]
pub struct Wheel {
    position: Vector2,
    angle: f64,
    max_force: f64,
    lateral_grip: f64,
    power: f64,
    lateral_velocity: f64,
}

impl Wheel {
    pub fn new(spec: &WheelSpec) -> Self {
        Wheel {
            position: spec.position,
            angle: spec.angle.to_radians(),
            max_force: spec.max_torque / spec.radius,
            lateral_grip: spec.lateral_grip,
            power: 0.0,
            lateral_velocity: 0.0,
        }
    }

    /// Sets the commanded power. Values outside [-1, 1] are clamped.
    pub fn set_power(&mut self, power: f64) {
        self.power = if power.is_nan() {
            0.0
        } else {
            power.clamp(-1.0, 1.0)
        };
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    pub fn longitudinal_force(&self) -> f64 {
        self.max_force * self.power
    }

    pub fn lateral_force(&self) -> f64 {
        -self.lateral_velocity * self.lateral_grip
    }

    /// Computes the world-space longitudinal and lateral forces for a chassis at
    /// `body_angle` whose velocity at the wheel, in the chassis frame, is
    /// `local_velocity`. Forces are scaled by `dt`.
    fn forces(&mut self, body_angle: f64, local_velocity: Vector2, dt: f64) -> (Vector2, Vector2) {
        let lateral_dir = Vector2::new(
            (self.angle + FRAC_PI_2).cos(),
            (self.angle + FRAC_PI_2).sin(),
        );
        self.lateral_velocity = local_velocity.dot(&lateral_dir);

        let combined = self.angle + body_angle;
        let longitudinal =
            Vector2::new(combined.cos(), combined.sin()) * self.longitudinal_force() * dt;
        let lateral = Vector2::new(
            (combined + FRAC_PI_2).cos(),
            (combined + FRAC_PI_2).sin(),
        ) * self.lateral_force()
            * dt;
        (longitudinal, lateral)
    }

    pub fn step_before_physics(
        &mut self,
        body: RigidBodyHandle,
        pose: &Isometry<Real>,
        physics: &mut PhysicsWorld,
        dt: f64,
    ) {
        let contact = world_point(pose, self.position);
        let Some(velocity) = physics.velocity_at_point(body, contact) else {
            return;
        };
        let local_velocity = pose.rotation.inverse_transform_vector(&velocity);
        let (longitudinal, lateral) = self.forces(pose.rotation.angle(), local_velocity, dt);

        physics.apply_force_at_point(body, longitudinal, contact);
        physics.apply_force_at_point(body, lateral, contact);
    }
}
