use std::sync::Arc;

use anyhow::{anyhow, Result};
use rapier2d_f64::prelude::*;
use robotex_core::{signum, Actuation, Side, Vector2, VisionSnapshot};

use crate::{
    ball::BALL_RADIUS,
    camera::Camera,
    coilgun::Coilgun,
    config::RobotModel,
    dribbler::Dribbler,
    models::{Drivetrain, RobotSpec},
    physics::{EntityTag, PhysicsWorld},
    step::{StepContext, StepListener},
    wheel::Wheel,
};

/// Fraction of the yaw input that reaches the omni wheels.
const OMNI_YAW_GAIN: f64 = 0.3;

/// The latest drive request of a robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveCommand {
    /// Thrust direction \[rad] in the robot frame, power in [0, 1], yaw rate in [-1, 1]
    Steer {
        heading: f64,
        power: f64,
        yaw_rate: f64,
    },
    /// Direct left/right wheel powers in [-1, 1]
    Wheels { left: f64, right: f64 },
}

impl Default for DriveCommand {
    fn default() -> Self {
        DriveCommand::Steer {
            heading: 0.0,
            power: 0.0,
            yaw_rate: 0.0,
        }
    }
}

/// Synthesizes per-wheel powers from a drive command.
///
/// Omni robots turn a left/right pair into forward power and yaw. Differential robots
/// take a left/right pair as is and mix a steer request into left = power + yaw,
/// right = power - yaw.
pub fn wheel_powers(drivetrain: &Drivetrain, command: &DriveCommand) -> Vec<f64> {
    match (drivetrain, *command) {
        (Drivetrain::Omni { role_angles }, DriveCommand::Steer { heading, power, yaw_rate }) => {
            let yaw = yaw_rate * OMNI_YAW_GAIN;
            let power = power - yaw * signum(power);
            role_angles
                .iter()
                .map(|role| power * (heading - role).sin() - yaw)
                .collect()
        }
        (Drivetrain::Omni { .. }, DriveCommand::Wheels { left, right }) => wheel_powers(
            drivetrain,
            &DriveCommand::Steer {
                heading: 0.0,
                power: (left + right) / 2.0,
                yaw_rate: (left - right) / 2.0,
            },
        ),
        (Drivetrain::Differential, DriveCommand::Wheels { left, right }) => vec![left, right],
        (Drivetrain::Differential, DriveCommand::Steer { power, yaw_rate, .. }) => {
            vec![power + yaw_rate, power - yaw_rate]
        }
    }
}

/// A robot on the field: a chassis body with wheels, a camera, a dribbler and a
/// coilgun.
pub struct Robot {
    side: Side,
    model: RobotModel,
    body: RigidBodyHandle,
    outline: Vec<Vector2>,
    drivetrain: Drivetrain,
    wheels: Vec<Wheel>,
    camera: Camera,
    dribbler: Dribbler,
    coilgun: Coilgun,
    coilgun_strength: f64,
    command: DriveCommand,
    actuation: Actuation,
}

impl Robot {
    pub(crate) fn spawn(
        physics: &mut PhysicsWorld,
        side: Side,
        model: RobotModel,
        position: Vector2,
        angle: f64,
    ) -> Result<Robot> {
        let spec = model.spec();
        let density = spec.density();
        let RobotSpec {
            outline,
            linear_damping,
            angular_damping,
            restitution,
            friction,
            drivetrain,
            wheels,
            camera,
            dribbler,
            dribbler_strength,
            coilgun,
            coilgun_strength,
            ..
        } = spec;

        let points: Vec<Point<Real>> = outline.iter().map(|v| Point::from(*v)).collect();
        let collider = ColliderBuilder::convex_hull(&points)
            .ok_or_else(|| anyhow!("Chassis outline of {:?} is degenerate", model))?
            .density(density)
            .restitution(restitution)
            .friction(friction)
            .user_data(EntityTag::Robot(side).to_user_data());
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .rotation(angle)
            .linear_damping(linear_damping)
            .angular_damping(angular_damping);
        let (body, _) = physics.insert(body, collider);

        log::debug!("Spawned {:?} for {} at {:?}", model, side, position);

        Ok(Robot {
            side,
            model,
            body,
            outline,
            drivetrain,
            wheels: wheels.iter().map(Wheel::new).collect(),
            camera: Camera::new(&camera),
            dribbler: Dribbler::new(&dribbler, dribbler_strength, BALL_RADIUS),
            coilgun: Coilgun::new(&coilgun, BALL_RADIUS),
            coilgun_strength,
            command: DriveCommand::default(),
            actuation: Actuation::default(),
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn model(&self) -> RobotModel {
        self.model
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    /// Chassis outline in the robot frame.
    pub fn outline(&self) -> &[Vector2] {
        &self.outline
    }

    /// Sets heading, power and yaw rate. A set `kick` flag also arms the coilgun.
    pub fn set_actuation(&mut self, actuation: Actuation) {
        self.command = DriveCommand::Steer {
            heading: actuation.heading,
            power: actuation.power,
            yaw_rate: actuation.yaw_rate,
        };
        self.actuation = Actuation {
            kick: false,
            ..actuation
        };
        if actuation.kick {
            self.kick();
        }
    }

    /// Drives the wheels from a left/right pair in [-1, 1].
    pub fn set_wheels(&mut self, left: f64, right: f64) {
        self.command = DriveCommand::Wheels { left, right };
        self.actuation = Actuation {
            heading: 0.0,
            power: (left + right) / 2.0,
            yaw_rate: (left - right) / 2.0,
            kick: false,
        };
    }

    /// The current continuous inputs, as last set.
    pub fn actuation(&self) -> Actuation {
        self.actuation
    }

    pub fn command(&self) -> DriveCommand {
        self.command
    }

    /// Arms the coilgun for the next tick.
    pub fn kick(&mut self) {
        self.coilgun.kick(self.coilgun_strength);
    }

    pub fn kicks(&self) -> u32 {
        self.coilgun.kicks()
    }

    pub fn has_ball(&self) -> bool {
        self.dribbler.has_ball()
    }

    pub fn set_dribbler_enabled(&mut self, enabled: bool) {
        self.dribbler.set_enabled(enabled);
    }

    /// The latest camera readings.
    pub fn vision(&self) -> Arc<VisionSnapshot> {
        self.camera.snapshot()
    }

    pub fn wheel_powers(&self) -> Vec<f64> {
        self.wheels.iter().map(Wheel::power).collect()
    }

    pub fn pose(&self, physics: &PhysicsWorld) -> Option<Isometry<Real>> {
        physics.pose(self.body)
    }
}

impl StepListener for Robot {
    fn step_before_physics(&mut self, ctx: &mut StepContext<'_>, dt: f64) {
        let Some(pose) = ctx.physics.pose(self.body) else {
            return;
        };

        let powers = wheel_powers(&self.drivetrain, &self.command);
        for (wheel, power) in self.wheels.iter_mut().zip(powers) {
            wheel.set_power(power);
            wheel.step_before_physics(self.body, &pose, ctx.physics, dt);
        }

        self.camera.sense(&pose, ctx.balls, ctx.goals);
        self.dribbler.step_before_physics(&pose, ctx, dt);
        self.coilgun.step_before_physics(&pose, ctx, dt);
    }

    fn step_after_physics(&mut self, _ctx: &mut StepContext<'_>, _dt: f64) {
        self.coilgun.step_after_physics();
    }
}
