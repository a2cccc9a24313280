use std::f64::consts::TAU;

use robotex_core::{polygon_signed_area, Vector2};

use crate::{camera::CameraSpec, config::RobotModel, wheel::WheelSpec, zone::ZoneSpec};

/// How power commands map onto the wheels of a robot.
#[derive(Debug, Clone, PartialEq)]
pub enum Drivetrain {
    /// Omni wheels. Each wheel has a role angle used to synthesize its power from a
    /// heading, power and yaw rate.
    Omni { role_angles: Vec<f64> },
    /// Two independently driven wheels, left then right.
    Differential,
}

/// Mass of a chassis, either as a density or as a total that is spread over the
/// outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyMass {
    Density(f64),
    Total(f64),
}

/// Everything needed to build a robot of a given model.
#[derive(Debug, Clone)]
pub struct RobotSpec {
    /// Convex chassis outline, counter-clockwise, front toward -y
    pub outline: Vec<Vector2>,
    /// Half the chassis extent, used to keep the spawn point off the walls
    pub radius: f64,
    pub mass: BodyMass,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub restitution: f64,
    pub friction: f64,
    pub drivetrain: Drivetrain,
    pub wheels: Vec<WheelSpec>,
    pub camera: CameraSpec,
    pub dribbler: ZoneSpec,
    pub dribbler_strength: f64,
    pub coilgun: ZoneSpec,
    pub coilgun_strength: f64,
}

impl RobotSpec {
    /// Chassis density resulting from the configured mass.
    pub fn density(&self) -> f64 {
        match self.mass {
            BodyMass::Density(density) => density,
            BodyMass::Total(mass) => mass / polygon_signed_area(&self.outline).abs(),
        }
    }
}

const CHASSIS_LINEAR_DAMPING: f64 = 0.7;
const CHASSIS_ANGULAR_DAMPING: f64 = 0.9;
const CHASSIS_RESTITUTION: f64 = 0.1;
const CHASSIS_FRICTION: f64 = 0.5;
const CAMERA_RANGE: f64 = 5.5;

impl RobotModel {
    pub fn spec(self) -> RobotSpec {
        match self {
            RobotModel::Ramses => ramses(),
            RobotModel::Telliskivi => telliskivi(),
        }
    }
}

fn ramses() -> RobotSpec {
    let r = 0.175;
    let edge = 0.08;
    let outline = vec![
        Vector2::new(-r + edge, r),
        Vector2::new(-r, r - edge),
        Vector2::new(-r, -r + edge),
        Vector2::new(-r + edge, -r),
        Vector2::new(r - edge, -r),
        Vector2::new(r, -r + edge),
        Vector2::new(r, r - edge),
        Vector2::new(r - edge, r),
    ];

    let inset = 0.06;
    let wheel = |x: f64, y: f64, angle: f64| WheelSpec {
        position: Vector2::new(x, y),
        angle,
        max_torque: 2.0,
        radius: 0.02,
        lateral_grip: 50.0,
    };
    // front left, front right, rear left, rear right
    let wheels = vec![
        wheel(-r + inset, -r + inset, 135.0),
        wheel(r - inset, -r + inset, -135.0),
        wheel(-r + inset, r - inset, -315.0),
        wheel(r - inset, r - inset, 315.0),
    ];

    let zone = ZoneSpec {
        mount: Vector2::new(0.0, -0.16),
        angle: 0.0,
        near_width: 0.16,
        far_width: 0.18,
        range: 0.04,
    };

    RobotSpec {
        outline,
        radius: r,
        mass: BodyMass::Density(30.0),
        linear_damping: CHASSIS_LINEAR_DAMPING,
        angular_damping: CHASSIS_ANGULAR_DAMPING,
        restitution: CHASSIS_RESTITUTION,
        friction: CHASSIS_FRICTION,
        drivetrain: Drivetrain::Omni {
            role_angles: [45.0f64, 315.0, 135.0, 225.0]
                .iter()
                .map(|deg| deg.to_radians())
                .collect(),
        },
        wheels,
        camera: CameraSpec {
            mount: Vector2::new(0.0, 0.1),
            angle: -90.0,
            field_of_view: 60.0,
            range: CAMERA_RANGE,
        },
        dribbler: zone,
        dribbler_strength: 3.0,
        coilgun: zone,
        coilgun_strength: 40.0,
    }
}

fn telliskivi() -> RobotSpec {
    let radius = 0.13;
    let front = -0.085;
    let half_front = 0.1;

    let mut outline = vec![
        Vector2::new(-half_front, front),
        Vector2::new(half_front, front),
    ];
    let start = front.atan2(half_front);
    let end = front.atan2(-half_front) + TAU;
    let segments = 20;
    for i in 1..segments {
        let angle = start + (end - start) * i as f64 / segments as f64;
        outline.push(Vector2::new(angle.cos(), angle.sin()) * radius);
    }

    let wheel = |x: f64| WheelSpec {
        position: Vector2::new(x, 0.0),
        angle: -90.0,
        max_torque: 0.6,
        radius: 0.03,
        lateral_grip: 500.0,
    };

    let zone = ZoneSpec {
        mount: Vector2::new(0.0, -0.077),
        angle: 0.0,
        near_width: 0.08,
        far_width: 0.10,
        range: 0.04,
    };

    RobotSpec {
        outline,
        radius,
        mass: BodyMass::Total(1.875),
        linear_damping: CHASSIS_LINEAR_DAMPING,
        angular_damping: CHASSIS_ANGULAR_DAMPING,
        restitution: CHASSIS_RESTITUTION,
        friction: CHASSIS_FRICTION,
        drivetrain: Drivetrain::Differential,
        wheels: vec![wheel(-0.105), wheel(0.105)],
        camera: CameraSpec {
            mount: Vector2::new(0.0, 0.015),
            angle: -90.0,
            field_of_view: 40.0,
            range: CAMERA_RANGE,
        },
        dribbler: zone,
        dribbler_strength: 0.1,
        coilgun: zone,
        coilgun_strength: 400.0,
    }
}
