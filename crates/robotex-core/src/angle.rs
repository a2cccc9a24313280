use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::Vector2;

/// A direction in radians, kept in (-pi, pi]. Sums wrap around:
///
/// ```
/// # use robotex_core::Angle;
/// let heading = Angle::from_degrees(135.0) + Angle::from_degrees(90.0);
/// assert!((heading.degrees() + 135.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    /// A quarter turn counter-clockwise.
    pub const PI_2: Angle = Angle(PI / 2.0);

    pub fn from_radians(radians: f64) -> Self {
        Angle(wrap_radians(radians))
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    pub fn radians(&self) -> f64 {
        self.0
    }

    pub fn degrees(&self) -> f64 {
        self.0.to_degrees()
    }
}

impl Default for Angle {
    fn default() -> Self {
        Angle(0.0)
    }
}

impl std::ops::Add for Angle {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Angle::from_radians(self.0 + other.0)
    }
}

/// Rotates a vector counter-clockwise by the angle.
impl std::ops::Mul<Vector2> for Angle {
    type Output = Vector2;

    fn mul(self, v: Vector2) -> Vector2 {
        nalgebra::Rotation2::new(self.0) * v
    }
}

/// Two angles are equal when they point the same way, up to 1e-5 rad.
impl PartialEq for Angle {
    fn eq(&self, other: &Self) -> bool {
        const TOLERANCE: f64 = 1e-5;
        let diff = (self.0 - other.0).abs();
        diff < TOLERANCE || diff > 2.0 * PI - TOLERANCE
    }
}

fn wrap_radians(radians: f64) -> f64 {
    let wrapped = radians % (2.0 * PI);
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else if wrapped > PI {
        wrapped - 2.0 * PI
    } else {
        wrapped
    }
}

/// Wraps an angle in degrees into [-180, 180].
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped < -180.0 {
        wrapped + 360.0
    } else if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_wrap_radians() {
        assert_eq!(wrap_radians(0.0), 0.0);
        assert_eq!(wrap_radians(PI), PI);
        assert_eq!(wrap_radians(-PI), PI);
        assert_eq!(wrap_radians(3.0 * PI), PI);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_relative_eq!(wrap_degrees(190.0), -170.0);
        assert_relative_eq!(wrap_degrees(-190.0), 170.0);
        assert_relative_eq!(wrap_degrees(725.0), 5.0);
        assert_relative_eq!(wrap_degrees(-180.0), -180.0);
    }

    #[test]
    fn test_quarter_turns_wrap() {
        let mut heading = Angle::default();
        for expected in [90.0, 180.0, -90.0, 0.0] {
            heading = heading + Angle::PI_2;
            assert_relative_eq!(heading.degrees(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotate_vector() {
        let r = Angle::from_degrees(90.0) * Vector2::new(1.0, 0.0);
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_across_wrap() {
        assert_eq!(Angle::from_degrees(180.0), Angle::from_degrees(-180.0));
        assert_ne!(Angle::from_degrees(10.0), Angle::from_degrees(20.0));
    }
}
