use std::path::Path;

use anyhow::{ensure, Context, Result};
use robotex_core::Side;
use serde::{Deserialize, Serialize};

/// Dimensions and surface properties of the playing field, in meters.
///
/// The field spans `[0, width] x [0, height]`. Goals open onto the left and right
/// edges, centered vertically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub width: f64,
    pub height: f64,
    pub goal_width: f64,
    pub goal_depth: f64,
    pub wall_depth: f64,
    pub wall_friction: f64,
    pub wall_restitution: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            width: 4.5,
            height: 3.0,
            goal_width: 0.8,
            goal_depth: 0.35,
            wall_depth: 0.05,
            wall_friction: 0.3,
            wall_restitution: 0.5,
        }
    }
}

/// The available robot builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotModel {
    /// Four omni wheels, chamfered square chassis
    Ramses,
    /// Two wheels in differential drive, round chassis with a flat front
    Telliskivi,
}

/// Who drives a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PilotKind {
    /// The onboard state machine
    Autonomous,
    /// An external process over the remote-control protocol
    Remote,
    /// Nobody; the robot only moves when pushed
    Idle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    pub model: RobotModel,
    pub pilot: PilotKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    // FIELD
    pub field: FieldConfig,

    // STEPPING
    /// Physics ticks per simulated second
    pub tick_rate: f64,
    /// Initial time acceleration in percent (0 pauses, 100 is real time)
    pub timewarp: f64,
    /// Velocity solver iterations per step
    pub velocity_iterations: usize,
    /// Position correction iterations per step
    pub position_iterations: usize,

    // BALLS
    /// Number of balls placed at setup
    pub ball_count: usize,
    /// Distance kept between randomly placed balls and the walls
    pub ball_margin: f64,
    /// Seed for ball placement, random if unset
    pub seed: Option<u64>,

    // ROBOTS
    pub yellow: RobotConfig,
    pub blue: RobotConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            field: FieldConfig::default(),

            tick_rate: 60.0,
            timewarp: 100.0,
            velocity_iterations: 8,
            position_iterations: 3,

            ball_count: 11,
            ball_margin: 0.2,
            seed: None,

            yellow: RobotConfig {
                model: RobotModel::Ramses,
                pilot: PilotKind::Autonomous,
            },
            blue: RobotConfig {
                model: RobotModel::Telliskivi,
                pilot: PilotKind::Remote,
            },
        }
    }
}

impl MatchConfig {
    /// Reads a config from a JSON file. Fields missing from the file keep their
    /// default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: MatchConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Rejects values the simulation cannot step with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.tick_rate.is_finite() && self.tick_rate > 0.0,
            "tick_rate must be positive, got {}",
            self.tick_rate
        );
        ensure!(
            self.velocity_iterations > 0 && self.position_iterations > 0,
            "solver iterations must be at least 1"
        );
        ensure!(
            self.field.width.is_finite()
                && self.field.width > 0.0
                && self.field.height.is_finite()
                && self.field.height > 0.0,
            "field size must be positive, got {}x{}",
            self.field.width,
            self.field.height
        );
        Ok(())
    }

    /// Fixed size of one tick in seconds.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate
    }

    pub fn robot(&self, side: Side) -> &RobotConfig {
        match side {
            Side::Yellow => &self.yellow,
            Side::Blue => &self.blue,
        }
    }

    pub fn robot_mut(&mut self, side: Side) -> &mut RobotConfig {
        match side {
            Side::Yellow => &mut self.yellow,
            Side::Blue => &mut self.blue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_relative_eq!(config.dt(), 1.0 / 60.0);
        assert_eq!(config.ball_count, 11);
        assert_eq!(config.robot(Side::Blue).pilot, PilotKind::Remote);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: MatchConfig = serde_json::from_str(
            r#"{ "ball_count": 3, "seed": 42, "field": { "width": 6.0 }, "yellow": { "model": "telliskivi", "pilot": "idle" } }"#,
        )
        .unwrap();
        assert_eq!(config.ball_count, 3);
        assert_eq!(config.seed, Some(42));
        assert_relative_eq!(config.field.width, 6.0);
        assert_relative_eq!(config.field.height, 3.0);
        assert_eq!(config.yellow.model, RobotModel::Telliskivi);
        assert_eq!(config.blue.model, RobotModel::Telliskivi);
        assert_eq!(config.velocity_iterations, 8);
    }

    #[test]
    fn test_validate_rejects_unsteppable_values() {
        assert!(MatchConfig::default().validate().is_ok());

        for tick_rate in [0.0, -60.0, f64::NAN, f64::INFINITY] {
            let config = MatchConfig {
                tick_rate,
                ..MatchConfig::default()
            };
            assert!(config.validate().is_err(), "tick_rate {}", tick_rate);
        }

        let config = MatchConfig {
            velocity_iterations: 0,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = MatchConfig::default();
        config.field.height = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_zero_tick_rate() {
        let path = std::env::temp_dir().join(format!(
            "robotex-zero-tick-rate-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "tick_rate": 0.0 }"#).unwrap();
        let result = MatchConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("tick_rate must be positive"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = MatchConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
