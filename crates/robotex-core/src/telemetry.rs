use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Actuation, BallId, PilotDebug, Side, Vector2, VisionSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub id: BallId,
    pub position: Vector2,
    pub velocity: Vector2,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub side: Side,
    pub position: Vector2,
    /// Chassis rotation \[rad]
    pub angle: f64,
    pub actuation: Actuation,
    pub wheel_powers: Vec<f64>,
    pub has_ball: bool,
    pub kicks: u32,
    pub vision: Arc<VisionSnapshot>,
    pub pilot: Option<PilotDebug>,
}

/// Read-only view of a match, published once per tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Simulated time \[s]
    pub elapsed: f64,
    pub yellow_score: u32,
    pub blue_score: u32,
    /// Time acceleration in percent
    pub timewarp: f64,
    /// Simulated ticks per second
    pub fps: u32,
    pub balls: Vec<BallSnapshot>,
    pub robots: Vec<RobotSnapshot>,
}

impl MatchSnapshot {
    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Yellow => self.yellow_score,
            Side::Blue => self.blue_score,
        }
    }

    pub fn robot(&self, side: Side) -> Option<&RobotSnapshot> {
        self.robots.iter().find(|r| r.side == side)
    }
}
