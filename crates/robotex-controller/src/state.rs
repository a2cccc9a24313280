use std::{f64::consts::FRAC_PI_4, fmt};

use robotex_core::{wrap_degrees, Actuation, Angle, BallId, PilotInputs};
use serde::{Deserialize, Serialize};

use crate::ControllerParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerState {
    /// Drive away from the starting corner
    Start,
    /// Spin in place looking for the closest ball
    SearchBall,
    /// Drive somewhere else to find balls
    Relocate,
    /// Turn to and drive at the target ball
    Fetch,
    /// Holding a ball, aim at the opponent's goal and kick
    SearchGoal,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Start => "START",
            ControllerState::SearchBall => "SEARCH_BALL",
            ControllerState::Relocate => "RELOCATE",
            ControllerState::Fetch => "FETCH",
            ControllerState::SearchGoal => "SEARCH_GOAL",
        };
        f.write_str(name)
    }
}

/// Data the controller carries between ticks and across states.
#[derive(Debug, Clone, PartialEq)]
pub struct Scratch {
    /// Time since the controller started \[s]
    pub duration: f64,
    /// Time since the current state was entered \[s]
    pub state_duration: f64,
    /// Whether the entry setup of the current state has run
    pub entered: bool,
    /// State to resume after [`ControllerState::Relocate`]
    pub next_state: ControllerState,
    /// Smallest ball distance seen in the current ball search
    pub closest_ball_distance: f64,
    pub target: Option<BallId>,
    /// How long the opponent's goal has been in view, `None` while it is not
    pub goal_sight_duration: Option<f64>,
    /// Spin direction of the current ball search, flipped on every search
    pub ball_search_dir: f64,
    /// Heading of the current relocation, rotated on every relocation
    pub relocate_heading: Angle,
    /// Spin direction while the opponent's goal is out of view
    pub goal_search_dir: f64,
    /// Estimated angle to the opponent's goal in the robot frame \[deg]
    pub guessed_goal_angle: f64,
}

impl Default for Scratch {
    fn default() -> Self {
        Scratch {
            duration: 0.0,
            state_duration: 0.0,
            entered: false,
            next_state: ControllerState::SearchBall,
            closest_ball_distance: f64::MAX,
            target: None,
            goal_sight_duration: None,
            ball_search_dir: 1.0,
            relocate_heading: Angle::default(),
            goal_search_dir: 1.0,
            guessed_goal_angle: 0.0,
        }
    }
}

/// Advances the controller by one tick.
///
/// `actuation` is what the robot is currently doing. Fields a state does not set keep
/// their value, except `kick`, which is only set on the tick the controller decides
/// to shoot.
pub fn transition(
    state: ControllerState,
    scratch: Scratch,
    inputs: &PilotInputs<'_>,
    params: &ControllerParams,
    dt: f64,
    actuation: Actuation,
) -> (ControllerState, Scratch, Actuation) {
    let mut step = Step {
        state,
        scratch,
        out: Actuation {
            kick: false,
            ..actuation
        },
        inputs: *inputs,
        params,
        dt,
    };
    step.run();
    (step.state, step.scratch, step.out)
}

struct Step<'a> {
    state: ControllerState,
    scratch: Scratch,
    out: Actuation,
    inputs: PilotInputs<'a>,
    params: &'a ControllerParams,
    dt: f64,
}

impl Step<'_> {
    fn run(&mut self) {
        // the goal estimate follows our own turning while the goal is out of view; it is
        // only wrapped again once a goal is seen
        let turned = self.out.yaw_rate * self.params.guessed_angle_gain * self.dt;
        self.scratch.guessed_goal_angle -= turned;

        self.scratch.duration += self.dt;
        self.scratch.state_duration += self.dt;

        if self.scratch.state_duration > self.params.max_state_duration
            && self.state != ControllerState::SearchBall
        {
            self.set_state(ControllerState::SearchBall);
        } else if self.inputs.has_ball && self.state != ControllerState::SearchGoal {
            self.set_state(ControllerState::SearchGoal);
        }

        match self.state {
            ControllerState::Start => self.start(),
            ControllerState::SearchBall => self.search_ball(),
            ControllerState::Relocate => self.relocate(),
            ControllerState::Fetch => self.fetch(),
            ControllerState::SearchGoal => self.search_goal(),
        }

        self.update_guessed_angle();
    }

    fn set_state(&mut self, state: ControllerState) {
        self.set_state_then(state, self.scratch.next_state);
    }

    fn set_state_then(&mut self, state: ControllerState, next_state: ControllerState) {
        log::debug!(
            "{} controller: {} -> {} after {:.2}s",
            self.inputs.side,
            self.state,
            state,
            self.scratch.state_duration
        );
        self.state = state;
        self.scratch.next_state = next_state;
        self.scratch.state_duration = 0.0;
        self.scratch.entered = false;
    }

    fn start(&mut self) {
        // diagonally away from the corner
        self.out.heading = -FRAC_PI_4;
        self.out.power = 1.0;

        if self.scratch.duration > self.params.start_time {
            self.set_state(ControllerState::SearchBall);
        }
    }

    fn search_ball(&mut self) {
        self.out.power = 0.0;

        if !self.scratch.entered {
            self.scratch.closest_ball_distance = f64::MAX;
            self.scratch.target = None;
            self.scratch.ball_search_dir = -self.scratch.ball_search_dir;
            self.scratch.entered = true;
        }

        let balls = &self.inputs.vision.balls;
        let dir = self.scratch.ball_search_dir;
        let spin_end = self.params.spin_search_time;
        let refind_end = spin_end + self.params.refind_time;

        if self.scratch.state_duration <= spin_end {
            // slower when something is in view so it does not slip past
            self.out.yaw_rate = if balls.is_empty() { 0.5 } else { 0.25 } * dir;

            for ball in balls {
                self.scratch.closest_ball_distance =
                    self.scratch.closest_ball_distance.min(ball.distance);
            }

            if self.scratch.closest_ball_distance <= self.params.close_enough {
                let closest = self.scratch.closest_ball_distance;
                if let Some(ball) = balls.iter().find(|ball| ball.distance == closest) {
                    self.scratch.target = Some(ball.id);
                    self.set_state(ControllerState::Fetch);
                }
            }
        } else if self.scratch.state_duration < refind_end {
            self.out.yaw_rate = if balls.is_empty() { 0.25 } else { 0.1 } * dir;

            let closest = self.scratch.closest_ball_distance;
            let tolerance = self.params.distance_tolerance;
            if let Some(ball) = balls
                .iter()
                .find(|ball| (ball.distance - closest).abs() <= tolerance)
            {
                self.scratch.target = Some(ball.id);
                self.set_state(ControllerState::Fetch);
            }
        } else {
            self.set_state_then(ControllerState::Relocate, ControllerState::SearchBall);
        }
    }

    fn relocate(&mut self) {
        if !self.scratch.entered {
            self.scratch.relocate_heading = self.scratch.relocate_heading + Angle::PI_2;
            self.scratch.entered = true;
        }

        self.out.yaw_rate = 0.0;
        self.out.heading = self.scratch.relocate_heading.radians();
        self.out.power = 1.0;

        if self.scratch.state_duration > self.params.relocate_time {
            self.set_state(self.scratch.next_state);
        }
    }

    fn fetch(&mut self) {
        self.out.power = 0.0;

        if self.scratch.state_duration < self.params.brake_time {
            self.out.yaw_rate = -1.0;
            return;
        }

        let Some(target) = self
            .scratch
            .target
            .and_then(|id| self.inputs.vision.ball(id))
        else {
            self.set_state(ControllerState::SearchBall);
            return;
        };

        let angle = target.bearing.to_degrees();
        self.out.yaw_rate = (angle / 60.0).clamp(-1.0, 1.0);

        if angle.abs() <= self.params.max_approach_angle {
            // slower when closer, the camera sits behind the front edge
            self.out.heading = 0.0;
            self.out.power = ((target.distance - 0.33) / 1.0).clamp(0.2, 1.0);
        }
    }

    fn search_goal(&mut self) {
        if !self.scratch.entered {
            self.scratch.goal_sight_duration = None;
            self.scratch.goal_search_dir = 1.0;
            self.scratch.entered = true;
        }

        if !self.inputs.has_ball {
            self.set_state(ControllerState::SearchBall);
            return;
        }

        self.out.power = 0.0;

        let opponent = self.inputs.side.opposite();
        let Some(goal) = self.inputs.vision.goal(opponent) else {
            self.out.yaw_rate = 0.25 * self.scratch.goal_search_dir;
            self.scratch.goal_sight_duration = None;
            return;
        };

        let guessed = self.scratch.guessed_goal_angle;
        let sight = match self.scratch.goal_sight_duration {
            Some(sight) => sight + self.dt,
            None => {
                // decided once per sighting so the robot does not oscillate around
                // the goal
                self.scratch.goal_search_dir = if guessed > 0.0 && guessed < 180.0 {
                    1.0
                } else {
                    -1.0
                };
                0.0
            }
        };
        self.scratch.goal_sight_duration = Some(sight);

        if sight < self.params.brake_time {
            self.out.yaw_rate = if guessed > 0.0 { -1.0 } else { 1.0 };
            return;
        }

        let angle = goal.bearing.to_degrees();
        self.scratch.guessed_goal_angle = wrap_degrees(angle);

        // a far goal needs better aim than a close one
        let required_accuracy = (10.0 / (goal.distance * 5.0)).max(2.0);
        if angle.abs() <= required_accuracy {
            self.out.kick = true;
            self.scratch.target = None;
        } else {
            self.out.yaw_rate = (angle / 30.0).clamp(-1.0, 1.0);
        }
    }

    fn update_guessed_angle(&mut self) {
        let opponent = self.inputs.side.opposite();
        for goal in &self.inputs.vision.goals {
            let angle = goal.bearing.to_degrees();
            let angle = if goal.side == opponent {
                angle
            } else {
                angle - 180.0
            };
            self.scratch.guessed_goal_angle = wrap_degrees(angle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use robotex_core::{BallReading, GoalReading, Side, Vector2, VisionSnapshot};

    const DT: f64 = 1.0 / 60.0;

    struct Harness {
        state: ControllerState,
        scratch: Scratch,
        actuation: Actuation,
        params: ControllerParams,
        time: f64,
    }

    impl Harness {
        fn new(state: ControllerState) -> Self {
            Harness {
                state,
                scratch: Scratch::default(),
                actuation: Actuation::default(),
                params: ControllerParams::default(),
                time: 0.0,
            }
        }

        fn tick(&mut self, vision: &VisionSnapshot, has_ball: bool) {
            let inputs = PilotInputs {
                side: Side::Yellow,
                vision,
                has_ball,
            };
            let (state, scratch, actuation) = transition(
                self.state,
                self.scratch.clone(),
                &inputs,
                &self.params,
                DT,
                self.actuation,
            );
            self.state = state;
            self.scratch = scratch;
            self.actuation = actuation;
            self.time += DT;
        }

        /// Ticks until the state changes and returns the time it took.
        fn until_change(&mut self, vision: &VisionSnapshot, has_ball: bool, limit: f64) -> f64 {
            let from = self.state;
            let start = self.time;
            while self.state == from {
                assert!(self.time - start < limit, "stuck in {}", from);
                self.tick(vision, has_ball);
            }
            self.time - start
        }
    }

    fn ball(id: BallId, distance: f64, bearing: f64) -> BallReading {
        BallReading {
            id,
            position: Vector2::zeros(),
            distance,
            bearing,
        }
    }

    fn goal(side: Side, distance: f64, bearing: f64) -> GoalReading {
        GoalReading {
            side,
            position: Vector2::zeros(),
            distance,
            bearing,
        }
    }

    fn sees_balls(balls: Vec<BallReading>) -> VisionSnapshot {
        VisionSnapshot {
            balls,
            goals: Vec::new(),
        }
    }

    #[test]
    fn test_start_drives_diagonally_then_searches() {
        let mut harness = Harness::new(ControllerState::Start);
        let empty = VisionSnapshot::default();
        harness.tick(&empty, false);
        assert_relative_eq!(harness.actuation.heading, -FRAC_PI_4);
        assert_relative_eq!(harness.actuation.power, 1.0);

        let took = harness.until_change(&empty, false, 3.0);
        assert!(took > 1.9 && took <= 2.0 + 2.0 * DT, "{}", took);
        assert_eq!(harness.state, ControllerState::SearchBall);
    }

    #[test]
    fn test_search_without_balls_relocates_and_returns() {
        let mut harness = Harness::new(ControllerState::SearchBall);
        let empty = VisionSnapshot::default();

        let took = harness.until_change(&empty, false, 7.0);
        assert_eq!(harness.state, ControllerState::Relocate);
        assert!(took <= 6.0 + 2.0 * DT, "{}", took);
        assert!(took >= 5.9, "{}", took);
        assert_relative_eq!(harness.actuation.power, 0.0);

        let took = harness.until_change(&empty, false, 3.0);
        assert_eq!(harness.state, ControllerState::SearchBall);
        assert!(took <= 2.0 + 2.0 * DT, "{}", took);
    }

    #[test]
    fn test_search_direction_flips_every_search() {
        let mut harness = Harness::new(ControllerState::SearchBall);
        let empty = VisionSnapshot::default();
        harness.tick(&empty, false);
        assert_relative_eq!(harness.actuation.yaw_rate, -0.5);

        harness.until_change(&empty, false, 7.0);
        harness.until_change(&empty, false, 3.0);
        harness.tick(&empty, false);
        assert_relative_eq!(harness.actuation.yaw_rate, 0.5);
    }

    #[test]
    fn test_relocation_heading_rotates_a_quarter_turn() {
        let mut harness = Harness::new(ControllerState::SearchBall);
        let empty = VisionSnapshot::default();
        let mut headings = Vec::new();
        for _ in 0..2 {
            harness.until_change(&empty, false, 7.0);
            harness.tick(&empty, false);
            headings.push(harness.actuation.heading);
            harness.until_change(&empty, false, 3.0);
        }
        assert_relative_eq!(headings[0], std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
        assert_relative_eq!(headings[1], std::f64::consts::PI, epsilon = 1e-9);
    }

    #[test]
    fn test_close_ball_is_fetched() {
        let mut harness = Harness::new(ControllerState::SearchBall);
        let vision = sees_balls(vec![ball(4, 2.5, 0.0), ball(5, 1.0, 0.3)]);

        harness.tick(&vision, false);
        assert_eq!(harness.state, ControllerState::Fetch);
        assert_eq!(harness.scratch.target, Some(5));
        assert_relative_eq!(harness.actuation.yaw_rate, -0.25);

        // brake pulse first
        harness.tick(&vision, false);
        assert_relative_eq!(harness.actuation.yaw_rate, -1.0);
        assert_relative_eq!(harness.actuation.power, 0.0);

        for _ in 0..15 {
            harness.tick(&vision, false);
        }
        let angle = 0.3f64.to_degrees();
        assert_relative_eq!(harness.actuation.yaw_rate, angle / 60.0, epsilon = 1e-9);
        assert_relative_eq!(harness.actuation.heading, 0.0);
        assert_relative_eq!(harness.actuation.power, 1.0 - 0.33, epsilon = 1e-9);
    }

    #[test]
    fn test_far_ball_is_refound_after_spin() {
        let mut harness = Harness::new(ControllerState::SearchBall);
        let vision = sees_balls(vec![ball(2, 3.0, 0.1)]);

        let took = harness.until_change(&vision, false, 7.0);
        assert_eq!(harness.state, ControllerState::Fetch);
        assert_eq!(harness.scratch.target, Some(2));
        assert!(took > 1.95 && took < 2.0 + 3.0 * DT, "{}", took);
    }

    #[test]
    fn test_fetch_turns_without_driving_at_wide_angle() {
        let mut harness = Harness::new(ControllerState::Fetch);
        harness.scratch.target = Some(1);
        let vision = sees_balls(vec![ball(1, 2.0, -0.9)]);
        for _ in 0..20 {
            harness.tick(&vision, false);
        }
        assert_relative_eq!(harness.actuation.yaw_rate, -0.9f64.to_degrees() / 60.0);
        assert_relative_eq!(harness.actuation.power, 0.0);
    }

    #[test]
    fn test_lost_target_goes_back_to_search() {
        let mut harness = Harness::new(ControllerState::Fetch);
        harness.scratch.target = Some(1);
        let vision = sees_balls(vec![ball(2, 1.0, 0.0)]);
        let took = harness.until_change(&vision, false, 1.0);
        assert_eq!(harness.state, ControllerState::SearchBall);
        assert!(took >= 0.2);
    }

    #[test]
    fn test_watchdog_ends_long_fetch() {
        let mut harness = Harness::new(ControllerState::Fetch);
        harness.scratch.target = Some(1);
        let vision = sees_balls(vec![ball(1, 2.0, 0.9)]);
        let took = harness.until_change(&vision, false, 11.0);
        assert_eq!(harness.state, ControllerState::SearchBall);
        assert!(took > 10.0, "{}", took);
    }

    #[test]
    fn test_has_ball_switches_to_goal_search() {
        for state in [
            ControllerState::Start,
            ControllerState::SearchBall,
            ControllerState::Relocate,
            ControllerState::Fetch,
        ] {
            let mut harness = Harness::new(state);
            harness.tick(&VisionSnapshot::default(), true);
            assert_eq!(harness.state, ControllerState::SearchGoal, "from {}", state);
        }
    }

    #[test]
    fn test_goal_search_without_ball_falls_back() {
        let mut harness = Harness::new(ControllerState::SearchGoal);
        harness.tick(&VisionSnapshot::default(), false);
        assert_eq!(harness.state, ControllerState::SearchBall);
    }

    #[test]
    fn test_goal_search_sweeps_then_kicks_when_aimed() {
        let mut harness = Harness::new(ControllerState::SearchGoal);
        let empty = VisionSnapshot::default();
        harness.tick(&empty, true);
        assert_relative_eq!(harness.actuation.yaw_rate, 0.25);
        assert!(!harness.actuation.kick);

        // yellow aims at the blue goal, dead ahead
        let vision = VisionSnapshot {
            balls: Vec::new(),
            goals: vec![goal(Side::Blue, 2.0, 0.0)],
        };
        harness.tick(&vision, true);
        assert!(!harness.actuation.kick, "no kick during the brake pulse");

        let mut kicked = false;
        for _ in 0..20 {
            harness.tick(&vision, true);
            kicked |= harness.actuation.kick;
        }
        assert!(kicked);
        assert_eq!(harness.scratch.target, None);
    }

    #[test]
    fn test_goal_search_corrects_aim() {
        let mut harness = Harness::new(ControllerState::SearchGoal);
        let vision = VisionSnapshot {
            balls: Vec::new(),
            goals: vec![goal(Side::Blue, 2.0, 0.2)],
        };
        for _ in 0..20 {
            harness.tick(&vision, true);
            assert!(!harness.actuation.kick);
        }
        let angle = 0.2f64.to_degrees();
        assert_relative_eq!(harness.actuation.yaw_rate, angle / 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_guessed_angle_tracks_goals_and_turning() {
        let mut harness = Harness::new(ControllerState::Start);
        // own goal in view: the opponent's is behind us
        let vision = VisionSnapshot {
            balls: Vec::new(),
            goals: vec![goal(Side::Yellow, 3.0, 0.5)],
        };
        harness.tick(&vision, false);
        assert_relative_eq!(
            harness.scratch.guessed_goal_angle,
            0.5f64.to_degrees() - 180.0,
            epsilon = 1e-9
        );

        let before = harness.scratch.guessed_goal_angle;
        harness.actuation.yaw_rate = 0.5;
        harness.tick(&VisionSnapshot::default(), false);
        assert_relative_eq!(
            harness.scratch.guessed_goal_angle,
            before - 0.5 * 200.0 * DT,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_turning_estimate_runs_past_half_turn() {
        let mut harness = Harness::new(ControllerState::Start);
        harness.scratch.guessed_goal_angle = 179.0;
        harness.actuation.yaw_rate = -0.5;
        harness.tick(&VisionSnapshot::default(), false);
        assert_relative_eq!(
            harness.scratch.guessed_goal_angle,
            179.0 + 0.5 * 200.0 * DT,
            epsilon = 1e-9
        );

        // past 180 the goal is still guessed counter-clockwise, so the first sighting
        // brakes clockwise
        harness.state = ControllerState::SearchGoal;
        harness.scratch.state_duration = 0.0;
        harness.scratch.entered = false;
        harness.actuation.yaw_rate = 0.0;
        let vision = VisionSnapshot {
            balls: Vec::new(),
            goals: vec![goal(Side::Blue, 2.0, 0.0)],
        };
        harness.tick(&vision, true);
        assert_relative_eq!(harness.actuation.yaw_rate, -1.0);
        assert_relative_eq!(harness.scratch.goal_search_dir, -1.0);
    }
}
