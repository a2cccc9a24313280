use std::collections::HashMap;

use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rapier2d_f64::prelude::*;
use robotex_core::{
    BallId, BallSnapshot, MatchSnapshot, Pilot, PilotDebug, PilotInputs, RobotSnapshot, Side,
    Vector2,
};

use crate::{
    ball::Ball,
    config::{FieldConfig, MatchConfig, RobotModel},
    goal::Goal,
    physics::{ContactEvent, EntityTag, PhysicsWorld},
    robot::Robot,
    scoring::{resolve_contact, ContactEffect},
    step::{BallState, GoalState, StepContext, StepListener},
};

/// A match between two robots on one field.
///
/// The match owns the physics world and every entity in it. [`Match::tick`] is the
/// only place where simulated time advances.
pub struct Match {
    physics: PhysicsWorld,
    field: FieldConfig,
    dt: f64,
    balls: Vec<Ball>,
    goals: Vec<Goal>,
    robots: Vec<Robot>,
    pilots: HashMap<Side, Box<dyn Pilot>>,
    elapsed: f64,
}

impl Match {
    /// Sets up the match described by `config`: field, scattered balls and both robots.
    /// Pilots are attached separately with [`Match::set_pilot`].
    pub fn from_config(config: &MatchConfig) -> Result<Match> {
        config.validate()?;
        let sim = MatchBuilder::new(config)
            .scatter_balls(config.ball_count, config.ball_margin)
            .add_robot(Side::Yellow, config.yellow.model)?
            .add_robot(Side::Blue, config.blue.model)?
            .build();

        log::info!(
            "Match set up on a {}x{} field with {} balls, {:?} (yellow) vs {:?} (blue)",
            config.field.width,
            config.field.height,
            sim.balls.len(),
            config.yellow.model,
            config.blue.model
        );
        Ok(sim)
    }

    /// Advances the match by one fixed tick.
    pub fn tick(&mut self) {
        let dt = self.dt;

        // pilots see the sensor readings of the previous tick
        for robot in self.robots.iter_mut() {
            let Some(pilot) = self.pilots.get_mut(&robot.side()) else {
                continue;
            };
            let vision = robot.vision();
            let inputs = PilotInputs {
                side: robot.side(),
                vision: &vision,
                has_ball: robot.has_ball(),
            };
            let actuation = pilot.drive(&inputs, &robot.actuation(), dt);
            robot.set_actuation(actuation);
        }

        self.physics.clear_forces();

        let balls: Vec<BallState> = self
            .balls
            .iter()
            .filter_map(|ball| {
                Some(BallState {
                    id: ball.id(),
                    body: ball.body(),
                    position: ball.position(&self.physics)?,
                    active: ball.is_active(),
                })
            })
            .collect();
        let goals: Vec<GoalState> = self
            .goals
            .iter()
            .map(|goal| GoalState {
                side: goal.side(),
                position: goal.position(),
            })
            .collect();

        let mut ctx = StepContext {
            physics: &mut self.physics,
            balls: &balls,
            goals: &goals,
        };
        for robot in self.robots.iter_mut() {
            robot.step_before_physics(&mut ctx, dt);
        }

        let contacts = ctx.physics.step(dt);
        for contact in contacts {
            apply_contact(&mut self.balls, &mut self.goals, contact);
        }

        for robot in self.robots.iter_mut() {
            robot.step_after_physics(&mut ctx, dt);
        }

        self.elapsed += dt;
    }

    /// Simulated time since the start of the match.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn field(&self) -> &FieldConfig {
        &self.field
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Balls a team has put into the opponent's goal.
    pub fn score(&self, side: Side) -> u32 {
        self.goal(side.opposite())
            .map(Goal::ball_count)
            .unwrap_or(0)
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.iter().find(|ball| ball.id() == id)
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn goal(&self, side: Side) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.side() == side)
    }

    pub fn robot(&self, side: Side) -> Option<&Robot> {
        self.robots.iter().find(|robot| robot.side() == side)
    }

    pub fn robot_mut(&mut self, side: Side) -> Option<&mut Robot> {
        self.robots.iter_mut().find(|robot| robot.side() == side)
    }

    /// Hands a robot over to an onboard pilot, replacing any previous one.
    pub fn set_pilot(&mut self, side: Side, pilot: Box<dyn Pilot>) {
        log::info!("{} robot is now driven by {}", side, pilot.name());
        self.pilots.insert(side, pilot);
    }

    pub fn clear_pilot(&mut self, side: Side) -> Option<Box<dyn Pilot>> {
        self.pilots.remove(&side)
    }

    pub fn pilot_debug(&self, side: Side) -> Option<PilotDebug> {
        self.pilots.get(&side).and_then(|pilot| pilot.debug_state())
    }

    /// Applies an impulse to the center of a ball.
    pub fn apply_impulse_to_ball(&mut self, id: BallId, impulse: Vector2) {
        let Some((body, position)) = self
            .ball(id)
            .and_then(|ball| Some((ball.body(), ball.position(&self.physics)?)))
        else {
            log::warn!("No ball #{} to push", id);
            return;
        };
        self.physics.apply_impulse_at_point(body, impulse, position);
    }

    /// Captures the current state for readers outside the simulation loop.
    pub fn snapshot(&self) -> MatchSnapshot {
        let balls = self
            .balls
            .iter()
            .filter_map(|ball| {
                Some(BallSnapshot {
                    id: ball.id(),
                    position: ball.position(&self.physics)?,
                    velocity: ball.velocity(&self.physics)?,
                    active: ball.is_active(),
                })
            })
            .collect();
        let robots = self
            .robots
            .iter()
            .filter_map(|robot| {
                let pose = robot.pose(&self.physics)?;
                Some(RobotSnapshot {
                    side: robot.side(),
                    position: pose.translation.vector,
                    angle: pose.rotation.angle(),
                    actuation: robot.actuation(),
                    wheel_powers: robot.wheel_powers(),
                    has_ball: robot.has_ball(),
                    kicks: robot.kicks(),
                    vision: robot.vision(),
                    pilot: self.pilot_debug(robot.side()),
                })
            })
            .collect();

        MatchSnapshot {
            elapsed: self.elapsed,
            yellow_score: self.score(Side::Yellow),
            blue_score: self.score(Side::Blue),
            balls,
            robots,
            ..MatchSnapshot::default()
        }
    }
}

fn apply_contact(balls: &mut [Ball], goals: &mut [Goal], contact: ContactEvent) {
    match resolve_contact(contact.first, contact.second, contact.started) {
        Some(ContactEffect::BallEnteredGoal { ball, goal }) => {
            let active = balls
                .iter()
                .any(|b| b.id() == ball && b.is_active());
            if !active {
                return;
            }
            if let Some(goal) = goals.iter_mut().find(|g| g.side() == goal) {
                log::info!("Ball #{} entered {} goal", ball, goal.side());
                goal.record_ball();
            }
        }
        Some(ContactEffect::BallLeftGoal { ball, .. }) => {
            if let Some(ball) = balls.iter_mut().find(|b| b.id() == ball) {
                if ball.deactivate() {
                    log::debug!("Ball #{} deactivated", ball.id());
                }
            }
        }
        None => {}
    }
}

/// Builds a [`Match`] piece by piece.
pub struct MatchBuilder {
    sim: Match,
    rng: StdRng,
}

impl MatchBuilder {
    /// Starts a match with the field walls and both goals in place.
    pub fn new(config: &MatchConfig) -> Self {
        let mut physics = PhysicsWorld::new(config.velocity_iterations, config.position_iterations);
        let goals = build_field(&mut physics, &config.field);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        MatchBuilder {
            sim: Match {
                physics,
                field: config.field.clone(),
                dt: config.dt(),
                balls: Vec::new(),
                goals,
                robots: Vec::new(),
                pilots: HashMap::new(),
                elapsed: 0.0,
            },
            rng,
        }
    }

    pub fn add_ball(mut self, position: Vector2) -> Self {
        let sim = &mut self.sim;
        let id = sim.balls.len() as BallId;
        sim.balls.push(Ball::spawn(&mut sim.physics, id, position));
        self
    }

    /// Places `count` balls in mirrored pairs, so both halves of the field look the
    /// same. An odd ball out goes to the center.
    pub fn scatter_balls(mut self, count: usize, margin: f64) -> Self {
        let width = self.sim.field.width;
        let height = self.sim.field.height;

        for _ in 0..count / 2 {
            let x = sample(&mut self.rng, margin, width / 2.0 - margin);
            let y = sample(&mut self.rng, margin, height - margin * 2.0);
            self = self
                .add_ball(Vector2::new(x, y))
                .add_ball(Vector2::new(width - x, height - y));
        }
        if count % 2 != 0 {
            self = self.add_ball(Vector2::new(width / 2.0, height / 2.0));
        }
        self
    }

    /// Adds a robot at its side's starting corner, facing into the field.
    pub fn add_robot(self, side: Side, model: RobotModel) -> Result<Self> {
        let radius = model.spec().radius;
        let field = &self.sim.field;
        let (position, angle) = match side {
            Side::Yellow => (Vector2::new(radius, radius), 90f64.to_radians()),
            Side::Blue => (
                Vector2::new(field.width - radius, field.height - radius),
                (-90f64).to_radians(),
            ),
        };
        self.add_robot_at(side, model, position, angle)
    }

    pub fn add_robot_at(
        mut self,
        side: Side,
        model: RobotModel,
        position: Vector2,
        angle: f64,
    ) -> Result<Self> {
        let sim = &mut self.sim;
        sim.robots.retain(|robot| robot.side() != side);
        sim.robots
            .push(Robot::spawn(&mut sim.physics, side, model, position, angle)?);
        Ok(self)
    }

    pub fn with_pilot(mut self, side: Side, pilot: Box<dyn Pilot>) -> Self {
        self.sim.set_pilot(side, pilot);
        self
    }

    pub fn build(self) -> Match {
        self.sim
    }
}

fn sample(rng: &mut StdRng, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Adds the boundary walls and the goal pockets. Returns the goals, blue on the left
/// and yellow on the right.
fn build_field(physics: &mut PhysicsWorld, field: &FieldConfig) -> Vec<Goal> {
    let FieldConfig {
        width,
        height,
        goal_width,
        goal_depth,
        wall_depth,
        ..
    } = *field;
    let goal_side_width = height / 2.0 - goal_width / 2.0;
    let pocket_y = goal_width / 2.0 + wall_depth / 2.0;

    let walls = [
        // left, split by the goal mouth
        (-wall_depth / 2.0, goal_side_width / 2.0, goal_side_width, 0.0),
        (-wall_depth / 2.0, height - goal_side_width / 2.0, goal_side_width, 0.0),
        // left goal pocket
        (-goal_depth / 2.0 - wall_depth / 2.0, height / 2.0 - pocket_y, goal_depth - wall_depth, 90.0),
        (-goal_depth / 2.0 - wall_depth / 2.0, height / 2.0 + pocket_y, goal_depth - wall_depth, 90.0),
        // right goal pocket
        (width + goal_depth / 2.0 + wall_depth / 2.0, height / 2.0 - pocket_y, goal_depth - wall_depth, 90.0),
        (width + goal_depth / 2.0 + wall_depth / 2.0, height / 2.0 + pocket_y, goal_depth - wall_depth, 90.0),
        // right, split by the goal mouth
        (width + wall_depth / 2.0, goal_side_width / 2.0, goal_side_width, 0.0),
        (width + wall_depth / 2.0, height - goal_side_width / 2.0, goal_side_width, 0.0),
        // top and bottom
        (width / 2.0, height + wall_depth / 2.0, width, 90.0),
        (width / 2.0, -wall_depth / 2.0, width, 90.0),
    ];
    for (x, y, length, angle) in walls {
        add_wall(physics, field, Vector2::new(x, y), length, angle);
    }

    vec![
        Goal::spawn(
            physics,
            Side::Blue,
            Vector2::new(-goal_depth / 2.0 - wall_depth, height / 2.0),
            goal_width,
            goal_depth,
        ),
        Goal::spawn(
            physics,
            Side::Yellow,
            Vector2::new(width + goal_depth / 2.0 + wall_depth, height / 2.0),
            goal_width,
            goal_depth,
        ),
    ]
}

/// A wall is a `wall_depth` thick box of the given length, vertical at angle 0.
fn add_wall(physics: &mut PhysicsWorld, field: &FieldConfig, center: Vector2, length: f64, angle: f64) {
    let body = RigidBodyBuilder::fixed()
        .translation(center)
        .rotation(angle.to_radians());
    let collider = ColliderBuilder::cuboid(field.wall_depth / 2.0, length / 2.0)
        .restitution(field.wall_restitution)
        .friction(field.wall_friction)
        .user_data(EntityTag::Wall.to_user_data());
    physics.insert(body, collider);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use robotex_core::Actuation;

    fn config() -> MatchConfig {
        MatchConfig {
            seed: Some(7),
            ..MatchConfig::default()
        }
    }

    #[test]
    fn test_scatter_balls_mirrors_pairs() {
        let config = config();
        let sim = MatchBuilder::new(&config)
            .scatter_balls(11, config.ball_margin)
            .build();
        let field = sim.field();

        assert_eq!(sim.balls().len(), 11);
        for (i, ball) in sim.balls().iter().enumerate() {
            assert_eq!(ball.id(), i as BallId);
            assert!(ball.is_active());
        }
        for pair in sim.balls()[..10].chunks(2) {
            let a = pair[0].position(sim.physics()).unwrap();
            let b = pair[1].position(sim.physics()).unwrap();
            assert_relative_eq!(a.x + b.x, field.width, epsilon = 1e-9);
            assert_relative_eq!(a.y + b.y, field.height, epsilon = 1e-9);
            assert!(a.x >= config.ball_margin && a.x <= field.width / 2.0 - config.ball_margin);
        }
        let center = sim.balls()[10].position(sim.physics()).unwrap();
        assert_relative_eq!(center.x, field.width / 2.0);
        assert_relative_eq!(center.y, field.height / 2.0);
    }

    #[test]
    fn test_seed_makes_placement_reproducible() {
        let config = config();
        let positions = |sim: &Match| -> Vec<Vector2> {
            sim.balls()
                .iter()
                .filter_map(|b| b.position(sim.physics()))
                .collect()
        };
        let a = MatchBuilder::new(&config).scatter_balls(6, 0.2).build();
        let b = MatchBuilder::new(&config).scatter_balls(6, 0.2).build();
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn test_robots_spawn_in_opposite_corners() {
        let sim = Match::from_config(&config()).unwrap();
        let yellow = sim.robot(Side::Yellow).unwrap();
        let blue = sim.robot(Side::Blue).unwrap();
        let yellow_pose = yellow.pose(sim.physics()).unwrap();
        let blue_pose = blue.pose(sim.physics()).unwrap();

        assert_relative_eq!(yellow_pose.translation.vector.x, 0.175, epsilon = 1e-9);
        assert_relative_eq!(blue_pose.translation.vector.x, 4.5 - 0.13, epsilon = 1e-9);
        // both face into the field
        let yellow_forward = yellow_pose.rotation * Vector2::new(0.0, -1.0);
        let blue_forward = blue_pose.rotation * Vector2::new(0.0, -1.0);
        assert_relative_eq!(yellow_forward.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(blue_forward.x, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_from_config_rejects_zero_tick_rate() {
        let config = MatchConfig {
            tick_rate: 0.0,
            ..config()
        };
        assert!(Match::from_config(&config).is_err());
    }

    #[test]
    fn test_tick_advances_elapsed() {
        let mut sim = Match::from_config(&config()).unwrap();
        for _ in 0..60 {
            sim.tick();
        }
        assert_relative_eq!(sim.elapsed(), 1.0, epsilon = 1e-9);
        assert_eq!(sim.score(Side::Yellow), 0);
        assert_eq!(sim.score(Side::Blue), 0);
    }

    #[test]
    fn test_ball_scores_once_and_is_deactivated() {
        let config = config();
        let field = config.field.clone();
        let mut sim = MatchBuilder::new(&config)
            .add_ball(Vector2::new(field.width - 0.1, field.height / 2.0))
            .build();

        // into the yellow goal on the right
        sim.apply_impulse_to_ball(0, Vector2::new(0.046 * 3.0, 0.0));
        for _ in 0..90 {
            sim.tick();
        }
        assert_eq!(sim.goal(Side::Yellow).unwrap().ball_count(), 1);
        assert_eq!(sim.score(Side::Blue), 1);
        assert_eq!(sim.score(Side::Yellow), 0);
        assert!(!sim.ball(0).unwrap().is_active());

        // back through the pocket; an inactive ball does not count again
        sim.apply_impulse_to_ball(0, Vector2::new(-0.3, 0.0));
        for _ in 0..120 {
            sim.tick();
        }
        assert_eq!(sim.score(Side::Blue), 1);
        assert!(!sim.ball(0).unwrap().is_active());
    }

    #[test]
    fn test_robot_dribbles_and_kicks_center_ball() {
        let config = config();
        let field = config.field.clone();
        let center = Vector2::new(field.width / 2.0, field.height / 2.0);
        let mut sim = MatchBuilder::new(&config)
            .add_ball(center)
            .add_robot_at(
                Side::Blue,
                RobotModel::Ramses,
                center + Vector2::new(0.5, 0.0),
                (-90f64).to_radians(),
            )
            .unwrap()
            .build();

        sim.robot_mut(Side::Blue).unwrap().set_actuation(Actuation {
            heading: 0.0,
            power: 1.0,
            yaw_rate: 0.0,
            kick: false,
        });
        let mut ticks = 0;
        while !sim.robot(Side::Blue).unwrap().has_ball() {
            assert!(ticks < 300, "robot never reached the ball");
            sim.tick();
            ticks += 1;
        }

        let robot = sim.robot_mut(Side::Blue).unwrap();
        robot.set_actuation(Actuation::stopped());
        for _ in 0..60 {
            let robot = sim.robot_mut(Side::Blue).unwrap();
            if robot.kicks() > 0 {
                break;
            }
            if robot.has_ball() {
                robot.kick();
            }
            sim.tick();
        }

        assert_eq!(sim.robot(Side::Blue).unwrap().kicks(), 1);
        let velocity = sim.ball(0).unwrap().velocity(sim.physics()).unwrap();
        assert!(velocity.norm() > 0.0);
        // kicked toward the blue robot's front, which faces -x
        assert!(velocity.x < 0.0);
    }

    #[test]
    fn test_autonomous_pilot_shoots_held_ball_at_goal() {
        use robotex_controller::{AutonomousPilot, ControllerParams};

        let config = config();
        let field = config.field.clone();
        let center = Vector2::new(field.width / 2.0, field.height / 2.0);
        // facing +x, toward the yellow goal blue attacks
        let mut sim = MatchBuilder::new(&config)
            .add_ball(center)
            .add_robot_at(
                Side::Blue,
                RobotModel::Ramses,
                center - Vector2::new(0.5, 0.0),
                90f64.to_radians(),
            )
            .unwrap()
            .build();

        sim.robot_mut(Side::Blue).unwrap().set_actuation(Actuation {
            heading: 0.0,
            power: 1.0,
            yaw_rate: 0.0,
            kick: false,
        });
        let mut ticks = 0;
        while !sim.robot(Side::Blue).unwrap().has_ball() {
            assert!(ticks < 300, "robot never reached the ball");
            sim.tick();
            ticks += 1;
        }

        let params = ControllerParams {
            brake_time: 0.0,
            ..ControllerParams::default()
        };
        sim.set_pilot(Side::Blue, Box::new(AutonomousPilot::with_params(params)));
        sim.tick();
        assert_eq!(sim.pilot_debug(Side::Blue).unwrap().state, "SEARCH_GOAL");

        for _ in 0..600 {
            if sim.robot(Side::Blue).unwrap().kicks() > 0 {
                break;
            }
            sim.tick();
        }

        assert!(sim.robot(Side::Blue).unwrap().kicks() >= 1);
        let velocity = sim.ball(0).unwrap().velocity(sim.physics()).unwrap();
        assert!(velocity.x > 0.0);
    }

    #[test]
    fn test_snapshot_reflects_match() {
        let mut sim = Match::from_config(&config()).unwrap();
        sim.tick();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.balls.len(), 11);
        assert_eq!(snapshot.robots.len(), 2);
        assert!(snapshot.robot(Side::Yellow).is_some());
        assert_relative_eq!(snapshot.elapsed, sim.elapsed());
        assert_eq!(snapshot.score(Side::Blue), 0);
    }
}
