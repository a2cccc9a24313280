use std::{sync::Arc, time::Duration};

use anyhow::Result;
use robotex_core::{Actuation, MatchSnapshot, RobotSnapshot, Side, VisionSnapshot};
use tokio::sync::{broadcast, mpsc, watch};

use crate::{
    simulation::Match,
    utils::{FpsCounter, IntervalTrigger},
};

/// Upper bound of the time acceleration, in percent.
pub const MAX_TIMEWARP: f64 = 1000.0;
/// How long the loop sleeps between checks while paused.
const PAUSED_POLL: Duration = Duration::from_millis(100);
/// Simulated seconds between two score log lines.
const SCORE_LOG_INTERVAL: f64 = 30.0;

/// Requests from outside the simulation loop. They are applied before the next tick,
/// in the order they were sent.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMsg {
    /// Direct left/right wheel powers in [-1, 1]
    SetWheels { side: Side, left: f64, right: f64 },
    SetActuation { side: Side, actuation: Actuation },
    Kick { side: Side },
    /// Time acceleration in percent, clamped to [0, 1000]
    SetTimewarp(f64),
    Stop,
}

/// Runs a [`Match`] in real time (scaled by the timewarp) and publishes a
/// [`MatchSnapshot`] after every tick.
pub struct MatchRunner {
    sim: Match,
    timewarp: f64,
    fps: FpsCounter,
    score_log: IntervalTrigger,
    control_tx: mpsc::UnboundedSender<ControlMsg>,
    control_rx: mpsc::UnboundedReceiver<ControlMsg>,
    snapshot_tx: watch::Sender<MatchSnapshot>,
}

impl MatchRunner {
    pub fn new(sim: Match, timewarp: f64) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let target_fps = (1.0 / sim.dt()).round() as u32;
        let timewarp = clamp_timewarp(timewarp);
        let snapshot = MatchSnapshot {
            timewarp,
            ..sim.snapshot()
        };
        let (snapshot_tx, _) = watch::channel(snapshot);

        MatchRunner {
            sim,
            timewarp,
            fps: FpsCounter::new(100, target_fps),
            score_log: IntervalTrigger::new(SCORE_LOG_INTERVAL),
            control_tx,
            control_rx,
            snapshot_tx,
        }
    }

    pub fn handle(&self) -> MatchHandle {
        MatchHandle {
            control_tx: self.control_tx.clone(),
            snapshot_rx: self.snapshot_tx.subscribe(),
        }
    }

    /// Steps the match until a [`ControlMsg::Stop`] arrives or `stop_rx` fires.
    /// Returns the match so its final state can be inspected.
    pub async fn run_real_time(mut self, mut stop_rx: broadcast::Receiver<()>) -> Result<Match> {
        log::info!("Match started at {}% speed", self.timewarp);

        'outer: loop {
            while let Ok(msg) = self.control_rx.try_recv() {
                match msg {
                    ControlMsg::Stop => break 'outer,
                    msg => self.handle_control_msg(msg),
                }
            }

            let delay = if self.timewarp == 0.0 {
                PAUSED_POLL
            } else {
                self.fps.register_frame();
                self.sim.tick();
                if self.score_log.trigger(self.sim.elapsed()) {
                    self.log_score();
                }
                Duration::try_from_secs_f64(self.sim.dt() / (self.timewarp / 100.0))
                    .unwrap_or(PAUSED_POLL)
            };
            self.publish();

            tokio::select! {
                _ = stop_rx.recv() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        log::info!("Match stopped after {:.1}s", self.sim.elapsed());
        self.log_score();
        Ok(self.sim)
    }

    fn handle_control_msg(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::SetWheels { side, left, right } => {
                if let Some(robot) = self.sim.robot_mut(side) {
                    robot.set_wheels(left, right);
                }
            }
            ControlMsg::SetActuation { side, actuation } => {
                if let Some(robot) = self.sim.robot_mut(side) {
                    robot.set_actuation(actuation);
                }
            }
            ControlMsg::Kick { side } => {
                if let Some(robot) = self.sim.robot_mut(side) {
                    robot.kick();
                }
            }
            ControlMsg::SetTimewarp(timewarp) => {
                self.timewarp = clamp_timewarp(timewarp);
                self.fps.reset();
                log::info!("Timewarp set to {}%", self.timewarp);
            }
            ControlMsg::Stop => {}
        }
    }

    fn publish(&self) {
        let snapshot = MatchSnapshot {
            timewarp: self.timewarp,
            fps: self.reported_fps(),
            ..self.sim.snapshot()
        };
        // no receivers is fine, the snapshot is just dropped
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Ticks per simulated second, or 0 while paused.
    fn reported_fps(&self) -> u32 {
        if self.timewarp == 0.0 {
            return 0;
        }
        (self.fps.fps() as f64 / (self.timewarp / 100.0)) as u32
    }

    fn log_score(&self) {
        log::info!(
            "Score at {:.0}s: yellow {} - {} blue",
            self.sim.elapsed(),
            self.sim.score(Side::Yellow),
            self.sim.score(Side::Blue)
        );
    }
}

fn clamp_timewarp(timewarp: f64) -> f64 {
    if timewarp.is_nan() {
        0.0
    } else {
        timewarp.clamp(0.0, MAX_TIMEWARP)
    }
}

/// Cloneable access to a running match.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    pub control_tx: mpsc::UnboundedSender<ControlMsg>,
    pub snapshot_rx: watch::Receiver<MatchSnapshot>,
}

impl MatchHandle {
    pub fn send(&self, msg: ControlMsg) {
        self.control_tx
            .send(msg)
            .map_err(|err| {
                log::error!("Error sending control message: {:?}", err);
            })
            .ok();
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> MatchSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn set_timewarp(&self, timewarp: f64) {
        self.send(ControlMsg::SetTimewarp(timewarp));
    }

    pub fn stop(&self) {
        self.send(ControlMsg::Stop);
    }

    pub fn robot(&self, side: Side) -> RobotHandle {
        RobotHandle {
            side,
            match_handle: self.clone(),
        }
    }
}

/// Actuation and sensor access to one robot of a running match.
#[derive(Debug, Clone)]
pub struct RobotHandle {
    side: Side,
    match_handle: MatchHandle,
}

impl RobotHandle {
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn set_wheels(&self, left: f64, right: f64) {
        self.match_handle.send(ControlMsg::SetWheels {
            side: self.side,
            left,
            right,
        });
    }

    pub fn set_actuation(&self, actuation: Actuation) {
        self.match_handle.send(ControlMsg::SetActuation {
            side: self.side,
            actuation,
        });
    }

    pub fn kick(&self) {
        self.match_handle.send(ControlMsg::Kick { side: self.side });
    }

    /// Camera readings of the last published tick.
    pub fn vision(&self) -> Arc<VisionSnapshot> {
        self.with_snapshot(|robot| Arc::clone(&robot.vision))
            .unwrap_or_default()
    }

    pub fn has_ball(&self) -> bool {
        self.with_snapshot(|robot| robot.has_ball).unwrap_or(false)
    }

    fn with_snapshot<T>(&self, f: impl FnOnce(&RobotSnapshot) -> T) -> Option<T> {
        self.match_handle
            .snapshot_rx
            .borrow()
            .robot(self.side)
            .map(f)
    }
}
