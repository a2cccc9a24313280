use std::net::SocketAddr;

use anyhow::{Context, Result};
use robotex_controller::AutonomousPilot;
use robotex_core::Side;
use robotex_remote::RemoteServer;
use robotex_simulator::{Match, MatchConfig, MatchRunner, PilotKind};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::Args;

/// The running match and the remote-control server.
pub struct Session {
    runner: JoinHandle<Result<Match>>,
    remote: JoinHandle<Result<()>>,
}

/// Builds the match, attaches pilots and starts the background tasks. Fails if the
/// remote-control port cannot be bound.
pub async fn start(
    args: &Args,
    config: &MatchConfig,
    stop_tx: &broadcast::Sender<()>,
) -> Result<Session> {
    let mut sim = Match::from_config(config)?;
    for side in Side::ALL {
        match config.robot(side).pilot {
            PilotKind::Autonomous => sim.set_pilot(side, Box::new(AutonomousPilot::new())),
            PilotKind::Remote if side != args.remote_side => {
                log::warn!(
                    "Only the {} robot is served remotely, {} robot stays idle",
                    args.remote_side,
                    side
                );
            }
            PilotKind::Remote | PilotKind::Idle => {}
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], args.remote_port));
    let server = RemoteServer::bind(addr).await?;

    let runner = MatchRunner::new(sim, config.timewarp);
    let handle = runner.handle();
    let runner = tokio::spawn(runner.run_real_time(stop_tx.subscribe()));
    let remote = tokio::spawn(server.serve(handle.robot(args.remote_side), stop_tx.subscribe()));

    Ok(Session { runner, remote })
}

impl Session {
    /// Waits for both tasks to stop.
    pub async fn join(self) -> Result<()> {
        let sim = self.runner.await.context("Match task panicked")??;
        tracing::info!(
            "Final score after {:.1}s: yellow {} - {} blue",
            sim.elapsed(),
            sim.score(Side::Yellow),
            sim.score(Side::Blue)
        );
        self.remote.await.context("Remote control task panicked")??;
        Ok(())
    }
}
