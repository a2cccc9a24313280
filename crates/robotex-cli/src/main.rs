use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use robotex_core::Side;
use robotex_simulator::{MatchConfig, PilotKind};
use tokio::sync::broadcast;

mod logging;
mod session;

#[derive(Debug, Parser)]
#[command(name = "robotex")]
pub(crate) struct Args {
    /// JSON match config, defaults are used when omitted
    #[clap(long)]
    config: Option<PathBuf>,

    /// Time acceleration in percent, 0 pauses
    #[clap(long)]
    timewarp: Option<f64>,

    #[clap(long)]
    balls: Option<usize>,

    #[clap(long)]
    seed: Option<u64>,

    #[clap(long, default_value = "5001")]
    remote_port: u16,

    /// Robot driven over the remote-control port
    #[clap(long, default_value = "blue")]
    remote_side: Side,

    #[clap(long, default_value = "info")]
    log_level: String,

    /// Also write JSON logs to this file
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// The config file, if any, with command line overrides applied.
    fn match_config(&self) -> Result<MatchConfig> {
        let mut config = match &self.config {
            Some(path) => MatchConfig::load(path)?,
            None => MatchConfig::default(),
        };

        if let Some(timewarp) = self.timewarp {
            config.timewarp = timewarp;
        }
        if let Some(balls) = self.balls {
            config.ball_count = balls;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.robot_mut(self.remote_side).pilot = PilotKind::Remote;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = logging::setup(&args.log_level, args.log_file.as_deref())?;

    let config = args.match_config()?;
    let (stop_tx, _) = broadcast::channel(1);
    let session = session::start(&args, &config, &stop_tx).await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down");
    // every task may already be gone
    let _ = stop_tx.send(());
    session.join().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let args = Args::parse_from([
            "robotex",
            "--timewarp",
            "250",
            "--balls",
            "3",
            "--seed",
            "7",
            "--remote-side",
            "yellow",
        ]);
        let config = args.match_config().unwrap();

        assert_eq!(config.timewarp, 250.0);
        assert_eq!(config.ball_count, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.yellow.pilot, PilotKind::Remote);
        assert_eq!(args.remote_port, 5001);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["robotex"]);
        let config = args.match_config().unwrap();
        assert_eq!(args.remote_side, Side::Blue);
        assert_eq!(config.blue.pilot, PilotKind::Remote);
        assert_eq!(config.yellow.pilot, PilotKind::Autonomous);
        assert_eq!(config.ball_count, 11);
    }
}
