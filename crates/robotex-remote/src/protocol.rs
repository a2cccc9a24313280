use std::fmt::Write;

use robotex_core::VisionSnapshot;
use thiserror::Error;

use crate::RobotLink;

const OK: &str = "OK";
pub(crate) const ERROR: &str = "ERROR";
const MAX_WHEEL_POWER: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Left and right wheel power in percent
    Wheels { left: i32, right: i32 },
    Cam,
    Goal,
    Kick,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command {0:?}")]
    Unknown(String),
    #[error("Missing argument")]
    MissingArgument,
    #[error("Unexpected argument {0:?}")]
    UnexpectedArgument(String),
    #[error("Invalid number {0:?}")]
    InvalidNumber(String),
    #[error("Wheel power {0} outside [-100, 100]")]
    OutOfRange(i32),
}

/// Parses one protocol line. Tokens are separated by any whitespace and command
/// names are case sensitive.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next().ok_or(CommandError::Empty)?;

    let command = match name {
        "WHEELS" => {
            let left = wheel_power(tokens.next())?;
            let right = wheel_power(tokens.next())?;
            Command::Wheels { left, right }
        }
        "CAM" => Command::Cam,
        "GOAL" => Command::Goal,
        "KICK" => Command::Kick,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };

    match tokens.next() {
        Some(extra) => Err(CommandError::UnexpectedArgument(extra.to_owned())),
        None => Ok(command),
    }
}

fn wheel_power(token: Option<&str>) -> Result<i32, CommandError> {
    let token = token.ok_or(CommandError::MissingArgument)?;
    let power = token
        .parse::<i32>()
        .map_err(|_| CommandError::InvalidNumber(token.to_owned()))?;
    if !(-MAX_WHEEL_POWER..=MAX_WHEEL_POWER).contains(&power) {
        return Err(CommandError::OutOfRange(power));
    }
    Ok(power)
}

/// `forward left` for every visible ball, then `0 0`.
pub fn format_balls(vision: &VisionSnapshot) -> String {
    let mut reply = String::new();
    for ball in &vision.balls {
        let (forward, left) = ball.forward_left();
        let _ = write!(reply, "{} {} ", forward, left);
    }
    reply.push_str("0 0");
    reply
}

/// `SIDE forward left` for every visible goal, then `0 0 0`.
pub fn format_goals(vision: &VisionSnapshot) -> String {
    let mut reply = String::new();
    for goal in &vision.goals {
        let (forward, left) = goal.forward_left();
        let _ = write!(reply, "{} {} {} ", goal.side, forward, left);
    }
    reply.push_str("0 0 0");
    reply
}

/// Runs one protocol line against `link` and returns the reply, without the line
/// terminator.
pub fn execute(link: &impl RobotLink, line: &str) -> String {
    match parse_command(line) {
        Ok(Command::Wheels { left, right }) => {
            let scale = MAX_WHEEL_POWER as f64;
            link.set_wheels(left as f64 / scale, right as f64 / scale);
            OK.to_owned()
        }
        Ok(Command::Cam) => format_balls(&link.vision()),
        Ok(Command::Goal) => format_goals(&link.vision()),
        Ok(Command::Kick) => {
            link.kick();
            OK.to_owned()
        }
        Err(err) => {
            log::warn!("Rejected remote command {:?}: {}", line, err);
            ERROR.to_owned()
        }
    }
}
