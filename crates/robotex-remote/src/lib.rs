//! Line-oriented remote control of one robot over TCP.
//!
//! Each line is one command, each command gets exactly one reply line:
//!
//! | Command            | Reply                                         |
//! |--------------------|-----------------------------------------------|
//! | `WHEELS <l> <r>`   | `OK`, or `ERROR` if `l` or `r` is outside [-100, 100] |
//! | `CAM`              | `forward left` per visible ball, then `0 0`    |
//! | `GOAL`             | `SIDE forward left` per visible goal, then `0 0 0` |
//! | `KICK`             | `OK`                                          |
//!
//! Anything else is answered with `ERROR` and the session continues.

mod link;
mod protocol;
mod server;

pub use link::RobotLink;
pub use protocol::{execute, format_balls, format_goals, parse_command, Command, CommandError};
pub use server::RemoteServer;
