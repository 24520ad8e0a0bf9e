//! Example control code for the simulated robot.
//!
//! On real hardware this logic is what learners write and flash; here it is
//! the reference implementation the viewer runs when keyboard override is
//! off: a PID steering loop over the sensor bar, emitting left/right PWM.

pub mod line_follower;
pub mod pid;

pub use line_follower::{LineFollower, LineFollowerConfig};
pub use pid::{PidConfig, PidController};
