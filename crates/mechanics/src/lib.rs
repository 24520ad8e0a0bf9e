//! Kinematic model of the differential-drive robot.

pub mod robot;

pub use robot::DiffDriveRobot;
