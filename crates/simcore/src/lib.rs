//! Shared data model for the line-follower simulation.
//!
//! Everything here is plain state passed between the engine and its
//! collaborators (kinematic model, track map, lap detector). The crates that
//! own behavior re-export what they consume from this one.

mod geometry;
mod pose;
mod sensors;
mod start_line;

pub use geometry::RobotGeometry;
pub use pose::Pose;
pub use sensors::{SensorMap, SensorReading, sensor_id};
pub use start_line::StartLine;

/// Process-wide conversion between world meters and track-image pixels.
///
/// All stored quantities are metric; pixel space exists only at the drawing
/// and track-raster boundary.
pub const PIXELS_PER_METER: f64 = 1000.0;

/// Meters to track-image pixels.
#[inline]
pub fn m_to_px(m: f64) -> f64 {
    m * PIXELS_PER_METER
}

/// Track-image pixels to meters.
#[inline]
pub fn px_to_m(px: f64) -> f64 {
    px / PIXELS_PER_METER
}
