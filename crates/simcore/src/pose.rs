use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// World-frame position and heading of the robot's reference point.
///
/// Owned and mutated by the kinematic model; the engine reads it, and writes
/// it directly only during start-of-run placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x_m: f64,
    pub y_m: f64,
    pub angle_rad: f64,
}

impl Pose {
    pub fn new(x_m: f64, y_m: f64, angle_rad: f64) -> Self {
        Pose { x_m, y_m, angle_rad }
    }

    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x_m, self.y_m)
    }

    /// Unit vector along the heading.
    pub fn heading(&self) -> Vector2<f64> {
        Vector2::new(self.angle_rad.cos(), self.angle_rad.sin())
    }

    /// The pose translated by `distance_m` along its own heading.
    /// Negative distances move backwards.
    pub fn advanced(&self, distance_m: f64) -> Self {
        Pose {
            x_m: self.x_m + distance_m * self.angle_rad.cos(),
            y_m: self.y_m + distance_m * self.angle_rad.sin(),
            angle_rad: self.angle_rad,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose { x_m: 0.0, y_m: 0.0, angle_rad: 0.0 }
    }
}
