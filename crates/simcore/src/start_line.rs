use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::Pose;

/// Start/finish segment in world meters.
///
/// The segment itself is undirected; the lap detector stores the crossing
/// direction separately, captured from the robot's heading when armed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartLine {
    pub x1_m: f64,
    pub y1_m: f64,
    pub x2_m: f64,
    pub y2_m: f64,
}

impl StartLine {
    pub fn new(x1_m: f64, y1_m: f64, x2_m: f64, y2_m: f64) -> Self {
        StartLine { x1_m, y1_m, x2_m, y2_m }
    }

    /// Segment of `length_m` centered on the pose position, perpendicular to
    /// the pose heading — a finish line laid across the direction of travel.
    pub fn across_pose(pose: &Pose, length_m: f64) -> Self {
        let perp = pose.angle_rad + std::f64::consts::FRAC_PI_2;
        let half = length_m / 2.0;
        let dx = perp.cos() * half;
        let dy = perp.sin() * half;
        StartLine {
            x1_m: pose.x_m - dx,
            y1_m: pose.y_m - dy,
            x2_m: pose.x_m + dx,
            y2_m: pose.y_m + dy,
        }
    }

    pub fn endpoints(&self) -> (Point2<f64>, Point2<f64>) {
        (Point2::new(self.x1_m, self.y1_m), Point2::new(self.x2_m, self.y2_m))
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new((self.x1_m + self.x2_m) / 2.0, (self.y1_m + self.y2_m) / 2.0)
    }

    pub fn length_m(&self) -> f64 {
        (Vector2::new(self.x2_m - self.x1_m, self.y2_m - self.y1_m)).norm()
    }

    /// Unit vector from endpoint 1 to endpoint 2, or zero for a degenerate
    /// segment.
    pub fn direction(&self) -> Vector2<f64> {
        let d = Vector2::new(self.x2_m - self.x1_m, self.y2_m - self.y1_m);
        let n = d.norm();
        if n > 0.0 { d / n } else { Vector2::zeros() }
    }

    /// Heading perpendicular to the segment (the direction a lap is run in,
    /// up to sign).
    pub fn perpendicular_angle_rad(&self) -> f64 {
        (self.y2_m - self.y1_m).atan2(self.x2_m - self.x1_m) + std::f64::consts::FRAC_PI_2
    }
}
