use serde::{Deserialize, Serialize};

/// Fallback body length when a geometry carries an unusable value (meters).
pub const DEFAULT_LENGTH_M: f64 = 0.15;
/// Fallback wheelbase when a geometry carries an unusable value (meters).
pub const DEFAULT_WHEELBASE_M: f64 = 0.10;

/// Physical dimensions of the robot and its sensor bar.
///
/// `length_m` and `wheelbase_m` are load-bearing for the simulation (lap
/// detection, bounds margin, kinematics); the sensor fields describe the row
/// of line sensors at the front of the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotGeometry {
    /// Chassis length along the heading (m).
    pub length_m: f64,
    /// Distance between the two wheel contact points (m).
    pub wheelbase_m: f64,
    /// How far the sensor row sits ahead of the reference point (m).
    pub sensor_forward_offset_m: f64,
    /// Total lateral span of the sensor row (m).
    pub sensor_side_spread_m: f64,
    /// Diameter of one sensor window (m), used for drawing.
    pub sensor_diameter_m: f64,
    /// Number of sensors in the row.
    pub sensor_count: usize,
}

impl Default for RobotGeometry {
    fn default() -> Self {
        RobotGeometry {
            length_m: DEFAULT_LENGTH_M,
            wheelbase_m: DEFAULT_WHEELBASE_M,
            sensor_forward_offset_m: 0.07,
            sensor_side_spread_m: 0.08,
            sensor_diameter_m: 0.008,
            sensor_count: 5,
        }
    }
}

impl RobotGeometry {
    /// Replaces unusable chassis dimensions with the documented defaults.
    ///
    /// Non-finite or non-positive length/wheelbase are defaulted rather than
    /// rejected; sensor counts of zero keep an empty sensor row.
    pub fn sanitized(mut self) -> Self {
        if !self.length_m.is_finite() || self.length_m <= 0.0 {
            self.length_m = DEFAULT_LENGTH_M;
        }
        if !self.wheelbase_m.is_finite() || self.wheelbase_m <= 0.0 {
            self.wheelbase_m = DEFAULT_WHEELBASE_M;
        }
        if !self.sensor_forward_offset_m.is_finite() {
            self.sensor_forward_offset_m = Self::default().sensor_forward_offset_m;
        }
        if !self.sensor_side_spread_m.is_finite() || self.sensor_side_spread_m < 0.0 {
            self.sensor_side_spread_m = Self::default().sensor_side_spread_m;
        }
        if !self.sensor_diameter_m.is_finite() || self.sensor_diameter_m <= 0.0 {
            self.sensor_diameter_m = Self::default().sensor_diameter_m;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_defaults_bad_dimensions() {
        let g = RobotGeometry {
            length_m: f64::NAN,
            wheelbase_m: 0.0,
            ..Default::default()
        }
        .sanitized();
        assert!((g.length_m - DEFAULT_LENGTH_M).abs() < 1e-12);
        assert!((g.wheelbase_m - DEFAULT_WHEELBASE_M).abs() < 1e-12);
    }

    #[test]
    fn test_sanitized_keeps_good_dimensions() {
        let g = RobotGeometry {
            length_m: 0.2,
            wheelbase_m: 0.12,
            ..Default::default()
        }
        .sanitized();
        assert!((g.length_m - 0.2).abs() < 1e-12);
        assert!((g.wheelbase_m - 0.12).abs() < 1e-12);
    }
}
