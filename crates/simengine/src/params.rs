use serde::{Deserialize, Serialize};

use simcore::RobotGeometry;
use trackmap::DEFAULT_LINE_THRESHOLD;

/// Tunable simulation parameters.
///
/// All values live here; collaborators receive them per call (the track map
/// additionally caches the line threshold, pushed down on load and update).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Fixed integration step (s). 0.02 matches a control loop with a 20 ms
    /// delay.
    pub time_step_s: f64,
    /// Speed reached at PWM 255 before efficiency losses (m/s).
    pub max_robot_speed_mps: f64,
    /// Multiplier on the max speed, modeling drivetrain losses.
    pub motor_efficiency: f64,
    /// Fraction of the target-speed gap closed per tick, in [0, 1].
    pub motor_response_factor: f64,
    /// Per-sensor, per-tick probability of an inverted reading, in [0, 1].
    pub sensor_noise_prob: f64,
    /// Magnitude of the random wheel-speed perturbation, in [0, 1].
    pub movement_perturb_factor: f64,
    /// Nonzero commands below this absolute PWM are forced to zero.
    pub motor_deadband_pwm: f64,
    /// Pixel-intensity cutoff for the track's on-line test.
    pub line_threshold: u8,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            time_step_s: 0.02,
            max_robot_speed_mps: 0.5,
            motor_efficiency: 0.85,
            motor_response_factor: 0.1,
            sensor_noise_prob: 0.0,
            movement_perturb_factor: 0.0,
            motor_deadband_pwm: 10.0,
            line_threshold: DEFAULT_LINE_THRESHOLD,
        }
    }
}

impl SimParams {
    /// Physically achievable wheel speed: max speed scaled by efficiency.
    pub fn effective_max_speed_mps(&self) -> f64 {
        self.max_robot_speed_mps * self.motor_efficiency
    }
}

/// Partial parameter update: only fields present overwrite the current
/// value, everything else is preserved. Deserializes from partial JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParamsUpdate {
    pub time_step_s: Option<f64>,
    pub max_robot_speed_mps: Option<f64>,
    pub motor_efficiency: Option<f64>,
    pub motor_response_factor: Option<f64>,
    pub sensor_noise_prob: Option<f64>,
    pub movement_perturb_factor: Option<f64>,
    pub motor_deadband_pwm: Option<f64>,
    pub line_threshold: Option<u8>,
    /// Forwarded to the kinematic model (and mirrored into the lap
    /// detector's cached dimensions) by the engine.
    pub robot_geometry: Option<RobotGeometry>,
}

impl SimParamsUpdate {
    /// Merge into `params`. Fractional factors are clamped to [0, 1].
    pub fn apply_to(&self, params: &mut SimParams) {
        if let Some(v) = self.time_step_s {
            params.time_step_s = v;
        }
        if let Some(v) = self.max_robot_speed_mps {
            params.max_robot_speed_mps = v;
        }
        if let Some(v) = self.motor_efficiency {
            params.motor_efficiency = v;
        }
        if let Some(v) = self.motor_response_factor {
            params.motor_response_factor = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.sensor_noise_prob {
            params.sensor_noise_prob = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.movement_perturb_factor {
            params.movement_perturb_factor = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.motor_deadband_pwm {
            params.motor_deadband_pwm = v;
        }
        if let Some(v) = self.line_threshold {
            params.line_threshold = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_only_present_fields() {
        let mut params = SimParams::default();
        let update = SimParamsUpdate {
            sensor_noise_prob: Some(0.25),
            motor_deadband_pwm: Some(20.0),
            ..Default::default()
        };
        update.apply_to(&mut params);
        assert!((params.sensor_noise_prob - 0.25).abs() < 1e-12);
        assert!((params.motor_deadband_pwm - 20.0).abs() < 1e-12);
        // Untouched fields keep their defaults.
        assert!((params.time_step_s - 0.02).abs() < 1e-12);
        assert!((params.max_robot_speed_mps - 0.5).abs() < 1e-12);
        assert_eq!(params.line_threshold, DEFAULT_LINE_THRESHOLD);
    }

    #[test]
    fn test_fractional_factors_clamped() {
        let mut params = SimParams::default();
        SimParamsUpdate {
            motor_response_factor: Some(3.0),
            sensor_noise_prob: Some(-0.5),
            movement_perturb_factor: Some(1.5),
            ..Default::default()
        }
        .apply_to(&mut params);
        assert!((params.motor_response_factor - 1.0).abs() < 1e-12);
        assert!(params.sensor_noise_prob.abs() < 1e-12);
        assert!((params.movement_perturb_factor - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_merges() {
        let mut params = SimParams::default();
        let update: SimParamsUpdate =
            serde_json::from_str(r#"{ "motor_response_factor": 1.0, "line_threshold": 80 }"#).unwrap();
        update.apply_to(&mut params);
        assert!((params.motor_response_factor - 1.0).abs() < 1e-12);
        assert_eq!(params.line_threshold, 80);
        assert!((params.motor_efficiency - 0.85).abs() < 1e-12);
        assert_eq!(update.robot_geometry, None);
    }

    #[test]
    fn test_effective_max_speed() {
        let params = SimParams::default();
        assert!((params.effective_max_speed_mps() - 0.425).abs() < 1e-12);
    }
}
