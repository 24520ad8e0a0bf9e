//! PID controller with anti-windup and output saturation.

use serde::{Deserialize, Serialize};

/// Configuration for a PID controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Maximum integral accumulator magnitude (anti-windup)
    pub i_max: f64,
    /// Minimum output value
    pub output_min: f64,
    /// Maximum output value
    pub output_max: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            i_max: f64::MAX,
            output_min: f64::NEG_INFINITY,
            output_max: f64::INFINITY,
        }
    }
}

impl PidConfig {
    /// Create a P-only controller
    pub fn p(kp: f64) -> Self {
        Self { kp, ..Default::default() }
    }

    /// Create a PI controller
    pub fn pi(kp: f64, ki: f64) -> Self {
        Self { kp, ki, ..Default::default() }
    }

    /// Create a PID controller
    pub fn pid(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd, ..Default::default() }
    }

    /// Set output limits
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }

    /// Set integral anti-windup limit
    pub fn with_i_max(mut self, i_max: f64) -> Self {
        self.i_max = i_max;
        self
    }
}

/// PID controller with state.
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    integral: f64,
    prev_measurement: Option<f64>,
    setpoint: f64,
}

impl PidController {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            prev_measurement: None,
            setpoint: 0.0,
        }
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Reset the controller state (integral and derivative)
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_measurement = None;
    }

    /// Update the controller with a new measurement and return the control
    /// output.
    ///
    /// Uses derivative-on-measurement to avoid derivative kick on setpoint
    /// changes.
    pub fn update(&mut self, measurement: f64, dt: f64) -> f64 {
        let error = self.setpoint - measurement;

        let p_term = self.config.kp * error;

        if dt > 0.0 {
            self.integral += error * dt;
            self.integral = self.integral.clamp(-self.config.i_max, self.config.i_max);
        }
        let i_term = self.config.ki * self.integral;

        let d_term = if let Some(prev) = self.prev_measurement {
            if dt > 0.0 {
                // Negative: derivative on measurement, not error.
                -self.config.kd * (measurement - prev) / dt
            } else {
                0.0
            }
        } else {
            0.0
        };
        self.prev_measurement = Some(measurement);

        let output = p_term + i_term + d_term;
        output.clamp(self.config.output_min, self.config.output_max)
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }
}
