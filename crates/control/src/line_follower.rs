//! PID line follower over the sensor bar.

use serde::{Deserialize, Serialize};

use simcore::SensorMap;

use crate::pid::{PidConfig, PidController};

/// Nominal PWM magnitude limit.
const PWM_LIMIT: f64 = 255.0;

/// Tuning for the follower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineFollowerConfig {
    /// Forward PWM both wheels share before steering correction.
    pub base_pwm: f64,
    /// Steering PID over the normalized line offset in [-1, 1].
    pub steer: PidConfig,
}

impl Default for LineFollowerConfig {
    fn default() -> Self {
        LineFollowerConfig {
            base_pwm: 160.0,
            steer: PidConfig::pid(220.0, 0.0, 6.0).with_limits(-PWM_LIMIT, PWM_LIMIT),
        }
    }
}

/// Maps sensor readings to a left/right PWM pair.
///
/// The measured line position is the centroid of the on-line sensors,
/// normalized to [-1, 1] (`s0` side negative). When every sensor is off the
/// line the follower holds the last known direction at full deflection until
/// the line is reacquired.
pub struct LineFollower {
    config: LineFollowerConfig,
    pid: PidController,
    last_offset: f64,
}

impl LineFollower {
    pub fn new(config: LineFollowerConfig) -> Self {
        let pid = PidController::new(config.steer.clone());
        LineFollower { config, pid, last_offset: 0.0 }
    }

    pub fn reset(&mut self) {
        self.pid.reset();
        self.last_offset = 0.0;
    }

    pub fn config(&self) -> &LineFollowerConfig {
        &self.config
    }

    /// One control cycle. Returns `(left_pwm, right_pwm)`, clamped to the
    /// nominal [-255, 255] range.
    pub fn compute(&mut self, sensors: &SensorMap, dt_s: f64) -> (f64, f64) {
        let offset = match line_offset(sensors) {
            Some(o) => o,
            // Line lost: steer hard toward where it was last seen.
            None => {
                if self.last_offset >= 0.0 { 1.0 } else { -1.0 }
            }
        };
        self.last_offset = offset;

        // Negative feedback around zero offset: positive offset (line toward
        // the s{n-1} side) must speed up the left-turn wheel pair.
        self.pid.set_setpoint(0.0);
        let steer = -self.pid.update(offset, dt_s);

        let left = (self.config.base_pwm - steer).clamp(-PWM_LIMIT, PWM_LIMIT);
        let right = (self.config.base_pwm + steer).clamp(-PWM_LIMIT, PWM_LIMIT);
        (left, right)
    }
}

/// Normalized position of the line under the sensor bar, from the on-line
/// sensors' centroid: -1 at `s0`, +1 at `s{n-1}`, `None` if no sensor sees
/// the line.
pub fn line_offset(sensors: &SensorMap) -> Option<f64> {
    let n = sensors.len();
    if n == 0 {
        return None;
    }
    let mut sum = 0.0;
    let mut hits = 0usize;
    for (id, reading) in sensors {
        if !reading.is_on_line() {
            continue;
        }
        // Ids are "s{index}"; ignore anything else.
        let Ok(index) = id.trim_start_matches('s').parse::<usize>() else { continue };
        let pos = if n > 1 { 2.0 * (index as f64 / (n - 1) as f64) - 1.0 } else { 0.0 };
        sum += pos;
        hits += 1;
    }
    if hits == 0 { None } else { Some(sum / hits as f64) }
}
