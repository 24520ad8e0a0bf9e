//! Differential-drive robot: pose, applied wheel speeds, and the row of line
//! sensors. The simulation engine is granted mutation only through the
//! phase-scoped methods here — `record_reading` during sensing, `set_pose`
//! during placement, `update_movement` during integration.

use std::collections::BTreeMap;

use nalgebra::{Point2, Rotation2, Vector2};
use rand::Rng;

use render::{Canvas, RgbaImage, rgba};
use simcore::{Pose, RobotGeometry, SensorMap, SensorReading, m_to_px, sensor_id};

/// Kinematic state of the robot. Geometry is sanitized on entry, so the
/// wheelbase used by the kinematics is always positive and finite.
#[derive(Debug, Clone)]
pub struct DiffDriveRobot {
    geometry: RobotGeometry,
    pose: Pose,
    sensors: SensorMap,
    applied_vl_mps: f64,
    applied_vr_mps: f64,
    sprite: Option<RgbaImage>,
}

impl DiffDriveRobot {
    pub fn new(geometry: RobotGeometry) -> Self {
        let geometry = geometry.sanitized();
        let sensors = Self::blank_sensors(geometry.sensor_count);
        DiffDriveRobot {
            geometry,
            pose: Pose::default(),
            sensors,
            applied_vl_mps: 0.0,
            applied_vr_mps: 0.0,
            sprite: None,
        }
    }

    fn blank_sensors(count: usize) -> SensorMap {
        (0..count).map(|i| (sensor_id(i), SensorReading::OffLine)).collect()
    }

    pub fn geometry(&self) -> &RobotGeometry {
        &self.geometry
    }

    /// Swaps in a new geometry, keeping pose and applied speeds. The sensor
    /// map is rebuilt (all off-line) when the sensor count changes.
    pub fn update_geometry(&mut self, geometry: RobotGeometry) {
        let geometry = geometry.sanitized();
        if geometry.sensor_count != self.geometry.sensor_count {
            self.sensors = Self::blank_sensors(geometry.sensor_count);
        }
        self.geometry = geometry;
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Placement-phase write. Steady-state pose changes go through
    /// `update_movement` only.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Zeroes motion state and re-seats the robot at `pose`. Sensor readings
    /// revert to all off-line until the next sense phase.
    pub fn reset_state(&mut self, pose: Pose) {
        self.pose = pose;
        self.applied_vl_mps = 0.0;
        self.applied_vr_mps = 0.0;
        self.sensors = Self::blank_sensors(self.geometry.sensor_count);
    }

    pub fn sensors(&self) -> &SensorMap {
        &self.sensors
    }

    /// Sense-phase write. Unknown ids are ignored rather than inserted, so
    /// the map always mirrors the geometry's sensor count.
    pub fn record_reading(&mut self, id: &str, reading: SensorReading) {
        if let Some(slot) = self.sensors.get_mut(id) {
            *slot = reading;
        }
    }

    /// Applied (post-lag) wheel speeds, left then right, m/s.
    pub fn applied_speeds_mps(&self) -> (f64, f64) {
        (self.applied_vl_mps, self.applied_vr_mps)
    }

    /// One integration step.
    ///
    /// Wheel speeds approach their targets first-order (`response_factor` of
    /// the gap per call), then take an optional bounded multiplicative
    /// perturbation, then clamp to `±max_speed_mps`; the pose integrates from
    /// the post-clamp speeds. `perturb_factor == 0` draws nothing from the rng.
    pub fn update_movement<R: Rng>(
        &mut self,
        dt_s: f64,
        target_vl_mps: f64,
        target_vr_mps: f64,
        response_factor: f64,
        max_speed_mps: f64,
        perturb_factor: f64,
        rng: &mut R,
    ) {
        let response = response_factor.clamp(0.0, 1.0);
        self.applied_vl_mps += (target_vl_mps - self.applied_vl_mps) * response;
        self.applied_vr_mps += (target_vr_mps - self.applied_vr_mps) * response;

        if perturb_factor > 0.0 {
            let f = perturb_factor.clamp(0.0, 1.0);
            self.applied_vl_mps *= 1.0 + f * rng.gen_range(-1.0..=1.0);
            self.applied_vr_mps *= 1.0 + f * rng.gen_range(-1.0..=1.0);
        }

        let limit = max_speed_mps.abs();
        self.applied_vl_mps = self.applied_vl_mps.clamp(-limit, limit);
        self.applied_vr_mps = self.applied_vr_mps.clamp(-limit, limit);

        let v = (self.applied_vl_mps + self.applied_vr_mps) / 2.0;
        let omega = (self.applied_vr_mps - self.applied_vl_mps) / self.geometry.wheelbase_m;

        self.pose.x_m += v * self.pose.angle_rad.cos() * dt_s;
        self.pose.y_m += v * self.pose.angle_rad.sin() * dt_s;
        self.pose.angle_rad += omega * dt_s;
    }

    /// World position of every sensor window, keyed by sensor id.
    ///
    /// Sensors form a row `sensor_forward_offset_m` ahead of the reference
    /// point, spread `sensor_side_spread_m` across, `s0` leftmost (negative
    /// lateral offset in the body frame).
    pub fn sensor_positions_world_m(&self) -> BTreeMap<String, Point2<f64>> {
        let rot = Rotation2::new(self.pose.angle_rad);
        let origin = self.pose.position();
        let n = self.geometry.sensor_count;
        (0..n)
            .map(|i| {
                let lateral = if n > 1 {
                    self.geometry.sensor_side_spread_m * (i as f64 / (n - 1) as f64 - 0.5)
                } else {
                    0.0
                };
                let local = Vector2::new(self.geometry.sensor_forward_offset_m, lateral);
                (sensor_id(i), origin + rot * local)
            })
            .collect()
    }

    /// Optional top-down sprite drawn instead of the schematic body.
    pub fn set_sprite(&mut self, sprite: Option<RgbaImage>) {
        self.sprite = sprite;
    }

    /// Draws the robot. `sensor_flags` uses the display convention:
    /// `true` = off the line (red), `false` = on the line (green).
    pub fn draw(&self, canvas: &mut Canvas, sensor_flags: &BTreeMap<String, bool>) {
        let cx = m_to_px(self.pose.x_m);
        let cy = m_to_px(self.pose.y_m);

        if let Some(sprite) = &self.sprite {
            canvas.blit_rotated(sprite, cx, cy, self.pose.angle_rad);
        } else {
            let hl = self.geometry.length_m / 2.0;
            let hw = self.geometry.wheelbase_m / 2.0;
            let rot = Rotation2::new(self.pose.angle_rad);
            let origin = self.pose.position();
            let corners: Vec<(f64, f64)> = [(hl, hw), (hl, -hw), (-hl, -hw), (-hl, hw)]
                .into_iter()
                .map(|(bx, by)| {
                    let w = origin + rot * Vector2::new(bx, by);
                    (m_to_px(w.x), m_to_px(w.y))
                })
                .collect();
            canvas.stroke_polygon(&corners, 2.0, rgba(40, 40, 200, 255));

            // Heading tick from the reference point to the nose.
            let nose = self.pose.advanced(hl);
            canvas.draw_line(cx, cy, m_to_px(nose.x_m), m_to_px(nose.y_m), 2.0, rgba(200, 40, 40, 255));
        }

        let r_px = m_to_px(self.geometry.sensor_diameter_m / 2.0).max(2.0);
        for (id, pos) in self.sensor_positions_world_m() {
            let off_line = sensor_flags.get(&id).copied().unwrap_or(true);
            let color = if off_line { rgba(220, 60, 60, 255) } else { rgba(60, 200, 60, 255) };
            canvas.fill_circle(m_to_px(pos.x), m_to_px(pos.y), r_px, color);
        }
    }
}
