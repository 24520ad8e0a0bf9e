use std::collections::BTreeMap;

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use laptimer::{LapDisplay, LapTimer};
use mechanics::DiffDriveRobot;
use render::{Canvas, RgbaImage, rgba};
use simcore::{Pose, RobotGeometry, SensorMap, SensorReading, m_to_px, px_to_m};
use trackmap::{PieceGrid, TrackLoadError, TrackMap, TrackSource};

use crate::params::{SimParams, SimParamsUpdate};
use crate::start_line::{FallbackStartLine, derive_from_connections};

/// Dimensions of a successfully decoded track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("no track loaded")]
    NoTrackLoaded,
}

/// Everything the presentation layer needs after one tick.
#[derive(Debug, Clone)]
pub struct StepSnapshot {
    /// Sensor readings sampled at the start of the tick (raw 0 = on line).
    pub sensors: SensorMap,
    /// The PWM pair exactly as supplied by the caller.
    pub commanded_pwm: (f64, f64),
    /// Applied (post-lag) wheel speeds, left then right, m/s.
    pub applied_speeds_mps: (f64, f64),
    pub lap: LapDisplay,
    pub new_lap_completed: bool,
    pub completed_lap_time_s: Option<f64>,
    pub sim_time_s: f64,
    pub out_of_track: bool,
}

/// The simulation engine.
///
/// Composes the kinematic model, track map and lap detector; owns the
/// parameters, total elapsed time and the random source. All collaborator
/// mutation goes through their phase-scoped methods — the engine writes
/// sensors only while sensing, and the pose only during placement.
pub struct SimulationEngine {
    robot: DiffDriveRobot,
    track: TrackMap,
    lap: LapTimer,
    params: SimParams,
    fallback_line: FallbackStartLine,
    total_sim_time_s: f64,
    out_of_track: bool,
    rng: ChaCha8Rng,
}

impl SimulationEngine {
    pub fn new(geometry: RobotGeometry) -> Self {
        Self::build(geometry, ChaCha8Rng::from_entropy())
    }

    /// Deterministic engine: start-line selection, sensor noise and movement
    /// perturbation all replay identically for the same seed.
    pub fn with_seed(geometry: RobotGeometry, seed: u64) -> Self {
        Self::build(geometry, ChaCha8Rng::seed_from_u64(seed))
    }

    fn build(geometry: RobotGeometry, rng: ChaCha8Rng) -> Self {
        let robot = DiffDriveRobot::new(geometry);
        let g = robot.geometry();
        let lap = LapTimer::new(g.wheelbase_m, g.length_m);
        SimulationEngine {
            robot,
            track: TrackMap::new(),
            lap,
            params: SimParams::default(),
            fallback_line: FallbackStartLine::default(),
            total_sim_time_s: 0.0,
            out_of_track: false,
            rng,
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn robot(&self) -> &DiffDriveRobot {
        &self.robot
    }

    pub fn track(&self) -> &TrackMap {
        &self.track
    }

    pub fn lap_timer(&self) -> &LapTimer {
        &self.lap
    }

    pub fn sim_time_s(&self) -> f64 {
        self.total_sim_time_s
    }

    pub fn is_out_of_track(&self) -> bool {
        self.out_of_track
    }

    pub fn current_robot_geometry(&self) -> RobotGeometry {
        *self.robot.geometry()
    }

    /// Replaces the last-resort start segment used when neither start-pose
    /// metadata nor a usable piece grid is available.
    pub fn set_fallback_start_line(&mut self, fallback: FallbackStartLine) {
        self.fallback_line = fallback;
    }

    pub fn set_robot_sprite(&mut self, sprite: Option<RgbaImage>) {
        self.robot.set_sprite(sprite);
    }

    pub fn set_track_watermark(&mut self, watermark: Option<RgbaImage>) {
        self.track.set_watermark(watermark);
    }

    /// Field-wise parameter merge. A supplied geometry goes to the kinematic
    /// model and is mirrored into the lap detector; the line threshold is
    /// pushed down to the track map.
    pub fn update_parameters(&mut self, update: &SimParamsUpdate) {
        if let Some(geometry) = update.robot_geometry {
            self.robot.update_geometry(geometry);
            let g = self.robot.geometry();
            self.lap.set_robot_dimensions(g.wheelbase_m, g.length_m);
        }
        update.apply_to(&mut self.params);
        self.track.set_line_threshold(self.params.line_threshold);
    }

    /// Loads a track and places the robot at a valid start.
    ///
    /// Start pose priority: explicit metadata on the source, then a
    /// connection derived from `grid`, then the fallback segment. After the
    /// reset the robot is reseated half a body length behind the start line
    /// so it has not already crossed it. On decode failure the engine is
    /// left exactly as before the call.
    pub fn load_track(
        &mut self,
        source: TrackSource,
        grid: Option<&PieceGrid>,
    ) -> Result<TrackInfo, TrackLoadError> {
        let pose_hint = source.start_pose_hint();
        let (width_px, height_px) = self.track.load(source, self.params.line_threshold)?;

        let (pose, line) = match pose_hint {
            Some(pose) => (pose, None),
            None => {
                let derived = grid.and_then(|g| {
                    derive_from_connections(
                        g,
                        width_px as f64,
                        self.robot.geometry().wheelbase_m,
                        &mut self.rng,
                    )
                });
                match derived {
                    Some(placement) => {
                        info!(
                            "start line derived from piece connection at ({:.3}, {:.3}) m",
                            placement.pose.x_m, placement.pose.y_m
                        );
                        (placement.pose, Some(placement.line))
                    }
                    None => {
                        warn!("no piece connection available, using fallback start line");
                        let placement = self.fallback_line.placement();
                        (placement.pose, Some(placement.line))
                    }
                }
            }
        };

        self.reset_simulation_state(pose, None);

        // The lap detector works off cached dimensions; re-sync from the
        // (sanitized, therefore always numeric) geometry before arming.
        let geometry = self.current_robot_geometry();
        self.lap.set_robot_dimensions(geometry.wheelbase_m, geometry.length_m);
        self.lap.initialize(&pose, self.total_sim_time_s, line);

        if let Some(line) = self.lap.start_line() {
            let center = line.center();
            let at_line = Pose::new(center.x, center.y, pose.angle_rad);
            self.robot.set_pose(at_line.advanced(-geometry.length_m / 2.0));
        }

        Ok(TrackInfo { width_px, height_px })
    }

    /// Re-seats the robot and zeroes the session.
    ///
    /// Elapsed time and the out-of-track flag reset; the lap detector's
    /// statistics clear but its start line survives, so a mid-session reset
    /// keeps the same finish line instead of regenerating one.
    pub fn reset_simulation_state(&mut self, pose: Pose, new_geometry: Option<RobotGeometry>) {
        if let Some(geometry) = new_geometry {
            self.robot.update_geometry(geometry);
        }
        self.robot.reset_state(pose);
        self.total_sim_time_s = 0.0;
        self.out_of_track = false;
        self.lap.reset();
        if self.track.is_loaded() {
            let existing = self.lap.start_line().copied();
            self.lap.initialize(&pose, self.total_sim_time_s, existing);
        }
    }

    /// Advances the simulation by one fixed step.
    ///
    /// The phase order is load-bearing: sensors sample the pre-move pose,
    /// the lap detector and the bounds check see the post-move pose.
    pub fn simulation_step(&mut self, left_pwm: f64, right_pwm: f64) -> Result<StepSnapshot, StepError> {
        if !self.track.is_loaded() {
            return Err(StepError::NoTrackLoaded);
        }

        // 1. Sense at the current pose.
        self.sample_sensors();

        // 2. Shape commands: deadband, then PWM -> target speed.
        let left = apply_deadband(left_pwm, self.params.motor_deadband_pwm);
        let right = apply_deadband(right_pwm, self.params.motor_deadband_pwm);
        let max_speed = self.params.effective_max_speed_mps();
        let target_vl = left / 255.0 * max_speed;
        let target_vr = right / 255.0 * max_speed;

        // 3. Integrate movement.
        self.robot.update_movement(
            self.params.time_step_s,
            target_vl,
            target_vr,
            self.params.motor_response_factor,
            max_speed,
            self.params.movement_perturb_factor,
            &mut self.rng,
        );

        // 4. Advance time.
        self.total_sim_time_s += self.params.time_step_s;

        // 5. Lap evaluation against the new pose.
        let pose = self.robot.pose();
        let lap_update = self.lap.update(self.total_sim_time_s, &pose);

        // 6. Bounds check, recomputed from scratch every tick.
        self.out_of_track = self.compute_out_of_track(&pose);

        // 7. Snapshot.
        Ok(StepSnapshot {
            sensors: self.robot.sensors().clone(),
            commanded_pwm: (left_pwm, right_pwm),
            applied_speeds_mps: self.robot.applied_speeds_mps(),
            lap: self.lap.display_data(),
            new_lap_completed: lap_update.new_lap_completed,
            completed_lap_time_s: lap_update.completed_lap_time_s,
            sim_time_s: self.total_sim_time_s,
            out_of_track: self.out_of_track,
        })
    }

    fn sample_sensors(&mut self) {
        if !self.track.is_loaded() {
            let ids: Vec<String> = self.robot.sensors().keys().cloned().collect();
            for id in ids {
                self.robot.record_reading(&id, SensorReading::OffLine);
            }
            return;
        }
        let noise = self.params.sensor_noise_prob.clamp(0.0, 1.0);
        for (id, position) in self.robot.sensor_positions_world_m() {
            let on_line = self.track.is_pixel_on_line(m_to_px(position.x), m_to_px(position.y));
            let mut reading = SensorReading::from_on_line(on_line);
            // Zero probability must stay rng-free so noiseless runs are
            // bit-for-bit reproducible across seeds.
            if noise > 0.0 && self.rng.gen_bool(noise) {
                reading = reading.inverted();
            }
            self.robot.record_reading(&id, reading);
        }
    }

    fn compute_out_of_track(&self, pose: &Pose) -> bool {
        let g = self.robot.geometry();
        let margin_m = g.length_m.max(g.wheelbase_m);
        let width_m = px_to_m(self.track.width_px() as f64);
        let height_m = px_to_m(self.track.height_px() as f64);
        pose.x_m < -margin_m
            || pose.x_m > width_m + margin_m
            || pose.y_m < -margin_m
            || pose.y_m > height_m + margin_m
    }

    /// Renders the current state: track, then robot (sensor colors from the
    /// boolean-inverted readings: `true` = off line), then the start line
    /// with its endpoint markers. Read-only.
    pub fn draw(&self, canvas: &mut Canvas) {
        self.track.draw(canvas);
        if self.track.is_loaded() {
            let flags: BTreeMap<String, bool> = self
                .robot
                .sensors()
                .iter()
                .map(|(id, reading)| (id.clone(), reading.is_off_line()))
                .collect();
            self.robot.draw(canvas, &flags);
        }
        if self.lap.is_active() {
            if let Some(line) = self.lap.start_line() {
                let (p1, p2) = line.endpoints();
                let (x1, y1) = (m_to_px(p1.x), m_to_px(p1.y));
                let (x2, y2) = (m_to_px(p2.x), m_to_px(p2.y));
                let color = rgba(255, 153, 153, 255);
                canvas.draw_line(x1, y1, x2, y2, 2.0, color);
                canvas.fill_circle(x1, y1, 4.0, color);
                canvas.fill_circle(x2, y2, 4.0, color);
            }
        }
    }
}

/// Nonzero commands inside the deadband collapse to exactly zero; a zero
/// command is left alone (the deadband never invents motion).
fn apply_deadband(pwm: f64, deadband: f64) -> f64 {
    if pwm != 0.0 && pwm.abs() < deadband { 0.0 } else { pwm }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use render::GrayImage;
    use simcore::sensor_id;

    /// White raster with a dark horizontal band, the simplest drivable line.
    fn banded_track(width: u32, height: u32, band_y: std::ops::Range<u32>) -> GrayImage {
        GrayImage::from_fn(width, height, |_, y| {
            if band_y.contains(&y) { image_luma(0) } else { image_luma(255) }
        })
    }

    fn image_luma(v: u8) -> image::Luma<u8> {
        image::Luma([v])
    }

    fn engine() -> SimulationEngine {
        SimulationEngine::with_seed(RobotGeometry::default(), 1)
    }

    /// Loads a 500x100 px track with a band under y=0.05 m and an explicit
    /// start pose on the band heading +x.
    fn engine_with_track() -> SimulationEngine {
        let mut engine = engine();
        let source = TrackSource::Raster {
            image: banded_track(500, 100, 45..55),
            start_pose: Some(Pose::new(0.1, 0.05, 0.0)),
        };
        engine.load_track(source, None).unwrap();
        engine
    }

    fn instant_response() -> SimParamsUpdate {
        SimParamsUpdate { motor_response_factor: Some(1.0), ..Default::default() }
    }

    #[test]
    fn test_step_without_track_is_an_error() {
        let mut engine = engine();
        assert!(matches!(engine.simulation_step(100.0, 100.0), Err(StepError::NoTrackLoaded)));
        assert_relative_eq!(engine.sim_time_s(), 0.0);
    }

    #[test]
    fn test_load_failure_leaves_engine_untouched() {
        let mut engine = engine();
        let err = engine.load_track(TrackSource::Bytes(vec![1, 2, 3]), None);
        assert!(err.is_err());
        assert!(!engine.track().is_loaded());
        assert!(!engine.lap_timer().is_active());
        assert!(matches!(engine.simulation_step(0.0, 0.0), Err(StepError::NoTrackLoaded)));
    }

    #[test]
    fn test_load_with_metadata_places_robot_behind_start() {
        let engine = engine_with_track();
        let pose = engine.robot().pose();
        // Half a body length (0.075 m) behind the start point, same heading.
        assert_relative_eq!(pose.x_m, 0.1 - 0.075, epsilon = 1e-9);
        assert_relative_eq!(pose.y_m, 0.05, epsilon = 1e-9);
        assert_relative_eq!(pose.angle_rad, 0.0, epsilon = 1e-12);
        assert!(engine.lap_timer().is_active());
    }

    #[test]
    fn test_load_with_grid_derives_start_from_connection() {
        let mut engine = engine();
        let grid = PieceGrid::from_rows(&[&[true, true]]);
        let source = TrackSource::Raster { image: banded_track(200, 100, 45..55), start_pose: None };
        engine.load_track(source, Some(&grid)).unwrap();

        // Single adjacency: midpoint of cell centers is (100, 50) px.
        let line = engine.lap_timer().start_line().copied().unwrap();
        let center = line.center();
        assert_relative_eq!(center.x, 0.1, epsilon = 1e-9);
        assert_relative_eq!(center.y, 0.05, epsilon = 1e-9);
        assert_relative_eq!(line.length_m(), 1.5 * 0.1, epsilon = 1e-9);
        assert!(engine.lap_timer().is_active());

        // Robot half a body length behind the midpoint, heading +x.
        let pose = engine.robot().pose();
        assert_relative_eq!(pose.x_m, 0.1 - 0.075, epsilon = 1e-9);
        assert_relative_eq!(pose.y_m, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_load_without_grid_or_metadata_uses_fallback() {
        let mut engine = engine();
        engine.set_fallback_start_line(FallbackStartLine {
            x1_px: 40.0,
            y1_px: 50.0,
            x2_px: 160.0,
            y2_px: 50.0,
        });
        let source = TrackSource::Raster { image: banded_track(200, 100, 45..55), start_pose: None };
        engine.load_track(source, None).unwrap();

        let line = engine.lap_timer().start_line().copied().unwrap();
        assert_relative_eq!(line.x1_m, 0.04, epsilon = 1e-12);
        assert_relative_eq!(line.x2_m, 0.16, epsilon = 1e-12);
        // Horizontal fallback segment: the lap heads straight down (+y).
        let pose = engine.robot().pose();
        assert_relative_eq!(pose.angle_rad, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_zeroes_time_and_bounds_flag() {
        let mut engine = engine_with_track();
        for _ in 0..10 {
            engine.simulation_step(200.0, 200.0).unwrap();
        }
        assert!(engine.sim_time_s() > 0.0);

        engine.reset_simulation_state(Pose::new(0.1, 0.05, 0.0), None);
        assert_relative_eq!(engine.sim_time_s(), 0.0);
        assert!(!engine.is_out_of_track());
        assert_eq!(engine.robot().applied_speeds_mps(), (0.0, 0.0));
    }

    #[test]
    fn test_reset_preserves_start_line() {
        let mut engine = engine_with_track();
        let before = engine.lap_timer().start_line().copied().unwrap();
        engine.reset_simulation_state(Pose::new(0.2, 0.05, 0.0), None);
        let after = engine.lap_timer().start_line().copied().unwrap();
        assert_eq!(before, after);
        // Crossing state cleared with the reset.
        assert_eq!(engine.lap_timer().display_data().laps_completed, 0);
        assert!(!engine.lap_timer().display_data().lap_in_progress);
    }

    #[test]
    fn test_deadband_forces_small_nonzero_commands_to_zero() {
        let mut engine = engine_with_track();
        engine.update_parameters(&instant_response());

        let snapshot = engine.simulation_step(5.0, -9.9).unwrap();
        assert_eq!(snapshot.applied_speeds_mps, (0.0, 0.0));
        // The snapshot still reports the PWMs exactly as commanded.
        assert_eq!(snapshot.commanded_pwm, (5.0, -9.9));

        let snapshot = engine.simulation_step(0.0, 0.0).unwrap();
        assert_eq!(snapshot.applied_speeds_mps, (0.0, 0.0));

        let snapshot = engine.simulation_step(10.0, -10.0).unwrap();
        assert!(snapshot.applied_speeds_mps.0 > 0.0);
        assert!(snapshot.applied_speeds_mps.1 < 0.0);
    }

    #[test]
    fn test_constant_pwm_reaches_target_and_advances_pose() {
        let mut engine = engine_with_track();
        engine.update_parameters(&instant_response());
        let start_x = engine.robot().pose().x_m;

        // 200/255 * 0.5 * 0.85 = 1/3 m/s exactly.
        let target = 200.0 / 255.0 * engine.params().effective_max_speed_mps();
        let dt = engine.params().time_step_s;
        let steps = (1.0 / dt).round() as usize;

        let first = engine.simulation_step(200.0, 200.0).unwrap();
        assert_relative_eq!(first.applied_speeds_mps.0, target, epsilon = 1e-12);
        assert_relative_eq!(first.applied_speeds_mps.1, target, epsilon = 1e-12);

        for _ in 1..steps {
            engine.simulation_step(200.0, 200.0).unwrap();
        }
        let pose = engine.robot().pose();
        assert_relative_eq!(pose.x_m - start_x, target * dt * steps as f64, epsilon = 1e-9);
        assert_relative_eq!(pose.y_m, 0.05, epsilon = 1e-9);
        assert_relative_eq!(engine.sim_time_s(), dt * steps as f64, epsilon = 1e-9);
    }

    #[test]
    fn test_driving_forward_crosses_start_line_and_arms_lap() {
        let mut engine = engine_with_track();
        engine.update_parameters(&instant_response());
        // The robot starts 0.075 m behind the line; a third of a meter of
        // forward travel takes it well past.
        for _ in 0..50 {
            engine.simulation_step(200.0, 200.0).unwrap();
        }
        assert!(engine.lap_timer().display_data().lap_in_progress);
    }

    #[test]
    fn test_sensors_on_band_read_on_line() {
        let mut engine = engine_with_track();
        let snapshot = engine.simulation_step(0.0, 0.0).unwrap();
        // The sensor row sits 0.07 m ahead of the reference point at
        // (0.025, 0.05): x = 0.095 m, still on the band around y = 0.05 m.
        let center = &snapshot.sensors[&sensor_id(2)];
        assert_eq!(*center, SensorReading::OnLine);
    }

    #[test]
    fn test_noiseless_sensors_are_seed_independent() {
        let mut a = SimulationEngine::with_seed(RobotGeometry::default(), 11);
        let mut b = SimulationEngine::with_seed(RobotGeometry::default(), 99);
        for engine in [&mut a, &mut b] {
            let source = TrackSource::Raster {
                image: banded_track(500, 100, 45..55),
                start_pose: Some(Pose::new(0.1, 0.05, 0.0)),
            };
            engine.load_track(source, None).unwrap();
        }
        let sa = a.simulation_step(50.0, 50.0).unwrap();
        let sb = b.simulation_step(50.0, 50.0).unwrap();
        assert_eq!(sa.sensors, sb.sensors);
    }

    #[test]
    fn test_full_noise_inverts_every_reading() {
        let mut clean = engine_with_track();
        let mut noisy = engine_with_track();
        noisy.update_parameters(&SimParamsUpdate {
            sensor_noise_prob: Some(1.0),
            ..Default::default()
        });
        let reference = clean.simulation_step(0.0, 0.0).unwrap();
        let flipped = noisy.simulation_step(0.0, 0.0).unwrap();
        for (id, reading) in &reference.sensors {
            assert_eq!(flipped.sensors[id], reading.inverted());
        }
    }

    #[test]
    fn test_out_of_track_is_recomputed_each_tick() {
        let mut engine = engine_with_track();
        // 500x100 px track: 0.5 x 0.1 m; margin = max(0.15, 0.10) = 0.15 m.
        engine.reset_simulation_state(Pose::new(2.0, 0.05, 0.0), None);
        let outside = engine.simulation_step(0.0, 0.0).unwrap();
        assert!(outside.out_of_track);

        engine.reset_simulation_state(Pose::new(0.25, 0.05, 0.0), None);
        assert!(!engine.is_out_of_track());
        let inside = engine.simulation_step(0.0, 0.0).unwrap();
        assert!(!inside.out_of_track);
    }

    #[test]
    fn test_boundary_margin_uses_larger_dimension() {
        let mut engine = engine_with_track();
        // x = 0.6 m is 0.1 m past the right edge, inside the 0.15 m margin.
        engine.reset_simulation_state(Pose::new(0.6, 0.05, 0.0), None);
        assert!(!engine.simulation_step(0.0, 0.0).unwrap().out_of_track);
        // x = 0.7 m is beyond the margin.
        engine.reset_simulation_state(Pose::new(0.7, 0.05, 0.0), None);
        assert!(engine.simulation_step(0.0, 0.0).unwrap().out_of_track);
    }

    #[test]
    fn test_update_parameters_forwards_geometry() {
        let mut engine = engine_with_track();
        let mut geometry = engine.current_robot_geometry();
        geometry.length_m = 0.3;
        geometry.wheelbase_m = 0.2;
        engine.update_parameters(&SimParamsUpdate {
            robot_geometry: Some(geometry),
            line_threshold: Some(42),
            ..Default::default()
        });
        assert_relative_eq!(engine.current_robot_geometry().length_m, 0.3, epsilon = 1e-12);
        assert_relative_eq!(engine.lap_timer().robot_length_m(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(engine.lap_timer().robot_width_m(), 0.2, epsilon = 1e-12);
        assert_eq!(engine.track().line_threshold(), 42);
    }

    #[test]
    fn test_degenerate_geometry_is_defaulted_on_load() {
        let mut engine = SimulationEngine::with_seed(
            RobotGeometry { length_m: f64::NAN, wheelbase_m: -1.0, ..Default::default() },
            1,
        );
        let source = TrackSource::Raster {
            image: banded_track(500, 100, 45..55),
            start_pose: Some(Pose::new(0.1, 0.05, 0.0)),
        };
        engine.load_track(source, None).unwrap();
        assert_relative_eq!(engine.current_robot_geometry().length_m, 0.15, epsilon = 1e-12);
        assert_relative_eq!(engine.lap_timer().robot_width_m(), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_deadband_helper() {
        assert_eq!(apply_deadband(5.0, 10.0), 0.0);
        assert_eq!(apply_deadband(-5.0, 10.0), 0.0);
        assert_eq!(apply_deadband(0.0, 10.0), 0.0);
        assert_eq!(apply_deadband(10.0, 10.0), 10.0);
        assert_eq!(apply_deadband(-255.0, 10.0), -255.0);
    }

    #[test]
    fn test_draw_renders_track_and_start_line() {
        let mut engine = engine_with_track();
        engine.simulation_step(0.0, 0.0).unwrap();
        let mut canvas = Canvas::new(500, 100);
        engine.draw(&mut canvas);
        // Band row comes out dark.
        assert!(canvas.as_image().get_pixel(5, 50).0[0] < 100);
        // Start line at x = 100 px runs along y through (100, 50): light red.
        let px = canvas.as_image().get_pixel(100, 60);
        assert!(px.0[0] > 200 && px.0[1] < 200);
    }
}
