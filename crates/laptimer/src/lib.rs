//! Lap detection against a start/finish segment.
//!
//! The detector tracks which side of the segment the robot is on, in the
//! direction the lap is run. Crossing from the back side to the front side,
//! within the segment's lateral extent and with the heading agreeing with the
//! lap direction, counts: the first such crossing starts the lap clock, each
//! subsequent one completes a lap.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use simcore::{Pose, StartLine};

/// Result of one lap-detector update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LapUpdate {
    pub new_lap_completed: bool,
    pub completed_lap_time_s: Option<f64>,
}

/// Lap statistics for presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LapDisplay {
    pub laps_completed: u32,
    pub last_lap_s: Option<f64>,
    pub best_lap_s: Option<f64>,
    pub lap_in_progress: bool,
}

pub struct LapTimer {
    start_line: Option<StartLine>,
    active: bool,
    robot_width_m: f64,
    robot_length_m: f64,
    /// Unit vector of the lap direction, captured from the pose at initialize.
    forward: Vector2<f64>,
    laps_completed: u32,
    last_lap_s: Option<f64>,
    best_lap_s: Option<f64>,
    lap_start_s: f64,
    lap_in_progress: bool,
    /// Signed front/back side of the robot last tick; None until first update.
    last_side: Option<f64>,
}

impl LapTimer {
    pub fn new(robot_width_m: f64, robot_length_m: f64) -> Self {
        LapTimer {
            start_line: None,
            active: false,
            robot_width_m,
            robot_length_m,
            forward: Vector2::x(),
            laps_completed: 0,
            last_lap_s: None,
            best_lap_s: None,
            lap_start_s: 0.0,
            lap_in_progress: false,
            last_side: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start_line(&self) -> Option<&StartLine> {
        self.start_line.as_ref()
    }

    pub fn robot_width_m(&self) -> f64 {
        self.robot_width_m
    }

    pub fn robot_length_m(&self) -> f64 {
        self.robot_length_m
    }

    /// Mirrors the kinematic model's dimensions into the detector; affects
    /// fresh line construction and the crossing extent margin.
    pub fn set_robot_dimensions(&mut self, width_m: f64, length_m: f64) {
        self.robot_width_m = width_m;
        self.robot_length_m = length_m;
    }

    /// Arms the detector against `pose`.
    ///
    /// With `existing` the supplied segment is kept verbatim (mid-session
    /// reset); otherwise a fresh segment is laid across the pose, spanning
    /// 1.5× the robot width. Lap statistics restart either way.
    pub fn initialize(&mut self, pose: &Pose, sim_time_s: f64, existing: Option<StartLine>) {
        let line = existing.unwrap_or_else(|| StartLine::across_pose(pose, 1.5 * self.robot_width_m));
        self.forward = pose.heading();
        self.start_line = Some(line);
        self.active = true;
        self.laps_completed = 0;
        self.last_lap_s = None;
        self.best_lap_s = None;
        self.lap_start_s = sim_time_s;
        self.lap_in_progress = false;
        self.last_side = Some(self.signed_side(&line, pose));
    }

    /// Clears lap statistics and crossing state; the start line, active flag
    /// and cached dimensions survive.
    pub fn reset(&mut self) {
        self.laps_completed = 0;
        self.last_lap_s = None;
        self.best_lap_s = None;
        self.lap_start_s = 0.0;
        self.lap_in_progress = false;
        self.last_side = None;
    }

    /// Evaluates the (already updated) pose against the line.
    pub fn update(&mut self, sim_time_s: f64, pose: &Pose) -> LapUpdate {
        let Some(line) = self.start_line else { return LapUpdate::default() };
        if !self.active {
            return LapUpdate::default();
        }

        let side = self.signed_side(&line, pose);
        let prev = self.last_side;
        self.last_side = Some(side);

        let crossed = matches!(prev, Some(p) if p <= 0.0 && side > 0.0);
        if !crossed || !self.within_extent(&line, pose) || pose.heading().dot(&self.forward) <= 0.0 {
            return LapUpdate::default();
        }

        if !self.lap_in_progress {
            // First crossing: the robot starts behind the line, so this only
            // starts the clock.
            self.lap_in_progress = true;
            self.lap_start_s = sim_time_s;
            return LapUpdate::default();
        }

        let lap_s = sim_time_s - self.lap_start_s;
        self.lap_start_s = sim_time_s;
        self.laps_completed += 1;
        self.last_lap_s = Some(lap_s);
        self.best_lap_s = Some(self.best_lap_s.map_or(lap_s, |b| b.min(lap_s)));
        LapUpdate { new_lap_completed: true, completed_lap_time_s: Some(lap_s) }
    }

    pub fn display_data(&self) -> LapDisplay {
        LapDisplay {
            laps_completed: self.laps_completed,
            last_lap_s: self.last_lap_s,
            best_lap_s: self.best_lap_s,
            lap_in_progress: self.lap_in_progress,
        }
    }

    /// Signed distance of the pose from the line along the lap direction:
    /// negative behind, positive past.
    fn signed_side(&self, line: &StartLine, pose: &Pose) -> f64 {
        let c = line.center();
        (pose.position() - c).dot(&self.forward)
    }

    /// Whether the pose projects onto the segment, with half a robot width of
    /// slack at each end so grazing an endpoint still counts.
    fn within_extent(&self, line: &StartLine, pose: &Pose) -> bool {
        let c = line.center();
        let along = (pose.position() - c).dot(&line.direction());
        along.abs() <= line.length_m() / 2.0 + self.robot_width_m / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn armed_timer() -> (LapTimer, Pose) {
        let mut timer = LapTimer::new(0.10, 0.15);
        // Robot heading +x; line will run along y through (1, 0).
        let start = Pose::new(1.0, 0.0, 0.0);
        timer.initialize(&start, 0.0, None);
        (timer, start)
    }

    #[test]
    fn test_initialize_builds_line_across_pose() {
        let (timer, start) = armed_timer();
        assert!(timer.is_active());
        let line = timer.start_line().unwrap();
        assert_relative_eq!(line.length_m(), 0.15, epsilon = 1e-12);
        let c = line.center();
        assert_relative_eq!(c.x, start.x_m, epsilon = 1e-12);
        assert_relative_eq!(c.y, start.y_m, epsilon = 1e-12);
    }

    #[test]
    fn test_first_crossing_arms_second_completes() {
        let (mut timer, _) = armed_timer();
        // Approach from behind, cross at t=1.
        let before = Pose::new(0.9, 0.0, 0.0);
        let after = Pose::new(1.05, 0.0, 0.0);
        assert_eq!(timer.update(0.5, &before), LapUpdate::default());
        let first = timer.update(1.0, &after);
        assert!(!first.new_lap_completed);
        assert!(timer.display_data().lap_in_progress);

        // Go around and cross again at t=11.
        assert_eq!(timer.update(10.5, &before), LapUpdate::default());
        let second = timer.update(11.0, &after);
        assert!(second.new_lap_completed);
        assert_relative_eq!(second.completed_lap_time_s.unwrap(), 10.0, epsilon = 1e-9);
        let display = timer.display_data();
        assert_eq!(display.laps_completed, 1);
        assert_relative_eq!(display.last_lap_s.unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_best_lap_keeps_minimum() {
        let (mut timer, _) = armed_timer();
        let before = Pose::new(0.9, 0.0, 0.0);
        let after = Pose::new(1.05, 0.0, 0.0);
        timer.update(0.0, &before);
        timer.update(1.0, &after); // arm
        timer.update(5.0, &before);
        timer.update(6.0, &after); // lap 1: 5 s
        timer.update(8.0, &before);
        timer.update(9.0, &after); // lap 2: 3 s
        let display = timer.display_data();
        assert_eq!(display.laps_completed, 2);
        assert_relative_eq!(display.last_lap_s.unwrap(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(display.best_lap_s.unwrap(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_backward_crossing_does_not_count() {
        let (mut timer, _) = armed_timer();
        // Robot drives backwards through the line (heading opposes lap
        // direction while the side flips back-to-front is never produced).
        let front = Pose::new(1.1, 0.0, std::f64::consts::PI);
        let back = Pose::new(0.9, 0.0, std::f64::consts::PI);
        timer.update(0.5, &front);
        let upd = timer.update(1.0, &back);
        assert!(!upd.new_lap_completed);
        assert!(!timer.display_data().lap_in_progress);
    }

    #[test]
    fn test_crossing_with_opposing_heading_is_rejected() {
        let (mut timer, _) = armed_timer();
        // Side transition back-to-front but heading reversed (sliding
        // backwards over the line): must not arm.
        let before = Pose::new(0.9, 0.0, std::f64::consts::PI);
        let after = Pose::new(1.05, 0.0, std::f64::consts::PI);
        timer.update(0.5, &before);
        let upd = timer.update(1.0, &after);
        assert!(!upd.new_lap_completed);
        assert!(!timer.display_data().lap_in_progress);
    }

    #[test]
    fn test_crossing_outside_extent_ignored() {
        let (mut timer, _) = armed_timer();
        // Line spans 0.15 m along y; pass the line 0.5 m off to the side.
        let before = Pose::new(0.9, 0.5, 0.0);
        let after = Pose::new(1.05, 0.5, 0.0);
        timer.update(0.5, &before);
        let upd = timer.update(1.0, &after);
        assert!(!upd.new_lap_completed);
        assert!(!timer.display_data().lap_in_progress);
    }

    #[test]
    fn test_initialize_with_existing_line_preserves_endpoints() {
        let (mut timer, start) = armed_timer();
        let original = *timer.start_line().unwrap();
        timer.reset();
        timer.initialize(&start, 0.0, Some(original));
        assert_eq!(*timer.start_line().unwrap(), original);
    }

    #[test]
    fn test_reset_clears_statistics_but_keeps_line() {
        let (mut timer, _) = armed_timer();
        let before = Pose::new(0.9, 0.0, 0.0);
        let after = Pose::new(1.05, 0.0, 0.0);
        timer.update(0.0, &before);
        timer.update(1.0, &after);
        timer.update(5.0, &before);
        timer.update(6.0, &after);
        assert_eq!(timer.display_data().laps_completed, 1);

        timer.reset();
        let display = timer.display_data();
        assert_eq!(display.laps_completed, 0);
        assert_eq!(display.last_lap_s, None);
        assert!(!display.lap_in_progress);
        assert!(timer.start_line().is_some());
        assert!(timer.is_active());
    }

    #[test]
    fn test_update_without_line_is_inert() {
        let mut timer = LapTimer::new(0.10, 0.15);
        let upd = timer.update(1.0, &Pose::default());
        assert_eq!(upd, LapUpdate::default());
        assert!(!timer.is_active());
    }
}
