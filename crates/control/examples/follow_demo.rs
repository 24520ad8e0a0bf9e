//! Headless line-follow run over the bundled ring track.
//!
//! Steps the full engine + follower pipeline for two simulated minutes and
//! prints lap times as they complete.

use control::{LineFollower, LineFollowerConfig};
use simcore::RobotGeometry;
use simengine::{SimParamsUpdate, SimulationEngine};
use trackmap::{TrackSource, demo};

fn main() {
    let mut engine = SimulationEngine::with_seed(RobotGeometry::default(), 7);
    let (image, grid) = demo::ring_track(200);
    let info = engine
        .load_track(TrackSource::Raster { image, start_pose: None }, Some(&grid))
        .expect("demo track decodes");
    println!("track {}x{} px, start pose {:?}", info.width_px, info.height_px, engine.robot().pose());

    // Snappier motors than the default so the demo corners cleanly.
    engine.update_parameters(&SimParamsUpdate {
        motor_response_factor: Some(0.5),
        ..Default::default()
    });

    let mut follower = LineFollower::new(LineFollowerConfig::default());
    let dt = engine.params().time_step_s;
    let ticks = (120.0 / dt) as usize;

    for _ in 0..ticks {
        // User control code runs on the previous tick's sensor readings,
        // exactly like the firmware loop it stands in for.
        let (left_pwm, right_pwm) = follower.compute(engine.robot().sensors(), dt);
        let snapshot = engine.simulation_step(left_pwm, right_pwm).expect("track is loaded");

        if snapshot.new_lap_completed {
            println!(
                "lap {} completed in {:.2} s",
                snapshot.lap.laps_completed,
                snapshot.completed_lap_time_s.unwrap_or_default()
            );
        }
        if snapshot.out_of_track {
            println!("robot left the track at t = {:.2} s", snapshot.sim_time_s);
            break;
        }
    }

    let lap = engine.lap_timer().display_data();
    println!(
        "done: {} laps, best {:?}, simulated {:.1} s",
        lap.laps_completed,
        lap.best_lap_s,
        engine.sim_time_s()
    );
}
