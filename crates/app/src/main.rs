//! Realtime viewer for the line-follower simulation.
//!
//! Runs the engine against the bundled ring track (or a track image given on
//! the command line), driving it either with the reference PID follower or
//! with the keyboard, and shows the rendered frame plus live wheel-speed
//! plots.
//!
//! Usage: `linesim-app [track.png] [params.json]`

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};
use log::{error, info, warn};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use control::{LineFollower, LineFollowerConfig};
use render::Canvas;
use simcore::{Pose, RobotGeometry};
use simengine::{SimParamsUpdate, SimulationEngine, StepSnapshot};
use trackmap::{TrackSource, demo};

// Demo track piece size
const DEMO_CELL_PX: u32 = 200;

// Cap on simulation catch-up per frame
const MAX_STEPS_PER_FRAME: usize = 400;

// Plot window and sampling
const PLOT_DT: f64 = 0.02;

fn main() -> eframe::Result<()> {
    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed, ColorChoice::Auto).ok();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1180.0, 860.0])
            .with_title("Line Follower Sim"),
        ..Default::default()
    };
    eframe::run_native(
        "Line Follower Sim",
        options,
        Box::new(|_cc| Ok(Box::new(App::new()))),
    )
}

struct Trace {
    t: VecDeque<f64>,
    vl: VecDeque<f64>,
    vr: VecDeque<f64>,
    capacity: usize,
}

impl Trace {
    fn new(seconds: f64, sample_dt: f64) -> Self {
        let capacity = (seconds / sample_dt).ceil() as usize + 1;
        Self {
            t: VecDeque::with_capacity(capacity),
            vl: VecDeque::with_capacity(capacity),
            vr: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn set_window_seconds(&mut self, seconds: f64, sample_dt: f64) {
        self.capacity = (seconds / sample_dt).ceil() as usize + 1;
        self.trim_to_capacity();
    }

    fn push(&mut self, t: f64, vl: f64, vr: f64) {
        self.t.push_back(t);
        self.vl.push_back(vl);
        self.vr.push_back(vr);
        self.trim_to_capacity();
    }

    fn clear(&mut self) {
        self.t.clear();
        self.vl.clear();
        self.vr.clear();
    }

    fn trim_to_capacity(&mut self) {
        let mut trim = |v: &mut VecDeque<f64>| while v.len() > self.capacity { v.pop_front(); };
        trim(&mut self.t);
        trim(&mut self.vl);
        trim(&mut self.vr);
    }

    fn line<'a>(points: &'a VecDeque<f64>, t: &'a VecDeque<f64>) -> PlotPoints<'a> {
        PlotPoints::from_iter(t.iter().copied().zip(points.iter().copied()).map(|(x, y)| [x, y]))
    }
}

struct App {
    engine: SimulationEngine,
    follower: LineFollower,
    start_pose: Pose,

    // frame buffer + uploaded texture
    canvas: Canvas,
    texture: Option<egui::TextureHandle>,

    // pacing
    paused: bool,
    sim_speed: f64,
    last_frame: Instant,
    accumulator_s: f64,

    // controls
    manual: bool,
    manual_left_pwm: f64,
    manual_right_pwm: f64,

    // parameter slider mirrors
    noise: f64,
    perturb: f64,
    response: f64,

    window_s: f64,
    trace: Trace,
    last_snapshot: Option<StepSnapshot>,
}

impl App {
    fn new() -> Self {
        let mut engine = SimulationEngine::new(RobotGeometry::default());

        let mut args = std::env::args().skip(1);
        let track_path = args.next();
        let params_path = args.next();

        let loaded = match &track_path {
            Some(path) => engine.load_track(TrackSource::Path(path.into()), None),
            None => {
                let (image, grid) = demo::ring_track(DEMO_CELL_PX);
                engine.load_track(TrackSource::Raster { image, start_pose: None }, Some(&grid))
            }
        };
        let info = match loaded {
            Ok(info) => info,
            Err(e) => {
                error!("track load failed ({e}), falling back to the bundled ring");
                let (image, grid) = demo::ring_track(DEMO_CELL_PX);
                engine
                    .load_track(TrackSource::Raster { image, start_pose: None }, Some(&grid))
                    .expect("bundled track always decodes")
            }
        };
        info!("track loaded: {}x{} px", info.width_px, info.height_px);

        if let Some(path) = params_path {
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<SimParamsUpdate>(&s).map_err(|e| e.to_string()))
            {
                Ok(update) => engine.update_parameters(&update),
                Err(e) => warn!("ignoring parameter file {path}: {e}"),
            }
        }

        let params = *engine.params();
        let start_pose = engine.robot().pose();
        App {
            follower: LineFollower::new(LineFollowerConfig::default()),
            start_pose,
            canvas: Canvas::new(info.width_px, info.height_px),
            texture: None,
            paused: false,
            sim_speed: 1.0,
            last_frame: Instant::now(),
            accumulator_s: 0.0,
            manual: false,
            manual_left_pwm: 0.0,
            manual_right_pwm: 0.0,
            noise: params.sensor_noise_prob,
            perturb: params.movement_perturb_factor,
            response: params.motor_response_factor,
            window_s: 10.0,
            trace: Trace::new(10.0, PLOT_DT),
            last_snapshot: None,
            engine,
        }
    }

    fn reset(&mut self) {
        self.engine.reset_simulation_state(self.start_pose, None);
        self.follower.reset();
        self.trace.clear();
        self.accumulator_s = 0.0;
        self.last_snapshot = None;
    }

    fn update_sim(&mut self, wall_dt_s: f64) {
        self.accumulator_s += wall_dt_s * self.sim_speed;
        let dt = self.engine.params().time_step_s;
        let mut steps = 0;
        while self.accumulator_s >= dt && steps < MAX_STEPS_PER_FRAME {
            let (left_pwm, right_pwm) = if self.manual {
                (self.manual_left_pwm, self.manual_right_pwm)
            } else {
                // The follower plays the user control code: it only ever sees
                // the previous tick's sensor readings.
                self.follower.compute(self.engine.robot().sensors(), dt)
            };
            match self.engine.simulation_step(left_pwm, right_pwm) {
                Ok(snapshot) => {
                    if snapshot.new_lap_completed {
                        info!(
                            "lap {} completed in {:.2} s",
                            snapshot.lap.laps_completed,
                            snapshot.completed_lap_time_s.unwrap_or_default()
                        );
                    }
                    self.trace.push(
                        snapshot.sim_time_s,
                        snapshot.applied_speeds_mps.0,
                        snapshot.applied_speeds_mps.1,
                    );
                    self.last_snapshot = Some(snapshot);
                }
                Err(e) => {
                    error!("simulation step failed: {e}");
                    self.paused = true;
                    break;
                }
            }
            self.accumulator_s -= dt;
            steps += 1;
        }
        // Drop any backlog we could not burn through this frame.
        if steps == MAX_STEPS_PER_FRAME {
            self.accumulator_s = 0.0;
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if !self.manual {
            return;
        }
        let mut forward: f64 = 0.0;
        let mut rotate: f64 = 0.0;
        ctx.input(|i| {
            if i.key_down(egui::Key::ArrowUp) {
                forward = 0.8;
            }
            if i.key_down(egui::Key::ArrowDown) {
                forward = -0.8;
            }
            if i.key_down(egui::Key::ArrowLeft) {
                rotate = -0.3;
            }
            if i.key_down(egui::Key::ArrowRight) {
                rotate = 0.3;
            }
            if i.key_pressed(egui::Key::Space) {
                forward = 0.0;
                rotate = 0.0;
            }
        });
        self.manual_left_pwm = ((forward - rotate) * 255.0).clamp(-255.0, 255.0);
        self.manual_right_pwm = ((forward + rotate) * 255.0).clamp(-255.0, 255.0);
    }

    fn upload_frame(&mut self, ctx: &egui::Context) {
        self.engine.draw(&mut self.canvas);
        let size = [self.canvas.width() as usize, self.canvas.height() as usize];
        let frame = egui::ColorImage::from_rgba_unmultiplied(size, self.canvas.as_image().as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(frame, egui::TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("sim-frame", frame, egui::TextureOptions::NEAREST));
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keyboard(ctx);

        if !self.paused {
            let now = Instant::now();
            let wall_dt = now.duration_since(self.last_frame).as_secs_f64().min(0.25);
            self.last_frame = now;
            self.update_sim(wall_dt);
        } else {
            self.last_frame = Instant::now();
        }

        self.upload_frame(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if ui.button(if self.paused { "▶ Resume" } else { "⏸ Pause" }).clicked() {
                    self.paused = !self.paused;
                }
                if ui.button("⟲ Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.label("Sim speed");
                ui.add(egui::Slider::new(&mut self.sim_speed, 0.1..=8.0).logarithmic(true).suffix("×"));

                ui.separator();
                ui.checkbox(&mut self.manual, "Keyboard drive (↑/↓/←/→)");

                ui.separator();
                ui.label("Sensor noise");
                if ui.add(egui::Slider::new(&mut self.noise, 0.0..=0.5)).changed() {
                    self.engine.update_parameters(&SimParamsUpdate {
                        sensor_noise_prob: Some(self.noise),
                        ..Default::default()
                    });
                }
                ui.label("Perturbation");
                if ui.add(egui::Slider::new(&mut self.perturb, 0.0..=0.5)).changed() {
                    self.engine.update_parameters(&SimParamsUpdate {
                        movement_perturb_factor: Some(self.perturb),
                        ..Default::default()
                    });
                }
                ui.label("Motor response");
                if ui.add(egui::Slider::new(&mut self.response, 0.01..=1.0)).changed() {
                    self.engine.update_parameters(&SimParamsUpdate {
                        motor_response_factor: Some(self.response),
                        ..Default::default()
                    });
                }

                ui.separator();
                ui.label("Window");
                if ui.add(egui::Slider::new(&mut self.window_s, 2.0..=60.0).suffix(" s")).changed() {
                    self.trace.set_window_seconds(self.window_s, PLOT_DT);
                }
            });

            ui.horizontal_wrapped(|ui| {
                let pose = self.engine.robot().pose();
                ui.label(format!(
                    "t = {:.2} s | pose: x={:.3} m, y={:.3} m, θ={:.1}°",
                    self.engine.sim_time_s(),
                    pose.x_m,
                    pose.y_m,
                    pose.angle_rad.to_degrees()
                ));
                if let Some(snapshot) = &self.last_snapshot {
                    let lap = &snapshot.lap;
                    let fmt = |v: Option<f64>| v.map_or("--".to_string(), |s| format!("{s:.2} s"));
                    ui.separator();
                    ui.label(format!(
                        "laps: {} | last: {} | best: {}",
                        lap.laps_completed,
                        fmt(lap.last_lap_s),
                        fmt(lap.best_lap_s)
                    ));
                    if snapshot.out_of_track {
                        ui.separator();
                        ui.colored_label(egui::Color32::RED, "OUT OF TRACK");
                    }
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                cols[0].heading("Track");
                if let Some(texture) = &self.texture {
                    let side = cols[0].available_width().min(640.0);
                    cols[0].add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(side, side)));
                }

                cols[1].heading("Wheel Speeds");
                Plot::new("wheel_speeds")
                    .legend(Legend::default())
                    .allow_scroll(false)
                    .y_axis_min_width(48.0)
                    .x_axis_label("Time (s)")
                    .y_axis_label("v (m/s)")
                    .show(&mut cols[1], |plot_ui| {
                        let t = self.engine.sim_time_s();
                        let x_min = (t - self.window_s).max(0.0);
                        let x_max = t.max(self.window_s * 0.1);
                        let v_max = self.engine.params().effective_max_speed_mps() * 1.2;
                        plot_ui.set_plot_bounds(PlotBounds::from_min_max([x_min, -v_max], [x_max, v_max]));
                        plot_ui.line(Line::new("v_left (m/s)", Trace::line(&self.trace.vl, &self.trace.t)));
                        plot_ui.line(Line::new("v_right (m/s)", Trace::line(&self.trace.vr, &self.trace.t)));
                    });

                if let Some(snapshot) = &self.last_snapshot {
                    cols[1].separator();
                    cols[1].heading("Sensors (0 = on line)");
                    cols[1].horizontal(|ui| {
                        for (id, reading) in &snapshot.sensors {
                            let color = if reading.is_on_line() {
                                egui::Color32::GREEN
                            } else {
                                egui::Color32::DARK_RED
                            };
                            ui.colored_label(color, format!("{id}={}", reading.as_raw()));
                        }
                    });
                }
            });
        });

        ctx.request_repaint_after(Duration::from_millis(10));
    }
}
