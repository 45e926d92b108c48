//! Interactive viewer for the particle growth simulation, built with
//! eframe/egui.
//!
//! [`Viewer`] owns a [`SimulationWorker`] and never touches simulation
//! state directly: it posts `init`/`resize`/`update` commands and draws
//! whichever [`Frame`] came back last.

use crate::style;
use eframe::App;
use glam::Vec2;
use grove_core::{Config, Frame, GroveError, SimulationWorker};
use std::time::Duration;

/// How long the "Step" button waits for its frame.
const STEP_TIMEOUT: Duration = Duration::from_millis(250);

/// Main application state for the viewer.
///
/// ### Fields
/// - `worker` - Simulation thread handle.
/// - `frame` - Most recent frame received from the worker.
/// - `canvas` - Canvas size last sent to the worker, `None` before the
///   first layout.
/// - `running` - Whether an update is posted every repaint.
/// - `show_particles` - Draw particle dots on top of connections.
/// - `last_frame_time` / `last_frame_dt` - Arrival time of the latest frame
///   and the gap to the one before it (seconds, display only).
pub struct Viewer {
    worker: SimulationWorker,
    cfg: Config,
    frame: Frame,
    canvas: Option<egui::Vec2>,

    running: bool,
    show_particles: bool,

    last_frame_time: f64,
    last_frame_dt: f64,
}

impl Viewer {
    /// Starts the simulation thread. The real canvas size is sent once the
    /// central panel has been laid out.
    pub fn new(cfg: Config) -> Result<Self, GroveError> {
        let worker = SimulationWorker::spawn(cfg.clone(), 800.0, 600.0)?;
        Ok(Self {
            worker,
            cfg,
            frame: Frame::default(),
            canvas: None,
            running: true,
            show_particles: false,
            last_frame_time: 0.0,
            last_frame_dt: 0.0,
        })
    }

    /// Sends `init` on the first layout and `resize` whenever the canvas
    /// size changes.
    ///
    /// ### Returns
    /// `true` if a command was sent.
    fn sync_canvas(&mut self, size: egui::Vec2) -> bool {
        if self.canvas == Some(size) {
            return false;
        }
        if self.canvas.is_none() {
            self.worker.init(size.x, size.y);
        } else {
            self.worker.resize(size.x, size.y);
        }
        self.canvas = Some(size);
        self.frame = Frame::default();
        true
    }

    /// Restarts the simulation on the current canvas.
    fn reset(&mut self) {
        if let Some(size) = self.canvas {
            self.worker.resize(size.x, size.y);
        }
        self.frame = Frame::default();
    }

    /// Keeps the newest frame the worker has produced, if any.
    fn poll_frame(&mut self, now: f64) {
        if let Some(frame) = self.worker.latest_frame() {
            self.accept(frame, now);
        }
    }

    /// Posts one update and waits briefly for its frame.
    fn step_once(&mut self, now: f64) {
        self.worker.update(now * 1000.0);
        if let Some(frame) = self.worker.recv_frame_timeout(STEP_TIMEOUT) {
            self.accept(frame, now);
        }
    }

    fn accept(&mut self, frame: Frame, now: f64) {
        if self.last_frame_time > 0.0 {
            self.last_frame_dt = now - self.last_frame_time;
        }
        self.last_frame_time = now;
        self.frame = frame;
    }

    /// Maps a canvas position to screen space. Both have `y` pointing down.
    fn canvas_to_screen(p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        rect.min + egui::vec2(p.x, p.y)
    }

    /// Builds the top panel (run controls).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    self.step_once(now);
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.checkbox(&mut self.show_particles, "Particles");
            });
        });
    }

    /// Builds the bottom status bar (frame contents and timing).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("frame dt = {:.3} s", self.last_frame_dt));
                ui.separator();
                ui.label(format!("connections = {}", self.frame.connections.len()));
                ui.label(format!("particles = {}", self.frame.particles.len()));
                ui.label(format!("max distance = {:.0}", self.cfg.max_distance));
            });
        });
    }

    /// Builds the central panel and draws the latest frame.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                let painter = ui.painter_at(rect);

                self.sync_canvas(rect.size());

                let now = ctx.input(|i| i.time);
                if self.running {
                    self.worker.update(now * 1000.0);
                }
                self.poll_frame(now);

                let particles = &self.frame.particles;
                for c in &self.frame.connections {
                    let (Some(a), Some(b)) = (particles.get(c.a), particles.get(c.b)) else {
                        continue;
                    };
                    if let Some(stroke) = style::connection_stroke(a, b, c, self.frame.max_distance) {
                        painter.line_segment(
                            [
                                Self::canvas_to_screen(a.pos, rect),
                                Self::canvas_to_screen(b.pos, rect),
                            ],
                            stroke,
                        );
                    }
                }

                if self.show_particles {
                    for p in particles {
                        let color = style::hsla(p.hue, 0.8, 0.75, p.density);
                        painter.circle_filled(Self::canvas_to_screen(p.pos, rect), 1.2, color);
                    }
                }

                if self.running {
                    ctx.request_repaint();
                }
            });
    }
}

impl App for Viewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_central_panel(ctx);
    }
}
