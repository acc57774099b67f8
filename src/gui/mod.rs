//! The eframe/egui plot window.
//!
//! The window is the frame-driven consumer: each frame it drains the dispatch bridge into
//! its [`PlotConsumer`], then draws one plot per axis from the registry's buffer snapshots.

use crate::bridge::EventReceiver;
use crate::consumer::{PlotConsumer, RenderSink, RenderUpdate};
use crate::data::palette::Color;
use crate::data::registry::{Axis, Registry};
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use tracing::info;

/// Upper bound on events applied per frame, so a burst cannot stall rendering.
const MAX_EVENTS_PER_FRAME: usize = 10_000;

/// Counts what changed; the window itself redraws from registry snapshots.
#[derive(Debug, Default)]
pub struct FrameSink {
    pub structural_changes: u64,
    pub batches: u64,
    pub dropped_signals: u64,
}

impl RenderSink for FrameSink {
    fn render(&mut self, update: RenderUpdate) {
        match update {
            RenderUpdate::Tails(_) => self.batches += 1,
            RenderUpdate::UnknownSignals(ids) => self.dropped_signals += ids.len() as u64,
            _ => self.structural_changes += 1,
        }
    }
}

fn color32(color: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// The main window.
pub struct PlotterApp {
    consumer: PlotConsumer<FrameSink>,
    events: EventReceiver,
    closed: bool,
}

impl PlotterApp {
    pub fn new(consumer: PlotConsumer<FrameSink>, events: EventReceiver) -> Self {
        Self {
            consumer,
            events,
            closed: false,
        }
    }

    fn draw_axis(ui: &mut egui::Ui, registry: &Registry, axis: &Axis, height: f32) {
        ui.label(RichText::new(&axis.title).strong());
        Plot::new(("axis", axis.id))
            .height(height)
            .legend(Legend::default())
            .x_axis_label(axis.x_label.clone())
            .y_axis_label(axis.y_label.clone())
            .show(ui, |plot_ui| {
                for signal in registry.signals_on(axis.id) {
                    let points: PlotPoints = signal
                        .buffer()
                        .iter()
                        .enumerate()
                        .map(|(i, v)| [i as f64, v])
                        .collect();
                    plot_ui.line(
                        Line::new(points)
                            .name(&signal.name)
                            .color(color32(signal.color)),
                    );
                }
            });
    }

    fn drain_on_close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.consumer.shutdown(&mut self.events);
            info!(
                batches = self.consumer.sink().batches,
                "Plot window closed"
            );
        }
    }
}

impl eframe::App for PlotterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.drain_on_close();
            return;
        }

        self.consumer
            .drain_pending(&mut self.events, MAX_EVENTS_PER_FRAME);

        egui::CentralPanel::default().show(ctx, |ui| {
            let registry = self.consumer.registry();
            let axis_count = registry.axis_count();
            if axis_count == 0 {
                ui.centered_and_justified(|ui| {
                    ui.label("Waiting for a producer to add an axis...");
                });
                return;
            }

            // Title row plus spacing per axis.
            let per_axis = ui.available_height() / axis_count as f32 - 28.0;
            let height = per_axis.max(80.0);
            egui::ScrollArea::vertical().show(ui, |ui| {
                for axis in registry.axes() {
                    Self::draw_axis(ui, registry, axis, height);
                }
            });
        });

        ctx.request_repaint();
    }
}

/// Opens the plot window on the current thread and blocks until it is closed.
pub fn run(title: &str, app: PlotterApp) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 720.0])
            .with_min_inner_size([480.0, 320.0])
            .with_title(title),
        ..Default::default()
    };

    eframe::run_native(title, options, Box::new(|_cc| Ok(Box::new(app))))
}
