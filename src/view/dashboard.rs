// src/view/dashboard.rs
//! Live egui dashboard
//!
//! Renders a [`ViewerSession`]: one scrolling plot per selected channel,
//! contact quality badges, and the session controls (zoom, play/stop,
//! layout, refresh interval). Incoming chunks are drained from a channel
//! each frame, so the data source can be a network reader thread or a
//! recording replay.

use std::time::Duration;

use crossbeam::channel::Receiver;
use egui_plot::{Line, Plot, PlotPoints};

use crate::view::session::{ChannelQuality, StreamChunk, ViewerCommand, ViewerSession};

/// Run the dashboard window until it is closed.
pub fn run_dashboard(
    session: ViewerSession,
    receiver: Option<Receiver<StreamChunk>>,
) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("EEG streaming"),
        ..Default::default()
    };

    eframe::run_native(
        "EEG streaming",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp { session, receiver }))),
    )
}

struct DashboardApp {
    session: ViewerSession,
    receiver: Option<Receiver<StreamChunk>>,
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(receiver) = &self.receiver {
            while let Ok(chunk) = receiver.try_recv() {
                self.session.push_chunk(&chunk);
            }
        }

        self.controls(ctx);
        self.plots(ctx);

        ctx.request_repaint_after(Duration::from_millis(self.session.refresh_ms()));
    }
}

impl DashboardApp {
    fn controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.heading("EEG streaming");
                ui.separator();

                if ui.button("Zoom in").clicked() {
                    self.session.apply(ViewerCommand::ZoomIn);
                }
                if ui.button("Zoom out").clicked() {
                    self.session.apply(ViewerCommand::ZoomOut);
                }
                if ui.button("Reset").clicked() {
                    self.session.apply(ViewerCommand::ResetZoom);
                }
                let play_label = if self.session.is_playing() {
                    "Stop"
                } else {
                    "Play"
                };
                if ui.button(play_label).clicked() {
                    self.session.apply(ViewerCommand::TogglePlay);
                }

                let mut expanded = self.session.is_expanded();
                if ui.checkbox(&mut expanded, "Expand graphs").changed() {
                    self.session.apply(ViewerCommand::ToggleExpand);
                }

                let mut refresh_ms = self.session.refresh_ms();
                if ui
                    .add(
                        egui::Slider::new(&mut refresh_ms, 50..=5000)
                            .text("update interval (ms)"),
                    )
                    .changed()
                {
                    self.session.apply(ViewerCommand::SetRefreshMs(refresh_ms));
                }
            });

            ui.horizontal_wrapped(|ui| {
                let available: Vec<String> = self
                    .session
                    .streams()
                    .first()
                    .map(|s| s.channels.clone())
                    .unwrap_or_default();
                let mut selected: Vec<String> = self.session.selected_channels().to_vec();
                let mut changed = false;
                for channel in &available {
                    let mut on = selected.contains(channel);
                    if ui.checkbox(&mut on, channel).changed() {
                        changed = true;
                        if on {
                            selected.push(channel.clone());
                        } else {
                            selected.retain(|c| c != channel);
                        }
                    }
                }
                if changed {
                    self.session.apply(ViewerCommand::SelectChannels(selected));
                }
            });
        });
    }

    fn plots(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for stream_index in 0..self.session.streams().len() {
                    self.stream_plots(ui, stream_index);
                }
            });
        });
    }

    fn stream_plots(&self, ui: &mut egui::Ui, stream_index: usize) {
        let stream = &self.session.streams()[stream_index];
        ui.heading(&stream.name);

        let shown: Vec<(usize, String)> = stream
            .channels
            .iter()
            .enumerate()
            .filter(|(_, c)| self.session.selected_channels().contains(c))
            .map(|(i, c)| (i, c.clone()))
            .collect();

        let columns = if self.session.is_expanded() { 1 } else { 2 };
        let window = self.session.window_rows();

        for row_of_plots in shown.chunks(columns) {
            ui.columns(columns, |cols| {
                for (col_ui, (channel_index, label)) in cols.iter_mut().zip(row_of_plots) {
                    self.channel_plot(col_ui, stream_index, stream, *channel_index, label, window);
                }
            });
        }
        ui.separator();
    }

    fn channel_plot(
        &self,
        ui: &mut egui::Ui,
        stream_index: usize,
        stream: &crate::view::session::StreamBuffer,
        channel_index: usize,
        label: &str,
        window: usize,
    ) {
        let quality = self.session.quality(stream_index, label);
        let (badge, color) = match quality {
            ChannelQuality::Good => ("GOOD \u{2713}", egui::Color32::from_rgb(0, 160, 60)),
            ChannelQuality::Bad => ("BAD \u{2716}", egui::Color32::from_rgb(200, 40, 40)),
            ChannelQuality::Unknown => ("\u{2026}", egui::Color32::GRAY),
        };
        ui.horizontal(|ui| {
            ui.label(label);
            ui.label(egui::RichText::new(badge).color(color));
        });

        let mut start_ts = None;
        let points: PlotPoints = stream
            .tail(window)
            .filter_map(|(ts, row)| {
                let value = *row.get(channel_index)?;
                let start = *start_ts.get_or_insert(ts);
                Some([ts - start, f64::from(value)])
            })
            .collect();

        Plot::new(format!("plot-{}-{}", stream_index, label))
            .height(180.0)
            .allow_drag(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(label, points));
            });
    }
}
