use anyhow::anyhow;
use eframe::egui;

use crate::collect::ResultCollector;
use crate::config::PlotConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SweepViewerApp {
    pub state: AppState,
}

impl SweepViewerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for SweepViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: swept values ----
        egui::SidePanel::left("sweep_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: one plot per spectrum ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::sweep_plots(ui, &self.state);
        });
    }
}

/// Show the collected curves in a window, blocking until it is closed.
pub fn render(collector: ResultCollector, plot: PlotConfig, title: &str) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 700.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let state = AppState::new(collector, plot);
    eframe::run_native(
        title,
        options,
        Box::new(move |_cc| Ok(Box::new(SweepViewerApp::new(state)))),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
