use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Sweep plots (central panel)
// ---------------------------------------------------------------------------

/// Render one plot per observed spectrum, side by side.
pub fn sweep_plots(ui: &mut Ui, state: &AppState) {
    let spectra = state.collector.spectra();
    if spectra.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("The sweep produced no curves");
        });
        return;
    }

    let legend_at = legend_position(state.plot.legend_on, spectra.len());
    ui.columns(spectra.len(), |columns: &mut [Ui]| {
        for (position, (ui, &spectrum)) in columns.iter_mut().zip(&spectra).enumerate() {
            spectrum_plot(ui, state, position == legend_at, position == 0, spectrum);
        }
    });
}

/// Plot carrying the legend; falls back to the last one when fewer spectra
/// are shown than configured.
fn legend_position(legend_on: usize, n_plots: usize) -> usize {
    legend_on.min(n_plots.saturating_sub(1))
}

fn spectrum_plot(ui: &mut Ui, state: &AppState, with_legend: bool, first: bool, spectrum: usize) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(format!("Spectrum {spectrum}"));
    });

    let log_y = state.plot.log_y;
    let mut plot = Plot::new(("sweep_plot", spectrum))
        .x_axis_label(state.plot.x_label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    // Only the first plot carries the y label, only one carries the legend.
    if first {
        plot = plot.y_axis_label(state.plot.y_label.clone());
    }
    if with_legend {
        plot = plot.legend(Legend::default());
    }
    if log_y {
        plot = plot.y_axis_formatter(|mark, _range| format!("{:.1e}", 10f64.powf(mark.value)));
    }

    plot.show(ui, |plot_ui| {
        for curve in state.visible_curves(spectrum) {
            let points: PlotPoints = curve
                .x
                .iter()
                .zip(&curve.y)
                .filter(|(_, yi)| yi.is_finite())
                .filter_map(|(&xi, &yi)| match log_y {
                    true if yi > 0.0 => Some([xi, yi.log10()]),
                    true => None,
                    false => Some([xi, yi]),
                })
                .collect();

            let line = Line::new(points)
                .name(&curve.label)
                .color(state.color_for(curve.order))
                .width(state.plot.line_width);

            plot_ui.line(line);
        }
    });
}
