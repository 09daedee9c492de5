use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::export::{export_file, EXPORT_EXTENSIONS};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – swept values
// ---------------------------------------------------------------------------

/// Render the side panel listing every swept value.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Swept values");
    ui.separator();

    if state.collector.is_empty() {
        ui.label("No results collected.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all();
        }
        if ui.small_button("None").clicked() {
            state.select_none();
        }
    });

    // Clone what we need so we can mutate state inside the table.
    let entries = state.legend_entries();
    let spectra = state.collector.spectra();
    let means: Vec<Vec<Option<f64>>> = (0..entries.len())
        .map(|order| {
            spectra
                .iter()
                .map(|&s| {
                    state
                        .collector
                        .curves(s)
                        .iter()
                        .find(|c| c.order == order)
                        .and_then(|c| mean(&c.y))
                })
                .collect()
        })
        .collect();

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::auto().at_least(70.0))
        .columns(Column::auto().at_least(60.0), spectra.len())
        .header(20.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Show");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("Size");
            });
            for s in &spectra {
                header.col(|ui: &mut Ui| {
                    ui.strong(format!("⟨y⟩ {s}"));
                });
            }
        })
        .body(|mut body| {
            for (order, (label, color)) in entries.iter().enumerate() {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        let mut checked = state.visible.get(order).copied().unwrap_or(true);
                        if ui.checkbox(&mut checked, "").changed() {
                            state.toggle(order);
                        }
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(RichText::new(label).color(*color));
                    });
                    for m in &means[order] {
                        row.col(|ui: &mut Ui| {
                            match m {
                                Some(v) => ui.label(format!("{v:.4}")),
                                None => ui.label("–"),
                            };
                        });
                    }
                });
            }
        });
}

// Mean over finite bins
fn mean(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} values swept, {} shown",
            state.collector.len(),
            state.n_visible()
        ));

        ui.separator();

        if ui.selectable_label(state.plot.log_y, "Log scale").clicked() {
            state.plot.log_y = !state.plot.log_y;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export swept curves")
        .set_file_name("sweep.parquet")
        .add_filter("Supported files", &EXPORT_EXTENSIONS)
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match export_file(&state.collector, &path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mean;

    #[test]
    fn mean_of_empty_curve_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[f64::NAN, 2.0, 4.0]), Some(3.0));
        assert_eq!(mean(&[f64::NAN]), None);
    }
}
