use eframe::egui::Color32;

use crate::collect::{ResultCollector, SweptCurve};
use crate::config::PlotConfig;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Curves collected by the sweep.
    pub collector: ResultCollector,

    /// Fixed axis configuration of the benchmark.
    pub plot: PlotConfig,

    /// One colour per swept value, in sweep order.
    pub colors: Vec<Color32>,

    /// Per swept value: whether its curves are drawn.
    pub visible: Vec<bool>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(collector: ResultCollector, plot: PlotConfig) -> Self {
        let colors = plot.colormap.sample(collector.len());
        let visible = vec![true; collector.len()];
        Self {
            collector,
            plot,
            colors,
            visible,
            status_message: None,
        }
    }

    /// Colour of the value at `order` in the sweep.
    pub fn color_for(&self, order: usize) -> Color32 {
        self.colors.get(order).copied().unwrap_or(Color32::GRAY)
    }

    /// Curves of `spectrum` that pass the visibility toggles.
    pub fn visible_curves(&self, spectrum: usize) -> impl Iterator<Item = &SweptCurve> {
        self.collector
            .curves(spectrum)
            .iter()
            .filter(|c| self.visible.get(c.order).copied().unwrap_or(true))
    }

    /// Legend entries (label → colour) in sweep order.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.collector
            .labels()
            .into_iter()
            .enumerate()
            .map(|(i, label)| (label, self.color_for(i)))
            .collect()
    }

    pub fn toggle(&mut self, order: usize) {
        if let Some(v) = self.visible.get_mut(order) {
            *v = !*v;
        }
    }

    pub fn select_all(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = true);
    }

    pub fn select_none(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = false);
    }

    pub fn n_visible(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}
