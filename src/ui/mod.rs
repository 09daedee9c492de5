//! Panels and plots of the sweep viewer.

pub mod panels;
pub mod plot;
