//! Element-size sweeps of neutron scattering corrections.
//!
//! A synthetic experiment is built once, a correction is run once per element
//! size, and the resulting curves are compared per spectrum.
//!
//! ```text
//!  build_experiment ──▶ sweep_each ──▶ ResultCollector ──▶ render / export
//!                          │
//!                          ▼
//!                   dyn Correction (Mantid, fakes in tests)
//! ```

pub mod app;
pub mod collect;
pub mod color;
pub mod config;
pub mod correction;
pub mod error;
pub mod experiment;
pub mod export;
pub mod state;
pub mod sweep;
pub mod ui;

pub use error::{Error, Result};
