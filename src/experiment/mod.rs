/// Synthetic experiment: instrument, sample, container and binned data.
///
/// Architecture:
/// ```text
///   ExperimentConfig (JSON / preset)
///        │
///        ▼
///   ┌────────────────────┐
///   │  build_experiment   │  validate geometry, resolve formulas,
///   └────────────────────┘  synthesise TOF spectra
///        │
///        ▼
///   ┌────────────────────┐
///   │   convert_units     │  TOF → wavelength, elastic, in place
///   └────────────────────┘
///        │
///        ▼
///    Experiment (immutable, uniquely named)
/// ```
pub mod geometry;
pub mod instrument;
pub mod material;
pub mod workspace;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use geometry::{check_containment, Shape};
use instrument::InstrumentConfig;
use material::{Material, MaterialConfig};
use workspace::{EMode, Workspace, XUnit};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    pub geometry: Shape,
    pub material: MaterialConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub instrument: InstrumentConfig,
    pub sample: VolumeConfig,
    #[serde(default)]
    pub container: Option<VolumeConfig>,
}

// ---------------------------------------------------------------------------
// Experiment
// ---------------------------------------------------------------------------

/// A validated volume: shape plus resolved material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Volume {
    pub geometry: Shape,
    pub material: Material,
}

/// Fully built experiment, in wavelength.
///
/// Fields are private so nothing can modify the experiment once the unit
/// conversion has run; a sweep only ever borrows it.
#[derive(Debug, Clone, Serialize)]
pub struct Experiment {
    handle: String,
    instrument: InstrumentConfig,
    sample: Volume,
    container: Option<Volume>,
    workspace: Workspace,
}

impl Experiment {
    /// Name the experiment is known by in the external framework.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn instrument(&self) -> &InstrumentConfig {
        &self.instrument
    }

    pub fn sample(&self) -> &Volume {
        &self.sample
    }

    pub fn container(&self) -> Option<&Volume> {
        self.container.as_ref()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn num_spectra(&self) -> usize {
        self.workspace.len()
    }
}

/// Build the synthetic experiment and convert it to wavelength.
///
/// Every call gets a fresh handle so repeated runs in one process never
/// collide in the external framework.
pub fn build_experiment(config: &ExperimentConfig) -> Result<Experiment> {
    config.instrument.validate()?;

    config.sample.geometry.validate("sample")?;
    let sample = Volume {
        geometry: config.sample.geometry.clone(),
        material: Material::from_config(&config.sample.material)?,
    };

    let container = match &config.container {
        Some(c) => {
            c.geometry.validate("container")?;
            check_containment(&sample.geometry, &c.geometry)?;
            Some(Volume {
                geometry: c.geometry.clone(),
                material: Material::from_config(&c.material)?,
            })
        }
        None => None,
    };

    let mut workspace = Workspace::powder_diffraction(&config.instrument);
    workspace.convert_units(XUnit::Wavelength, EMode::Elastic, &config.instrument)?;

    let handle = format!("ws_{}", Uuid::new_v4().simple());
    log::info!(
        "Built experiment {handle}: {} spectra, sample {} {}, container {}",
        workspace.len(),
        sample.geometry.name(),
        sample.material.chemical_formula,
        container
            .as_ref()
            .map(|c| format!("{} {}", c.geometry.name(), c.material.chemical_formula))
            .unwrap_or_else(|| "none".to_string()),
    );

    Ok(Experiment {
        handle,
        instrument: config.instrument.clone(),
        sample,
        container,
        workspace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::error::Error;

    #[test]
    fn preset_builds_in_wavelength() {
        let config = RunConfig::multiple_scattering().experiment;
        let experiment = build_experiment(&config).unwrap();

        assert_eq!(experiment.num_spectra(), 2);
        assert_eq!(experiment.workspace().unit, XUnit::Wavelength);
        assert!(experiment.container().is_some());
        assert!(experiment.handle().starts_with("ws_"));
    }

    #[test]
    fn handles_are_unique_per_build() {
        let config = RunConfig::smoke().experiment;
        let a = build_experiment(&config).unwrap();
        let b = build_experiment(&config).unwrap();
        assert_ne!(a.handle(), b.handle());
    }

    #[test]
    fn negative_radius_fails_the_build() {
        let mut config = RunConfig::smoke().experiment;
        config.sample.geometry = Shape::Cylinder {
            height: 1.0,
            radius: -0.2,
            center: [0.0; 3],
        };
        assert!(matches!(
            build_experiment(&config),
            Err(Error::InvalidGeometry { part: "sample", .. })
        ));
    }

    #[test]
    fn unknown_formula_fails_the_build() {
        let mut config = RunConfig::smoke().experiment;
        if let Some(container) = config.container.as_mut() {
            container.material.chemical_formula = "Vx".into();
        }
        assert!(matches!(
            build_experiment(&config),
            Err(Error::UnknownElement { .. })
        ));
    }
}
