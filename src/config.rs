use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{Colormap, ColormapConfig};
use crate::correction::{CorrectionConfig, CorrectionKind, Method, SweptParameter};
use crate::error::Result;
use crate::experiment::geometry::Shape;
use crate::experiment::instrument::{Detector, InstrumentConfig};
use crate::experiment::material::MaterialConfig;
use crate::experiment::{ExperimentConfig, VolumeConfig};

// ---------------------------------------------------------------------------
// Sweep and plot settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(flatten)]
    pub correction: CorrectionConfig,
    /// Swept values in mm, in plotting order
    pub values: Vec<f64>,
    /// Spectrum indices to collect
    #[serde(default = "default_spectra")]
    pub spectra: Vec<usize>,
}

fn default_spectra() -> Vec<usize> {
    vec![0, 1]
}

/// Fixed axis and styling choices of a benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_x_label")]
    pub x_label: String,
    pub y_label: String,
    #[serde(default)]
    pub log_y: bool,
    pub colormap: ColormapConfig,
    #[serde(default = "default_line_width")]
    pub line_width: f32,
    /// Index of the subplot showing the legend
    #[serde(default = "default_legend_on")]
    pub legend_on: usize,
    /// Unit appended to legend labels
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_x_label() -> String {
    "Wavelength (Å)".to_string()
}

fn default_line_width() -> f32 {
    1.0
}

fn default_legend_on() -> usize {
    1
}

fn default_unit() -> String {
    "mm".to_string()
}

// ---------------------------------------------------------------------------
// RunConfig – everything one benchmark run needs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub experiment: ExperimentConfig,
    pub sweep: SweepConfig,
    pub plot: PlotConfig,
}

/// Names accepted by [`RunConfig::preset`]
pub const PRESETS: [&str; 3] = ["multiple-scattering", "paalman-pings", "smoke"];

impl RunConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Look up a built-in benchmark by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "multiple-scattering" => Some(Self::multiple_scattering()),
            "paalman-pings" => Some(Self::paalman_pings()),
            "smoke" => Some(Self::smoke()),
            _ => None,
        }
    }

    /// Container element size sweep of the multiple-scattering correction.
    ///
    /// The container wall is 0.5 mm thick, which bounds the coarsest size.
    pub fn multiple_scattering() -> Self {
        RunConfig {
            experiment: lab6_in_vanadium(10000.0, 0.3, 0.35),
            sweep: SweepConfig {
                correction: CorrectionConfig {
                    correction: CorrectionKind::MultipleScattering {
                        method: Method::SampleAndContainer,
                    },
                    swept: SweptParameter::ContainerElementSize,
                    element_size: Some(0.5),
                    container_element_size: None,
                    output_suffix: None,
                    stability_floor: None,
                },
                values: vec![0.5, 0.45, 0.4, 0.35, 0.3, 0.25, 0.2, 0.15, 0.1],
                spectra: default_spectra(),
            },
            plot: PlotConfig {
                x_label: default_x_label(),
                y_label: "ms_factor".to_string(),
                log_y: false,
                colormap: ColormapConfig {
                    name: Colormap::Plasma,
                    start: 0.3,
                    stop: 1.0,
                },
                line_width: 1.0,
                legend_on: 1,
                unit: default_unit(),
            },
        }
    }

    /// Element size sweep of the Paalman-Pings absorption correction.
    pub fn paalman_pings() -> Self {
        RunConfig {
            experiment: lab6_in_vanadium(10000.0, 0.3, 0.35),
            sweep: SweepConfig {
                correction: CorrectionConfig {
                    correction: CorrectionKind::PaalmanPings,
                    swept: SweptParameter::ElementSize,
                    element_size: None,
                    container_element_size: None,
                    output_suffix: None,
                    stability_floor: None,
                },
                values: vec![0.5, 0.45, 0.4, 0.35, 0.3, 0.25, 0.2, 0.1, 0.05, 0.02],
                spectra: default_spectra(),
            },
            plot: PlotConfig {
                x_label: default_x_label(),
                y_label: "abs_factor".to_string(),
                log_y: true,
                colormap: ColormapConfig {
                    name: Colormap::BluesReversed,
                    start: 0.0,
                    stop: 0.7,
                },
                line_width: 0.5,
                legend_on: 1,
                unit: default_unit(),
            },
        }
    }

    /// Single multiple-scattering run on a short TOF range.
    pub fn smoke() -> Self {
        let mut config = Self::multiple_scattering();
        config.experiment = lab6_in_vanadium(1500.0, 0.2, 0.25);
        config.sweep.correction.swept = SweptParameter::ElementSize;
        config.sweep.correction.element_size = None;
        config.sweep.values = vec![0.1];
        config
    }
}

/// Enriched lanthanum hexaboride in a thin vanadium can, two detectors.
fn lab6_in_vanadium(tof_max: f64, radius: f64, can_outer_radius: f64) -> ExperimentConfig {
    ExperimentConfig {
        instrument: InstrumentConfig {
            num_banks: 2,
            bank_pixel_width: 1,
            tof_min: 1000.0,
            tof_max,
            tof_bin_width: 200.0,
            primary_flight_path: 5.0,
            detectors: vec![
                Detector {
                    l2: 2.0,
                    polar: 10.0,
                    azimuthal: 0.0,
                },
                Detector {
                    l2: 2.0,
                    polar: 90.0,
                    azimuthal: 45.0,
                },
            ],
        },
        sample: VolumeConfig {
            geometry: Shape::Cylinder {
                height: 1.0,
                radius,
                center: [0.0; 3],
            },
            material: MaterialConfig {
                chemical_formula: "La-(B11)5.94-(B10)0.06".to_string(),
                number_density: 0.1,
            },
        },
        container: Some(VolumeConfig {
            geometry: Shape::HollowCylinder {
                height: 1.0,
                inner_radius: radius,
                outer_radius: can_outer_radius,
                center: [0.0; 3],
            },
            material: MaterialConfig {
                chemical_formula: "V".to_string(),
                number_density: 0.0721,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::build_experiment;
    use rstest::rstest;

    #[rstest]
    #[case("multiple-scattering")]
    #[case("paalman-pings")]
    #[case("smoke")]
    fn presets_build(#[case] name: &str) {
        let config = RunConfig::preset(name).unwrap();
        assert!(build_experiment(&config.experiment).is_ok());
        assert!(!config.sweep.values.is_empty());
    }

    #[test]
    fn unknown_preset() {
        assert!(RunConfig::preset("mayers").is_none());
    }

    #[test]
    fn dumped_preset_loads_back() {
        let config = RunConfig::paalman_pings();
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(RunConfig::from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{
            "experiment": {
                "instrument": {
                    "num_banks": 1,
                    "tof_min": 1000.0,
                    "tof_max": 2000.0,
                    "primary_flight_path": 5.0,
                    "detectors": [{"l2": 2.0, "polar": 90.0}]
                },
                "sample": {
                    "geometry": {"shape": "Cylinder", "height": 1.0, "radius": 0.2},
                    "material": {"chemical_formula": "V", "number_density": 0.0721}
                }
            },
            "sweep": {
                "correction": {"algorithm": "PaalmanPings"},
                "swept": "ElementSize",
                "values": [0.5, 0.2],
                "spectra": [0]
            },
            "plot": {
                "y_label": "abs_factor",
                "colormap": {"name": "Viridis", "start": 0.0, "stop": 1.0}
            }
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.experiment.instrument.tof_bin_width, 200.0);
        assert_eq!(config.experiment.instrument.bank_pixel_width, 1);
        assert!(config.experiment.container.is_none());
        assert_eq!(config.sweep.correction.correction, CorrectionKind::PaalmanPings);
        assert_eq!(config.plot.unit, "mm");
        assert!(!config.plot.log_y);
        assert!(build_experiment(&config.experiment).is_ok());
    }
}
