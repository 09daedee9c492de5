use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::experiment::instrument::InstrumentConfig;

/// h / m_n expressed in Å·m/µs, so λ[Å] = K · t[µs] / L[m]
const WAVELENGTH_PER_TOF: f64 = 3.956_034e-3;

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XUnit {
    #[serde(rename = "TOF")]
    TimeOfFlight,
    Wavelength,
}

impl fmt::Display for XUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XUnit::TimeOfFlight => write!(f, "TOF"),
            XUnit::Wavelength => write!(f, "Wavelength"),
        }
    }
}

/// Energy transfer mode of a unit conversion. Only elastic is needed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EMode {
    Elastic,
}

// ---------------------------------------------------------------------------
// Histogram spectra
// ---------------------------------------------------------------------------

/// One detector's histogram: `edges.len() == counts.len() + 1`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub spectrum_id: usize,
    pub detector_id: usize,
    pub edges: Vec<f64>,
    pub counts: Vec<f64>,
}

/// Binned data for every spectrum, sharing one x unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workspace {
    pub unit: XUnit,
    pub spectra: Vec<Histogram>,
}

impl Workspace {
    /// Synthetic powder-diffraction spectra on a regular TOF grid.
    ///
    /// Each spectrum is a gently falling linear background with four
    /// Gaussian Bragg peaks at fixed fractions of the TOF range; the peaks
    /// weaken slightly with spectrum index so curves stay distinguishable.
    pub fn powder_diffraction(instrument: &InstrumentConfig) -> Self {
        let edges = tof_edges(instrument.tof_min, instrument.tof_max, instrument.tof_bin_width);
        let range = instrument.tof_max - instrument.tof_min;

        // (fraction of range, sigma as fraction of range, height)
        let peaks = [
            (0.20, 0.004, 0.58),
            (0.35, 0.005, 0.45),
            (0.55, 0.006, 0.32),
            (0.75, 0.008, 0.21),
        ];

        let spectra = (0..instrument.num_spectra())
            .map(|index| {
                let scale = 1.0 / (1.0 + 0.1 * index as f64);
                let counts = edges
                    .windows(2)
                    .map(|w| {
                        let t = 0.5 * (w[0] + w[1]);
                        let background = 0.085 * (1.0 - 0.5 * (t - instrument.tof_min) / range);
                        let signal: f64 = peaks
                            .iter()
                            .map(|&(at, width, height)| {
                                let mu = instrument.tof_min + at * range;
                                gaussian(t, mu, width * range, height * scale)
                            })
                            .sum();
                        background + signal
                    })
                    .collect();
                Histogram {
                    spectrum_id: index + 1,
                    detector_id: index + 1,
                    edges: edges.clone(),
                    counts,
                }
            })
            .collect();

        Workspace {
            unit: XUnit::TimeOfFlight,
            spectra,
        }
    }

    /// Convert the x axis in place.
    ///
    /// Converting to the current unit is a no-op. TOF → wavelength in
    /// elastic mode uses the total flight path of each spectrum's detector.
    pub fn convert_units(
        &mut self,
        target: XUnit,
        emode: EMode,
        instrument: &InstrumentConfig,
    ) -> Result<()> {
        match (self.unit, target, emode) {
            (from, to, _) if from == to => Ok(()),
            (XUnit::TimeOfFlight, XUnit::Wavelength, EMode::Elastic) => {
                for (index, spectrum) in self.spectra.iter_mut().enumerate() {
                    let path = instrument.total_flight_path(index).ok_or_else(|| {
                        Error::InvalidInstrument(format!("no detector for spectrum {index}"))
                    })?;
                    for edge in spectrum.edges.iter_mut() {
                        *edge = tof_to_wavelength(*edge, path);
                    }
                }
                self.unit = XUnit::Wavelength;
                Ok(())
            }
            (from, to, _) => Err(Error::UnitConversion {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

/// Elastic wavelength (Å) of a neutron with time-of-flight `tof` (µs) over
/// `flight_path` (m).
pub fn tof_to_wavelength(tof: f64, flight_path: f64) -> f64 {
    WAVELENGTH_PER_TOF * tof / flight_path
}

// Slack on the bin count so rounding in `(max - min) / width` cannot add an
// empty last bin.
const BIN_COUNT_TOLERANCE: f64 = 1e-9;

/// Regular bin edges from `min`, the last bin truncated at `max`.
/// Edges are strictly increasing.
fn tof_edges(min: f64, max: f64, width: f64) -> Vec<f64> {
    let n_bins = ((max - min) / width - BIN_COUNT_TOLERANCE).ceil().max(1.0) as usize;
    (0..=n_bins)
        .map(|i| (min + i as f64 * width).min(max))
        .collect()
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::instrument::Detector;
    use rstest::rstest;

    fn instrument(tof_max: f64) -> InstrumentConfig {
        InstrumentConfig {
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
                    l2: 3.0,
                    polar: 90.0,
                    azimuthal: 45.0,
                },
            ],
        }
    }

    #[test]
    fn regular_grid_truncated_at_max() {
        assert_eq!(tof_edges(1000.0, 1500.0, 200.0), [1000.0, 1200.0, 1400.0, 1500.0]);
        assert_eq!(tof_edges(1000.0, 1400.0, 200.0), [1000.0, 1200.0, 1400.0]);
    }

    #[rstest]
    #[case(0.7, 1.0, 0.1, 3)]
    #[case(0.1, 0.7, 0.1, 6)]
    #[case(1000.0, 1300.0, 100.0, 3)]
    #[case(1000.0, 1300.1, 100.0, 4)]
    fn fractional_grid_is_strictly_increasing(
        #[case] min: f64,
        #[case] max: f64,
        #[case] width: f64,
        #[case] n_bins: usize,
    ) {
        let edges = tof_edges(min, max, width);
        assert_eq!(edges.len(), n_bins + 1);
        assert!(edges.windows(2).all(|w| w[0] < w[1]), "{edges:?}");
        assert_eq!(edges[0], min);
        assert_eq!(edges[n_bins], max);
    }

    #[test]
    fn synthetic_spectra_are_histograms() {
        let ws = Workspace::powder_diffraction(&instrument(10000.0));
        assert_eq!(ws.len(), 2);
        assert_eq!(ws.unit, XUnit::TimeOfFlight);
        for sp in &ws.spectra {
            assert_eq!(sp.edges.len(), 46);
            assert_eq!(sp.counts.len(), 45);
            assert!(sp.counts.iter().all(|c| *c >= 0.0));
        }
    }

    #[test]
    fn elastic_wavelength_uses_total_flight_path() {
        let inst = instrument(1500.0);
        let mut ws = Workspace::powder_diffraction(&inst);
        ws.convert_units(XUnit::Wavelength, EMode::Elastic, &inst).unwrap();

        assert_eq!(ws.unit, XUnit::Wavelength);
        // 1000 µs over 7 m and 8 m
        assert!((ws.spectra[0].edges[0] - 0.565_148).abs() < 1e-5);
        assert!((ws.spectra[1].edges[0] - 0.494_504).abs() < 1e-5);
        // counts are untouched
        assert_eq!(ws.spectra[0].counts.len(), 3);
    }

    #[test]
    fn converting_twice_is_a_no_op() {
        let inst = instrument(1500.0);
        let mut ws = Workspace::powder_diffraction(&inst);
        ws.convert_units(XUnit::Wavelength, EMode::Elastic, &inst).unwrap();
        let once = ws.clone();
        ws.convert_units(XUnit::Wavelength, EMode::Elastic, &inst).unwrap();
        assert_eq!(ws, once);
    }

    #[test]
    fn wavelength_back_to_tof_is_unsupported() {
        let inst = instrument(1500.0);
        let mut ws = Workspace::powder_diffraction(&inst);
        ws.convert_units(XUnit::Wavelength, EMode::Elastic, &inst).unwrap();
        assert!(matches!(
            ws.convert_units(XUnit::TimeOfFlight, EMode::Elastic, &inst),
            Err(Error::UnitConversion { .. })
        ));
    }
}
