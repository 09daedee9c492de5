use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One detector pixel, positioned relative to the sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detector {
    /// Secondary flight path, sample to detector (m)
    pub l2: f64,
    /// Scattering angle 2θ (degrees)
    pub polar: f64,
    /// Azimuthal angle (degrees)
    #[serde(default)]
    pub azimuthal: f64,
}

/// Instrument and synthetic time-of-flight binning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub num_banks: usize,
    #[serde(default = "default_pixel_width")]
    pub bank_pixel_width: usize,
    /// Time-of-flight range in µs
    pub tof_min: f64,
    pub tof_max: f64,
    #[serde(default = "default_bin_width")]
    pub tof_bin_width: f64,
    /// Moderator to sample distance (m)
    pub primary_flight_path: f64,
    /// One entry per spectrum, in spectrum order
    pub detectors: Vec<Detector>,
}

fn default_pixel_width() -> usize {
    1
}

fn default_bin_width() -> f64 {
    200.0
}

impl InstrumentConfig {
    /// Number of spectra the banks produce.
    pub fn num_spectra(&self) -> usize {
        self.num_banks * self.bank_pixel_width * self.bank_pixel_width
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_spectra() == 0 {
            return Err(Error::InvalidInstrument(
                "at least one bank of one pixel is required".into(),
            ));
        }
        if self.detectors.len() != self.num_spectra() {
            return Err(Error::InvalidInstrument(format!(
                "{} detectors given for {} spectra",
                self.detectors.len(),
                self.num_spectra()
            )));
        }
        if !(self.tof_min >= 0.0 && self.tof_max > self.tof_min) {
            return Err(Error::InvalidInstrument(format!(
                "time-of-flight range {}..{} is empty",
                self.tof_min, self.tof_max
            )));
        }
        if !(self.tof_bin_width > 0.0 && self.tof_bin_width.is_finite()) {
            return Err(Error::InvalidInstrument(format!(
                "bin width must be positive, got {}",
                self.tof_bin_width
            )));
        }
        if !(self.primary_flight_path > 0.0) {
            return Err(Error::InvalidInstrument(format!(
                "primary flight path must be positive, got {}",
                self.primary_flight_path
            )));
        }
        for (i, det) in self.detectors.iter().enumerate() {
            if !(det.l2 > 0.0) {
                return Err(Error::InvalidInstrument(format!(
                    "detector {i} has non-positive L2 {}",
                    det.l2
                )));
            }
            if !(0.0..=180.0).contains(&det.polar) {
                return Err(Error::InvalidInstrument(format!(
                    "detector {i} polar angle {} is outside 0..180",
                    det.polar
                )));
            }
        }
        Ok(())
    }

    /// Total elastic flight path for a spectrum (m).
    pub fn total_flight_path(&self, spectrum: usize) -> Option<f64> {
        self.detectors
            .get(spectrum)
            .map(|d| self.primary_flight_path + d.l2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_detectors() -> InstrumentConfig {
        InstrumentConfig {
            num_banks: 2,
            bank_pixel_width: 1,
            tof_min: 1000.0,
            tof_max: 10000.0,
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
        }
    }

    #[test]
    fn detector_count_matches_spectra() {
        let mut instrument = two_detectors();
        assert!(instrument.validate().is_ok());

        instrument.bank_pixel_width = 2;
        assert!(matches!(
            instrument.validate(),
            Err(Error::InvalidInstrument(_))
        ));
    }

    #[test]
    fn empty_tof_range_is_rejected() {
        let mut instrument = two_detectors();
        instrument.tof_max = instrument.tof_min;
        assert!(instrument.validate().is_err());
    }

    #[test]
    fn flight_path_adds_l1_and_l2() {
        let instrument = two_detectors();
        assert_eq!(instrument.total_flight_path(1), Some(7.0));
        assert_eq!(instrument.total_flight_path(2), None);
    }
}
