use std::collections::BTreeMap;

use crate::correction::{Correction, CorrectionConfig, SweptParameter};
use crate::error::{Error, Result};
use crate::experiment::Experiment;

// ---------------------------------------------------------------------------
// SweepParameter – ordered element sizes
// ---------------------------------------------------------------------------

/// Element sizes to try, in mm. Order is kept: it fixes colours and legend.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepParameter {
    values: Vec<f64>,
}

impl SweepParameter {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidSweep("no values to sweep".into()));
        }
        if let Some(v) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(Error::InvalidSweep(format!(
                "element sizes must be positive, got {v}"
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reject the whole sweep if any value is finer than `floor`.
    pub fn check_floor(&self, floor: f64, correction: &str) -> Result<()> {
        match self.values.iter().find(|v| **v < floor) {
            Some(&value) => Err(Error::BelowStabilityFloor {
                correction: correction.to_string(),
                value,
                floor,
            }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// CorrectionResult – one sweep iteration
// ---------------------------------------------------------------------------

/// Point data of one spectrum: bin centres and values
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Curves of the observed spectra for one swept value
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionResult {
    pub value: f64,
    /// Output the curves were read from
    pub output_name: String,
    pub curves: BTreeMap<usize, Curve>,
}

/// Midpoints of consecutive bin edges; `k` edges give `k - 1` centres.
pub fn bin_centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run the correction once per value and collect the observed spectra.
pub fn run_sweep<C: Correction + ?Sized>(
    experiment: &Experiment,
    parameter: &SweepParameter,
    correction: &C,
    config: &CorrectionConfig,
    spectra: &[usize],
) -> Result<Vec<CorrectionResult>> {
    let mut results = Vec::with_capacity(parameter.len());
    sweep_each(experiment, parameter, correction, config, spectra, |r| {
        results.push(r)
    })?;
    Ok(results)
}

/// Like [`run_sweep`] but hands each result to `on_result` as soon as it is
/// read, in the order of `parameter`.
///
/// Iterations run strictly one after another and each gets its own output
/// name. The first failing correction aborts the sweep; nothing is retried.
pub fn sweep_each<C, F>(
    experiment: &Experiment,
    parameter: &SweepParameter,
    correction: &C,
    config: &CorrectionConfig,
    spectra: &[usize],
    mut on_result: F,
) -> Result<()>
where
    C: Correction + ?Sized,
    F: FnMut(CorrectionResult),
{
    check_spectra(experiment, spectra)?;
    parameter.check_floor(config.stability_floor(), config.correction.algorithm())?;
    check_fixed_sizes(config)?;
    warn_if_coarser_than_wall(experiment, parameter, config.swept);

    for (iteration, &value) in parameter.values().iter().enumerate() {
        log::info!("{} = {value} mm", config.swept);

        let output_name = format!(
            "{}_{}_{iteration}",
            experiment.handle(),
            config.correction.tag()
        );
        let params = config.merged_with(value, output_name);
        let mut output = correction.apply(experiment, &params)?;

        let expected = config.expected_output(&params.output_name);
        let workspace = output.take(&expected).ok_or_else(|| Error::MissingOutput {
            name: expected.clone(),
            spectrum: None,
        })?;

        let mut curves = BTreeMap::new();
        for &spectrum in spectra {
            let (edges, y) = workspace
                .spectrum(spectrum)
                .ok_or_else(|| Error::MissingOutput {
                    name: expected.clone(),
                    spectrum: Some(spectrum),
                })?;
            if edges.len() != y.len() + 1 {
                return Err(Error::CorrectionFailed {
                    algorithm: config.correction.algorithm().to_string(),
                    value,
                    reason: format!(
                        "spectrum {spectrum} of '{expected}' has {} bin edges for {} values",
                        edges.len(),
                        y.len()
                    ),
                });
            }
            curves.insert(
                spectrum,
                Curve {
                    x: bin_centers(edges),
                    y: y.to_vec(),
                },
            );
        }

        on_result(CorrectionResult {
            value,
            output_name: expected,
            curves,
        });
    }
    Ok(())
}

fn check_spectra(experiment: &Experiment, spectra: &[usize]) -> Result<()> {
    if spectra.is_empty() {
        return Err(Error::InvalidSweep("no spectra selected".into()));
    }
    if let Some(s) = spectra.iter().find(|s| **s >= experiment.num_spectra()) {
        return Err(Error::InvalidSweep(format!(
            "spectrum {s} out of range, experiment has {}",
            experiment.num_spectra()
        )));
    }
    Ok(())
}

// The floor holds for the sizes that are not swept too
fn check_fixed_sizes(config: &CorrectionConfig) -> Result<()> {
    let floor = config.stability_floor();
    match config.fixed_sizes().find(|v| *v < floor) {
        Some(value) => Err(Error::BelowStabilityFloor {
            correction: config.correction.algorithm().to_string(),
            value,
            floor,
        }),
        None => Ok(()),
    }
}

// Elements coarser than the can wall cannot resolve it
fn warn_if_coarser_than_wall(
    experiment: &Experiment,
    parameter: &SweepParameter,
    swept: SweptParameter,
) {
    let Some(container) = experiment.container() else {
        return;
    };
    let wall = container.geometry.wall_thickness_mm();
    for value in parameter.values().iter().filter(|v| **v > wall + 1e-9) {
        log::warn!("{swept} {value} mm exceeds the {wall:.3} mm container wall");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[1.0, 2.0, 4.0], &[1.5, 3.0])]
    #[case(&[0.5, 0.7], &[0.6])]
    #[case(&[3.0], &[])]
    #[case(&[], &[])]
    fn centres_are_edge_midpoints(#[case] edges: &[f64], #[case] centres: &[f64]) {
        assert_eq!(bin_centers(edges), centres);
    }

    #[test]
    fn centre_count_is_one_less_than_edges() {
        let edges: Vec<f64> = (0..=50).map(|i| 0.5 + 0.013 * (i * i) as f64).collect();
        let centres = bin_centers(&edges);
        assert_eq!(centres.len(), edges.len() - 1);
        for (i, c) in centres.iter().enumerate() {
            assert_eq!(*c, 0.5 * (edges[i] + edges[i + 1]));
        }
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![0.5, 0.0])]
    #[case(vec![0.5, -0.2])]
    #[case(vec![f64::NAN])]
    fn unusable_values(#[case] values: Vec<f64>) {
        assert!(matches!(
            SweepParameter::new(values),
            Err(Error::InvalidSweep(_))
        ));
    }

    #[test]
    fn floor_names_the_offending_value() {
        let parameter = SweepParameter::new(vec![0.5, 0.05, 0.01]).unwrap();
        match parameter.check_floor(0.1, "MultipleScatteringCorrection") {
            Err(Error::BelowStabilityFloor { value, floor, .. }) => {
                assert_eq!(value, 0.05);
                assert_eq!(floor, 0.1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parameter.check_floor(0.01, "x").is_ok());
    }
}
