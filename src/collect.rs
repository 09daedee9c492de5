use std::collections::BTreeMap;

use crate::sweep::CorrectionResult;

// ---------------------------------------------------------------------------
// SweptCurve – one line on one subplot
// ---------------------------------------------------------------------------

/// A spectrum's curve for one swept value
#[derive(Debug, Clone, PartialEq)]
pub struct SweptCurve {
    /// Position of the value in the sweep, used for colour and legend order
    pub order: usize,
    pub value: f64,
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ResultCollector
// ---------------------------------------------------------------------------

/// Regroups sweep results per spectrum as they arrive.
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    unit: String,
    values: Vec<f64>,
    by_spectrum: BTreeMap<usize, Vec<SweptCurve>>,
}

impl ResultCollector {
    /// `unit` is appended to every legend label.
    pub fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            ..Default::default()
        }
    }

    /// Take ownership of one iteration's curves.
    pub fn push(&mut self, result: CorrectionResult) {
        let order = self.values.len();
        let label = format!("{} {}", result.value, self.unit);
        for (spectrum, curve) in result.curves {
            self.by_spectrum.entry(spectrum).or_default().push(SweptCurve {
                order,
                value: result.value,
                label: label.clone(),
                x: curve.x,
                y: curve.y,
            });
        }
        self.values.push(result.value);
    }

    /// Swept values in arrival order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Legend labels in arrival order.
    pub fn labels(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| format!("{v} {}", self.unit))
            .collect()
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Observed spectrum indices, ascending.
    pub fn spectra(&self) -> Vec<usize> {
        self.by_spectrum.keys().copied().collect()
    }

    /// Curves of one spectrum in arrival order.
    pub fn curves(&self, spectrum: usize) -> &[SweptCurve] {
        self.by_spectrum
            .get(&spectrum)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &SweptCurve)> {
        self.by_spectrum
            .iter()
            .flat_map(|(s, curves)| curves.iter().map(move |c| (*s, c)))
    }

    /// Number of swept values received.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::Curve;

    fn result(value: f64, spectra: &[usize]) -> CorrectionResult {
        CorrectionResult {
            value,
            output_name: format!("out_{value}"),
            curves: spectra
                .iter()
                .map(|&s| {
                    (
                        s,
                        Curve {
                            x: vec![1.0, 2.0],
                            y: vec![value, value * s as f64],
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn curves_grouped_per_spectrum_in_arrival_order() {
        let mut collector = ResultCollector::new("mm");
        collector.push(result(0.5, &[0, 1]));
        collector.push(result(0.2, &[0, 1]));

        assert_eq!(collector.len(), 2);
        assert_eq!(collector.spectra(), [0, 1]);
        assert_eq!(collector.labels(), ["0.5 mm", "0.2 mm"]);

        let second = collector.curves(1);
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].value, 0.5);
        assert_eq!(second[0].order, 0);
        assert_eq!(second[1].label, "0.2 mm");
        assert_eq!(second[1].order, 1);
        assert_eq!(second[1].y, [0.2, 0.2]);
    }

    #[test]
    fn unknown_spectrum_has_no_curves() {
        let mut collector = ResultCollector::new("mm");
        collector.push(result(0.5, &[0]));
        assert!(collector.curves(3).is_empty());
        assert_eq!(collector.iter().count(), 1);
    }
}
