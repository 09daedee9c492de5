/// Correction capability: experiment + parameters → named outputs.
///
/// The numerical work happens in an external framework. This module only
/// describes what to ask for and what comes back; [`mantid`] is the backend
/// that actually runs the algorithms, and tests substitute their own.
pub mod mantid;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::Result;
use crate::experiment::Experiment;

// ---------------------------------------------------------------------------
// What to run
// ---------------------------------------------------------------------------

/// Which volumes a multiple-scattering calculation integrates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    SampleOnly,
    SampleAndContainer,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::SampleOnly => write!(f, "SampleOnly"),
            Method::SampleAndContainer => write!(f, "SampleAndContainer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
pub enum CorrectionKind {
    MultipleScattering { method: Method },
    PaalmanPings,
}

impl CorrectionKind {
    /// Algorithm name in the external framework
    pub fn algorithm(&self) -> &'static str {
        match self {
            CorrectionKind::MultipleScattering { .. } => "MultipleScatteringCorrection",
            CorrectionKind::PaalmanPings => "PaalmanPingsAbsorptionCorrection",
        }
    }

    /// Short tag used in output names
    pub fn tag(&self) -> &'static str {
        match self {
            CorrectionKind::MultipleScattering { .. } => "ms",
            CorrectionKind::PaalmanPings => "pp",
        }
    }

    /// Member of the output group holding the factor of interest.
    ///
    /// `None` means the output workspace itself.
    pub fn default_output_suffix(&self) -> Option<&'static str> {
        match self {
            CorrectionKind::MultipleScattering {
                method: Method::SampleOnly,
            } => None,
            CorrectionKind::MultipleScattering {
                method: Method::SampleAndContainer,
            } => Some("sampleAndContainer"),
            CorrectionKind::PaalmanPings => Some("assc"),
        }
    }

    /// Finest element size (mm) the backend is known to survive.
    ///
    /// Sizes strictly below it are rejected: 0.1 mm for multiple
    /// scattering, 0.02 mm for Paalman-Pings (0.01 mm runs out of memory).
    pub fn stability_floor(&self) -> f64 {
        match self {
            CorrectionKind::MultipleScattering { .. } => 0.1,
            CorrectionKind::PaalmanPings => 0.02,
        }
    }
}

/// Which element size the swept value replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweptParameter {
    ElementSize,
    ContainerElementSize,
}

impl fmt::Display for SweptParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweptParameter::ElementSize => write!(f, "ElementSize"),
            SweptParameter::ContainerElementSize => write!(f, "ContainerElementSize"),
        }
    }
}

/// Fixed part of a correction request, shared by every sweep iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionConfig {
    pub correction: CorrectionKind,
    pub swept: SweptParameter,
    /// Sample element size (mm) when it is not the swept parameter
    #[serde(default)]
    pub element_size: Option<f64>,
    /// Container element size (mm) when it is not the swept parameter
    #[serde(default)]
    pub container_element_size: Option<f64>,
    /// Overrides [`CorrectionKind::default_output_suffix`]
    #[serde(default)]
    pub output_suffix: Option<String>,
    /// Overrides [`CorrectionKind::stability_floor`]
    #[serde(default)]
    pub stability_floor: Option<f64>,
}

impl CorrectionConfig {
    /// Parameters for one iteration with `value` merged into the swept slot.
    pub fn merged_with(&self, value: f64, output_name: String) -> CorrectionParams {
        let mut params = CorrectionParams {
            kind: self.correction,
            value,
            element_size: self.element_size,
            container_element_size: self.container_element_size,
            output_name,
        };
        match self.swept {
            SweptParameter::ElementSize => params.element_size = Some(value),
            SweptParameter::ContainerElementSize => params.container_element_size = Some(value),
        }
        params
    }

    /// Element sizes sent unchanged with every request.
    pub fn fixed_sizes(&self) -> impl Iterator<Item = f64> {
        let element_size = match self.swept {
            SweptParameter::ElementSize => None,
            _ => self.element_size,
        };
        let container_element_size = match self.swept {
            SweptParameter::ContainerElementSize => None,
            _ => self.container_element_size,
        };
        element_size.into_iter().chain(container_element_size)
    }

    /// Name of the output carrying the curves for `output_name`.
    pub fn expected_output(&self, output_name: &str) -> String {
        let suffix = self
            .output_suffix
            .as_deref()
            .or(self.correction.default_output_suffix());
        match suffix {
            Some(s) => format!("{output_name}_{s}"),
            None => output_name.to_string(),
        }
    }

    pub fn stability_floor(&self) -> f64 {
        self.stability_floor
            .unwrap_or(self.correction.stability_floor())
    }
}

/// A single fully specified correction request
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionParams {
    pub kind: CorrectionKind,
    /// The swept value this request was built for (mm)
    pub value: f64,
    pub element_size: Option<f64>,
    pub container_element_size: Option<f64>,
    /// Fresh for every request
    pub output_name: String,
}

impl CorrectionParams {
    /// Algorithm properties besides the input and output workspaces.
    pub fn properties(&self) -> BTreeMap<&'static str, JsonValue> {
        let mut props = BTreeMap::new();
        if let CorrectionKind::MultipleScattering { method } = self.kind {
            props.insert("Method", json!(method.to_string()));
        }
        if let Some(size) = self.element_size {
            props.insert("ElementSize", json!(size));
        }
        if let Some(size) = self.container_element_size {
            props.insert("ContainerElementSize", json!(size));
        }
        props
    }
}

// ---------------------------------------------------------------------------
// What comes back
// ---------------------------------------------------------------------------

/// Histogram output of a correction: bin edges and values per spectrum
///
/// JSON has no NaN, so non-finite values travel as `null` and come back as
/// NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputWorkspace {
    pub x: Vec<Vec<f64>>,
    #[serde(deserialize_with = "nullable_values")]
    pub y: Vec<Vec<f64>>,
}

fn nullable_values<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<Vec<Option<f64>>>::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        .collect())
}

impl OutputWorkspace {
    /// Bin edges and values of one spectrum.
    pub fn spectrum(&self, index: usize) -> Option<(&[f64], &[f64])> {
        Some((self.x.get(index)?.as_slice(), self.y.get(index)?.as_slice()))
    }

    pub fn num_spectra(&self) -> usize {
        self.x.len().min(self.y.len())
    }
}

/// Everything a correction produced, by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOutput {
    pub outputs: BTreeMap<String, OutputWorkspace>,
}

impl CorrectionOutput {
    /// Remove and return the named output.
    pub fn take(&mut self, name: &str) -> Option<OutputWorkspace> {
        self.outputs.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }
}

/// An external correction routine.
///
/// Implementations must return their outputs by value and never rely on
/// state left behind by an earlier call.
pub trait Correction {
    fn apply(&self, experiment: &Experiment, params: &CorrectionParams) -> Result<CorrectionOutput>;
}

impl<C: Correction + ?Sized> Correction for &C {
    fn apply(&self, experiment: &Experiment, params: &CorrectionParams) -> Result<CorrectionOutput> {
        (**self).apply(experiment, params)
    }
}

impl<C: Correction + ?Sized> Correction for Box<C> {
    fn apply(&self, experiment: &Experiment, params: &CorrectionParams) -> Result<CorrectionOutput> {
        (**self).apply(experiment, params)
    }
}

/// Runs `before` ahead of every call to the wrapped correction, so a crash
/// inside the backend still leaves a trace of the request being served.
pub struct Announced<C, F> {
    inner: C,
    before: F,
}

impl<C, F> Announced<C, F>
where
    C: Correction,
    F: Fn(&CorrectionParams),
{
    pub fn new(inner: C, before: F) -> Self {
        Self { inner, before }
    }
}

impl<C, F> Correction for Announced<C, F>
where
    C: Correction,
    F: Fn(&CorrectionParams),
{
    fn apply(&self, experiment: &Experiment, params: &CorrectionParams) -> Result<CorrectionOutput> {
        (self.before)(params);
        self.inner.apply(experiment, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms_container_sweep() -> CorrectionConfig {
        CorrectionConfig {
            correction: CorrectionKind::MultipleScattering {
                method: Method::SampleAndContainer,
            },
            swept: SweptParameter::ContainerElementSize,
            element_size: Some(0.5),
            container_element_size: None,
            output_suffix: None,
            stability_floor: None,
        }
    }

    #[test]
    fn value_replaces_only_the_swept_size() {
        let params = ms_container_sweep().merged_with(0.2, "out_0".into());
        assert_eq!(params.element_size, Some(0.5));
        assert_eq!(params.container_element_size, Some(0.2));

        let props = params.properties();
        assert_eq!(props["Method"], json!("SampleAndContainer"));
        assert_eq!(props["ContainerElementSize"], json!(0.2));
    }

    #[test]
    fn fixed_sizes_skip_the_swept_slot() {
        let mut config = ms_container_sweep();
        config.container_element_size = Some(0.01);
        assert_eq!(config.fixed_sizes().collect::<Vec<_>>(), [0.5]);

        config.swept = SweptParameter::ElementSize;
        assert_eq!(config.fixed_sizes().collect::<Vec<_>>(), [0.01]);
    }

    #[test]
    fn paalman_pings_has_no_method() {
        let config = CorrectionConfig {
            correction: CorrectionKind::PaalmanPings,
            swept: SweptParameter::ElementSize,
            element_size: None,
            container_element_size: None,
            output_suffix: None,
            stability_floor: None,
        };
        let props = config.merged_with(0.05, "out".into()).properties();
        assert!(!props.contains_key("Method"));
        assert!(!props.contains_key("ContainerElementSize"));
        assert_eq!(config.expected_output("out"), "out_assc");
        assert_eq!(config.stability_floor(), 0.02);
    }

    #[test]
    fn expected_output_follows_method_and_override() {
        let mut config = ms_container_sweep();
        assert_eq!(config.expected_output("rst"), "rst_sampleAndContainer");

        config.correction = CorrectionKind::MultipleScattering {
            method: Method::SampleOnly,
        };
        assert_eq!(config.expected_output("rst"), "rst");

        config.output_suffix = Some("containerOnly".into());
        assert_eq!(config.expected_output("rst"), "rst_containerOnly");
    }

    #[test]
    fn correction_kind_is_tagged_in_json() {
        let kind: CorrectionKind = serde_json::from_str(
            r#"{"algorithm": "MultipleScattering", "method": "SampleOnly"}"#,
        )
        .unwrap();
        assert_eq!(
            kind,
            CorrectionKind::MultipleScattering {
                method: Method::SampleOnly
            }
        );
    }
}
