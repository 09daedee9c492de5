//! Backend running the corrections in Mantid through a Python subprocess
//!
//! Every request starts a fresh interpreter, so no workspace survives from
//! one sweep iteration to the next. The experiment travels as JSON; the
//! outputs come back as JSON in a scratch directory owned by this process.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

use super::{Correction, CorrectionOutput, CorrectionParams};
use crate::error::{Error, Result};
use crate::experiment::Experiment;

/// Python side of the bridge
pub const BRIDGE_SCRIPT: &str = include_str!("../../scripts/mantid_bridge.py");

// Lines of interpreter stderr kept in error messages
const STDERR_TAIL: usize = 12;

/// Request document read by the bridge script
#[derive(Debug, Serialize)]
pub struct BridgeRequest<'a> {
    pub input_name: &'a str,
    pub algorithm: &'static str,
    pub properties: BTreeMap<&'static str, JsonValue>,
    pub output_name: &'a str,
    pub response_path: &'a Path,
    pub experiment: &'a Experiment,
}

impl<'a> BridgeRequest<'a> {
    pub fn new(experiment: &'a Experiment, params: &'a CorrectionParams, response_path: &'a Path) -> Self {
        BridgeRequest {
            input_name: experiment.handle(),
            algorithm: params.kind.algorithm(),
            properties: params.properties(),
            output_name: &params.output_name,
            response_path,
            experiment,
        }
    }
}

/// Runs corrections with the `mantid` Python package.
#[derive(Debug, Clone)]
pub struct MantidCorrection {
    python: PathBuf,
}

impl MantidCorrection {
    /// `python` must be an interpreter able to `import mantid`.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn python(&self) -> &Path {
        &self.python
    }
}

impl Correction for MantidCorrection {
    fn apply(&self, experiment: &Experiment, params: &CorrectionParams) -> Result<CorrectionOutput> {
        let scratch = TempDir::new()?;
        let request_path = scratch.path().join("request.json");
        let response_path = scratch.path().join("response.json");

        let request = BridgeRequest::new(experiment, params, &response_path);
        let mut writer = BufWriter::new(File::create(&request_path)?);
        serde_json::to_writer(&mut writer, &request)?;
        writer.flush()?;

        log::debug!(
            "{} {} on {} -> {}",
            self.python.display(),
            params.kind.algorithm(),
            experiment.handle(),
            params.output_name
        );
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(BRIDGE_SCRIPT)
            .arg(&request_path)
            .output()?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            log::debug!("[python] {line}");
        }

        if !output.status.success() {
            return Err(Error::CorrectionFailed {
                algorithm: params.kind.algorithm().to_string(),
                value: params.value,
                reason: format!("{}\n{}", output.status, tail(&stderr, STDERR_TAIL)),
            });
        }

        read_response(&response_path)
    }
}

/// Parse a bridge response file.
pub fn read_response(path: &Path) -> Result<CorrectionOutput> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
