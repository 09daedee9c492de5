use thiserror::Error;

/// Type alias for `Result<T, scatter_sweep::Error>`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building an experiment, sweeping a correction or
/// exporting its results.
///
/// None of these are recoverable: the CLI reports them and exits.
#[derive(Debug, Error)]
pub enum Error {
    /// Sample or container geometry rejected before reaching the backend.
    #[error("invalid {part} geometry: {reason}")]
    InvalidGeometry { part: &'static str, reason: String },

    /// Instrument description inconsistent with the synthetic data.
    #[error("invalid instrument: {0}")]
    InvalidInstrument(String),

    /// Chemical formula could not be parsed.
    #[error("cannot parse chemical formula '{formula}': {reason}")]
    Formula { formula: String, reason: String },

    /// Chemical formula names an element or isotope that does not exist.
    #[error("unknown element '{symbol}' in chemical formula '{formula}'")]
    UnknownElement { formula: String, symbol: String },

    /// Sweep values unusable regardless of the backend.
    #[error("invalid sweep: {0}")]
    InvalidSweep(String),

    /// Value finer than the documented stability limit of the backend.
    #[error("element size {value} mm is below the stability floor of {floor} mm for {correction}")]
    BelowStabilityFloor {
        correction: String,
        value: f64,
        floor: f64,
    },

    /// The external correction raised.
    #[error("{algorithm} failed at element size {value} mm: {reason}")]
    CorrectionFailed {
        algorithm: String,
        value: f64,
        reason: String,
    },

    /// The correction finished without producing the expected output.
    #[error("correction produced no output '{name}'{}", for_spectrum(.spectrum))]
    MissingOutput {
        name: String,
        spectrum: Option<usize>,
    },

    #[error("unsupported unit conversion from {from} to {to}")]
    UnitConversion { from: String, to: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

fn for_spectrum(spectrum: &Option<usize>) -> String {
    spectrum
        .map(|s| format!(" for spectrum {s}"))
        .unwrap_or_default()
}
