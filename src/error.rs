//! Error types for crop-cycle simulation.
//!
//! Setup problems are reported as [`ConfigError`] before any cell is touched.
//! [`SimulationError`] adds the fatal conditions that can only surface while
//! the grid is being processed.

/// Invalid inputs or parameters detected at setup time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A crop parameter is outside its admissible range.
    #[error("invalid crop parameter `{field}`: {reason}")]
    InvalidCrop { field: &'static str, reason: String },

    /// The requested crop is not present in the crop library.
    #[error("crop `{0}` not found in crop library")]
    UnknownCrop(String),

    /// The crop library could not be read from disk.
    #[error("failed to read crop library `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The crop library is not valid TOML or does not match the expected layout.
    #[error("failed to parse crop library: {0}")]
    Toml(#[from] toml::de::Error),

    /// A grid does not match the shape of the climate grid.
    #[error("grid `{name}` has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Daily series of one cell disagree in length or are not a full year.
    #[error("daily series `{name}` has {found} values, expected {expected}")]
    SeriesLength {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    /// The start-day sweep is malformed.
    #[error("invalid sweep: {0}")]
    InvalidSweep(String),

    /// Soil water parameters are outside their admissible range.
    #[error("invalid soil water parameter: {0}")]
    InvalidSoil(String),

    /// A screening table is malformed.
    #[error("invalid screening configuration: {0}")]
    InvalidScreening(String),
}

/// Errors that stop a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A collaborator returned an undefined value or the per-day result list
    /// went out of step with the sweep. Always a defect, never a data issue.
    #[error("contract violation at row {row}, col {col}, day {day}: {detail}")]
    ContractViolation {
        row: usize,
        col: usize,
        day: usize,
        detail: String,
    },

    /// The caller raised the cancellation flag.
    #[error("simulation cancelled")]
    Cancelled,
}
