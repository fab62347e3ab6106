//! Error types for the adhere_core library.

use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for adhere_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied bad input; nothing was mutated
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot file could not be read back into a consistent tracker
    #[error("State error: {0}")]
    State(String),
}

impl Error {
    /// The validation failure behind this error, if that is what it is
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}

/// The input a validation failure refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    MedicationName,
    MedicationId,
    SupplyDays,
    Date,
    Measurement,
    ViralLoad,
    Cd4Count,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::MedicationName => "medication name",
            Field::MedicationId => "medication id",
            Field::SupplyDays => "supply days",
            Field::Date => "date",
            Field::Measurement => "measurement",
            Field::ViralLoad => "viral load",
            Field::Cd4Count => "CD4 count",
        };
        f.write_str(name)
    }
}

/// Rejected input, naming the offending field
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
