/// Error types for the mass balance library
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for loading observations and running mass balances
#[derive(Error, Debug)]
pub enum BalanceError {
    /// A required column is missing from the input table
    #[error("Missing required column: {column}")]
    Schema { column: String },

    /// Non-physical input on a given day
    #[error("Non-physical input on {date}: {reason}")]
    Domain { date: NaiveDate, reason: String },

    /// A run parameter outside its valid range
    #[error("Invalid parameter {name}: {reason}")]
    Parameter { name: String, reason: String },

    /// Input not date-ordered, duplicated, gapped or empty
    #[error("Invalid observation sequence: {0}")]
    Sequence(String),

    /// A cell could not be parsed
    #[error("Failed to parse {column} on row {row}: '{value}'")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    /// Tracer name not present in the registry
    #[error("Tracer not found: {0}")]
    UnknownTracer(String),

    /// Invalid tracer definition
    #[error("Invalid tracer definition: {0}")]
    TracerDefinition(String),

    /// Failed to read or write CSV data
    #[error("Failed to process CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BalanceError {
    pub fn domain(date: NaiveDate, reason: impl Into<String>) -> Self {
        BalanceError::Domain {
            date,
            reason: reason.into(),
        }
    }

    pub fn schema(column: impl Into<String>) -> Self {
        BalanceError::Schema {
            column: column.into(),
        }
    }
}

/// Type alias for Results using BalanceError
pub type Result<T> = std::result::Result<T, BalanceError>;
