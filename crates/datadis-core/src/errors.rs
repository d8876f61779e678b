use thiserror::Error;

/// Locally detected bad input - never reaches the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("CUPS cannot be empty (expected format: {expected})")]
    EmptyCups { expected: &'static str },

    #[error("Invalid CUPS format: '{value}' (expected {expected}: 'ES' followed by 20-22 alphanumeric characters)")]
    InvalidCups {
        value: String,
        expected: &'static str,
    },

    #[error("Invalid {field} format: '{value}' (expected {expected})")]
    InvalidDateFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid {field} date: '{value}' is not a calendar date (expected {expected})")]
    InvalidDate {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Start date {from} cannot be after end date {to}")]
    InvertedRange { from: String, to: String },

    #[error("Start date {from} is more than 2 years in the past (earliest allowed: {earliest})")]
    StartTooOld { from: String, earliest: String },

    #[error("End date {to} cannot be in the future")]
    EndInFuture { to: String },

    #[error("Invalid distributor code: '{0}' (expected a single digit between 1 and 8)")]
    InvalidDistributorCode(String),

    #[error("Invalid measurement type: {0} (expected 0 = consumption or 1 = generation)")]
    InvalidMeasurementType(i64),

    #[error("Invalid point type: {value} (expected an integer between 1 and {max})")]
    InvalidPointType { value: i64, max: u8 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
