//! # Datadis Core
//!
//! Core domain logic for the Datadis metering API.
//!
//! This crate contains pure logic with no I/O dependencies:
//! - Parameter validators
//! - Response normalization and envelope unwrapping
//! - Typed record models
//! - Best-effort record parsing results

pub mod errors;
pub mod models;
pub mod normalize;
pub mod records;
pub mod validators;

// Re-export commonly used types
pub use errors::{Result, ValidationError};
pub use models::{
    ConsumptionData, ConsumptionSummary, ContractData, DateOwner, DistributorData,
    DistributorError, MaxPowerData, ReactiveEnergyData, ReactiveEnergyPeriod, SupplyData,
};
pub use normalize::{
    extract_distributor_errors, normalize_text, normalize_value, unwrap_envelope, Resource,
};
pub use records::{ParsedRecords, RecordFailure, V2Response};
pub use validators::{
    validate_cups, validate_date_range, validate_date_range_at, validate_distributor_code,
    validate_measurement_type, validate_point_type, DateFormat, PointTypeRange,
};
