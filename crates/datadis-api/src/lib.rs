//! # Datadis API
//!
//! HTTP client for the Datadis metering API.
//! This crate provides the transport, token handling and the v1/v2
//! resource views built on top of `datadis-core`.

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod errors;
pub mod sdk;
pub mod transport;
pub mod v1;
pub mod v2;

// Re-export common types for convenience
pub use auth::{Authenticator, Credentials, TokenState};
pub use client::{ApiConfig, ClientConfig, DatadisClient};
pub use endpoints::{Endpoint, DEFAULT_API_BASE, DEFAULT_BASE_URL};
pub use errors::*;
pub use sdk::{ClientInfo, Datadis, SDK_VERSION};
pub use transport::{HttpTransport, Payload, TransportRequest};
pub use v1::{V1Raw, V1Typed};
pub use v2::V2Typed;

// Re-export core types that API consumers will need
pub use datadis_core::{
    ConsumptionData, ConsumptionSummary, ContractData, DistributorData, DistributorError,
    MaxPowerData, ParsedRecords, ReactiveEnergyData, RecordFailure, SupplyData, V2Response,
    ValidationError,
};
