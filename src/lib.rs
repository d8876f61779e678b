//! # datadis-rs
//!
//! Client SDK for the Datadis electricity metering API.
//!
//! ```no_run
//! # async fn run() -> datadis_rs::Result<()> {
//! let mut datadis = datadis_rs::connect()?;
//! let supplies = datadis.get_supplies(None).await?;
//! for supply in supplies.records.iter() {
//!     println!("{} ({})", supply.cups, supply.distributor);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod sdk;

// Re-export main public types
pub use config::{load_config, Config};
pub use errors::{ConfigError, DatadisError, Result};
pub use sdk::{connect, connect_with};

pub use datadis_api::{
    ApiConfig, ApiError, ClientConfig, ClientInfo, Credentials, Datadis, DatadisClient,
    ErrorKind, HttpError, V1Raw, V1Typed, V2Typed,
};
pub use datadis_core::{
    ConsumptionData, ConsumptionSummary, ContractData, DateOwner, DistributorData,
    DistributorError, MaxPowerData, ParsedRecords, ReactiveEnergyData, ReactiveEnergyPeriod,
    RecordFailure, SupplyData, V2Response, ValidationError,
};
