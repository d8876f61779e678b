//! Datadis URLs and endpoint paths.

pub const DEFAULT_BASE_URL: &str = "https://datadis.es";
pub const DEFAULT_API_BASE: &str = "https://datadis.es/api-private/api";

/// Login path, relative to the base URL. Responds with a plain-text token.
pub const LOGIN_PATH: &str = "/nikola-auth/tokens/login";

pub const USER_AGENT: &str = concat!("datadis-rs/", env!("CARGO_PKG_VERSION"));

/// Data endpoints, relative to the API base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Supplies,
    ContractDetail,
    Consumption,
    MaxPower,
    Distributors,
    SuppliesV2,
    ContractDetailV2,
    ConsumptionV2,
    MaxPowerV2,
    DistributorsV2,
    ReactiveDataV2,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Supplies => "/get-supplies",
            Endpoint::ContractDetail => "/get-contract-detail",
            Endpoint::Consumption => "/get-consumption-data",
            Endpoint::MaxPower => "/get-max-power",
            Endpoint::Distributors => "/get-distributors-with-supplies",
            Endpoint::SuppliesV2 => "/get-supplies-v2",
            Endpoint::ContractDetailV2 => "/get-contract-detail-v2",
            Endpoint::ConsumptionV2 => "/get-consumption-data-v2",
            Endpoint::MaxPowerV2 => "/get-max-power-v2",
            Endpoint::DistributorsV2 => "/get-distributors-with-supplies-v2",
            Endpoint::ReactiveDataV2 => "/get-reactive-data-v2",
        }
    }
}

/// Join a base URL and a path without doubling or dropping slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
