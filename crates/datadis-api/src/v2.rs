//! Version 2 endpoints.
//!
//! v2 takes monthly dates (`YYYY/MM`), accepts point types 1 to 4 and
//! reports per-distributor failures next to the records.

use crate::client::{param, DatadisClient};
use crate::endpoints::Endpoint;
use crate::errors::Result;
use datadis_core::{
    validate_cups, validate_date_range, validate_distributor_code, validate_measurement_type,
    validate_point_type, ConsumptionData, ContractData, DateFormat, DistributorData, MaxPowerData,
    PointTypeRange, ReactiveEnergyData, Resource, SupplyData, V2Response,
};
use log::{debug, info};
use serde::de::DeserializeOwned;

/// Typed v2 view over a client
pub struct V2Typed<'a> {
    client: &'a mut DatadisClient,
    authorized_nif: Option<String>,
}

impl<'a> V2Typed<'a> {
    pub(crate) fn new(client: &'a mut DatadisClient) -> Self {
        Self {
            client,
            authorized_nif: None,
        }
    }

    /// Query on behalf of another NIF that authorized this account
    pub fn authorized_nif(mut self, nif: impl Into<String>) -> Self {
        self.authorized_nif = Some(nif.into().trim().to_uppercase());
        self
    }

    async fn fetch<T: DeserializeOwned>(
        &mut self,
        endpoint: Endpoint,
        resource: Resource,
        mut query: Vec<(String, String)>,
    ) -> Result<V2Response<T>> {
        if let Some(nif) = &self.authorized_nif {
            debug!("Querying {} on behalf of {}", resource.name(), nif);
            query.push(param("authorizedNif", nif));
        }

        let response = self.client.get_json(endpoint, query).await?;
        let parsed = V2Response::from_envelope(response, resource);

        info!(
            "Fetched {} {} records (v2, {} rejected, {} distributor errors)",
            parsed.records.len(),
            resource.name(),
            parsed.records.rejected.len(),
            parsed.distributor_errors.len()
        );
        Ok(parsed)
    }

    pub async fn get_supplies(
        &mut self,
        distributor_code: Option<&str>,
    ) -> Result<V2Response<SupplyData>> {
        let mut query = Vec::new();
        if let Some(code) = distributor_code {
            query.push(param("distributorCode", validate_distributor_code(code)?));
        }

        self.fetch(Endpoint::SuppliesV2, Resource::Supplies, query)
            .await
    }

    pub async fn get_distributors(&mut self) -> Result<V2Response<DistributorData>> {
        self.fetch(Endpoint::DistributorsV2, Resource::Distributors, Vec::new())
            .await
    }

    pub async fn get_contract_detail(
        &mut self,
        cups: &str,
        distributor_code: &str,
    ) -> Result<V2Response<ContractData>> {
        let query = vec![
            param("cups", validate_cups(cups)?),
            param("distributorCode", validate_distributor_code(distributor_code)?),
        ];

        self.fetch(Endpoint::ContractDetailV2, Resource::Contracts, query)
            .await
    }

    /// Consumption time curve between two months
    pub async fn get_consumption(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
        measurement_type: Option<i64>,
        point_type: Option<i64>,
    ) -> Result<V2Response<ConsumptionData>> {
        let cups = validate_cups(cups)?;
        let distributor_code = validate_distributor_code(distributor_code)?;
        let (date_from, date_to) = validate_date_range(date_from, date_to, DateFormat::Monthly)?;
        let measurement_type = validate_measurement_type(measurement_type)?;
        let point_type = validate_point_type(point_type, PointTypeRange::Standard)?;

        let query = vec![
            param("cups", cups),
            param("distributorCode", distributor_code),
            param("startDate", date_from),
            param("endDate", date_to),
            param("measurementType", measurement_type),
            param("pointType", point_type),
        ];

        self.fetch(Endpoint::ConsumptionV2, Resource::Consumption, query)
            .await
    }

    pub async fn get_max_power(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<V2Response<MaxPowerData>> {
        let query = monthly_query(cups, distributor_code, date_from, date_to)?;
        self.fetch(Endpoint::MaxPowerV2, Resource::MaxPower, query)
            .await
    }

    /// Reactive energy per tariff period
    pub async fn get_reactive_data(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<V2Response<ReactiveEnergyData>> {
        let query = monthly_query(cups, distributor_code, date_from, date_to)?;
        self.fetch(Endpoint::ReactiveDataV2, Resource::ReactiveEnergy, query)
            .await
    }
}

fn monthly_query(
    cups: &str,
    distributor_code: &str,
    date_from: &str,
    date_to: &str,
) -> Result<Vec<(String, String)>> {
    let cups = validate_cups(cups)?;
    let distributor_code = validate_distributor_code(distributor_code)?;
    let (date_from, date_to) = validate_date_range(date_from, date_to, DateFormat::Monthly)?;

    Ok(vec![
        param("cups", cups),
        param("distributorCode", distributor_code),
        param("startDate", date_from),
        param("endDate", date_to),
    ])
}
