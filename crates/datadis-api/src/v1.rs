//! Version 1 endpoints.
//!
//! v1 takes monthly dates (`YYYY/MM`) and accepts point types 1 to 5.
//! [`V1Raw`] returns the normalized records as JSON values; [`V1Typed`]
//! parses them into models, dropping the ones that do not fit.

use crate::client::{param, DatadisClient};
use crate::endpoints::Endpoint;
use crate::errors::Result;
use datadis_core::{
    unwrap_envelope, validate_cups, validate_date_range, validate_distributor_code,
    validate_measurement_type, validate_point_type, ConsumptionData, ContractData, DateFormat,
    DistributorData, MaxPowerData, ParsedRecords, PointTypeRange, Resource, SupplyData,
};
use log::{debug, info};
use serde_json::Value;
use std::collections::BTreeSet;

/// Raw v1 view over a client
pub struct V1Raw<'a> {
    client: &'a mut DatadisClient,
}

impl<'a> V1Raw<'a> {
    pub(crate) fn new(client: &'a mut DatadisClient) -> Self {
        Self { client }
    }

    async fn fetch(
        &mut self,
        endpoint: Endpoint,
        resource: Resource,
        query: Vec<(String, String)>,
    ) -> Result<Vec<Value>> {
        let response = self.client.get_json(endpoint, query).await?;
        let records = unwrap_envelope(response, resource);
        info!("Fetched {} {} records (v1)", records.len(), resource.name());
        Ok(records)
    }

    /// Supply points of the account, optionally for one distributor
    pub async fn get_supplies(&mut self, distributor_code: Option<&str>) -> Result<Vec<Value>> {
        let mut query = Vec::new();
        if let Some(code) = distributor_code {
            query.push(param("distributorCode", validate_distributor_code(code)?));
        }

        self.fetch(Endpoint::Supplies, Resource::Supplies, query).await
    }

    pub async fn get_distributors(&mut self) -> Result<Vec<Value>> {
        self.fetch(Endpoint::Distributors, Resource::Distributors, Vec::new())
            .await
    }

    pub async fn get_contract_detail(
        &mut self,
        cups: &str,
        distributor_code: &str,
    ) -> Result<Vec<Value>> {
        let query = vec![
            param("cups", validate_cups(cups)?),
            param("distributorCode", validate_distributor_code(distributor_code)?),
        ];

        self.fetch(Endpoint::ContractDetail, Resource::Contracts, query)
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
    ) -> Result<Vec<Value>> {
        let cups = validate_cups(cups)?;
        let distributor_code = validate_distributor_code(distributor_code)?;
        let (date_from, date_to) = validate_date_range(date_from, date_to, DateFormat::Monthly)?;
        let measurement_type = validate_measurement_type(measurement_type)?;
        let point_type = validate_point_type(point_type, PointTypeRange::Extended)?;

        let query = vec![
            param("cups", cups),
            param("distributorCode", distributor_code),
            param("startDate", date_from),
            param("endDate", date_to),
            param("measurementType", measurement_type),
            param("pointType", point_type),
        ];

        self.fetch(Endpoint::Consumption, Resource::Consumption, query)
            .await
    }

    pub async fn get_max_power(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<Vec<Value>> {
        let cups = validate_cups(cups)?;
        let distributor_code = validate_distributor_code(distributor_code)?;
        let (date_from, date_to) = validate_date_range(date_from, date_to, DateFormat::Monthly)?;

        let query = vec![
            param("cups", cups),
            param("distributorCode", distributor_code),
            param("startDate", date_from),
            param("endDate", date_to),
        ];

        self.fetch(Endpoint::MaxPower, Resource::MaxPower, query)
            .await
    }

    /// CUPS codes of every supply point
    pub async fn get_cups_list(&mut self) -> Result<Vec<String>> {
        let cups = self
            .get_supplies(None)
            .await?
            .iter()
            .filter_map(|supply| supply.get("cups").and_then(Value::as_str))
            .map(str::to_string)
            .collect::<Vec<_>>();

        debug!("Found {} CUPS codes", cups.len());
        Ok(cups)
    }

    /// Distinct distributor codes of the account's supply points, sorted
    pub async fn get_distributor_codes(&mut self) -> Result<Vec<String>> {
        let codes = self
            .get_supplies(None)
            .await?
            .iter()
            .filter_map(|supply| supply.get("distributorCode").and_then(Value::as_str))
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();

        debug!("Found {} distributor codes", codes.len());
        Ok(codes.into_iter().collect())
    }
}

/// Typed v1 view over a client
pub struct V1Typed<'a> {
    client: &'a mut DatadisClient,
}

impl<'a> V1Typed<'a> {
    pub(crate) fn new(client: &'a mut DatadisClient) -> Self {
        Self { client }
    }

    pub async fn get_supplies(
        &mut self,
        distributor_code: Option<&str>,
    ) -> Result<ParsedRecords<SupplyData>> {
        let raw = self.client.v1().get_supplies(distributor_code).await?;
        Ok(ParsedRecords::parse(raw, Resource::Supplies))
    }

    pub async fn get_distributors(&mut self) -> Result<ParsedRecords<DistributorData>> {
        let raw = self.client.v1().get_distributors().await?;
        Ok(ParsedRecords::parse(raw, Resource::Distributors))
    }

    pub async fn get_contract_detail(
        &mut self,
        cups: &str,
        distributor_code: &str,
    ) -> Result<ParsedRecords<ContractData>> {
        let raw = self
            .client
            .v1()
            .get_contract_detail(cups, distributor_code)
            .await?;
        Ok(ParsedRecords::parse(raw, Resource::Contracts))
    }

    pub async fn get_consumption(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
        measurement_type: Option<i64>,
        point_type: Option<i64>,
    ) -> Result<ParsedRecords<ConsumptionData>> {
        let raw = self
            .client
            .v1()
            .get_consumption(
                cups,
                distributor_code,
                date_from,
                date_to,
                measurement_type,
                point_type,
            )
            .await?;
        Ok(ParsedRecords::parse(raw, Resource::Consumption))
    }

    pub async fn get_max_power(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<ParsedRecords<MaxPowerData>> {
        let raw = self
            .client
            .v1()
            .get_max_power(cups, distributor_code, date_from, date_to)
            .await?;
        Ok(ParsedRecords::parse(raw, Resource::MaxPower))
    }
}
