use crate::client::{ClientConfig, DatadisClient};
use crate::errors::Result;
use crate::v1::{V1Raw, V1Typed};
use crate::v2::V2Typed;
use chrono::{DateTime, Utc};
use datadis_core::{
    ConsumptionData, ConsumptionSummary, ContractData, DistributorData, MaxPowerData,
    ReactiveEnergyData, SupplyData, V2Response,
};
use datadis_utils::format_consumption_summary;
use log::info;
use serde::Serialize;

pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Snapshot of a client's state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientInfo {
    pub sdk_version: &'static str,
    pub username: String,
    pub authenticated: bool,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub api_versions: Vec<&'static str>,
    pub default_version: &'static str,
}

/// Main SDK struct for Datadis
///
/// Convenience methods use the v2 endpoints; [`Datadis::v1`] and
/// [`Datadis::v2`] give access to the full views.
#[derive(Debug)]
pub struct Datadis {
    client: DatadisClient,
}

impl Datadis {
    /// Create new Datadis instance with default settings
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Ok(Self::from_client(DatadisClient::with_credentials(
            username, password,
        )?))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(config.build()?))
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_client(DatadisClient::from_env()?))
    }

    pub fn from_client(client: DatadisClient) -> Self {
        Self { client }
    }

    pub fn client(&mut self) -> &mut DatadisClient {
        &mut self.client
    }

    pub fn v1(&mut self) -> V1Raw<'_> {
        self.client.v1()
    }

    pub fn v1_typed(&mut self) -> V1Typed<'_> {
        self.client.v1_typed()
    }

    pub fn v2(&mut self) -> V2Typed<'_> {
        self.client.v2()
    }

    pub async fn authenticate(&mut self) -> Result<()> {
        self.client.authenticate().await
    }

    pub async fn get_supplies(
        &mut self,
        distributor_code: Option<&str>,
    ) -> Result<V2Response<SupplyData>> {
        self.client.v2().get_supplies(distributor_code).await
    }

    pub async fn get_distributors(&mut self) -> Result<V2Response<DistributorData>> {
        self.client.v2().get_distributors().await
    }

    pub async fn get_contract_detail(
        &mut self,
        cups: &str,
        distributor_code: &str,
    ) -> Result<V2Response<ContractData>> {
        self.client
            .v2()
            .get_contract_detail(cups, distributor_code)
            .await
    }

    pub async fn get_consumption(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
        measurement_type: Option<i64>,
        point_type: Option<i64>,
    ) -> Result<V2Response<ConsumptionData>> {
        self.client
            .v2()
            .get_consumption(
                cups,
                distributor_code,
                date_from,
                date_to,
                measurement_type,
                point_type,
            )
            .await
    }

    pub async fn get_max_power(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<V2Response<MaxPowerData>> {
        self.client
            .v2()
            .get_max_power(cups, distributor_code, date_from, date_to)
            .await
    }

    pub async fn get_reactive_data(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<V2Response<ReactiveEnergyData>> {
        self.client
            .v2()
            .get_reactive_data(cups, distributor_code, date_from, date_to)
            .await
    }

    /// Total, average, max and min consumption over a range of months
    pub async fn consumption_summary(
        &mut self,
        cups: &str,
        distributor_code: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<ConsumptionSummary> {
        let consumption = self
            .get_consumption(cups, distributor_code, date_from, date_to, None, None)
            .await?;
        let summary = ConsumptionSummary::from_records(&consumption.records.records);

        info!("Consumption for {}: {}", cups, format_consumption_summary(&summary));
        Ok(summary)
    }

    pub fn client_info(&self) -> ClientInfo {
        ClientInfo {
            sdk_version: SDK_VERSION,
            username: self.client.username().to_string(),
            authenticated: self.client.is_authenticated(),
            token_expires_at: self.client.token_expires_at(),
            api_versions: vec!["v1", "v2"],
            default_version: "v2",
        }
    }

    pub fn close(self) {
        self.client.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{mount_login, test_client};
    use chrono::{Datelike, Local};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CUPS: &str = "ES0031607515707001RC0F";

    fn consumption(kwh: f64) -> serde_json::Value {
        json!({
            "cups": CUPS,
            "date": "2024/01/15",
            "time": "01:00",
            "consumptionKWh": kwh,
            "obtainMethod": "Real"
        })
    }

    #[tokio::test]
    async fn test_consumption_summary() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/get-consumption-data-v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timeCurve": [consumption(1.0), consumption(3.0), consumption(2.0)],
                "distributorError": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let today = Local::now().date_naive();
        let month = format!("{:04}/{:02}", today.year(), today.month());

        let mut sdk = Datadis::from_client(test_client(&server));
        let summary = sdk
            .consumption_summary(CUPS, "2", &month, &month)
            .await
            .unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.total_kwh, 6.0);
        assert_eq!(summary.average_kwh, 2.0);
        assert_eq!(summary.max_kwh, 3.0);
        assert_eq!(summary.min_kwh, 1.0);
    }

    #[tokio::test]
    async fn test_client_info_tracks_authentication() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;

        let mut sdk = Datadis::from_client(test_client(&server));
        let info = sdk.client_info();
        assert!(!info.authenticated);
        assert_eq!(info.username, "12345678A");
        assert_eq!(info.default_version, "v2");

        sdk.authenticate().await.unwrap();
        let info = sdk.client_info();
        assert!(info.authenticated);
        assert!(info.token_expires_at.is_some());

        sdk.close();
    }
}
