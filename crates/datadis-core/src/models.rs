use serde::{Deserialize, Serialize};

// Wire names are camelCase; snake_case names are accepted as aliases so
// records built by callers deserialize as well.

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SupplyData {
    pub address: String,
    pub cups: String,
    #[serde(rename = "postalCode", alias = "postal_code")]
    pub postal_code: String,
    pub province: String,
    pub municipality: String,
    pub distributor: String,
    #[serde(rename = "validDateFrom", alias = "valid_date_from")]
    pub valid_date_from: String,
    #[serde(rename = "validDateTo", alias = "valid_date_to", default)]
    pub valid_date_to: Option<String>,
    #[serde(rename = "pointType", alias = "point_type")]
    pub point_type: u8,
    #[serde(rename = "distributorCode", alias = "distributor_code")]
    pub distributor_code: String,
}

/// Ownership period of a contract
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DateOwner {
    #[serde(rename = "startDate", alias = "start_date")]
    pub start_date: String,
    #[serde(rename = "endDate", alias = "end_date", default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ContractData {
    pub cups: String,
    pub distributor: String,
    #[serde(default)]
    pub marketer: Option<String>,
    pub tension: String,
    #[serde(rename = "accessFare", alias = "access_fare")]
    pub access_fare: String,
    pub province: String,
    pub municipality: String,
    #[serde(rename = "postalCode", alias = "postal_code")]
    pub postal_code: String,
    #[serde(rename = "contractedPowerkW", alias = "contracted_power_kw")]
    pub contracted_power_kw: Vec<f64>,
    #[serde(rename = "timeDiscrimination", alias = "time_discrimination", default)]
    pub time_discrimination: Option<String>,
    #[serde(rename = "modePowerControl", alias = "mode_power_control")]
    pub mode_power_control: String,
    #[serde(rename = "startDate", alias = "start_date")]
    pub start_date: String,
    #[serde(rename = "endDate", alias = "end_date", default)]
    pub end_date: Option<String>,
    #[serde(rename = "codeFare", alias = "code_fare", default)]
    pub code_fare: Option<String>,
    #[serde(
        rename = "selfConsumptionTypeCode",
        alias = "self_consumption_type_code",
        default
    )]
    pub self_consumption_type_code: Option<String>,
    #[serde(
        rename = "selfConsumptionTypeDesc",
        alias = "self_consumption_type_desc",
        default
    )]
    pub self_consumption_type_desc: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub subsection: Option<String>,
    #[serde(
        rename = "partitionCoefficient",
        alias = "partition_coefficient",
        default
    )]
    pub partition_coefficient: Option<f64>,
    #[serde(default)]
    pub cau: Option<String>,
    #[serde(rename = "installedCapacityKW", alias = "installed_capacity_kw", default)]
    pub installed_capacity_kw: Option<f64>,
    #[serde(rename = "dateOwner", alias = "date_owner", default)]
    pub date_owner: Option<Vec<DateOwner>>,
    #[serde(rename = "lastMarketerDate", alias = "last_marketer_date", default)]
    pub last_marketer_date: Option<String>,
    #[serde(rename = "maxPowerInstall", alias = "max_power_install", default)]
    pub max_power_install: Option<String>,
}

/// One interval of the consumption time curve
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConsumptionData {
    pub cups: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "consumptionKWh", alias = "consumption_kwh")]
    pub consumption_kwh: f64,
    #[serde(rename = "obtainMethod", alias = "obtain_method")]
    pub obtain_method: String,
    #[serde(rename = "surplusEnergyKWh", alias = "surplus_energy_kwh", default)]
    pub surplus_energy_kwh: Option<f64>,
    #[serde(rename = "generationEnergyKWh", alias = "generation_energy_kwh", default)]
    pub generation_energy_kwh: Option<f64>,
    #[serde(
        rename = "selfConsumptionEnergyKWh",
        alias = "self_consumption_energy_kwh",
        default
    )]
    pub self_consumption_energy_kwh: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MaxPowerData {
    pub cups: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "maxPower", alias = "max_power")]
    pub max_power: f64,
    pub period: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DistributorData {
    #[serde(rename = "distributorCodes", alias = "distributor_codes")]
    pub distributor_codes: Vec<String>,
}

/// Reactive energy of one billing period, split by tariff period
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReactiveEnergyPeriod {
    pub date: String,
    #[serde(default)]
    pub energy_p1: Option<f64>,
    #[serde(default)]
    pub energy_p2: Option<f64>,
    #[serde(default)]
    pub energy_p3: Option<f64>,
    #[serde(default)]
    pub energy_p4: Option<f64>,
    #[serde(default)]
    pub energy_p5: Option<f64>,
    #[serde(default)]
    pub energy_p6: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReactiveEnergyData {
    pub cups: String,
    pub energy: Vec<ReactiveEnergyPeriod>,
}

/// Partial failure reported for one distributor in a v2 response
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DistributorError {
    #[serde(rename = "distributorCode", alias = "distributor_code")]
    pub distributor_code: String,
    #[serde(rename = "distributorName", alias = "distributor_name", default)]
    pub distributor_name: Option<String>,
    #[serde(rename = "errorCode", alias = "error_code")]
    pub error_code: String,
    #[serde(rename = "errorDescription", alias = "error_description", default)]
    pub error_description: Option<String>,
}

/// Aggregate figures over a consumption time curve
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConsumptionSummary {
    pub records: usize,
    pub total_kwh: f64,
    pub average_kwh: f64,
    pub max_kwh: f64,
    pub min_kwh: f64,
}

impl ConsumptionSummary {
    pub fn from_records(records: &[ConsumptionData]) -> Self {
        if records.is_empty() {
            return Self {
                records: 0,
                total_kwh: 0.0,
                average_kwh: 0.0,
                max_kwh: 0.0,
                min_kwh: 0.0,
            };
        }

        let total_kwh: f64 = records.iter().map(|r| r.consumption_kwh).sum();
        let max_kwh = records
            .iter()
            .map(|r| r.consumption_kwh)
            .fold(f64::NEG_INFINITY, f64::max);
        let min_kwh = records
            .iter()
            .map(|r| r.consumption_kwh)
            .fold(f64::INFINITY, f64::min);

        Self {
            records: records.len(),
            total_kwh,
            average_kwh: total_kwh / records.len() as f64,
            max_kwh,
            min_kwh,
        }
    }
}
