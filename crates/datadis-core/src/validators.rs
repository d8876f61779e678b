//! Parameter validators.
//!
//! Every function here is pure and runs before a request is built, so bad
//! input is rejected without touching the network.

use crate::errors::{Result, ValidationError};
use chrono::{Datelike, Local, Months, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

pub const CUPS_PATTERN: &str = "^ES[0-9A-Z]{20,22}$";

/// Measurement types accepted by the consumption endpoints
pub const MEASUREMENT_CONSUMPTION: u8 = 0;
pub const MEASUREMENT_GENERATION: u8 = 1;

/// Point types (border, consumption, generation, auxiliary services)
pub const POINT_BORDER: u8 = 1;
pub const POINT_CONSUMPTION: u8 = 2;
pub const POINT_GENERATION: u8 = 3;
pub const POINT_AUXILIARY_SERVICES: u8 = 4;

const HISTORY_MONTHS: u32 = 24;

fn cups_regex() -> &'static Regex {
    static CUPS: OnceLock<Regex> = OnceLock::new();
    CUPS.get_or_init(|| Regex::new(CUPS_PATTERN).expect("CUPS pattern is a valid regex"))
}

fn monthly_regex() -> &'static Regex {
    static MONTHLY: OnceLock<Regex> = OnceLock::new();
    MONTHLY.get_or_init(|| Regex::new(r"^\d{4}/\d{2}$").expect("monthly pattern is a valid regex"))
}

fn daily_regex() -> &'static Regex {
    static DAILY: OnceLock<Regex> = OnceLock::new();
    DAILY.get_or_init(|| {
        Regex::new(r"^\d{4}/\d{2}/\d{2}$").expect("daily pattern is a valid regex")
    })
}

/// Date granularity accepted by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYY/MM`, used by the v2 endpoints
    Monthly,
    /// `YYYY/MM/DD`, used by the v1 endpoints
    Daily,
}

impl DateFormat {
    pub fn expected(&self) -> &'static str {
        match self {
            DateFormat::Monthly => "YYYY/MM",
            DateFormat::Daily => "YYYY/MM/DD",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            DateFormat::Monthly => monthly_regex(),
            DateFormat::Daily => daily_regex(),
        }
    }

    fn parse(&self, value: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::Monthly => {
                NaiveDate::parse_from_str(&format!("{}/01", value), "%Y/%m/%d").ok()
            }
            DateFormat::Daily => NaiveDate::parse_from_str(value, "%Y/%m/%d").ok(),
        }
    }

    /// Reduce a reference date to the granularity of this format
    fn truncate(&self, date: NaiveDate) -> NaiveDate {
        match self {
            DateFormat::Monthly => date.with_day(1).unwrap_or(date),
            DateFormat::Daily => date,
        }
    }
}

/// Upper bound of the accepted point types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTypeRange {
    /// 1..=4
    Standard,
    /// 1..=5, accepted by the v1 endpoints
    Extended,
}

impl PointTypeRange {
    pub fn max(&self) -> u8 {
        match self {
            PointTypeRange::Standard => 4,
            PointTypeRange::Extended => 5,
        }
    }
}

/// Validate a CUPS code, returning it trimmed and upper-cased
pub fn validate_cups(cups: &str) -> Result<String> {
    let normalized = cups.trim().to_uppercase();

    if normalized.is_empty() {
        return Err(ValidationError::EmptyCups {
            expected: CUPS_PATTERN,
        });
    }

    if !cups_regex().is_match(&normalized) {
        return Err(ValidationError::InvalidCups {
            value: cups.to_string(),
            expected: CUPS_PATTERN,
        });
    }

    Ok(normalized)
}

/// Validate a date range against today's date
pub fn validate_date_range(
    date_from: &str,
    date_to: &str,
    format: DateFormat,
) -> Result<(String, String)> {
    validate_date_range_at(date_from, date_to, format, Local::now().date_naive())
}

/// Validate a date range against an explicit reference date
pub fn validate_date_range_at(
    date_from: &str,
    date_to: &str,
    format: DateFormat,
    today: NaiveDate,
) -> Result<(String, String)> {
    let start = parse_date("date_from", date_from, format)?;
    let end = parse_date("date_to", date_to, format)?;

    if start > end {
        return Err(ValidationError::InvertedRange {
            from: date_from.to_string(),
            to: date_to.to_string(),
        });
    }

    let earliest = today
        .checked_sub_months(Months::new(HISTORY_MONTHS))
        .map(|d| format.truncate(d))
        .unwrap_or(NaiveDate::MIN);
    if start < earliest {
        return Err(ValidationError::StartTooOld {
            from: date_from.to_string(),
            earliest: earliest.format("%Y/%m/%d").to_string(),
        });
    }

    if end > format.truncate(today) {
        return Err(ValidationError::EndInFuture {
            to: date_to.to_string(),
        });
    }

    Ok((date_from.to_string(), date_to.to_string()))
}

fn parse_date(field: &'static str, value: &str, format: DateFormat) -> Result<NaiveDate> {
    if !format.regex().is_match(value) {
        return Err(ValidationError::InvalidDateFormat {
            field,
            value: value.to_string(),
            expected: format.expected(),
        });
    }

    format.parse(value).ok_or_else(|| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
        expected: format.expected(),
    })
}

/// Validate a distributor code ("1" to "8")
pub fn validate_distributor_code(distributor_code: &str) -> Result<String> {
    let code = distributor_code.trim();
    match code {
        "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" => Ok(code.to_string()),
        _ => Err(ValidationError::InvalidDistributorCode(
            distributor_code.to_string(),
        )),
    }
}

/// Validate a measurement type, defaulting to consumption
pub fn validate_measurement_type(measurement_type: Option<i64>) -> Result<u8> {
    match measurement_type {
        None => Ok(MEASUREMENT_CONSUMPTION),
        Some(0) => Ok(MEASUREMENT_CONSUMPTION),
        Some(1) => Ok(MEASUREMENT_GENERATION),
        Some(other) => Err(ValidationError::InvalidMeasurementType(other)),
    }
}

/// Validate a point type, defaulting to border points
pub fn validate_point_type(point_type: Option<i64>, range: PointTypeRange) -> Result<u8> {
    let Some(value) = point_type else {
        return Ok(POINT_BORDER);
    };

    let max = range.max();
    if (1..=i64::from(max)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ValidationError::InvalidPointType { value, max })
    }
}
