//! Typed materialization of raw record lists.
//!
//! A malformed record never fails the batch: it is dropped and reported in
//! `rejected` together with its position in the raw list.

use crate::models::DistributorError;
use crate::normalize::{extract_distributor_errors, unwrap_envelope, Resource};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A raw record that could not be turned into its typed model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFailure {
    pub index: usize,
    pub reason: String,
}

/// Successfully parsed records plus the ones that were dropped
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecords<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RecordFailure>,
}

impl<T> Default for ParsedRecords<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T: DeserializeOwned> ParsedRecords<T> {
    /// Parse each raw record independently
    pub fn parse(raw: Vec<Value>, resource: Resource) -> Self {
        let mut parsed = Self::default();

        for (index, record) in raw.into_iter().enumerate() {
            match serde_json::from_value::<T>(record) {
                Ok(item) => parsed.records.push(item),
                Err(e) => {
                    warn!("Dropping invalid {} record #{}: {}", resource.name(), index, e);
                    parsed.rejected.push(RecordFailure {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            "Parsed {} {} records ({} rejected)",
            parsed.records.len(),
            resource.name(),
            parsed.rejected.len()
        );

        parsed
    }
}

impl<T> ParsedRecords<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of raw records received, valid or not
    pub fn total(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

impl<T> IntoIterator for ParsedRecords<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Typed v2 result: records plus per-distributor partial failures
#[derive(Debug, Clone, PartialEq)]
pub struct V2Response<T> {
    pub records: ParsedRecords<T>,
    pub distributor_errors: Vec<DistributorError>,
}

impl<T: DeserializeOwned> V2Response<T> {
    /// Split a v2 envelope into typed records and distributor errors
    pub fn from_envelope(response: Value, resource: Resource) -> Self {
        let distributor_errors = extract_distributor_errors(&response)
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<DistributorError>(raw) {
                Ok(err) => Some(err),
                Err(e) => {
                    warn!("Ignoring malformed distributorError entry: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        for err in &distributor_errors {
            warn!(
                "Distributor {} reported error {}: {}",
                err.distributor_code,
                err.error_code,
                err.error_description.as_deref().unwrap_or("no description")
            );
        }

        let raw = unwrap_envelope(response, resource);
        Self {
            records: ParsedRecords::parse(raw, resource),
            distributor_errors,
        }
    }
}

impl<T> V2Response<T> {
    pub fn has_distributor_errors(&self) -> bool {
        !self.distributor_errors.is_empty()
    }

    pub fn into_records(self) -> Vec<T> {
        self.records.into_records()
    }
}
