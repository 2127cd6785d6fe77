// [libs/infra/store/src/mapping.rs]
//! Scalar ↔ column helpers shared by every repository. libsql has no
//! native array or timestamp type, so lists travel as JSON text and
//! timestamps as RFC3339 strings — every repository goes through here
//! rather than rolling its own `to_string()`/`parse()` pair.

use crate::errors::StoreError;
use chrono::{DateTime, NaiveDate, Utc};

pub fn to_json(value: &impl serde::Serialize) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::MappingError(e.to_string()))
}

pub fn from_json<T: serde::de::DeserializeOwned + Default>(raw: Option<String>) -> Result<T, StoreError> {
    match raw {
        None => Ok(T::default()),
        Some(text) => serde_json::from_str(&text).map_err(|e| StoreError::MappingError(e.to_string())),
    }
}

pub fn to_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::MappingError(format!("bad timestamp {raw}: {e}")))
}

pub fn parse_rfc3339_opt(raw: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    raw.map(|s| parse_rfc3339(&s)).transpose()
}

pub fn to_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn parse_date_opt(raw: Option<String>) -> Result<Option<NaiveDate>, StoreError> {
    raw.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| StoreError::MappingError(e.to_string())))
        .transpose()
}

pub fn parse_enum<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| StoreError::MappingError(format!("bad enum value {raw:?}: {e}")))
}

pub fn parse_enum_opt<T: serde::de::DeserializeOwned>(raw: Option<String>) -> Result<Option<T>, StoreError> {
    raw.map(|s| parse_enum(&s)).transpose()
}

pub fn enum_str(value: &impl serde::Serialize) -> Result<String, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::MappingError(e.to_string()))? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(StoreError::MappingError(format!("expected string enum, got {other}"))),
    }
}
