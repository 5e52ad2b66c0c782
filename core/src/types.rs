//! Backend DTOs read by the console.
//!
//! # Design
//! The backend is a black box, so decoding is lenient: missing fields take
//! defaults and numeric KPIs accept either JSON numbers or numeric strings.
//! Ledger, credit, audit and customer rows are kept as raw JSON; the console
//! only lists them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier the backend may send as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Identity returned by `GET /auth/me` under `user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location_id: Option<RecordId>,
}

impl SessionUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.eq_ignore_ascii_case(role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: RecordId,
    pub name: String,
}

/// KPIs returned under `summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(default, deserialize_with = "lenient_number")]
    pub users_count: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub products_count: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sales_count: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sales_total_amount: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub payments_count: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub payments_total_amount: f64,
}

impl OwnerSummary {
    /// Sales were made but no payment was recorded in the period.
    pub fn unrecorded_payments_hint(&self) -> bool {
        self.sales_count > 0.0 && self.payments_count == 0.0
    }
}

/// Numbers, numeric strings, or anything else as zero.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| number_of(&value))
}

/// `null` reads as an empty string. Other non-string values are rejected.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Numeric reading of a backend field: numbers and numeric strings count,
/// everything else (including non-finite results) is zero.
pub fn number_of(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Text reading of a row field. Missing, `null`, `false`, `0` and `""` are
/// all empty; numbers and booleans are rendered.
pub fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// First non-empty text among `keys` in `row`.
pub fn first_text(row: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text_of(row.get(key)))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Rows under `key` in `data`, or empty when absent or not an array.
pub fn list_under(data: &Value, key: &str) -> Vec<Value> {
    list_under_any(data, &[key])
}

/// Rows under the first of `keys` that is present and not `null`. Empty when
/// that value is not an array.
pub fn list_under_any(data: &Value, keys: &[&str]) -> Vec<Value> {
    keys.iter()
        .filter_map(|key| data.get(key))
        .find(|value| !value.is_null())
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
