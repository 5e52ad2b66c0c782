//! Owner-console loaders built on the two gateways.
//!
//! # Design
//! Server-side loaders (`fetch_owner_summary`, `load_locations`) return data
//! a render can always use, falling back instead of failing. Client-side
//! helpers raise `ApiError` like the gateway they wrap.

pub mod lists;

use serde::Serialize;
use serde_json::{json, Value};
use url::form_urlencoded;

use crate::body::RequestBody;
use crate::client::ClientGateway;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::options::CallOptions;
use crate::server::{Inbound, ServerGateway, ServerResponse};
use crate::transport::Transport;
use crate::types::{list_under, list_under_any, Location, OwnerSummary, SessionUser};

use self::lists::{CreditQuery, AUDIT_KEYS, AUDIT_PATH, CREDITS_PATH, CREDIT_KEYS, LEDGER_KEYS, LEDGER_PATH};

pub const DEFAULT_RANGE: &str = "7d";
pub const SUMMARY_PATH: &str = "/owner/summary";
pub const SUMMARY_FALLBACK_PATH: &str = "/dashboard/owner/summary";
pub const LOCATIONS_PATH: &str = "/owner/locations";

/// Date range and location shared by every console view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalFilters {
    pub range: String,
    pub from: String,
    pub to: String,
    pub location_id: String,
}

impl Default for GlobalFilters {
    fn default() -> Self {
        Self {
            range: DEFAULT_RANGE.to_string(),
            from: String::new(),
            to: String::new(),
            location_id: String::new(),
        }
    }
}

impl GlobalFilters {
    /// Parse from a URL query string. The first occurrence of a key wins.
    pub fn from_query(query: &str) -> Self {
        let mut filters = Self::default();
        let mut seen = [false; 4];
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let (slot, index) = match &*key {
                "range" => (&mut filters.range, 0),
                "from" => (&mut filters.from, 1),
                "to" => (&mut filters.to, 2),
                "locationId" => (&mut filters.location_id, 3),
                _ => continue,
            };
            if seen[index] {
                continue;
            }
            seen[index] = true;
            if !value.is_empty() {
                *slot = value.into_owned();
            }
        }
        filters
    }

    /// Query string for backend calls: non-empty `locationId`, `from`, `to`.
    pub fn to_backend_query(&self) -> String {
        let mut qs = form_urlencoded::Serializer::new(String::new());
        for (key, value) in [("locationId", &self.location_id), ("from", &self.from), ("to", &self.to)] {
            if !value.is_empty() {
                qs.append_pair(key, value);
            }
        }
        qs.finish()
    }

    /// Append the backend query to `path`.
    pub fn apply(&self, path: &str) -> String {
        let qs = self.to_backend_query();
        if qs.is_empty() {
            return path.to_string();
        }
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{path}{sep}{qs}")
    }

    pub fn label(&self) -> String {
        if self.range == "custom" && !self.from.is_empty() && !self.to.is_empty() {
            return format!("{} → {}", self.from, self.to);
        }
        self.range.clone()
    }

    /// Short description of the active location and dates for list headers.
    pub fn hint(&self) -> String {
        let mut parts = Vec::new();
        if !self.location_id.is_empty() {
            parts.push(format!("Location {}", self.location_id));
        }
        if !self.from.is_empty() && !self.to.is_empty() {
            parts.push(format!("{} → {}", self.from, self.to));
        }
        if parts.is_empty() {
            return "All locations • Default range".to_string();
        }
        parts.join(" • ")
    }
}

/// Outcome of the summary lookup, including which endpoint answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub result: ServerResponse,
    pub used_path: String,
    pub primary_failed: Option<u16>,
}

impl SummaryReport {
    pub fn summary(&self) -> Option<OwnerSummary> {
        if !self.result.ok {
            return None;
        }
        self.result
            .data
            .get("summary")
            .and_then(|s| serde_json::from_value(s.clone()).ok())
    }
}

/// Fetch the KPI summary, retrying the legacy path when the primary is 404.
pub async fn fetch_owner_summary<T: Transport>(
    gateway: &ServerGateway<T>,
    inbound: &Inbound,
    filters: &GlobalFilters,
) -> Result<SummaryReport, ApiError> {
    let primary = filters.apply(SUMMARY_PATH);
    let first = gateway.call(&primary, inbound, CallOptions::get()).await?;
    if first.ok || first.status != 404 {
        return Ok(SummaryReport {
            result: first,
            used_path: primary,
            primary_failed: None,
        });
    }

    let fallback = filters.apply(SUMMARY_FALLBACK_PATH);
    tracing::debug!(%primary, %fallback, "summary endpoint missing, trying fallback");
    let second = gateway.call(&fallback, inbound, CallOptions::get()).await?;
    Ok(SummaryReport {
        result: second,
        used_path: fallback,
        primary_failed: Some(first.status),
    })
}

/// Locations the owner can filter by. Falls back to the user's own location.
pub async fn load_locations<T: Transport>(
    gateway: &ServerGateway<T>,
    inbound: &Inbound,
    user: &SessionUser,
) -> Vec<Location> {
    match gateway.call(LOCATIONS_PATH, inbound, CallOptions::get()).await {
        Ok(response) if response.ok => list_under(&response.data, "locations")
            .into_iter()
            .filter_map(|l| serde_json::from_value(l).ok())
            .collect(),
        _ => user
            .location_id
            .clone()
            .map(|id| {
                vec![Location {
                    id,
                    name: "Main location".to_string(),
                }]
            })
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Client-side helpers
// ---------------------------------------------------------------------------

pub async fn me<T: Transport>(gateway: &ClientGateway<T>) -> Result<Value, ApiError> {
    gateway.call("/auth/me", CallOptions::get()).await
}

pub async fn login<T: Transport>(gateway: &ClientGateway<T>, email: &str, password: &str) -> Result<Value, ApiError> {
    let body = RequestBody::Json(json!({ "email": email, "password": password }));
    gateway.call("/auth/login", CallOptions::post(body)).await
}

/// POST logout; on any failure retry once as GET.
pub async fn logout<T: Transport>(gateway: &ClientGateway<T>) -> Result<Value, ApiError> {
    match gateway
        .call("/auth/logout", CallOptions::get().method(HttpMethod::Post))
        .await
    {
        Ok(data) => Ok(data),
        Err(e) => {
            tracing::debug!(error = %e, "logout via POST failed, retrying with GET");
            gateway.call("/auth/logout", CallOptions::get()).await
        }
    }
}

/// `raw` as one URL path segment. Dot segments have no encoding that URL
/// parsers leave alone, so they are refused along with the empty id.
fn path_segment(raw: &str) -> Result<String, ApiError> {
    match raw {
        "" | "." | ".." => Err(ApiError::InvalidPathSegment(raw.to_string())),
        _ => Ok(form_urlencoded::byte_serialize(raw.as_bytes())
            .collect::<String>()
            .replace('+', "%20")),
    }
}

/// Every ledger row for the global filters. Narrow with `lists::LedgerFilter`.
pub async fn cash_ledger<T: Transport>(gateway: &ClientGateway<T>, filters: &GlobalFilters) -> Result<Vec<Value>, ApiError> {
    let data = gateway.call(&filters.apply(LEDGER_PATH), CallOptions::get()).await?;
    Ok(list_under_any(&data, &LEDGER_KEYS))
}

pub async fn credits<T: Transport>(
    gateway: &ClientGateway<T>,
    filters: &GlobalFilters,
    query: &CreditQuery,
) -> Result<Vec<Value>, ApiError> {
    let data = gateway.call(&query.path(filters), CallOptions::get()).await?;
    Ok(list_under_any(&data, &CREDIT_KEYS))
}

pub async fn credit<T: Transport>(gateway: &ClientGateway<T>, id: &str) -> Result<Value, ApiError> {
    let path = format!("{CREDITS_PATH}/{}", path_segment(id.trim())?);
    let data = gateway.call(&path, CallOptions::get()).await?;
    Ok(data.get("credit").cloned().unwrap_or(Value::Null))
}

/// Every audit row for the global filters. Narrow with `lists::AuditFilter`.
pub async fn audit<T: Transport>(gateway: &ClientGateway<T>, filters: &GlobalFilters) -> Result<Vec<Value>, ApiError> {
    let data = gateway.call(&filters.apply(AUDIT_PATH), CallOptions::get()).await?;
    Ok(list_under_any(&data, &AUDIT_KEYS))
}

pub async fn search_customers<T: Transport>(gateway: &ClientGateway<T>, query: &str) -> Result<Vec<Value>, ApiError> {
    let qs = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", query.trim())
        .finish();
    let data = gateway.call(&format!("/customers/search?{qs}"), CallOptions::get()).await?;
    Ok(list_under(&data, "customers"))
}
