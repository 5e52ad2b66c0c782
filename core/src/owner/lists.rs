//! Narrowing and totals for the console's list views.
//!
//! Ledger and audit rows are fetched whole and narrowed here. Credits are
//! narrowed by the backend, which takes `status`, `q` and `limit` on top of
//! the global query; only the totals are computed locally.

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use super::GlobalFilters;
use crate::types::{first_text, number_of, text_of};

pub const MAX_LIMIT: i64 = 500;
pub const LEDGER_LIMIT: i64 = 100;
pub const AUDIT_LIMIT: i64 = 200;
pub const CREDITS_LIMIT: u32 = 50;
pub const DEFAULT_CREDIT_STATUS: &str = "OPEN";

pub const LEDGER_PATH: &str = "/cash/ledger";
pub const CREDITS_PATH: &str = "/credits";
pub const AUDIT_PATH: &str = "/audit";

/// Keys the rows may arrive under, most specific first.
pub const LEDGER_KEYS: [&str; 2] = ["ledger", "rows"];
pub const CREDIT_KEYS: [&str; 3] = ["credits", "items", "rows"];
pub const AUDIT_KEYS: [&str; 3] = ["audit", "logs", "rows"];

/// Row limit within `1..=500`. Zero means `default`.
pub fn clamp_limit(limit: i64, default: i64) -> usize {
    let limit = if limit == 0 { default } else { limit };
    limit.clamp(1, MAX_LIMIT) as usize
}

fn equals_ignoring_case(row: &Value, key: &str, wanted: &str) -> bool {
    wanted.is_empty() || text_of(row.get(key)).eq_ignore_ascii_case(wanted)
}

// ---------------------------------------------------------------------------
// Cash ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFilter {
    /// `IN`, `OUT`, or empty for both.
    pub direction: String,
    /// Entry type such as `SALE_PAYMENT`, or empty for all.
    pub kind: String,
    pub limit: i64,
}

impl Default for LedgerFilter {
    fn default() -> Self {
        Self {
            direction: String::new(),
            kind: String::new(),
            limit: LEDGER_LIMIT,
        }
    }
}

impl LedgerFilter {
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        rows.iter()
            .filter(|row| equals_ignoring_case(row, "direction", &self.direction))
            .filter(|row| equals_ignoring_case(row, "type", &self.kind))
            .take(clamp_limit(self.limit, LEDGER_LIMIT))
            .cloned()
            .collect()
    }

    /// Filtered rows together with their totals.
    pub fn view(&self, rows: &[Value]) -> LedgerView {
        let rows = self.apply(rows);
        let totals = LedgerTotals::of(&rows);
        LedgerView { rows, totals }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub in_total: f64,
    pub out_total: f64,
    pub net: f64,
}

impl LedgerTotals {
    /// Sum `amount` by direction. Rows with any other direction are ignored.
    pub fn of(rows: &[Value]) -> Self {
        let mut totals = Self::default();
        for row in rows {
            let amount = row.get("amount").map(number_of).unwrap_or(0.0);
            match text_of(row.get("direction")).to_ascii_uppercase().as_str() {
                "IN" => totals.in_total += amount,
                "OUT" => totals.out_total += amount,
                _ => {}
            }
        }
        totals.net = totals.in_total - totals.out_total;
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerView {
    pub rows: Vec<Value>,
    pub totals: LedgerTotals,
}

// ---------------------------------------------------------------------------
// Credits
// ---------------------------------------------------------------------------

/// Backend-side narrowing for the credits list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditQuery {
    /// `OPEN`, `SETTLED`, `REJECTED`, or empty for every status.
    pub status: String,
    pub q: String,
    /// Zero leaves the limit to the backend.
    pub limit: u32,
}

impl Default for CreditQuery {
    fn default() -> Self {
        Self {
            status: DEFAULT_CREDIT_STATUS.to_string(),
            q: String::new(),
            limit: CREDITS_LIMIT,
        }
    }
}

impl CreditQuery {
    /// Every status, no search, default limit.
    pub fn any_status() -> Self {
        Self {
            status: String::new(),
            ..Self::default()
        }
    }

    /// `/credits` with the global query followed by `status`, `q` and `limit`.
    pub fn path(&self, filters: &GlobalFilters) -> String {
        let mut qs = form_urlencoded::Serializer::new(filters.to_backend_query());
        if !self.status.is_empty() {
            qs.append_pair("status", &self.status);
        }
        if !self.q.is_empty() {
            qs.append_pair("q", &self.q);
        }
        if self.limit > 0 {
            qs.append_pair("limit", &self.limit.to_string());
        }
        let qs = qs.finish();
        if qs.is_empty() {
            CREDITS_PATH.to_string()
        } else {
            format!("{CREDITS_PATH}?{qs}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CreditTotals {
    pub count: usize,
    pub total: f64,
}

impl CreditTotals {
    pub fn of(rows: &[Value]) -> Self {
        Self {
            count: rows.len(),
            total: rows.iter().map(|row| row.get("amount").map(number_of).unwrap_or(0.0)).sum(),
        }
    }
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFilter {
    /// Free text over description, entity, action and entity id.
    pub q: String,
    /// Substring of the action, any case.
    pub action: String,
    /// Substring of the entity, any case.
    pub entity: String,
    /// Exact match on `userId` (or `user_id`).
    pub user_id: String,
    pub limit: i64,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            q: String::new(),
            action: String::new(),
            entity: String::new(),
            user_id: String::new(),
            limit: AUDIT_LIMIT,
        }
    }
}

impl AuditFilter {
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        rows.iter()
            .filter(|row| self.matches(row))
            .take(clamp_limit(self.limit, AUDIT_LIMIT))
            .cloned()
            .collect()
    }

    fn matches(&self, row: &Value) -> bool {
        let action = text_of(row.get("action")).to_lowercase();
        let entity = text_of(row.get("entity")).to_lowercase();

        if !self.action.is_empty() && !action.contains(&self.action.to_lowercase()) {
            return false;
        }
        if !self.entity.is_empty() && !entity.contains(&self.entity.to_lowercase()) {
            return false;
        }
        if !self.user_id.is_empty() && first_text(row, &["userId", "user_id"]) != self.user_id {
            return false;
        }
        if self.q.is_empty() {
            return true;
        }

        let q = self.q.to_lowercase();
        let description = first_text(row, &["description", "message"]).to_lowercase();
        // Entity ids are compared as sent.
        let entity_id = first_text(row, &["entityId", "entity_id"]);
        description.contains(&q) || entity.contains(&q) || action.contains(&q) || entity_id.contains(&q)
    }
}
