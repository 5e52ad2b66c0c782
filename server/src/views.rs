//! Owner views rendered on the server, behind `OwnerSession`.

use axum::{
    extract::{RawQuery, State},
    Json,
};
use serde_json::{json, Value};

use console_core::decode::error_message;
use console_core::owner::{fetch_owner_summary, load_locations, SUMMARY_PATH};
use console_core::GlobalFilters;

use crate::guard::OwnerSession;
use crate::state::AppState;

/// Overview page model: who is logged in, which locations they can pick,
/// the active filters and the KPI summary. A failed summary becomes an error
/// panel with the status and endpoint instead of failing the page.
pub async fn overview(
    State(state): State<AppState>,
    OwnerSession { user, inbound }: OwnerSession,
    RawQuery(query): RawQuery,
) -> Json<Value> {
    let filters = GlobalFilters::from_query(query.as_deref().unwrap_or_default());
    let locations = load_locations(&*state.gateway, &inbound, &user).await;

    let summary = match fetch_owner_summary(&*state.gateway, &inbound, &filters).await {
        Ok(report) => match report.summary() {
            Some(summary) => json!({
                "ok": true,
                "status": report.result.status,
                "endpoint": report.used_path,
                "data": summary,
                "unrecordedPaymentsHint": summary.unrecorded_payments_hint(),
            }),
            None => json!({
                "ok": false,
                "status": report.result.status,
                "endpoint": report.used_path,
                "primaryFailedStatus": report.primary_failed,
                "error": error_message(&report.result.data),
            }),
        },
        Err(e) => json!({
            "ok": false,
            "status": null,
            "endpoint": filters.apply(SUMMARY_PATH),
            "error": e.to_string(),
        }),
    };

    Json(json!({
        "user": user,
        "filters": {
            "range": filters.range,
            "from": filters.from,
            "to": filters.to,
            "locationId": filters.location_id,
            "label": filters.label(),
            "hint": filters.hint(),
        },
        "locations": locations,
        "summary": summary,
    }))
}
