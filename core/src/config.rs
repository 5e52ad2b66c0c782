//! Backend origin resolution.
//!
//! Pure functions only; reading the environment is the binary's job so the
//! same resolution rules apply to values from any source.

/// Origin used when no configuration names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Environment variables consulted for the backend origin, in priority order.
pub const BASE_URL_VARS: [&str; 2] = ["CONSOLE_API_BASE_URL", "API_BASE_URL"];

/// Pick the first non-blank candidate, or `default`, without trailing slashes.
pub fn resolve_base_url(candidates: &[Option<&str>], default: &str) -> String {
    let chosen = candidates
        .iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .unwrap_or(default);
    chosen.trim_end_matches('/').to_string()
}

/// Resolve the backend origin from a variable lookup such as `std::env::var`.
pub fn resolve_from<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let values: Vec<Option<String>> = BASE_URL_VARS.iter().map(|name| lookup(name)).collect();
    let candidates: Vec<Option<&str>> = values.iter().map(Option::as_deref).collect();
    resolve_base_url(&candidates, DEFAULT_BASE_URL)
}
