//! User-Agent string for catalog and print-view requests.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/chartfetch";

/// Default User-Agent for all catalog traffic (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("chartfetch/{version} (vfr-chart-mirror; +{PROJECT_UA_URL})")
}
