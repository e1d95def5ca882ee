//! User-Agent string for catalog traffic.

/// Project URL so catalog operators can identify the tool.
const PROJECT_UA_URL: &str = "https://github.com/fierce/bibliophile";

/// Default User-Agent for every catalog request.
#[must_use]
pub(crate) fn default_catalog_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bibliophile/{version} (library-catalog-lookup; +{PROJECT_UA_URL})")
}
