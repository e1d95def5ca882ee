//! HTTP client construction for catalog requests.
//!
//! Every catalog client shares the same timeout, user-agent, and compression
//! settings, plus a fallback for hosts where system proxy lookup panics.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::error::CatalogError;

/// Default TCP connect timeout.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default whole-request timeout enforced by the client.
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Client-level timeouts, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Builds the HTTP client used for catalog traffic.
///
/// # Errors
///
/// Returns [`CatalogError::ClientBuild`] when client construction fails.
pub fn build_catalog_http_client(
    user_agent: impl Into<String>,
    timeouts: HttpTimeouts,
) -> Result<Client, CatalogError> {
    let user_agent = user_agent.into();

    match try_build_client(&user_agent, timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed macOS environments panic when reading system proxy
            // settings; env proxies still apply on the fallback path.
            warn!("Catalog client hit system proxy panic; using env-proxy fallback builder");
            try_build_client(&user_agent, timeouts, true).map_err(BuildClientFailure::into_error)
        }
        Err(failure) => Err(failure.into_error()),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

impl BuildClientFailure {
    fn into_error(self) -> CatalogError {
        let reason = match self {
            Self::Panic => "client construction panicked while reading proxy settings".to_string(),
            Self::Build(error) => error.to_string(),
        };
        CatalogError::ClientBuild { reason }
    }
}

fn try_build_client(
    user_agent: &str,
    timeouts: HttpTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let user_agent = user_agent.to_string();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(user_agent, timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(user_agent: String, timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    for (scheme, names) in [
        ("https", ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        ("http", ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
    ] {
        let Some(proxy) = first_env_value(&names) else {
            continue;
        };
        let resolved = if scheme == "https" {
            Proxy::https(&proxy)
        } else {
            Proxy::http(&proxy)
        };
        if let Ok(resolved) = resolved {
            builder = builder.proxy(resolved);
        }
    }
    builder
}

fn first_env_value(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
