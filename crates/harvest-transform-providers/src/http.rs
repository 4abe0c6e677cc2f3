// crates/harvest-transform-providers/src/http.rs
// ============================================================================
// Module: HTTP Asset Fetcher
// Description: Bounded HTTP retrieval of build-script assets.
// Purpose: Fetch CWL scripts for synthesis with strict limits.
// Dependencies: harvest-transform-core, reqwest, url
// ============================================================================

//! ## Overview
//! The HTTP fetcher issues bounded GET requests for build-script assets. It
//! enforces scheme restrictions, an optional host allowlist, a hard response
//! size limit, and refuses redirects, so a hostile or misconfigured asset
//! href cannot stall or balloon a transformation run.
//! Invariants:
//! - `allow_http = false` blocks cleartext `http://` URLs.
//! - `max_asset_bytes` is a hard upper bound on fetched bodies.
//! - URLs with embedded credentials are rejected.
//! - Every failure maps onto [`FetchError`]; the caller degrades to
//!   defaults rather than aborting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io::Read;
use std::time::Duration;

use harvest_transform_core::AssetFetcher;
use harvest_transform_core::FetchError;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP asset fetcher.
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle.
/// - If `allowed_hosts` is set, only listed hosts are permitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpFetcherConfig {
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum asset size allowed, in bytes.
    pub max_asset_bytes: usize,
    /// Optional host allowlist.
    pub allowed_hosts: Option<BTreeSet<String>>,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            timeout_ms: 10_000,
            max_asset_bytes: 4 * 1024 * 1024,
            allowed_hosts: None,
            user_agent: "harvest-transform/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Fetcher Implementation
// ============================================================================

/// Asset fetcher issuing bounded blocking GET requests.
///
/// # Invariants
/// - Redirects are not followed.
/// - Responses exceeding configured limits fail closed.
#[derive(Debug)]
pub struct HttpFetcher {
    /// Fetcher configuration, including limits and policy.
    config: HttpFetcherConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpFetcher {
    /// Creates a new HTTP fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the HTTP client cannot be created.
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| FetchError::Unreachable("http client build failed".to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let url = Url::parse(uri)
            .map_err(|_| FetchError::Denied(format!("invalid asset url: {uri}")))?;
        validate_url(&url, &self.config)?;
        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|err| FetchError::Unreachable(err.to_string()))?;
        if response.url() != &url {
            return Err(FetchError::Denied(format!("redirect refused for {uri}")));
        }
        if response.status().is_redirection() {
            return Err(FetchError::Denied(format!("redirect refused for {uri}")));
        }
        if !response.status().is_success() {
            return Err(FetchError::Unreachable(format!(
                "{uri} returned status {}",
                response.status().as_u16()
            )));
        }
        read_response_limited(&mut response, uri, self.config.max_asset_bytes)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates URL scheme, credentials, and allowlist policy.
fn validate_url(url: &Url, config: &HttpFetcherConfig) -> Result<(), FetchError> {
    match url.scheme() {
        "https" => {}
        "http" if config.allow_http => {}
        other => {
            return Err(FetchError::Denied(format!("unsupported url scheme: {other}")));
        }
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(FetchError::Denied("url credentials are not allowed".to_string()));
    }
    if let Some(allowlist) = &config.allowed_hosts {
        let host = normalize_host_label(
            url.host_str()
                .ok_or_else(|| FetchError::Denied("url host required".to_string()))?,
        );
        let allowed =
            allowlist.iter().any(|entry| normalize_host_label(entry.as_str()) == host);
        if !allowed {
            return Err(FetchError::Denied(format!("host not allowed: {host}")));
        }
    }
    Ok(())
}

/// Normalizes host labels for allowlist comparisons.
fn normalize_host_label(host: &str) -> String {
    let trimmed = host.trim_end_matches('.');
    let trimmed =
        trimmed.strip_prefix('[').and_then(|inner| inner.strip_suffix(']')).unwrap_or(trimmed);
    trimmed.to_ascii_lowercase()
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut reqwest::blocking::Response,
    uri: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, FetchError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| FetchError::Denied("size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(FetchError::TooLarge {
            uri: uri.to_string(),
            max_bytes,
            actual_bytes: usize::try_from(expected).unwrap_or(usize::MAX),
        });
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    response
        .take(limit)
        .read_to_end(&mut buf)
        .map_err(|err| FetchError::Unreachable(err.to_string()))?;
    if buf.len() > max_bytes {
        return Err(FetchError::TooLarge {
            uri: uri.to_string(),
            max_bytes,
            actual_bytes: buf.len(),
        });
    }
    Ok(buf)
}
