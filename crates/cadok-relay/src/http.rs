// crates/cadok-relay/src/http.rs
// ============================================================================
// Module: Third-Party Relay Network Source
// Description: Best-effort HTTP source for partner relay networks.
// Purpose: Fetch candidate relay points with strict limits; failures degrade
//          the merged result, never the query.
// Dependencies: cadok-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! Each third-party network exposes an endpoint returning a JSON array of
//! relay points near an origin. Requests are bounded: redirects disabled,
//! explicit timeout, response size cap. Any failure is reported as a
//! [`SourceError`] which the directory treats as "omit this network".
//!
//! Security posture: network responses are untrusted; entries failing
//! deserialization reject the whole response (fail closed per source).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use cadok_core::GeoPoint;
use cadok_core::RelayPoint;
use cadok_core::SourceError;
use cadok_core::interfaces::RelayPointSource;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default request timeout for third-party networks.
const DEFAULT_TIMEOUT_MS: u64 = 3_000;
/// Default maximum response size in bytes.
const DEFAULT_MAX_RESPONSE_BYTES: usize = 512 * 1024;

/// Configuration for one third-party relay network.
///
/// # Invariants
/// - `endpoint` must be `http` or `https`.
/// - `timeout_ms` applies to the full request lifecycle.
/// - `max_response_bytes` is a hard upper bound on response bodies.
#[derive(Debug, Clone)]
pub struct HttpNetworkConfig {
    /// Stable network name used in logs and results.
    pub name: String,
    /// Search endpoint; `lat` and `lng` query parameters are appended.
    pub endpoint: Url,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
}

impl HttpNetworkConfig {
    /// Creates a network configuration with default limits.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: Url) -> Self {
        Self {
            name: name.into(),
            endpoint,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: HTTP Source
// ============================================================================

/// Best-effort HTTP relay network source.
pub struct HttpNetworkSource {
    /// Network configuration.
    config: HttpNetworkConfig,
    /// HTTP client used for fetch requests.
    client: Client,
}

impl HttpNetworkSource {
    /// Builds a source with a bounded client.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the HTTP client cannot be constructed.
    pub fn new(config: HttpNetworkConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| SourceError::Upstream(err.to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }
}

impl RelayPointSource for HttpNetworkSource {
    fn network(&self) -> &str {
        &self.config.name
    }

    fn fetch(&self, origin: GeoPoint) -> Result<Vec<RelayPoint>, SourceError> {
        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("lat", &origin.lat.to_string())
            .append_pair("lng", &origin.lng.to_string());

        let response = self.client.get(url).send().map_err(|err| {
            if err.is_timeout() {
                SourceError::Timeout(self.config.name.clone())
            } else {
                SourceError::Upstream(err.to_string())
            }
        })?;
        if !response.status().is_success() {
            return Err(SourceError::Upstream(format!(
                "{}: status {}",
                self.config.name,
                response.status()
            )));
        }

        let mut body = Vec::new();
        let limit = u64::try_from(self.config.max_response_bytes).unwrap_or(u64::MAX);
        response
            .take(limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|err| SourceError::Upstream(err.to_string()))?;
        if body.len() > self.config.max_response_bytes {
            return Err(SourceError::InvalidData("response exceeds size limit".to_string()));
        }

        let mut points: Vec<RelayPoint> = serde_json::from_slice(&body)
            .map_err(|err| SourceError::InvalidData(err.to_string()))?;
        for point in &mut points {
            // Provenance is assigned by this integration, not trusted from
            // the response body.
            point.network = self.config.name.clone();
        }
        Ok(points)
    }
}
