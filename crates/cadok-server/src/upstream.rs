// crates/cadok-server/src/upstream.rs
// ============================================================================
// Module: Marketplace Upstream Directories
// Description: HTTP-backed trade and user directories.
// Purpose: Read trades, profiles, and recipient addresses from the main
//          marketplace API with strict limits.
// Dependencies: cadok-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! The delivery subsystem never owns trade or user data. These directory
//! implementations read it from the marketplace backend over HTTP with
//! redirects disabled, explicit timeouts, and a hard response size cap.
//! A `404` from the backend maps to `Ok(None)`; everything else fails as a
//! backend error.
//!
//! Security posture: upstream responses are untrusted; payloads failing
//! deserialization reject the whole request (fail closed).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use cadok_core::AddressRecord;
use cadok_core::DirectoryError;
use cadok_core::TradeDirectory;
use cadok_core::TradeId;
use cadok_core::TradeSummary;
use cadok_core::UserDirectory;
use cadok_core::UserId;
use cadok_core::UserProfile;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the marketplace backend client.
///
/// # Invariants
/// - `base_url` must be `http` or `https`.
/// - `max_response_bytes` is a hard upper bound on response bodies.
#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    /// Base URL of the marketplace API.
    pub base_url: Url,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Bounded HTTP client for the marketplace backend.
///
/// Serves both directory ports; the backend exposes `trades/{id}`,
/// `users/{id}/profile`, and `users/{id}/address`.
pub struct UpstreamDirectory {
    /// Client configuration.
    config: UpstreamClientConfig,
    /// HTTP client used for directory reads.
    client: Client,
}

impl UpstreamDirectory {
    /// Builds a directory client with bounded transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the HTTP client cannot be constructed.
    pub fn new(config: UpstreamClientConfig) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| DirectoryError::Backend(err.to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Fetches one resource, mapping `404` to `Ok(None)`.
    fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, DirectoryError> {
        let url = self
            .config
            .base_url
            .join(path)
            .map_err(|err| DirectoryError::Backend(err.to_string()))?;
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| DirectoryError::Backend(err.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DirectoryError::Backend(format!(
                "upstream status {}",
                response.status()
            )));
        }

        let mut body = Vec::new();
        let limit = u64::try_from(self.config.max_response_bytes).unwrap_or(u64::MAX);
        response
            .take(limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|err| DirectoryError::Backend(err.to_string()))?;
        if body.len() > self.config.max_response_bytes {
            return Err(DirectoryError::Backend("response exceeds size limit".to_string()));
        }

        let value = serde_json::from_slice(&body)
            .map_err(|err| DirectoryError::Backend(err.to_string()))?;
        Ok(Some(value))
    }
}

impl TradeDirectory for UpstreamDirectory {
    fn trade(&self, id: &TradeId) -> Result<Option<TradeSummary>, DirectoryError> {
        self.fetch_json(&format!("trades/{}", id.as_str()))
    }
}

impl UserDirectory for UpstreamDirectory {
    fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        self.fetch_json(&format!("users/{}/profile", id.as_str()))
    }

    fn address(&self, id: &UserId) -> Result<Option<AddressRecord>, DirectoryError> {
        self.fetch_json(&format!("users/{}/address", id.as_str()))
    }
}
