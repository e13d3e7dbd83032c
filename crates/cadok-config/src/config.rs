// crates/cadok-config/src/config.rs
// ============================================================================
// Module: CADOK Configuration
// Description: Configuration loading and validation for the delivery service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: cadok-core, cadok-store-sqlite, cadok-vault, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. Secrets (the vault key and
//! the webhook signing secret) never live in the file; they are read from
//! environment variables named by the config and are never echoed in errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use cadok_core::MILLIS_PER_DAY;
use cadok_core::MILLIS_PER_HOUR;
use cadok_core::PublicAddress;
use cadok_core::RegistryConfig;
use cadok_core::RelayPoint;
use cadok_core::SecurityLevel;
use cadok_core::WebhookSecret;
use cadok_store_sqlite::SqliteStoreConfig;
use cadok_vault::VaultKey;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "cadok.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "CADOK_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default environment variable holding the vault key.
const DEFAULT_VAULT_KEY_ENV: &str = "CADOK_VAULT_KEY";
/// Default environment variable holding the webhook secret.
const DEFAULT_WEBHOOK_SECRET_ENV: &str = "CADOK_WEBHOOK_SECRET";
/// Default webhook signature header.
const DEFAULT_SIGNATURE_HEADER: &str = "X-Cadok-Signature";
/// Maximum request body size accepted by the server (bytes).
const MAX_BODY_BYTES_LIMIT: usize = 4 * 1024 * 1024;
/// Maximum allowed mapping expiry in days.
const MAX_EXPIRY_DAYS: u64 = 90;
/// Maximum allowed resolve grace window in hours.
const MAX_GRACE_HOURS: u64 = 168;
/// Maximum allowed code generation attempts.
const MAX_CODE_ATTEMPTS: u32 = 64;
/// Maximum code prefix length.
const MAX_CODE_PREFIX_LENGTH: usize = 12;
/// Maximum relay results the service will return.
const MAX_RELAY_RESULTS: usize = 50;
/// Maximum relay search radius in kilometers.
const MAX_SEARCH_RADIUS_KM: f64 = 100.0;
/// Bounds for third-party network request timeouts (ms).
const NETWORK_TIMEOUT_RANGE_MS: (u64, u64) = (100, 30_000);
/// Maximum third-party network response size in bytes.
const MAX_NETWORK_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// CADOK delivery service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CadokConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Destination vault configuration.
    #[serde(default)]
    pub vault: VaultConfig,
    /// Carrier webhook configuration.
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// Redirection code lifecycle configuration.
    #[serde(default)]
    pub redirection: RedirectionConfig,
    /// Central redirection hub printed on labels.
    pub hub: HubConfig,
    /// Relay point search configuration.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Label generation configuration.
    #[serde(default)]
    pub label: LabelConfig,
    /// Marketplace backend serving trades, profiles, and addresses.
    pub upstream: UpstreamConfig,
    /// Mapping store configuration.
    pub store: SqliteStoreConfig,
}

impl CadokConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.redirection.validate()?;
        self.hub.validate()?;
        self.relay.validate()?;
        self.label.validate()?;
        self.upstream.validate()?;
        Ok(())
    }
}

/// HTTP server configuration.
///
/// # Invariants
/// - `max_body_bytes` is bounded by a hard upper limit.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates server limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes out of range: {} (max {MAX_BODY_BYTES_LIMIT})",
                self.max_body_bytes
            )));
        }
        Ok(())
    }
}

/// Destination vault configuration.
///
/// The key itself never appears in the file, only the name of the
/// environment variable that holds it.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Environment variable holding the 64-hex-character vault key.
    #[serde(default = "default_vault_key_env")]
    pub key_env: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_env: default_vault_key_env(),
        }
    }
}

impl VaultConfig {
    /// Reads and parses the vault key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the variable is missing or the key does
    /// not parse. Error messages never include the key material.
    pub fn load_key(&self) -> Result<VaultKey, ConfigError> {
        let encoded = env::var(&self.key_env).map_err(|_| {
            ConfigError::MissingSecret {
                env_var: self.key_env.clone(),
            }
        })?;
        VaultKey::from_hex(&encoded).map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

/// Carrier webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Environment variable holding the HMAC signing secret.
    #[serde(default = "default_webhook_secret_env")]
    pub secret_env: String,
    /// Header carrying the hex HMAC signature.
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret_env: default_webhook_secret_env(),
            signature_header: default_signature_header(),
        }
    }
}

impl WebhookConfig {
    /// Reads the webhook signing secret from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the variable is missing or empty. Error
    /// messages never include the secret.
    pub fn load_secret(&self) -> Result<WebhookSecret, ConfigError> {
        let secret = env::var(&self.secret_env).map_err(|_| {
            ConfigError::MissingSecret {
                env_var: self.secret_env.clone(),
            }
        })?;
        if secret.trim().is_empty() {
            return Err(ConfigError::Invalid("webhook secret must be non-empty".to_string()));
        }
        Ok(WebhookSecret::new(secret.into_bytes()))
    }
}

/// Redirection code lifecycle configuration.
///
/// # Invariants
/// - `expiry_days` is at least one day; the grace window may be zero.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectionConfig {
    /// Code prefix printed on labels.
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
    /// Days before an unconsumed mapping expires.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: u64,
    /// Hours a consumed code remains resolvable for carrier replays.
    #[serde(default = "default_resolve_grace_hours")]
    pub resolve_grace_hours: u64,
    /// Days added to the creation date for the delivery estimate.
    #[serde(default = "default_estimated_delivery_days")]
    pub estimated_delivery_days: u64,
    /// Maximum code generation attempts before giving up.
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,
}

impl Default for RedirectionConfig {
    fn default() -> Self {
        Self {
            code_prefix: default_code_prefix(),
            expiry_days: default_expiry_days(),
            resolve_grace_hours: default_resolve_grace_hours(),
            estimated_delivery_days: default_estimated_delivery_days(),
            max_code_attempts: default_max_code_attempts(),
        }
    }
}

impl RedirectionConfig {
    /// Validates lifecycle bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.code_prefix.trim();
        if prefix.is_empty() || prefix.len() > MAX_CODE_PREFIX_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "redirection.code_prefix length out of range (max {MAX_CODE_PREFIX_LENGTH})"
            )));
        }
        if !prefix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(ConfigError::Invalid(
                "redirection.code_prefix must be ascii alphanumeric".to_string(),
            ));
        }
        if self.expiry_days == 0 || self.expiry_days > MAX_EXPIRY_DAYS {
            return Err(ConfigError::Invalid(format!(
                "redirection.expiry_days out of range: {} (max {MAX_EXPIRY_DAYS})",
                self.expiry_days
            )));
        }
        if self.resolve_grace_hours > MAX_GRACE_HOURS {
            return Err(ConfigError::Invalid(format!(
                "redirection.resolve_grace_hours out of range: {} (max {MAX_GRACE_HOURS})",
                self.resolve_grace_hours
            )));
        }
        if self.estimated_delivery_days == 0 || self.estimated_delivery_days > MAX_EXPIRY_DAYS {
            return Err(ConfigError::Invalid(format!(
                "redirection.estimated_delivery_days out of range: {}",
                self.estimated_delivery_days
            )));
        }
        if self.max_code_attempts == 0 || self.max_code_attempts > MAX_CODE_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "redirection.max_code_attempts out of range: {} (max {MAX_CODE_ATTEMPTS})",
                self.max_code_attempts
            )));
        }
        Ok(())
    }

    /// Builds the registry configuration from validated settings.
    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            code_prefix: self.code_prefix.trim().to_uppercase(),
            expiry_ms: i64::try_from(self.expiry_days).unwrap_or(i64::MAX).saturating_mul(MILLIS_PER_DAY),
            resolve_grace_ms: i64::try_from(self.resolve_grace_hours)
                .unwrap_or(i64::MAX)
                .saturating_mul(MILLIS_PER_HOUR),
            max_code_attempts: self.max_code_attempts,
        }
    }
}

/// Central redirection hub printed on labels when no relay is chosen.
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Hub display name.
    pub name: String,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub zip_code: String,
    /// Country code.
    pub country: String,
}

impl HubConfig {
    /// Validates that every printed field is non-empty.
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("hub.name", &self.name),
            ("hub.street", &self.street),
            ("hub.city", &self.city),
            ("hub.zip_code", &self.zip_code),
            ("hub.country", &self.country),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
            }
        }
        Ok(())
    }

    /// Returns the hub address as printed on labels.
    #[must_use]
    pub fn address(&self) -> PublicAddress {
        PublicAddress {
            street: self.street.clone(),
            city: self.city.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
        }
    }
}

/// One third-party relay network endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayNetworkConfig {
    /// Network name recorded on results and failures.
    pub name: String,
    /// HTTPS endpoint returning relay point candidates.
    pub endpoint: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_network_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum accepted response size in bytes.
    #[serde(default = "default_network_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl RelayNetworkConfig {
    /// Validates the endpoint and limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("relay network name must be non-empty".to_string()));
        }
        let parsed = Url::parse(&self.endpoint)
            .map_err(|err| ConfigError::Invalid(format!("relay network endpoint: {err}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::Invalid(
                "relay network endpoint must be http or https".to_string(),
            ));
        }
        let (min_timeout, max_timeout) = NETWORK_TIMEOUT_RANGE_MS;
        if self.timeout_ms < min_timeout || self.timeout_ms > max_timeout {
            return Err(ConfigError::Invalid(format!(
                "relay network timeout_ms out of range: {} ({min_timeout}..={max_timeout})",
                self.timeout_ms
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_NETWORK_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "relay network max_response_bytes out of range: {}",
                self.max_response_bytes
            )));
        }
        Ok(())
    }

    /// Returns the parsed endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the endpoint fails to parse; callers
    /// should have validated first.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint)
            .map_err(|err| ConfigError::Invalid(format!("relay network endpoint: {err}")))
    }
}

/// Relay point search configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Maximum results returned to callers.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Default search radius in kilometers.
    #[serde(default = "default_max_distance_km")]
    pub default_max_distance_km: f64,
    /// Default minimum security tier for candidates.
    #[serde(default = "default_min_security_level")]
    pub default_min_security_level: u8,
    /// Third-party network endpoints queried alongside the catalog.
    #[serde(default)]
    pub networks: Vec<RelayNetworkConfig>,
    /// First-party partner entries seeding the catalog source.
    #[serde(default)]
    pub seeds: Vec<RelayPoint>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            default_max_distance_km: default_max_distance_km(),
            default_min_security_level: default_min_security_level(),
            networks: Vec::new(),
            seeds: Vec::new(),
        }
    }
}

impl RelayConfig {
    /// Validates search bounds and network entries.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_results == 0 || self.max_results > MAX_RELAY_RESULTS {
            return Err(ConfigError::Invalid(format!(
                "relay.max_results out of range: {} (max {MAX_RELAY_RESULTS})",
                self.max_results
            )));
        }
        if !self.default_max_distance_km.is_finite()
            || self.default_max_distance_km <= 0.0
            || self.default_max_distance_km > MAX_SEARCH_RADIUS_KM
        {
            return Err(ConfigError::Invalid(format!(
                "relay.default_max_distance_km out of range: {}",
                self.default_max_distance_km
            )));
        }
        if SecurityLevel::new(self.default_min_security_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "relay.default_min_security_level out of range: {}",
                self.default_min_security_level
            )));
        }
        let mut names: Vec<&str> = self.networks.iter().map(|n| n.name.trim()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.networks.len() {
            return Err(ConfigError::Invalid(
                "relay network names must be unique".to_string(),
            ));
        }
        for network in &self.networks {
            network.validate()?;
        }
        let mut seed_ids: Vec<&str> = self.seeds.iter().map(|seed| seed.id.as_str()).collect();
        seed_ids.sort_unstable();
        seed_ids.dedup();
        if seed_ids.len() != self.seeds.len() {
            return Err(ConfigError::Invalid("relay seed ids must be unique".to_string()));
        }
        Ok(())
    }
}

/// Marketplace backend endpoint configuration.
///
/// The delivery subsystem reads trades, profiles, and recipient addresses
/// from the main marketplace API; it never owns that data.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the marketplace API.
    pub base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_network_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum accepted response size in bytes.
    #[serde(default = "default_network_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl UpstreamConfig {
    /// Validates the endpoint and limits.
    fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.base_url)
            .map_err(|err| ConfigError::Invalid(format!("upstream.base_url: {err}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::Invalid(
                "upstream.base_url must be http or https".to_string(),
            ));
        }
        let (min_timeout, max_timeout) = NETWORK_TIMEOUT_RANGE_MS;
        if self.timeout_ms < min_timeout || self.timeout_ms > max_timeout {
            return Err(ConfigError::Invalid(format!(
                "upstream.timeout_ms out of range: {} ({min_timeout}..={max_timeout})",
                self.timeout_ms
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_NETWORK_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "upstream.max_response_bytes out of range: {}",
                self.max_response_bytes
            )));
        }
        Ok(())
    }

    /// Returns the parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the base URL fails to parse; callers
    /// should have validated first.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|err| ConfigError::Invalid(format!("upstream.base_url: {err}")))
    }
}

/// Label generation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelConfig {
    /// Base URL for tracking links embedded in QR payloads.
    #[serde(default = "default_tracking_base_url")]
    pub tracking_base_url: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            tracking_base_url: default_tracking_base_url(),
        }
    }
}

impl LabelConfig {
    /// Validates the tracking base URL.
    fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.tracking_base_url)
            .map_err(|err| ConfigError::Invalid(format!("label.tracking_base_url: {err}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::Invalid(
                "label.tracking_base_url must be http or https".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Secret values never appear in error messages, only the names of the
///   environment variables that should hold them.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// A required secret environment variable is missing.
    #[error("missing secret: environment variable {env_var} is not set")]
    MissingSecret {
        /// Name of the missing environment variable.
        env_var: String,
    },
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default bind address.
fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8787))
}

/// Returns the default max request body size.
const fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Returns the default vault key environment variable name.
fn default_vault_key_env() -> String {
    DEFAULT_VAULT_KEY_ENV.to_string()
}

/// Returns the default webhook secret environment variable name.
fn default_webhook_secret_env() -> String {
    DEFAULT_WEBHOOK_SECRET_ENV.to_string()
}

/// Returns the default signature header name.
fn default_signature_header() -> String {
    DEFAULT_SIGNATURE_HEADER.to_string()
}

/// Returns the default code prefix.
fn default_code_prefix() -> String {
    cadok_core::DEFAULT_CODE_PREFIX.to_string()
}

/// Returns the default expiry in days.
const fn default_expiry_days() -> u64 {
    7
}

/// Returns the default resolve grace window in hours.
const fn default_resolve_grace_hours() -> u64 {
    24
}

/// Returns the default delivery estimate in days.
const fn default_estimated_delivery_days() -> u64 {
    5
}

/// Returns the default code generation attempt cap.
const fn default_max_code_attempts() -> u32 {
    8
}

/// Returns the default relay result cap.
const fn default_max_results() -> usize {
    cadok_core::DEFAULT_RESULT_LIMIT
}

/// Returns the default search radius in kilometers.
const fn default_max_distance_km() -> f64 {
    10.0
}

/// Returns the default minimum security tier.
const fn default_min_security_level() -> u8 {
    3
}

/// Returns the default third-party network timeout.
const fn default_network_timeout_ms() -> u64 {
    3_000
}

/// Returns the default third-party network response cap.
const fn default_network_max_response_bytes() -> usize {
    512 * 1024
}

/// Returns the default tracking base URL.
fn default_tracking_base_url() -> String {
    "https://cadok.app/track".to_string()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}
