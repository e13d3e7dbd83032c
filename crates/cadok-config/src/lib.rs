// crates/cadok-config/src/lib.rs
// ============================================================================
// Module: CADOK Config
// Description: Canonical configuration model and validation.
// Purpose: Load service configuration with fail-closed parsing.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Strict TOML configuration for the delivery service. Secrets are never
//! stored in the file; the config names the environment variables that hold
//! them and provides typed loaders.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CadokConfig;
pub use config::ConfigError;
pub use config::HubConfig;
pub use config::LabelConfig;
pub use config::RedirectionConfig;
pub use config::RelayConfig;
pub use config::RelayNetworkConfig;
pub use config::ServerConfig;
pub use config::UpstreamConfig;
pub use config::VaultConfig;
pub use config::WebhookConfig;
