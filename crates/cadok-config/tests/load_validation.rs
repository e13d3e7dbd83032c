// crates/cadok-config/tests/load_validation.rs
// ============================================================================
// Module: CADOK Config Tests
// Description: Tests for configuration loading and validation.
// Purpose: Verify defaults, bounds, and secret loading behavior.
// Dependencies: cadok-config, cadok-core, tempfile
// ============================================================================
//! ## Overview
//! Exercises config parsing from disk, per-section validation bounds, and
//! environment-based secret loading.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]
#![allow(
    unsafe_code,
    clippy::undocumented_unsafe_blocks,
    reason = "Secret-loading tests mutate process environment variables."
)]

use std::fs;

use cadok_config::CadokConfig;
use cadok_config::ConfigError;
use cadok_config::VaultConfig;
use cadok_config::WebhookConfig;
use cadok_core::MILLIS_PER_DAY;
use cadok_core::MILLIS_PER_HOUR;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const MINIMAL_CONFIG: &str = r#"
[hub]
name = "CADOK Redirection Hub"
street = "18 Avenue des Entrepots"
city = "Villeurbanne"
zip_code = "69100"
country = "FR"

[upstream]
base_url = "https://api.cadok.internal"

[store]
path = "/tmp/cadok-test/mappings.db"
"#;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("cadok.toml");
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// SECTION: Loading and Defaults
// ============================================================================

#[test]
fn minimal_config_loads_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, MINIMAL_CONFIG);

    let config = CadokConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.bind_addr.port(), 8787);
    assert_eq!(config.server.max_body_bytes, 64 * 1024);
    assert_eq!(config.redirection.code_prefix, "CADOK");
    assert_eq!(config.redirection.expiry_days, 7);
    assert_eq!(config.redirection.resolve_grace_hours, 24);
    assert_eq!(config.redirection.estimated_delivery_days, 5);
    assert_eq!(config.relay.max_results, 10);
    assert!(config.relay.networks.is_empty());
    assert_eq!(config.webhook.signature_header, "X-Cadok-Signature");
    assert_eq!(config.label.tracking_base_url, "https://cadok.app/track");
}

#[test]
fn missing_file_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Io(_))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[hub\nname = ");
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_hub_section_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[store]\npath = \"/tmp/db\"\n");
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Parse(_))));
}

#[test]
fn registry_config_converts_days_and_hours_to_millis() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, MINIMAL_CONFIG);
    let config = CadokConfig::load(Some(&path)).unwrap();

    let registry = config.redirection.registry_config();
    assert_eq!(registry.code_prefix, "CADOK");
    assert_eq!(registry.expiry_ms, 7 * MILLIS_PER_DAY);
    assert_eq!(registry.resolve_grace_ms, 24 * MILLIS_PER_HOUR);
    assert_eq!(registry.max_code_attempts, 8);
}

// ============================================================================
// SECTION: Validation Bounds
// ============================================================================

#[test]
fn zero_expiry_days_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!("{MINIMAL_CONFIG}\n[redirection]\nexpiry_days = 0\n");
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn oversized_expiry_days_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!("{MINIMAL_CONFIG}\n[redirection]\nexpiry_days = 365\n");
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn non_alphanumeric_code_prefix_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!("{MINIMAL_CONFIG}\n[redirection]\ncode_prefix = \"CA-DOK\"\n");
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn empty_hub_street_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = MINIMAL_CONFIG.replace("18 Avenue des Entrepots", "  ");
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn zero_body_limit_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!("{MINIMAL_CONFIG}\n[server]\nmax_body_bytes = 0\n");
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn relay_network_with_ftp_endpoint_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{MINIMAL_CONFIG}\n[[relay.networks]]\nname = \"courier-x\"\nendpoint = \"ftp://relay.example\"\n"
    );
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn duplicate_relay_network_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{MINIMAL_CONFIG}\n\
         [[relay.networks]]\nname = \"courier-x\"\nendpoint = \"https://a.example\"\n\
         [[relay.networks]]\nname = \"courier-x\"\nendpoint = \"https://b.example\"\n"
    );
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn valid_relay_network_parses_with_defaults() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{MINIMAL_CONFIG}\n[[relay.networks]]\nname = \"courier-x\"\nendpoint = \"https://relay.example/points\"\n"
    );
    let path = write_config(&dir, &content);
    let config = CadokConfig::load(Some(&path)).unwrap();

    let network = &config.relay.networks[0];
    assert_eq!(network.timeout_ms, 3_000);
    assert_eq!(network.max_response_bytes, 512 * 1024);
    assert_eq!(network.endpoint_url().unwrap().scheme(), "https");
}

#[test]
fn upstream_with_bad_scheme_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = MINIMAL_CONFIG.replace("https://api.cadok.internal", "file:///etc/passwd");
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn duplicate_relay_seed_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let seed = r#"
[[relay.seeds]]
id = "relay-1"
name = "Tabac du Pont"
kind = "tobacco_shop"
security_level = 4
supports_anonymization = true
network = "cadok-partners"

[relay.seeds.address]
street = "3 Place Carnot"
city = "Lyon"
zip_code = "69002"
country = "FR"

[relay.seeds.coordinates]
lat = 45.747
lng = 4.827
"#;
    let content = format!("{MINIMAL_CONFIG}{seed}{seed}");
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn out_of_range_security_level_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!("{MINIMAL_CONFIG}\n[relay]\ndefault_min_security_level = 9\n");
    let path = write_config(&dir, &content);
    assert!(matches!(CadokConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

// ============================================================================
// SECTION: Secret Loading
// ============================================================================

#[test]
fn vault_key_loads_from_named_env_var() {
    let var = "CADOK_TEST_VAULT_KEY_OK";
    // Env mutation is process-global; each test uses a unique variable name.
    unsafe { std::env::set_var(var, "a".repeat(64)) };
    let vault = VaultConfig {
        key_env: var.to_string(),
    };
    assert!(vault.load_key().is_ok());
    unsafe { std::env::remove_var(var) };
}

#[test]
fn missing_vault_key_names_the_variable_without_the_value() {
    let vault = VaultConfig {
        key_env: "CADOK_TEST_VAULT_KEY_ABSENT".to_string(),
    };
    let err = vault.load_key().map(|_| ()).unwrap_err();
    assert!(err.to_string().contains("CADOK_TEST_VAULT_KEY_ABSENT"));
}

#[test]
fn malformed_vault_key_never_echoes_the_material() {
    let var = "CADOK_TEST_VAULT_KEY_BAD";
    unsafe { std::env::set_var(var, "not-hex-material") };
    let vault = VaultConfig {
        key_env: var.to_string(),
    };
    let err = vault.load_key().map(|_| ()).unwrap_err();
    assert!(!err.to_string().contains("not-hex-material"));
    unsafe { std::env::remove_var(var) };
}

#[test]
fn webhook_secret_loads_and_rejects_empty() {
    let var = "CADOK_TEST_WEBHOOK_SECRET";
    unsafe { std::env::set_var(var, "shared-secret") };
    let webhook = WebhookConfig {
        secret_env: var.to_string(),
        signature_header: "X-Cadok-Signature".to_string(),
    };
    assert!(webhook.load_secret().is_ok());

    unsafe { std::env::set_var(var, "   ") };
    assert!(webhook.load_secret().is_err());
    unsafe { std::env::remove_var(var) };
}
