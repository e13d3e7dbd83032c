// crates/cadok-server/src/main.rs
// ============================================================================
// Module: CADOK Server Entry Point
// Description: Binary entry point for the delivery server.
// Purpose: Load configuration and run the HTTP server until it stops.
// Dependencies: cadok-config, cadok-server, tokio
// ============================================================================

//! ## Overview
//! Loads configuration (first argument, `CADOK_CONFIG`, or `cadok.toml`),
//! builds the delivery server, and serves until the transport fails. Secrets
//! come from the environment and never appear in output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use cadok_config::CadokConfig;
use cadok_server::DeliveryServer;
use cadok_server::ServerError;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Binary entry point.
#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Loads configuration and runs the server.
async fn run() -> Result<(), ServerError> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = CadokConfig::load(path.as_deref())
        .map_err(|err| ServerError::Config(err.to_string()))?;
    let server = DeliveryServer::from_config(config)?;
    server.serve().await
}

/// Writes an error line to stderr and returns a failure code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
