// crates/cadok-server/src/lib.rs
// ============================================================================
// Module: CADOK Server Library
// Description: Host wiring for the anonymized-delivery subsystem.
// Purpose: Expose the HTTP server, upstream directories, clock, and telemetry.
// Dependencies: crate::{clock, server, telemetry, upstream}
// ============================================================================

//! ## Overview
//! The server crate is the host boundary: it loads configuration and secrets,
//! opens the SQLite mapping store, connects the marketplace upstream, and
//! serves the delivery HTTP API. Everything below this crate is
//! backend-agnostic and clock-free.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clock;
pub mod server;
pub mod telemetry;
pub mod upstream;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::SystemClock;
pub use server::DeliveryServer;
pub use server::ServerError;
pub use telemetry::DeliveryMetricEvent;
pub use telemetry::DeliveryMetrics;
pub use telemetry::DeliveryOp;
pub use telemetry::DeliveryOutcome;
pub use telemetry::NoopMetrics;
pub use upstream::UpstreamClientConfig;
pub use upstream::UpstreamDirectory;
