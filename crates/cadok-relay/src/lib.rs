// crates/cadok-relay/src/lib.rs
// ============================================================================
// Module: CADOK Relay Sources
// Description: Relay point network sources and the default distance provider.
// Purpose: Supply the directory with first-party and third-party candidates.
// Dependencies: crate::{catalog, distance, http}
// ============================================================================

//! ## Overview
//! Implementations of the relay-network and distance ports: a static
//! first-party catalog, a bounded best-effort HTTP source for third-party
//! networks, and a haversine distance provider.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod distance;
pub mod http;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogSource;
pub use catalog::FIRST_PARTY_NETWORK;
pub use distance::GreatCircleDistance;
pub use http::HttpNetworkConfig;
pub use http::HttpNetworkSource;
