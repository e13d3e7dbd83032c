// crates/cadok-core/src/runtime/mod.rs
// ============================================================================
// Module: CADOK Runtime
// Description: Behavioral components over the core types and interfaces.
// Purpose: Group the registry, relay directory, webhook resolver, and the
//          in-memory store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime components implement the delivery-subsystem behavior: code
//! lifecycle, relay search, and carrier-event resolution. Each component is
//! an independent unit of work safe to invoke concurrently across trades.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod directory;
pub mod registry;
pub mod resolver;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use directory::DEFAULT_RESULT_LIMIT;
pub use directory::RankedRelayPoint;
pub use directory::RelayDirectory;
pub use directory::RelayQuery;
pub use directory::RelaySearch;
pub use registry::RedirectionRegistry;
pub use registry::RegistryConfig;
pub use registry::RegistryError;
pub use resolver::CarrierEvent;
pub use resolver::CarrierEventKind;
pub use resolver::ResolvedDelivery;
pub use resolver::ResolverError;
pub use resolver::WebhookResolver;
pub use resolver::WebhookSecret;
pub use store::InMemoryMappingStore;
