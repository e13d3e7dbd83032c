// crates/cadok-core/src/lib.rs
// ============================================================================
// Module: CADOK Core Library
// Description: Public API surface for the CADOK anonymized-delivery core.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! CADOK core implements the anonymized-delivery redirection subsystem:
//! redirection-code lifecycle, relay point search, and carrier-webhook
//! resolution. It is backend-agnostic and integrates with persistence,
//! crypto, and marketplace stores through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CipherError;
pub use interfaces::Clock;
pub use interfaces::DestinationCipher;
pub use interfaces::DirectoryError;
pub use interfaces::DistanceError;
pub use interfaces::DistanceProvider;
pub use interfaces::InsertOutcome;
pub use interfaces::MappingStore;
pub use interfaces::RelayPointSource;
pub use interfaces::SourceError;
pub use interfaces::StoreError;
pub use interfaces::TradeDirectory;
pub use interfaces::TradeStatus;
pub use interfaces::TradeSummary;
pub use interfaces::TransitionOutcome;
pub use interfaces::UserDirectory;
pub use interfaces::UserProfile;
pub use runtime::CarrierEvent;
pub use runtime::CarrierEventKind;
pub use runtime::DEFAULT_RESULT_LIMIT;
pub use runtime::InMemoryMappingStore;
pub use runtime::RankedRelayPoint;
pub use runtime::RedirectionRegistry;
pub use runtime::RegistryConfig;
pub use runtime::RegistryError;
pub use runtime::RelayDirectory;
pub use runtime::RelayQuery;
pub use runtime::RelaySearch;
pub use runtime::ResolvedDelivery;
pub use runtime::ResolverError;
pub use runtime::WebhookResolver;
pub use runtime::WebhookSecret;
