// crates/cadok-store-sqlite/src/lib.rs
// ============================================================================
// Module: CADOK SQLite Store
// Description: Durable SQLite-backed mapping store.
// Purpose: Provide the production MappingStore implementation.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! Durable persistence for redirection mappings. The schema enforces the two
//! store invariants directly: a primary key on the code and a partial unique
//! index keeping one active mapping per trade.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteJournalMode;
pub use store::SqliteMappingStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
