// crates/cadok-core/src/core/mod.rs
// ============================================================================
// Module: CADOK Core Types
// Description: Domain types for the anonymized-delivery subsystem.
// Purpose: Group identifiers, addresses, mappings, relay points, and codes.
// Dependencies: crate::core::{address, code, identifiers, mapping, relay, time}
// ============================================================================

//! ## Overview
//! Core domain types shared by every CADOK crate. Types here carry their own
//! invariants and serialization forms; behavior lives in `crate::runtime`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod address;
pub mod code;
pub mod identifiers;
pub mod mapping;
pub mod relay;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use address::AddressRecord;
pub use address::mask_phone;
pub use code::DEFAULT_CODE_PREFIX;
pub use code::generate_code;
pub use identifiers::CodeFormatError;
pub use identifiers::RedirectionCode;
pub use identifiers::RelayPointId;
pub use identifiers::TradeId;
pub use identifiers::UserId;
pub use mapping::EncryptedDestination;
pub use mapping::MappingStatus;
pub use mapping::RedirectionMapping;
pub use mapping::TerminalStatus;
pub use relay::GeoPoint;
pub use relay::PublicAddress;
pub use relay::RelayKind;
pub use relay::RelayPoint;
pub use relay::SecurityLevel;
pub use time::MILLIS_PER_DAY;
pub use time::MILLIS_PER_HOUR;
pub use time::MILLIS_PER_SECOND;
pub use time::Timestamp;
