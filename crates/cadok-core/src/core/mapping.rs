// crates/cadok-core/src/core/mapping.rs
// ============================================================================
// Module: CADOK Redirection Mapping
// Description: The persisted association between a code and a protected destination.
// Purpose: Capture the mapping lifecycle with one-way terminal transitions.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`RedirectionMapping`] links a redirection code to the trade it serves
//! and to the encrypted real destination. Status only ever moves from
//! [`MappingStatus::Active`] into a terminal state; terminal mappings are
//! never mutated again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RedirectionCode;
use crate::core::identifiers::TradeId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Encrypted Destination
// ============================================================================

/// Opaque ciphertext blob produced by the vault.
///
/// # Invariants
/// - Transport-safe (base64) so it embeds cleanly in JSON and SQL text columns.
/// - Self-contained: carries everything needed to decrypt given the shared key.
/// - Opaque to every component except the cipher implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedDestination(String);

impl EncryptedDestination {
    /// Wraps an encoded ciphertext blob.
    #[must_use]
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Returns the encoded blob as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// SECTION: Mapping Status
// ============================================================================

/// Redirection mapping lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and store round-trips.
/// - `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    /// Mapping is live and resolvable.
    Active,
    /// A terminal delivery event resolved the mapping.
    Consumed,
    /// The mapping elapsed unconsumed.
    Expired,
    /// The mapping was revoked and replaced.
    Revoked,
}

impl MappingStatus {
    /// Returns true for terminal (immutable) states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Returns the stable storage label for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Consumed => "consumed",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    /// Parses a stable storage label back into a status.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "active" => Some(Self::Active),
            "consumed" => Some(Self::Consumed),
            "expired" => Some(Self::Expired),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal states a mapping can transition into.
///
/// # Invariants
/// - Maps 1:1 onto the terminal subset of [`MappingStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    /// Delivery completed through the redirection.
    Consumed,
    /// Expiry elapsed unconsumed.
    Expired,
    /// Operator or replacement revocation.
    Revoked,
}

impl TerminalStatus {
    /// Returns the corresponding full status value.
    #[must_use]
    pub const fn as_status(self) -> MappingStatus {
        match self {
            Self::Consumed => MappingStatus::Consumed,
            Self::Expired => MappingStatus::Expired,
            Self::Revoked => MappingStatus::Revoked,
        }
    }
}

// ============================================================================
// SECTION: Redirection Mapping
// ============================================================================

/// Persisted association between a redirection code and a trade.
///
/// # Invariants
/// - At most one mapping is `Active` per `trade_id` at a time (store-enforced).
/// - `to_user_id` is the identity whose address is protected.
/// - `encrypted_destination` is opaque outside the cipher boundary.
/// - `consumed_at` is set exactly when status becomes [`MappingStatus::Consumed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectionMapping {
    /// The redirection code printed on the label.
    pub code: RedirectionCode,
    /// Trade this mapping serves.
    pub trade_id: TradeId,
    /// Sending party.
    pub from_user_id: UserId,
    /// Receiving party (protected identity).
    pub to_user_id: UserId,
    /// Encrypted real destination.
    pub encrypted_destination: EncryptedDestination,
    /// Lifecycle status.
    pub status: MappingStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Expiry deadline for unconsumed mappings.
    pub expires_at: Timestamp,
    /// Consumption time, when status is `consumed`.
    pub consumed_at: Option<Timestamp>,
}

impl RedirectionMapping {
    /// Returns true when an active mapping is past its expiry deadline.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.status == MappingStatus::Active && !now.is_before(self.expires_at)
    }
}
