// crates/cadok-core/src/core/identifiers.rs
// ============================================================================
// Module: CADOK Identifiers
// Description: Canonical opaque identifiers for trades, users, and codes.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout the CADOK
//! delivery subsystem. Trade and user identifiers are opaque strings issued
//! by the marketplace; redirection codes carry a validated, normalized shape
//! so lookups are case-insensitive and whitespace-tolerant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Opaque Identifiers
// ============================================================================

/// Trade identifier issued by the marketplace.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(String);

impl TradeId {
    /// Creates a new trade identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User identifier issued by the marketplace.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relay point identifier within a partner network.
///
/// # Invariants
/// - Opaque UTF-8 string; uniqueness is scoped to the merged directory result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayPointId(String);

impl RelayPointId {
    /// Creates a new relay point identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelayPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Redirection Codes
// ============================================================================

/// Minimum length of the random code segment.
const MIN_RANDOM_SEGMENT_LEN: usize = 4;
/// Maximum length of any code segment.
const MAX_SEGMENT_LEN: usize = 12;
/// Minimum length of the time-derived code segment.
const MIN_TIME_SEGMENT_LEN: usize = 4;

/// Redirection code format errors.
///
/// # Invariants
/// - Messages never echo the rejected input (avoids log injection and
///   enumeration hints).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeFormatError {
    /// The code does not have the `PREFIX-RANDOM-TIME` shape.
    #[error("redirection code has an invalid shape")]
    InvalidShape,
    /// The code contains characters outside `A-Z0-9`.
    #[error("redirection code contains invalid characters")]
    InvalidCharacters,
}

/// Human-typeable redirection code standing in for a real address.
///
/// # Invariants
/// - Stored uppercase with surrounding whitespace removed.
/// - Shape is `PREFIX-RANDOM-TIME` where every segment is `A-Z0-9`.
/// - Lookups are therefore case-insensitive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectionCode(String);

impl RedirectionCode {
    /// Parses and normalizes a candidate code (trim + uppercase).
    ///
    /// # Errors
    ///
    /// Returns [`CodeFormatError`] when the candidate does not match the
    /// `PREFIX-RANDOM-TIME` shape.
    pub fn parse(candidate: &str) -> Result<Self, CodeFormatError> {
        let normalized = candidate.trim().to_ascii_uppercase();
        let segments: Vec<&str> = normalized.split('-').collect();
        if segments.len() != 3 {
            return Err(CodeFormatError::InvalidShape);
        }
        let prefix = segments[0];
        let random = segments[1];
        let time_tail = segments[2];
        if prefix.is_empty() || prefix.len() > MAX_SEGMENT_LEN {
            return Err(CodeFormatError::InvalidShape);
        }
        if random.len() < MIN_RANDOM_SEGMENT_LEN || random.len() > MAX_SEGMENT_LEN {
            return Err(CodeFormatError::InvalidShape);
        }
        if time_tail.len() < MIN_TIME_SEGMENT_LEN || time_tail.len() > MAX_SEGMENT_LEN {
            return Err(CodeFormatError::InvalidShape);
        }
        if !segments.iter().all(|segment| segment.bytes().all(|b| b.is_ascii_alphanumeric())) {
            return Err(CodeFormatError::InvalidCharacters);
        }
        Ok(Self(normalized))
    }

    /// Builds a code from pre-validated segments.
    ///
    /// Used by the generator, which controls segment alphabets directly.
    #[must_use]
    pub(crate) fn from_segments(prefix: &str, random: &str, time_tail: &str) -> Self {
        Self(format!("{prefix}-{random}-{time_tail}"))
    }

    /// Returns the normalized code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RedirectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
