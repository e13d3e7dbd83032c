// crates/cadok-core/src/core/relay.rs
// ============================================================================
// Module: CADOK Relay Points
// Description: Trusted drop-off/pickup partner directory entries.
// Purpose: Model relay points with security tiers and anonymization support.
// Dependencies: serde, crate::core::identifiers
// ============================================================================

//! ## Overview
//! Relay points are commercial storefronts acting as secure drop-off and
//! pickup locations. Their addresses are public by nature; the privacy
//! property protected by this subsystem concerns recipients, not partners.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RelayPointId;

// ============================================================================
// SECTION: Geography
// ============================================================================

/// Geographic coordinates in decimal degrees.
///
/// # Invariants
/// - Values are caller-supplied; no range validation is applied by this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// Public commercial address printed on labels.
///
/// # Invariants
/// - Always a storefront or hub address, never a private residence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAddress {
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub zip_code: String,
    /// Country.
    pub country: String,
}

// ============================================================================
// SECTION: Security Level
// ============================================================================

/// Lowest valid security tier.
const MIN_SECURITY_LEVEL: u8 = 1;
/// Highest valid security tier.
const MAX_SECURITY_LEVEL: u8 = 5;

/// Relay point security tier (1 = basic, 5 = vetted partner).
///
/// # Invariants
/// - Always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SecurityLevel(u8);

impl SecurityLevel {
    /// Creates a security level, returning `None` outside `1..=5`.
    #[must_use]
    pub const fn new(level: u8) -> Option<Self> {
        if level >= MIN_SECURITY_LEVEL && level <= MAX_SECURITY_LEVEL {
            Some(Self(level))
        } else {
            None
        }
    }

    /// Returns the raw tier value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SecurityLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("security level out of range: {value}"))
    }
}

impl From<SecurityLevel> for u8 {
    fn from(level: SecurityLevel) -> Self {
        level.get()
    }
}

// ============================================================================
// SECTION: Relay Point
// ============================================================================

/// Kind of storefront hosting the relay point.
///
/// # Invariants
/// - Variants are stable for serialization and directory filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayKind {
    /// Pharmacy counter.
    Pharmacy,
    /// Tobacco shop counter.
    TobaccoShop,
    /// Supermarket service desk.
    Supermarket,
    /// Dedicated locker hub.
    LockerHub,
    /// Any other storefront kind.
    Other,
}

/// Directory entry for a trusted drop-off/pickup partner.
///
/// # Invariants
/// - Entries with `supports_anonymization = false` must never be selected
///   when the caller requires full anonymization.
/// - `network` names the source the entry was merged from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayPoint {
    /// Relay point identifier.
    pub id: RelayPointId,
    /// Storefront display name.
    pub name: String,
    /// Public storefront address.
    pub address: PublicAddress,
    /// Storefront kind.
    pub kind: RelayKind,
    /// Security tier.
    pub security_level: SecurityLevel,
    /// Whether the partner supports anonymized redirection handling.
    pub supports_anonymization: bool,
    /// Source network name.
    pub network: String,
    /// Storefront coordinates.
    pub coordinates: GeoPoint,
    /// Opening hours, free text.
    pub hours: Option<String>,
    /// Optional partner trust score used as a sort tie-breaker.
    pub trust_score: Option<f64>,
}
