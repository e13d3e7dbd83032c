// crates/cadok-core/src/core/address.rs
// ============================================================================
// Module: CADOK Address Records
// Description: Structured postal address and contact records.
// Purpose: Carry recipient destinations with required-field validation and
//          phone masking for logs.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! An [`AddressRecord`] is the plaintext form of a protected destination. It
//! exists in memory only inside the vault boundary and the carrier-facing
//! resolver output; it is never persisted or rendered onto labels.
//!
//! Security posture: treat every record as personal data. Phone numbers must
//! pass through [`mask_phone`] before reaching logs or telemetry labels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Address Record
// ============================================================================

/// Structured postal address and contact record for a recipient.
///
/// # Invariants
/// - `street`, `zip_code`, and `city` are required for a deliverable record;
///   [`AddressRecord::missing_required_field`] reports the first gap.
/// - `owner_user_id` and `recorded_at` exist for audit only and never appear
///   on rendered labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
    /// Recipient phone number (given in full to the carrier only).
    pub phone: Option<String>,
    /// Street line of the destination.
    pub street: String,
    /// Destination city.
    pub city: String,
    /// Destination postal code.
    pub zip_code: String,
    /// Destination country.
    pub country: String,
    /// Free-text delivery details (door code, floor, ...).
    pub additional_info: Option<String>,
    /// User who owns this address (audit trail).
    pub owner_user_id: UserId,
    /// When this record was captured (audit trail).
    pub recorded_at: Timestamp,
}

impl AddressRecord {
    /// Returns the first missing required geographic field, if any.
    #[must_use]
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.street.trim().is_empty() {
            return Some("street");
        }
        if self.zip_code.trim().is_empty() {
            return Some("zip_code");
        }
        if self.city.trim().is_empty() {
            return Some("city");
        }
        None
    }

    /// Returns the recipient display name used in carrier instructions.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim()).trim().to_string()
    }
}

// ============================================================================
// SECTION: Phone Masking
// ============================================================================

/// Number of digits kept visible at each end of a masked phone number.
const PHONE_VISIBLE_EDGE: usize = 2;

/// Masks a phone number for logs and telemetry labels.
///
/// Keeps the first and last two characters visible and replaces the middle
/// with `*`. Inputs shorter than five characters are fully masked.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let len = trimmed.chars().count();
    if len <= PHONE_VISIBLE_EDGE * 2 {
        return "*".repeat(len);
    }
    let head: String = trimmed.chars().take(PHONE_VISIBLE_EDGE).collect();
    let tail: String = trimmed.chars().skip(len - PHONE_VISIBLE_EDGE).collect();
    let masked = "*".repeat(len - PHONE_VISIBLE_EDGE * 2);
    format!("{head}{masked}{tail}")
}
