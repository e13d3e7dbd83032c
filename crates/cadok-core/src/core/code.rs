// crates/cadok-core/src/core/code.rs
// ============================================================================
// Module: CADOK Code Generation
// Description: Redirection code generation with CSPRNG entropy.
// Purpose: Produce human-typeable `PREFIX-RANDOM-TIME` codes that resist guessing.
// Dependencies: rand, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! Codes have the shape `PREFIX-XXXXXX-YYYY`: six base36 characters drawn
//! from a cryptographically secure random source, then four characters
//! derived from the current unix time in base36. The random segment carries
//! the uniqueness; the time tail keeps codes visually distinct across
//! batches. Collisions are checked against the store before commit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::RngCore;

use crate::core::identifiers::RedirectionCode;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default code prefix for the CADOK marketplace.
pub const DEFAULT_CODE_PREFIX: &str = "CADOK";
/// Length of the random code segment.
const RANDOM_SEGMENT_LEN: usize = 6;
/// Length of the time-derived code segment.
const TIME_SEGMENT_LEN: usize = 4;
/// Base36 alphabet (digits then uppercase letters).
const BASE36_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Base36 radix.
const BASE36_RADIX: u64 = 36;

// ============================================================================
// SECTION: Generation
// ============================================================================

/// Returns the base36 character for `value % 36`.
fn base36_char(value: u64) -> char {
    let index = usize::try_from(value % BASE36_RADIX).unwrap_or(0);
    char::from(BASE36_ALPHABET[index])
}

/// Encodes the random segment from CSPRNG output.
fn random_segment(rng: &mut dyn RngCore) -> String {
    let mut segment = String::with_capacity(RANDOM_SEGMENT_LEN);
    for _ in 0..RANDOM_SEGMENT_LEN {
        segment.push(base36_char(u64::from(rng.next_u32())));
    }
    segment
}

/// Encodes the trailing segment from the current unix time.
fn time_segment(now: Timestamp) -> String {
    let mut remaining = now.as_unix_seconds().unsigned_abs();
    let mut reversed = Vec::with_capacity(TIME_SEGMENT_LEN);
    for _ in 0..TIME_SEGMENT_LEN {
        reversed.push(base36_char(remaining));
        remaining /= BASE36_RADIX;
    }
    reversed.iter().rev().collect()
}

/// Generates a fresh redirection code.
///
/// The caller is responsible for checking store uniqueness before commit and
/// regenerating on collision.
#[must_use]
pub fn generate_code(prefix: &str, now: Timestamp, rng: &mut dyn RngCore) -> RedirectionCode {
    let normalized_prefix = prefix.trim().to_ascii_uppercase();
    RedirectionCode::from_segments(&normalized_prefix, &random_segment(rng), &time_segment(now))
}
