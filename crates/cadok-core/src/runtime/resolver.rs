// crates/cadok-core/src/runtime/resolver.rs
// ============================================================================
// Module: CADOK Webhook Resolver
// Description: Carrier-event resolution from redirection codes to real
//              destinations.
// Purpose: Gate carrier webhooks behind an HMAC check, resolve codes, and
//          apply idempotent terminal transitions.
// Dependencies: crate::{core, interfaces, runtime::registry}, hmac, sha2,
//               hex, serde_json
// ============================================================================

//! ## Overview
//! The resolver is the only component that turns a redirection code back into
//! a real destination. Every inbound carrier event must carry a valid
//! HMAC-SHA256 signature over the raw body; authentication happens before any
//! state is read. Replayed events produce identical outputs and never
//! double-transition state.
//!
//! Security posture: a decryption failure here means data corruption or
//! tampering and is surfaced as an integrity error for operator attention,
//! never silently retried or defaulted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use crate::core::AddressRecord;
use crate::core::RedirectionMapping;
use crate::core::Timestamp;
use crate::interfaces::DestinationCipher;
use crate::runtime::registry::RedirectionRegistry;
use crate::runtime::registry::RegistryError;

// ============================================================================
// SECTION: Webhook Secret
// ============================================================================

/// Shared secret for carrier webhook signatures.
///
/// # Invariants
/// - Never serialized; `Debug` output is redacted.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    /// Wraps raw secret bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the secret bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(..)")
    }
}

// ============================================================================
// SECTION: Carrier Events
// ============================================================================

/// Carrier event kinds understood by the resolver.
///
/// # Invariants
/// - Unknown kinds deserialize to `Unknown` and never transition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierEventKind {
    /// Parcel in transit to the redirection hub; no transition.
    InTransit,
    /// Parcel arrived at the redirection hub; no transition.
    ArrivedAtHub,
    /// Parcel ready for final-leg dispatch; consumes the mapping.
    FinalLegDispatch,
    /// Delivery confirmed; consumes the mapping.
    Delivered,
    /// Unrecognized event kind; resolves but never transitions.
    #[serde(other)]
    Unknown,
}

impl CarrierEventKind {
    /// Returns true when the event consumes the mapping.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::FinalLegDispatch | Self::Delivered)
    }
}

/// Carrier-originated webhook event.
///
/// # Invariants
/// - `redirection_code` is raw carrier input; normalization happens in the
///   registry during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierEvent {
    /// Carrier tracking reference.
    pub tracking_ref: String,
    /// Redirection code as typed or scanned by the carrier.
    pub redirection_code: String,
    /// Carrier name.
    pub carrier: String,
    /// Event kind.
    pub event_type: CarrierEventKind,
    /// Carrier-reported event time.
    pub occurred_at: Timestamp,
}

/// Resolved delivery instructions returned to the carrier integration.
///
/// # Invariants
/// - `real_destination` is plaintext for the carrier only; hosts must mask
///   the phone before logging any part of this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDelivery {
    /// Decrypted real destination.
    pub real_destination: AddressRecord,
    /// Carrier-facing delivery instructions.
    pub carrier_instructions: String,
    /// Whether the mapping is consumed after this event.
    pub consumed: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Webhook resolver errors.
///
/// # Invariants
/// - `Authentication` is returned before any state is read or mutated.
/// - `Integrity` indicates corruption or tampering and must be logged at
///   error severity by hosts.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Signature missing, malformed, or mismatched.
    #[error("carrier webhook signature rejected")]
    Authentication,
    /// Unknown redirection code.
    #[error("redirection code not found")]
    NotFound,
    /// Event payload failed to parse.
    #[error("carrier payload invalid: {0}")]
    InvalidPayload(String),
    /// Stored destination failed authentication or post-decryption checks.
    #[error("destination integrity failure: {0}")]
    Integrity(String),
    /// Underlying registry failure.
    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for ResolverError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound => Self::NotFound,
            other => Self::Registry(other),
        }
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// HMAC-SHA256 tag width in bytes.
const SIGNATURE_LEN: usize = 32;

/// Carrier webhook resolver.
pub struct WebhookResolver {
    /// Redirection registry.
    registry: Arc<RedirectionRegistry>,
    /// Destination cipher (vault).
    cipher: Arc<dyn DestinationCipher>,
    /// Shared webhook signing secret.
    secret: WebhookSecret,
}

impl WebhookResolver {
    /// Creates a resolver over the given registry, cipher, and secret.
    #[must_use]
    pub fn new(
        registry: Arc<RedirectionRegistry>,
        cipher: Arc<dyn DestinationCipher>,
        secret: WebhookSecret,
    ) -> Self {
        Self {
            registry,
            cipher,
            secret,
        }
    }

    /// Verifies the hex-encoded HMAC-SHA256 signature over the raw body.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Authentication`] on any mismatch; the error
    /// carries no detail about which check failed.
    pub fn verify_signature(&self, body: &[u8], signature_hex: &str) -> Result<(), ResolverError> {
        let signature =
            hex::decode(signature_hex.trim()).map_err(|_| ResolverError::Authentication)?;
        if signature.len() != SIGNATURE_LEN {
            return Err(ResolverError::Authentication);
        }
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .map_err(|_| ResolverError::Authentication)?;
        mac.update(body);
        // verify_slice performs a constant-time comparison.
        mac.verify_slice(&signature).map_err(|_| ResolverError::Authentication)
    }

    /// Verifies, parses, and handles a signed carrier webhook body.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Authentication`] before any state access when
    /// the signature is invalid, then the errors of [`Self::handle_event`].
    pub fn handle_signed(
        &self,
        body: &[u8],
        signature_hex: &str,
    ) -> Result<ResolvedDelivery, ResolverError> {
        self.verify_signature(body, signature_hex)?;
        let event: CarrierEvent = serde_json::from_slice(body)
            .map_err(|err| ResolverError::InvalidPayload(err.to_string()))?;
        self.handle_event(&event)
    }

    /// Resolves a code to the real destination without changing state.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NotFound`] for unknown or unresolvable codes
    /// and [`ResolverError::Integrity`] when the stored destination fails
    /// authentication.
    pub fn resolve_code(&self, raw_code: &str) -> Result<ResolvedDelivery, ResolverError> {
        let (mapping, destination) = self.open_mapping(raw_code)?;
        let instructions = carrier_instructions(&mapping.code.to_string(), &destination);
        Ok(ResolvedDelivery {
            consumed: mapping.status.is_terminal(),
            real_destination: destination,
            carrier_instructions: instructions,
        })
    }

    /// Resolves a carrier event to the real destination and instructions.
    ///
    /// Terminal events consume the mapping; replays are idempotent no-ops
    /// that return the same output.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NotFound`] for unknown codes and
    /// [`ResolverError::Integrity`] when the stored destination fails
    /// authentication (data corruption; hosts must alert operators).
    pub fn handle_event(&self, event: &CarrierEvent) -> Result<ResolvedDelivery, ResolverError> {
        let (mapping, destination) = self.open_mapping(&event.redirection_code)?;

        let instructions = carrier_instructions(&mapping.code.to_string(), &destination);

        let mut consumed = mapping.status.is_terminal();
        if event.event_type.is_terminal() && !consumed {
            self.registry.mark_consumed(&mapping.code)?;
            consumed = true;
        }

        Ok(ResolvedDelivery {
            real_destination: destination,
            carrier_instructions: instructions,
            consumed,
        })
    }

    /// Resolves and decrypts a mapping for the given raw code.
    fn open_mapping(
        &self,
        raw_code: &str,
    ) -> Result<(RedirectionMapping, AddressRecord), ResolverError> {
        let mapping = self.registry.resolve(raw_code)?;
        let destination = self
            .cipher
            .open(&mapping.encrypted_destination)
            .map_err(|err| ResolverError::Integrity(err.to_string()))?;
        Ok((mapping, destination))
    }
}

/// Builds carrier-facing instructions for a resolved redirection.
///
/// The phone is included in full: the carrier needs it operationally. Hosts
/// must mask it before logging.
fn carrier_instructions(code: &str, destination: &AddressRecord) -> String {
    let phone = destination.phone.as_deref().unwrap_or("no phone on file");
    format!(
        "Redirection {code}: deliver to the verified recipient below.\n\
         Recipient: {name}\n\
         Phone: {phone}\n\
         Hold at the pickup point for 7 days if the recipient is absent.",
        name = destination.display_name(),
    )
}
