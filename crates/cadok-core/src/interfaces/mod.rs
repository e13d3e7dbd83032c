// crates/cadok-core/src/interfaces/mod.rs
// ============================================================================
// Module: CADOK Interfaces
// Description: Backend-agnostic ports for storage, crypto, relay networks,
//              geo distance, and marketplace directories.
// Purpose: Define the contract surfaces used by the CADOK runtime.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the delivery subsystem integrates with external
//! systems without embedding backend-specific details. Implementations must
//! fail closed: a store that cannot uphold its uniqueness or atomicity
//! guarantees, or a cipher that cannot authenticate a blob, returns an error
//! rather than a best-effort value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AddressRecord;
use crate::core::EncryptedDestination;
use crate::core::GeoPoint;
use crate::core::MappingStatus;
use crate::core::RedirectionCode;
use crate::core::RedirectionMapping;
use crate::core::RelayPoint;
use crate::core::TerminalStatus;
use crate::core::Timestamp;
use crate::core::TradeId;
use crate::core::UserId;

// ============================================================================
// SECTION: Mapping Store
// ============================================================================

/// Mapping store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never embed plaintext destinations or ciphertext blobs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("mapping store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("mapping store corruption: {0}")]
    Corrupt(String),
    /// Store data or request is invalid.
    #[error("mapping store invalid data: {0}")]
    Invalid(String),
}

/// Outcome of an atomic active-mapping insert.
///
/// # Invariants
/// - `ActiveExists` carries the mapping that already holds the per-trade slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The mapping was inserted and is now the trade's active mapping.
    Inserted,
    /// Another active mapping already exists for the trade.
    ActiveExists(RedirectionMapping),
    /// A mapping with the same code already exists (collision; regenerate).
    CodeExists,
}

/// Outcome of an atomic terminal transition.
///
/// # Invariants
/// - `AlreadyTerminal` carries the status that won the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition was applied (the mapping was active).
    Applied,
    /// The mapping was already in a terminal state; no change was made.
    AlreadyTerminal(MappingStatus),
    /// No mapping exists for the code.
    NotFound,
}

/// Durable store for redirection mappings.
///
/// Implementations must enforce, atomically:
/// - global uniqueness of `code`;
/// - at most one `active` mapping per `trade_id`;
/// - terminal transitions applied only from `active`.
pub trait MappingStore: Send + Sync {
    /// Inserts a new active mapping in a single atomic operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails. A concurrent active
    /// mapping for the same trade is reported via
    /// [`InsertOutcome::ActiveExists`], not as an error.
    fn insert_active(&self, mapping: &RedirectionMapping) -> Result<InsertOutcome, StoreError>;

    /// Fetches a mapping by normalized code.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn get(&self, code: &RedirectionCode) -> Result<Option<RedirectionMapping>, StoreError>;

    /// Fetches the active mapping for a trade, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_active_by_trade(
        &self,
        trade_id: &TradeId,
    ) -> Result<Option<RedirectionMapping>, StoreError>;

    /// Applies a terminal transition if and only if the mapping is active.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the conditional update fails. Losing the
    /// race to another transition is reported via
    /// [`TransitionOutcome::AlreadyTerminal`], not as an error.
    fn transition(
        &self,
        code: &RedirectionCode,
        to: TerminalStatus,
        at: Timestamp,
    ) -> Result<TransitionOutcome, StoreError>;

    /// Expires every active mapping whose deadline has elapsed.
    ///
    /// Returns the number of mappings transitioned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the sweep fails.
    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Destination Cipher
// ============================================================================

/// Destination cipher errors.
///
/// # Invariants
/// - `Integrity` is raised whenever authentication fails; the cipher never
///   returns partial or unauthenticated plaintext.
#[derive(Debug, Error)]
pub enum CipherError {
    /// A required geographic field is missing before encryption or after decryption.
    #[error("address record incomplete: missing {field}")]
    MissingField {
        /// Name of the missing required field.
        field: &'static str,
    },
    /// Ciphertext is malformed, tampered, or keyed differently.
    #[error("destination integrity failure: {0}")]
    Integrity(String),
    /// Encryption failed.
    #[error("destination encryption failed: {0}")]
    Encrypt(String),
}

/// Authenticated cipher boundary around recipient destinations.
///
/// Implementations must use an AEAD primitive and fail closed on any
/// authentication mismatch.
pub trait DestinationCipher: Send + Sync {
    /// Encrypts an address record into a self-contained transport-safe blob.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::MissingField`] when street, zip, or city is
    /// absent, or [`CipherError::Encrypt`] when the primitive fails.
    fn seal(&self, record: &AddressRecord) -> Result<EncryptedDestination, CipherError>;

    /// Decrypts and authenticates a blob back into an address record.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Integrity`] when the blob is malformed or
    /// tampered, and [`CipherError::MissingField`] when the decrypted record
    /// lacks required geographic fields (defense against corruption).
    fn open(&self, blob: &EncryptedDestination) -> Result<AddressRecord, CipherError>;
}

// ============================================================================
// SECTION: Relay Point Sources
// ============================================================================

/// Relay network source errors.
///
/// # Invariants
/// - Every variant is recoverable by omission: a failing source degrades the
///   merged result set and never fails the overall query.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Upstream network or protocol failure.
    #[error("relay network unavailable: {0}")]
    Upstream(String),
    /// Upstream exceeded its deadline.
    #[error("relay network timed out: {0}")]
    Timeout(String),
    /// Upstream returned data that failed validation.
    #[error("relay network returned invalid data: {0}")]
    InvalidData(String),
}

/// One relay point network (first-party catalog or third-party partner).
pub trait RelayPointSource: Send + Sync {
    /// Returns the stable network name used in logs and results.
    fn network(&self) -> &str;

    /// Fetches candidate relay points near an origin.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the network cannot answer; callers must
    /// treat this as "omit this network", never as a fatal error.
    fn fetch(&self, origin: GeoPoint) -> Result<Vec<RelayPoint>, SourceError>;
}

/// Geo-distance provider errors.
///
/// # Invariants
/// - Failures are per-point recoverable; callers skip the affected candidate.
#[derive(Debug, Error)]
pub enum DistanceError {
    /// Distance could not be computed.
    #[error("distance unavailable: {0}")]
    Unavailable(String),
}

/// External geo-distance collaborator (straight-line or routed).
pub trait DistanceProvider: Send + Sync {
    /// Returns the distance between two points in kilometers.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError`] when the distance cannot be computed.
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, DistanceError>;
}

// ============================================================================
// SECTION: Marketplace Directories
// ============================================================================

/// Trade lifecycle status as reported by the marketplace.
///
/// # Invariants
/// - Variants are stable for serialization; labels are only generated for
///   `Accepted` trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Trade proposed, not yet accepted.
    Proposed,
    /// Trade accepted by both parties.
    Accepted,
    /// Trade completed.
    Completed,
    /// Trade cancelled.
    Cancelled,
}

/// Trade summary consumed from the external trade store.
///
/// # Invariants
/// - `from_user` sends the parcel; `to_user` receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSummary {
    /// Trade identifier.
    pub id: TradeId,
    /// Sending party.
    pub from_user: UserId,
    /// Receiving party.
    pub to_user: UserId,
    /// Trade status.
    pub status: TradeStatus,
}

/// Public user profile consumed from the external user store.
///
/// # Invariants
/// - Contains only fields safe to print on a label sender block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Public display name.
    pub display_name: String,
    /// Public city (origin city on labels).
    pub city: String,
}

/// Directory backend errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Backend lookup failure.
    #[error("directory backend error: {0}")]
    Backend(String),
}

/// External trade store.
pub trait TradeDirectory: Send + Sync {
    /// Fetches a trade summary.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the backend fails; an unknown trade is
    /// `Ok(None)`.
    fn trade(&self, id: &TradeId) -> Result<Option<TradeSummary>, DirectoryError>;
}

/// External user and address store.
pub trait UserDirectory: Send + Sync {
    /// Fetches a public user profile.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the backend fails; an unknown user is
    /// `Ok(None)`.
    fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, DirectoryError>;

    /// Fetches a user's stored address record.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the backend fails; a user with no
    /// address on file is `Ok(None)`.
    fn address(&self, id: &UserId) -> Result<Option<AddressRecord>, DirectoryError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Wall-clock source supplied by the host.
///
/// The core never reads system time directly; tests inject fixed clocks.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}
