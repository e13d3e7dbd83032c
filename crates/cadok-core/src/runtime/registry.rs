// crates/cadok-core/src/runtime/registry.rs
// ============================================================================
// Module: CADOK Redirection Registry
// Description: Redirection-code lifecycle: creation, resolution, transitions.
// Purpose: Uphold the one-active-mapping-per-trade invariant and the
//          monotonic status state machine.
// Dependencies: crate::{core, interfaces}, rand
// ============================================================================

//! ## Overview
//! The registry owns the redirection-code lifecycle. Creation is idempotent
//! per trade: while a mapping is active, repeated requests return the same
//! code. Resolution is case-insensitive and grace-window aware so duplicate
//! carrier webhooks replay deterministically. All terminal transitions go
//! through the store's atomic conditional update; losing a race is a no-op.
//!
//! Security posture: the registry handles plaintext addresses only long
//! enough to seal them; nothing plaintext is persisted or logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use rand::rngs::OsRng;
use thiserror::Error;

use crate::core::MILLIS_PER_DAY;
use crate::core::MILLIS_PER_HOUR;
use crate::core::MappingStatus;
use crate::core::RedirectionCode;
use crate::core::RedirectionMapping;
use crate::core::TerminalStatus;
use crate::core::TradeId;
use crate::core::UserId;
use crate::core::code::DEFAULT_CODE_PREFIX;
use crate::core::code::generate_code;
use crate::interfaces::CipherError;
use crate::interfaces::Clock;
use crate::interfaces::DestinationCipher;
use crate::interfaces::DirectoryError;
use crate::interfaces::InsertOutcome;
use crate::interfaces::MappingStore;
use crate::interfaces::StoreError;
use crate::interfaces::TransitionOutcome;
use crate::interfaces::UserDirectory;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default mapping lifetime: 7 days.
const DEFAULT_EXPIRY_MS: i64 = 7 * MILLIS_PER_DAY;
/// Default resolve grace window for consumed mappings: 24 hours.
const DEFAULT_RESOLVE_GRACE_MS: i64 = 24 * MILLIS_PER_HOUR;
/// Default number of code generation attempts before giving up.
const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 8;

/// Registry configuration.
///
/// # Invariants
/// - `expiry_ms` and `resolve_grace_ms` are positive millisecond durations.
/// - `code_prefix` is uppercase alphanumeric (config loading enforces this).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Prefix segment of generated codes.
    pub code_prefix: String,
    /// Mapping lifetime in milliseconds.
    pub expiry_ms: i64,
    /// Grace window during which consumed mappings still resolve.
    pub resolve_grace_ms: i64,
    /// Collision retry budget for code generation.
    pub max_code_attempts: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
            expiry_ms: DEFAULT_EXPIRY_MS,
            resolve_grace_ms: DEFAULT_RESOLVE_GRACE_MS,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry errors.
///
/// # Invariants
/// - `NotFound` never distinguishes absent, expired, or revoked codes
///   (avoids enumeration hints).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Unknown, expired, or revoked redirection code.
    #[error("redirection code not found")]
    NotFound,
    /// The recipient has no address on file.
    #[error("recipient has no address on file")]
    AddressMissing,
    /// The recipient's address is missing a required field.
    #[error("recipient address incomplete: missing {field}")]
    AddressIncomplete {
        /// Name of the missing required field.
        field: &'static str,
    },
    /// Code generation kept colliding (should not happen at this cardinality).
    #[error("code generation exhausted after {attempts} attempts")]
    CodeSpaceExhausted {
        /// Number of attempts made.
        attempts: u32,
    },
    /// Cipher failure while sealing a destination.
    #[error(transparent)]
    Cipher(CipherError),
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Directory backend failure.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    /// In-process lock failure.
    #[error("registry concurrency failure: {0}")]
    Concurrency(String),
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Redirection-code registry.
///
/// # Invariants
/// - `create_mapping` for the same trade is serialized through a keyed
///   in-process lock; the store's unique active-per-trade constraint is the
///   durable backstop against multi-process races.
pub struct RedirectionRegistry {
    /// Durable mapping store.
    store: Arc<dyn MappingStore>,
    /// Destination cipher (vault).
    cipher: Arc<dyn DestinationCipher>,
    /// External user/address directory.
    users: Arc<dyn UserDirectory>,
    /// Host clock.
    clock: Arc<dyn Clock>,
    /// Registry configuration.
    config: RegistryConfig,
    /// Per-trade creation gates. Uncontended entries are dropped after use.
    trade_gates: Mutex<HashMap<TradeId, Arc<Mutex<()>>>>,
}

impl RedirectionRegistry {
    /// Creates a registry over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn MappingStore>,
        cipher: Arc<dyn DestinationCipher>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            store,
            cipher,
            users,
            clock,
            config,
            trade_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the keyed creation gate for a trade.
    fn trade_gate(&self, trade_id: &TradeId) -> Result<Arc<Mutex<()>>, RegistryError> {
        let mut gates = self
            .trade_gates
            .lock()
            .map_err(|_| RegistryError::Concurrency("trade gate table poisoned".to_string()))?;
        Ok(Arc::clone(gates.entry(trade_id.clone()).or_default()))
    }

    /// Drops a trade's gate entry once no other worker holds it, so the gate
    /// table stays bounded by concurrent creations rather than trade history.
    fn release_trade_gate(&self, trade_id: &TradeId, gate: &Arc<Mutex<()>>) {
        let Ok(mut gates) = self.trade_gates.lock() else {
            return;
        };
        // Two strong references are the table entry and our local handle; a
        // third means another worker is waiting on this gate.
        if Arc::strong_count(gate) == 2 {
            gates.remove(trade_id);
        }
    }

    /// Number of gate entries currently retained.
    #[cfg(test)]
    fn trade_gate_entries(&self) -> usize {
        self.trade_gates.lock().map_or(0, |gates| gates.len())
    }

    /// Creates (or idempotently returns) the active mapping for a trade.
    ///
    /// Encrypts the recipient's stored address, generates a unique code, and
    /// persists the mapping atomically with `status = active`. If an active
    /// mapping already exists for the trade, it is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AddressMissing`] when the recipient has no
    /// address on file, [`RegistryError::AddressIncomplete`] when required
    /// fields are blank, and store/cipher errors otherwise.
    pub fn create_mapping(
        &self,
        trade_id: &TradeId,
        from_user_id: &UserId,
        to_user_id: &UserId,
    ) -> Result<RedirectionMapping, RegistryError> {
        let gate = self.trade_gate(trade_id)?;
        let result = match gate.lock() {
            Ok(_guard) => self.create_mapping_gated(trade_id, from_user_id, to_user_id),
            Err(_) => Err(RegistryError::Concurrency("trade gate poisoned".to_string())),
        };
        self.release_trade_gate(trade_id, &gate);
        result
    }

    /// Creation body; the caller holds the trade's gate.
    fn create_mapping_gated(
        &self,
        trade_id: &TradeId,
        from_user_id: &UserId,
        to_user_id: &UserId,
    ) -> Result<RedirectionMapping, RegistryError> {
        let now = self.clock.now();
        if let Some(existing) = self.store.find_active_by_trade(trade_id)? {
            if existing.is_expired_at(now) {
                // Lazy expiry: retire the stale mapping, then mint a new one.
                self.store.transition(&existing.code, TerminalStatus::Expired, now)?;
            } else {
                return Ok(existing);
            }
        }

        let record =
            self.users.address(to_user_id)?.ok_or(RegistryError::AddressMissing)?;
        let sealed = self.cipher.seal(&record).map_err(|err| match err {
            CipherError::MissingField { field } => RegistryError::AddressIncomplete { field },
            other => RegistryError::Cipher(other),
        })?;

        let mut rng = OsRng;
        for _ in 0..self.config.max_code_attempts {
            let code = generate_code(&self.config.code_prefix, now, &mut rng);
            if self.store.get(&code)?.is_some() {
                continue;
            }
            let mapping = RedirectionMapping {
                code,
                trade_id: trade_id.clone(),
                from_user_id: from_user_id.clone(),
                to_user_id: to_user_id.clone(),
                encrypted_destination: sealed.clone(),
                status: MappingStatus::Active,
                created_at: now,
                expires_at: now.saturating_add_millis(self.config.expiry_ms),
                consumed_at: None,
            };
            match self.store.insert_active(&mapping)? {
                InsertOutcome::Inserted => return Ok(mapping),
                InsertOutcome::ActiveExists(winner) => return Ok(winner),
                InsertOutcome::CodeExists => {}
            }
        }
        Err(RegistryError::CodeSpaceExhausted {
            attempts: self.config.max_code_attempts,
        })
    }

    /// Resolves a raw code string to its mapping.
    ///
    /// Lookup is trimmed and case-insensitive. Active mappings past their
    /// deadline are lazily expired and reported as not found. Consumed
    /// mappings remain resolvable inside the grace window so duplicate
    /// carrier events replay deterministically.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for absent, malformed, expired, or
    /// revoked codes.
    pub fn resolve(&self, raw_code: &str) -> Result<RedirectionMapping, RegistryError> {
        let code = RedirectionCode::parse(raw_code).map_err(|_| RegistryError::NotFound)?;
        let Some(mapping) = self.store.get(&code)? else {
            return Err(RegistryError::NotFound);
        };
        let now = self.clock.now();
        match mapping.status {
            MappingStatus::Active => {
                if mapping.is_expired_at(now) {
                    self.store.transition(&code, TerminalStatus::Expired, now)?;
                    return Err(RegistryError::NotFound);
                }
                Ok(mapping)
            }
            MappingStatus::Consumed => {
                let consumed_at = mapping.consumed_at.unwrap_or(mapping.created_at);
                let grace_deadline =
                    consumed_at.saturating_add_millis(self.config.resolve_grace_ms);
                if now.is_before(grace_deadline) {
                    Ok(mapping)
                } else {
                    Err(RegistryError::NotFound)
                }
            }
            MappingStatus::Expired | MappingStatus::Revoked => Err(RegistryError::NotFound),
        }
    }

    /// Applies a terminal transition; terminal mappings are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown codes and store errors
    /// otherwise.
    fn mark(&self, code: &RedirectionCode, to: TerminalStatus) -> Result<(), RegistryError> {
        match self.store.transition(code, to, self.clock.now())? {
            TransitionOutcome::Applied | TransitionOutcome::AlreadyTerminal(_) => Ok(()),
            TransitionOutcome::NotFound => Err(RegistryError::NotFound),
        }
    }

    /// Marks a mapping consumed after a terminal delivery event.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown codes.
    pub fn mark_consumed(&self, code: &RedirectionCode) -> Result<(), RegistryError> {
        self.mark(code, TerminalStatus::Consumed)
    }

    /// Marks a mapping expired.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown codes.
    pub fn mark_expired(&self, code: &RedirectionCode) -> Result<(), RegistryError> {
        self.mark(code, TerminalStatus::Expired)
    }

    /// Marks a mapping revoked.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown codes.
    pub fn mark_revoked(&self, code: &RedirectionCode) -> Result<(), RegistryError> {
        self.mark(code, TerminalStatus::Revoked)
    }

    /// Expires every active mapping whose deadline has elapsed.
    ///
    /// Returns the number of mappings transitioned.
    ///
    /// # Errors
    ///
    /// Returns a store error when the sweep fails.
    pub fn sweep_expired(&self) -> Result<u64, RegistryError> {
        Ok(self.store.sweep_expired(self.clock.now())?)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::*;
    use crate::core::AddressRecord;
    use crate::core::EncryptedDestination;
    use crate::core::Timestamp;
    use crate::interfaces::UserProfile;
    use crate::runtime::store::InMemoryMappingStore;

    /// Fixed clock for gate bookkeeping tests.
    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::from_unix_millis(1_700_000_000_000)
        }
    }

    /// Cipher that only seals; these tests never open a destination.
    struct SealOnlyCipher;

    impl DestinationCipher for SealOnlyCipher {
        fn seal(&self, record: &AddressRecord) -> Result<EncryptedDestination, CipherError> {
            if let Some(field) = record.missing_required_field() {
                return Err(CipherError::MissingField {
                    field,
                });
            }
            Ok(EncryptedDestination::new("sealed"))
        }

        fn open(&self, _blob: &EncryptedDestination) -> Result<AddressRecord, CipherError> {
            Err(CipherError::Integrity("not opened in these tests".to_string()))
        }
    }

    /// Directory serving one optional recipient address.
    struct OneAddress(Option<AddressRecord>);

    impl UserDirectory for OneAddress {
        fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
            Ok(Some(UserProfile {
                id: id.clone(),
                display_name: "Test User".to_string(),
                city: "Lyon".to_string(),
            }))
        }

        fn address(&self, _id: &UserId) -> Result<Option<AddressRecord>, DirectoryError> {
            Ok(self.0.clone())
        }
    }

    /// Complete recipient address for the happy path.
    fn recipient_address() -> AddressRecord {
        AddressRecord {
            first_name: "Claire".to_string(),
            last_name: "Dupont".to_string(),
            phone: Some("+33612345678".to_string()),
            street: "12 Rue des Acacias".to_string(),
            city: "Lyon".to_string(),
            zip_code: "69001".to_string(),
            country: "FR".to_string(),
            additional_info: None,
            owner_user_id: UserId::new("user-recipient"),
            recorded_at: Timestamp::from_unix_millis(1_700_000_000_000),
        }
    }

    /// Registry over in-memory collaborators.
    fn registry_with(address: Option<AddressRecord>) -> RedirectionRegistry {
        RedirectionRegistry::new(
            Arc::new(InMemoryMappingStore::new()),
            Arc::new(SealOnlyCipher),
            Arc::new(OneAddress(address)),
            Arc::new(FixedClock),
            RegistryConfig::default(),
        )
    }

    #[test]
    fn creation_gates_are_released_once_uncontended() {
        let registry = registry_with(Some(recipient_address()));
        for trade in ["trade-1", "trade-2", "trade-3"] {
            registry
                .create_mapping(&TradeId::new(trade), &UserId::new("a"), &UserId::new("b"))
                .unwrap();
        }
        // Idempotent re-entry takes and releases the same gate again.
        registry
            .create_mapping(&TradeId::new("trade-1"), &UserId::new("a"), &UserId::new("b"))
            .unwrap();
        assert_eq!(registry.trade_gate_entries(), 0);
    }

    #[test]
    fn failed_creation_still_releases_the_gate() {
        let registry = registry_with(None);
        let err = registry
            .create_mapping(&TradeId::new("trade-1"), &UserId::new("a"), &UserId::new("b"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::AddressMissing));
        assert_eq!(registry.trade_gate_entries(), 0);
    }
}
