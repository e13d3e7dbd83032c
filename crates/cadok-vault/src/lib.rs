// crates/cadok-vault/src/lib.rs
// ============================================================================
// Module: CADOK Address Vault
// Description: Authenticated encryption boundary around recipient addresses.
// Purpose: Seal and open address records with XChaCha20-Poly1305 so plaintext
//          destinations never leave decryption calls.
// Dependencies: cadok-core, chacha20poly1305, base64, serde_json, zeroize
// ============================================================================

//! ## Overview
//! The vault is the hard privacy boundary of the delivery subsystem. Address
//! records are serialized to canonical JSON, encrypted with
//! XChaCha20-Poly1305 under a random 24-byte nonce, and framed as
//! `version ‖ nonce ‖ ciphertext+tag` in base64 so blobs embed safely in JSON
//! and SQL text columns. Decryption authenticates before returning anything;
//! a tampered blob fails closed with an integrity error, never with partial
//! plaintext.
//!
//! The key is long-lived process-wide configuration, loaded once at startup
//! and zeroized on drop. It must never be logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use cadok_core::AddressRecord;
use cadok_core::CipherError;
use cadok_core::DestinationCipher;
use cadok_core::EncryptedDestination;
use chacha20poly1305::XChaCha20Poly1305;
use chacha20poly1305::XNonce;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::aead::KeyInit;
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::Zeroize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Vault key width in bytes (XChaCha20-Poly1305).
pub const KEY_LEN: usize = 32;
/// Nonce width in bytes (XChaCha20 extended nonce).
const NONCE_LEN: usize = 24;
/// Blob framing version understood by this vault.
const BLOB_VERSION: u8 = 1;
/// Minimum decoded blob length: version byte, nonce, and the Poly1305 tag.
const MIN_BLOB_LEN: usize = 1 + NONCE_LEN + 16;

// ============================================================================
// SECTION: Key Handling
// ============================================================================

/// Vault key errors.
///
/// # Invariants
/// - Messages never include key material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Key is not valid hex.
    #[error("vault key is not valid hex")]
    InvalidHex,
    /// Key has the wrong length.
    #[error("vault key must be {KEY_LEN} bytes ({expected} hex chars)", expected = KEY_LEN * 2)]
    InvalidLength,
}

/// Process-wide vault key (256-bit), zeroized on drop.
///
/// # Invariants
/// - Never serialized; `Debug` is not implemented.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct VaultKey([u8; KEY_LEN]);

impl VaultKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a key from its 64-character hex form.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the input is not 64 hex characters.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let decoded = hex::decode(encoded.trim()).map_err(|_| KeyError::InvalidHex)?;
        let bytes: [u8; KEY_LEN] = decoded.try_into().map_err(|_| KeyError::InvalidLength)?;
        Ok(Self(bytes))
    }

    /// Generates a random key from the operating system CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Returns the key bytes.
    fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

// ============================================================================
// SECTION: Address Vault
// ============================================================================

/// Authenticated encryption vault for recipient destinations.
pub struct AddressVault {
    /// Long-lived symmetric key.
    key: VaultKey,
}

impl AddressVault {
    /// Creates a vault over the given key.
    #[must_use]
    pub const fn new(key: VaultKey) -> Self {
        Self {
            key,
        }
    }
}

impl DestinationCipher for AddressVault {
    fn seal(&self, record: &AddressRecord) -> Result<EncryptedDestination, CipherError> {
        if let Some(field) = record.missing_required_field() {
            return Err(CipherError::MissingField {
                field,
            });
        }
        let plaintext = serde_json::to_vec(record)
            .map_err(|err| CipherError::Encrypt(err.to_string()))?;

        let cipher = XChaCha20Poly1305::new(self.key.as_bytes().into());
        let mut nonce = [0_u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|err| CipherError::Encrypt(err.to_string()))?;

        let mut framed = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        framed.push(BLOB_VERSION);
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&ciphertext);
        Ok(EncryptedDestination::new(BASE64.encode(framed)))
    }

    fn open(&self, blob: &EncryptedDestination) -> Result<AddressRecord, CipherError> {
        let framed = BASE64
            .decode(blob.as_str())
            .map_err(|_| CipherError::Integrity("blob is not valid base64".to_string()))?;
        if framed.len() < MIN_BLOB_LEN {
            return Err(CipherError::Integrity("blob too short".to_string()));
        }
        if framed[0] != BLOB_VERSION {
            return Err(CipherError::Integrity(format!(
                "unsupported blob version: {}",
                framed[0]
            )));
        }
        let nonce = &framed[1..=NONCE_LEN];
        let ciphertext = &framed[1 + NONCE_LEN..];

        let cipher = XChaCha20Poly1305::new(self.key.as_bytes().into());
        let plaintext = cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Integrity("authentication failed".to_string()))?;

        let record: AddressRecord = serde_json::from_slice(&plaintext)
            .map_err(|_| CipherError::Integrity("decrypted record malformed".to_string()))?;
        if let Some(field) = record.missing_required_field() {
            // Defensive: a record sealed without required fields indicates
            // corruption upstream of the vault.
            return Err(CipherError::MissingField {
                field,
            });
        }
        Ok(record)
    }
}
