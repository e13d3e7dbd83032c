// crates/cadok-core/tests/resolver_unit.rs
// ============================================================================
// Module: Webhook Resolver Tests
// Description: Signature-gate, consumption, and integrity tests for the
//              carrier webhook resolver.
// Purpose: Verify authentication happens before state, terminal events
//          consume exactly once, and corrupt blobs surface as integrity
//          errors.
// Dependencies: cadok-core, hex, hmac, serde_json, sha2
// ============================================================================

//! ## Overview
//! Exercises the resolver end to end over an in-memory store and a
//! transparent JSON cipher. Signature material is computed with the same
//! HMAC-SHA256 primitive the resolver uses.

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

use std::sync::Arc;

use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;

use cadok_core::AddressRecord;
use cadok_core::CipherError;
use cadok_core::Clock;
use cadok_core::DestinationCipher;
use cadok_core::DirectoryError;
use cadok_core::EncryptedDestination;
use cadok_core::InMemoryMappingStore;
use cadok_core::InsertOutcome;
use cadok_core::MILLIS_PER_DAY;
use cadok_core::MappingStatus;
use cadok_core::MappingStore;
use cadok_core::RedirectionMapping;
use cadok_core::RedirectionRegistry;
use cadok_core::RegistryConfig;
use cadok_core::ResolverError;
use cadok_core::Timestamp;
use cadok_core::TradeId;
use cadok_core::UserDirectory;
use cadok_core::UserId;
use cadok_core::UserProfile;
use cadok_core::WebhookResolver;
use cadok_core::WebhookSecret;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const TEST_NOW_MS: i64 = 1_700_000_000_000;
const TEST_SECRET: &[u8] = b"test-webhook-secret";

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(TEST_NOW_MS)
    }
}

struct JsonCipher;

impl DestinationCipher for JsonCipher {
    fn seal(&self, record: &AddressRecord) -> Result<EncryptedDestination, CipherError> {
        if let Some(field) = record.missing_required_field() {
            return Err(CipherError::MissingField {
                field,
            });
        }
        let encoded = serde_json::to_string(record)
            .map_err(|err| CipherError::Encrypt(err.to_string()))?;
        Ok(EncryptedDestination::new(encoded))
    }

    fn open(&self, blob: &EncryptedDestination) -> Result<AddressRecord, CipherError> {
        serde_json::from_str(blob.as_str())
            .map_err(|_| CipherError::Integrity("blob malformed".to_string()))
    }
}

struct OneRecipient;

impl UserDirectory for OneRecipient {
    fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        Ok(Some(UserProfile {
            id: id.clone(),
            display_name: "Claire Dupont".to_string(),
            city: "Lyon".to_string(),
        }))
    }

    fn address(&self, _id: &UserId) -> Result<Option<AddressRecord>, DirectoryError> {
        Ok(Some(recipient_address()))
    }
}

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
        recorded_at: Timestamp::from_unix_millis(TEST_NOW_MS),
    }
}

struct Harness {
    resolver: WebhookResolver,
    registry: Arc<RedirectionRegistry>,
    store: Arc<InMemoryMappingStore>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryMappingStore::new());
    let store_ref: Arc<dyn MappingStore> = store.clone();
    let cipher: Arc<dyn DestinationCipher> = Arc::new(JsonCipher);
    let registry = Arc::new(RedirectionRegistry::new(
        store_ref,
        Arc::clone(&cipher),
        Arc::new(OneRecipient),
        Arc::new(FixedClock),
        RegistryConfig::default(),
    ));
    let resolver = WebhookResolver::new(
        Arc::clone(&registry),
        cipher,
        WebhookSecret::new(TEST_SECRET.to_vec()),
    );
    Harness {
        resolver,
        registry,
        store,
    }
}

fn active_mapping(h: &Harness) -> RedirectionMapping {
    h.registry
        .create_mapping(
            &TradeId::new("trade-42"),
            &UserId::new("user-sender"),
            &UserId::new("user-recipient"),
        )
        .unwrap()
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn event_body(code: &str, event_type: &str) -> Vec<u8> {
    serde_json::json!({
        "tracking_ref": "TRK-9001",
        "redirection_code": code,
        "carrier": "mondial-relay",
        "event_type": event_type,
        "occurred_at": TEST_NOW_MS,
    })
    .to_string()
    .into_bytes()
}

// ============================================================================
// SECTION: Signature Gate
// ============================================================================

#[test]
fn a_bad_signature_is_rejected_before_any_state_is_touched() {
    let h = harness();
    let mapping = active_mapping(&h);
    let body = event_body(mapping.code.as_str(), "delivered");

    let err = h.resolver.handle_signed(&body, &"0".repeat(64)).unwrap_err();
    assert!(matches!(err, ResolverError::Authentication));

    let stored = h.store.get(&mapping.code).unwrap().unwrap();
    assert_eq!(stored.status, MappingStatus::Active);
}

#[test]
fn malformed_and_truncated_signatures_are_one_uniform_error() {
    let h = harness();
    let body = event_body("CADOK-AAAAAA-0000", "delivered");
    let not_hex = h.resolver.verify_signature(&body, "not-hex").unwrap_err();
    let truncated = h.resolver.verify_signature(&body, "deadbeef").unwrap_err();
    assert!(matches!(not_hex, ResolverError::Authentication));
    assert!(matches!(truncated, ResolverError::Authentication));
    assert_eq!(not_hex.to_string(), truncated.to_string());
}

#[test]
fn a_tampered_body_fails_against_the_original_signature() {
    let h = harness();
    let mapping = active_mapping(&h);
    let body = event_body(mapping.code.as_str(), "in_transit");
    let signature = sign(&body);

    let mut tampered = body.clone();
    tampered.extend_from_slice(b" ");
    let err = h.resolver.handle_signed(&tampered, &signature).unwrap_err();
    assert!(matches!(err, ResolverError::Authentication));
}

// ============================================================================
// SECTION: Event Handling
// ============================================================================

#[test]
fn a_delivered_event_resolves_and_consumes_the_mapping() {
    let h = harness();
    let mapping = active_mapping(&h);
    let body = event_body(mapping.code.as_str(), "delivered");

    let resolved = h.resolver.handle_signed(&body, &sign(&body)).unwrap();
    assert!(resolved.consumed);
    assert_eq!(resolved.real_destination.street, "12 Rue des Acacias");
    assert_eq!(h.store.get(&mapping.code).unwrap().unwrap().status, MappingStatus::Consumed);
}

#[test]
fn replayed_terminal_events_are_idempotent() {
    let h = harness();
    let mapping = active_mapping(&h);
    let body = event_body(mapping.code.as_str(), "final_leg_dispatch");
    let signature = sign(&body);

    let first = h.resolver.handle_signed(&body, &signature).unwrap();
    let second = h.resolver.handle_signed(&body, &signature).unwrap();
    assert_eq!(first, second);
    assert!(second.consumed);
    let stored = h.store.get(&mapping.code).unwrap().unwrap();
    assert_eq!(stored.status, MappingStatus::Consumed);
    assert_eq!(stored.consumed_at, Some(Timestamp::from_unix_millis(TEST_NOW_MS)));
}

#[test]
fn transit_events_resolve_without_consuming() {
    let h = harness();
    let mapping = active_mapping(&h);
    for event_type in ["in_transit", "arrived_at_hub"] {
        let body = event_body(mapping.code.as_str(), event_type);
        let resolved = h.resolver.handle_signed(&body, &sign(&body)).unwrap();
        assert!(!resolved.consumed);
    }
    assert_eq!(h.store.get(&mapping.code).unwrap().unwrap().status, MappingStatus::Active);
}

#[test]
fn unrecognized_event_kinds_resolve_but_never_transition() {
    let h = harness();
    let mapping = active_mapping(&h);
    let body = event_body(mapping.code.as_str(), "sorted_at_depot");

    let resolved = h.resolver.handle_signed(&body, &sign(&body)).unwrap();
    assert!(!resolved.consumed);
    assert_eq!(h.store.get(&mapping.code).unwrap().unwrap().status, MappingStatus::Active);
}

#[test]
fn unknown_codes_fail_uniformly_even_with_a_valid_signature() {
    let h = harness();
    let body = event_body("CADOK-ZZZZZZ-0000", "delivered");
    let err = h.resolver.handle_signed(&body, &sign(&body)).unwrap_err();
    assert!(matches!(err, ResolverError::NotFound));
}

#[test]
fn a_garbled_signed_payload_reports_invalid_payload() {
    let h = harness();
    let body = b"{\"tracking_ref\": 12}".to_vec();
    let err = h.resolver.handle_signed(&body, &sign(&body)).unwrap_err();
    assert!(matches!(err, ResolverError::InvalidPayload(_)));
}

// ============================================================================
// SECTION: Instructions and Integrity
// ============================================================================

#[test]
fn carrier_instructions_carry_the_full_contact_details() {
    let h = harness();
    let mapping = active_mapping(&h);
    let resolved = h.resolver.resolve_code(mapping.code.as_str()).unwrap();
    assert!(resolved.carrier_instructions.contains(mapping.code.as_str()));
    assert!(resolved.carrier_instructions.contains("Claire Dupont"));
    assert!(resolved.carrier_instructions.contains("+33612345678"));
    assert!(resolved.carrier_instructions.contains("Hold at the pickup point for 7 days"));
    assert!(!resolved.consumed);
}

#[test]
fn read_only_resolution_never_changes_state() {
    let h = harness();
    let mapping = active_mapping(&h);
    h.resolver.resolve_code(mapping.code.as_str()).unwrap();
    h.resolver.resolve_code(mapping.code.as_str()).unwrap();
    assert_eq!(h.store.get(&mapping.code).unwrap().unwrap().status, MappingStatus::Active);
}

#[test]
fn a_corrupt_stored_destination_surfaces_as_an_integrity_error() {
    let h = harness();
    let mapping = active_mapping(&h);
    let mut corrupt = mapping.clone();
    corrupt.code = cadok_core::RedirectionCode::parse("CADOK-CORRPT-0001").unwrap();
    corrupt.trade_id = TradeId::new("trade-99");
    corrupt.encrypted_destination = EncryptedDestination::new("garbage");
    assert!(matches!(h.store.insert_active(&corrupt).unwrap(), InsertOutcome::Inserted));

    let err = h.resolver.resolve_code(corrupt.code.as_str()).unwrap_err();
    assert!(matches!(err, ResolverError::Integrity(_)));

    // The mapping itself is untouched; corruption is surfaced, not retired.
    let stored = h.store.get(&corrupt.code).unwrap().unwrap();
    assert_eq!(stored.status, MappingStatus::Active);
}

#[test]
fn expired_mappings_are_unknown_to_carriers() {
    let h = harness();
    let mapping = active_mapping(&h);
    let mut stale = mapping.clone();
    stale.code = cadok_core::RedirectionCode::parse("CADOK-STALE1-0001").unwrap();
    stale.trade_id = TradeId::new("trade-stale");
    stale.expires_at = Timestamp::from_unix_millis(TEST_NOW_MS - MILLIS_PER_DAY);
    assert!(matches!(h.store.insert_active(&stale).unwrap(), InsertOutcome::Inserted));

    let err = h.resolver.resolve_code(stale.code.as_str()).unwrap_err();
    assert!(matches!(err, ResolverError::NotFound));
}
