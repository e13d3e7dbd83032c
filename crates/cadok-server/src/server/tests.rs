// crates/cadok-server/src/server/tests.rs
// ============================================================================
// Module: Delivery Server Unit Tests
// Description: Handler-level tests with in-memory fixtures.
// Purpose: Validate label creation, resolution, webhook gating, and relay
//          search behavior without a network listener.
// Dependencies: cadok-server, hex, hmac, sha2
// ============================================================================

//! ## Overview
//! Calls handlers directly with in-memory stores, static directories, and a
//! fixed clock. Confidentiality assertions check that rendered labels never
//! contain the real destination and that unknown trades and codes share one
//! uniform not-found error.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use cadok_core::AddressRecord;
use cadok_core::Clock;
use cadok_core::DestinationCipher;
use cadok_core::DirectoryError;
use cadok_core::GeoPoint;
use cadok_core::InMemoryMappingStore;
use cadok_core::MappingStore;
use cadok_core::PublicAddress;
use cadok_core::RedirectionRegistry;
use cadok_core::RegistryConfig;
use cadok_core::RelayDirectory;
use cadok_core::RelayKind;
use cadok_core::RelayPoint;
use cadok_core::RelayPointId;
use cadok_core::SecurityLevel;
use cadok_core::Timestamp;
use cadok_core::TradeDirectory;
use cadok_core::TradeId;
use cadok_core::TradeStatus;
use cadok_core::TradeSummary;
use cadok_core::UserDirectory;
use cadok_core::UserId;
use cadok_core::UserProfile;
use cadok_core::WebhookResolver;
use cadok_core::WebhookSecret;
use cadok_label::ApparentAddress;
use cadok_label::LabelComposer;
use cadok_label::MinimalPdfRenderer;
use cadok_relay::CatalogSource;
use cadok_relay::GreatCircleDistance;
use cadok_vault::AddressVault;
use cadok_vault::VaultKey;
use hmac::Hmac;
use hmac::Mac;
use serde_json::json;
use sha2::Sha256;

use super::ApiError;
use super::AppState;
use super::RelayDefaults;
use super::RelaySearchParams;
use super::estimated_delivery_date;
use super::handle_create_label;
use super::handle_health;
use super::handle_relay_search;
use super::handle_resolve;
use super::handle_webhook;
use crate::telemetry::DeliveryMetricEvent;
use crate::telemetry::DeliveryMetrics;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Fixed test time: 2023-11-14T22:13:20Z.
const TEST_NOW_MS: i64 = 1_700_000_000_000;
/// Shared webhook secret for signed test events.
const TEST_SECRET: &[u8] = b"test-webhook-secret";

/// Clock pinned to [`TEST_NOW_MS`].
struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(TEST_NOW_MS)
    }
}

/// Static trade directory fixture.
struct StaticTrades(Vec<TradeSummary>);

impl TradeDirectory for StaticTrades {
    fn trade(&self, id: &TradeId) -> Result<Option<TradeSummary>, DirectoryError> {
        Ok(self.0.iter().find(|trade| &trade.id == id).cloned())
    }
}

/// Static user directory fixture.
struct StaticUsers {
    profiles: Vec<UserProfile>,
    addresses: Vec<AddressRecord>,
}

impl UserDirectory for StaticUsers {
    fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        Ok(self.profiles.iter().find(|profile| &profile.id == id).cloned())
    }

    fn address(&self, id: &UserId) -> Result<Option<AddressRecord>, DirectoryError> {
        Ok(self.addresses.iter().find(|record| &record.owner_user_id == id).cloned())
    }
}

/// Metrics sink capturing every event.
#[derive(Default)]
struct RecordingMetrics {
    events: Mutex<Vec<DeliveryMetricEvent>>,
}

impl DeliveryMetrics for RecordingMetrics {
    fn record_event(&self, event: DeliveryMetricEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn record_latency(&self, _event: DeliveryMetricEvent, _latency: Duration) {}
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

fn seed_relay_point() -> RelayPoint {
    RelayPoint {
        id: RelayPointId::new("relay-1"),
        name: "Tabac du Pont".to_string(),
        address: PublicAddress {
            street: "3 Place Carnot".to_string(),
            city: "Lyon".to_string(),
            zip_code: "69002".to_string(),
            country: "FR".to_string(),
        },
        kind: RelayKind::TobaccoShop,
        security_level: SecurityLevel::new(4).unwrap(),
        supports_anonymization: true,
        network: "cadok-partners".to_string(),
        coordinates: GeoPoint {
            lat: 45.747,
            lng: 4.827,
        },
        hours: None,
        trust_score: Some(4.6),
    }
}

/// Catalog point without anonymized handling; never a printable destination.
fn plain_relay_point() -> RelayPoint {
    RelayPoint {
        id: RelayPointId::new("relay-2"),
        name: "Presse de la Gare".to_string(),
        address: PublicAddress {
            street: "1 Cours de Verdun".to_string(),
            city: "Lyon".to_string(),
            zip_code: "69002".to_string(),
            country: "FR".to_string(),
        },
        kind: RelayKind::Supermarket,
        security_level: SecurityLevel::new(4).unwrap(),
        supports_anonymization: false,
        network: "cadok-partners".to_string(),
        coordinates: GeoPoint {
            lat: 45.749,
            lng: 4.826,
        },
        hours: None,
        trust_score: Some(4.1),
    }
}

fn accepted_trade() -> TradeSummary {
    TradeSummary {
        id: TradeId::new("trade-42"),
        from_user: UserId::new("user-sender"),
        to_user: UserId::new("user-recipient"),
        status: TradeStatus::Accepted,
    }
}

fn sample_state() -> (Arc<AppState>, Arc<RecordingMetrics>) {
    let store: Arc<dyn MappingStore> = Arc::new(InMemoryMappingStore::new());
    let cipher: Arc<dyn DestinationCipher> = Arc::new(AddressVault::new(VaultKey::generate()));
    let users: Arc<dyn UserDirectory> = Arc::new(StaticUsers {
        profiles: vec![UserProfile {
            id: UserId::new("user-sender"),
            display_name: "Marc V.".to_string(),
            city: "Villeurbanne".to_string(),
        }],
        addresses: vec![recipient_address()],
    });
    let trades: Arc<dyn TradeDirectory> = Arc::new(StaticTrades(vec![
        accepted_trade(),
        TradeSummary {
            id: TradeId::new("trade-77"),
            from_user: UserId::new("user-sender"),
            to_user: UserId::new("user-recipient"),
            status: TradeStatus::Proposed,
        },
    ]));

    let registry = Arc::new(RedirectionRegistry::new(
        Arc::clone(&store),
        Arc::clone(&cipher),
        Arc::clone(&users),
        Arc::new(FixedClock),
        RegistryConfig::default(),
    ));
    let resolver = Arc::new(WebhookResolver::new(
        Arc::clone(&registry),
        Arc::clone(&cipher),
        WebhookSecret::new(TEST_SECRET.to_vec()),
    ));
    let relay = Arc::new(RelayDirectory::new(
        vec![Arc::new(CatalogSource::new(vec![seed_relay_point()]))],
        Arc::new(GreatCircleDistance),
    ));
    let composer = Arc::new(LabelComposer::new(
        Arc::new(MinimalPdfRenderer),
        None,
        "https://cadok.app/track",
    ));
    let metrics = Arc::new(RecordingMetrics::default());

    let state = Arc::new(AppState {
        registry,
        resolver,
        relay,
        composer,
        trades,
        users,
        metrics: metrics.clone(),
        hub: ApparentAddress::CentralHub {
            name: "CADOK Redirection Hub".to_string(),
            address: PublicAddress {
                street: "18 Avenue des Entrepots".to_string(),
                city: "Villeurbanne".to_string(),
                zip_code: "69100".to_string(),
                country: "FR".to_string(),
            },
        },
        seeds: vec![seed_relay_point(), plain_relay_point()],
        relay_defaults: RelayDefaults {
            max_results: 10,
            max_distance_km: 10.0,
            min_security_level: SecurityLevel::new(3).unwrap(),
        },
        signature_header: "X-Cadok-Signature".to_string(),
        estimated_delivery_days: 5,
        max_body_bytes: 64 * 1024,
    });
    (state, metrics)
}

/// Signs a body the way a configured carrier does.
fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn delivered_event_body(code: &str) -> Vec<u8> {
    json!({
        "tracking_ref": "trk-0001",
        "redirection_code": code,
        "carrier": "colissimo",
        "event_type": "delivered",
        "occurred_at": TEST_NOW_MS,
    })
    .to_string()
    .into_bytes()
}

fn bytes_contain(haystack: &[u8], needle: &str) -> bool {
    let needle = needle.as_bytes();
    haystack.windows(needle.len()).any(|window| window == needle)
}

async fn create_label_for(
    state: &Arc<AppState>,
    trade_id: &str,
    body: &str,
) -> Result<(StatusCode, axum::Json<super::CreateLabelResponse>), ApiError> {
    handle_create_label(
        State(Arc::clone(state)),
        Path(trade_id.to_string()),
        Bytes::from(body.as_bytes().to_vec()),
    )
    .await
}

// ============================================================================
// SECTION: Health
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = handle_health().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.0["status"], "ok");
}

// ============================================================================
// SECTION: Label Creation
// ============================================================================

#[tokio::test]
async fn create_label_hides_the_real_destination() {
    let (state, _metrics) = sample_state();
    let (status, body) = create_label_for(&state, "trade-42", "").await.unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let pdf = BASE64.decode(&body.0.label_pdf_base64).unwrap();
    assert!(bytes_contain(&pdf, &body.0.redirection_code));
    assert!(bytes_contain(&pdf, "18 Avenue des Entrepots"));
    assert!(!bytes_contain(&pdf, "12 Rue des Acacias"));
    assert!(!bytes_contain(&pdf, "69001"));
    assert!(!bytes_contain(&pdf, "Dupont"));
    assert_eq!(body.0.filename, format!("cadok-label-{}.pdf", body.0.redirection_code));
    assert!(body.0.redirection_code.starts_with("CADOK-"));
}

#[tokio::test]
async fn create_label_is_idempotent_per_trade() {
    let (state, _metrics) = sample_state();
    let (_, first) = create_label_for(&state, "trade-42", "").await.unwrap();
    let (status, second) = create_label_for(&state, "trade-42", "").await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first.0.redirection_code, second.0.redirection_code);
}

#[tokio::test]
async fn create_label_prints_a_chosen_relay_point() {
    let (state, _metrics) = sample_state();
    let (_, body) =
        create_label_for(&state, "trade-42", r#"{"relay_point_id":"relay-1"}"#).await.unwrap();
    let pdf = BASE64.decode(&body.0.label_pdf_base64).unwrap();
    assert!(bytes_contain(&pdf, "Tabac du Pont"));
    assert!(bytes_contain(&pdf, "3 Place Carnot"));
    assert!(!bytes_contain(&pdf, "12 Rue des Acacias"));
}

#[tokio::test]
async fn create_label_rejects_an_unknown_relay_point() {
    let (state, _metrics) = sample_state();
    let err = create_label_for(&state, "trade-42", r#"{"relay_point_id":"relay-9"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn create_label_rejects_a_relay_point_without_anonymization() {
    let (state, _metrics) = sample_state();
    let err = create_label_for(&state, "trade-42", r#"{"relay_point_id":"relay-2"}"#)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Conflict("relay point does not support anonymized delivery".to_string())
    );
}

#[tokio::test]
async fn create_label_requires_an_accepted_trade() {
    let (state, _metrics) = sample_state();
    let err = create_label_for(&state, "trade-77", "").await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn create_label_reports_missing_recipient_address() {
    let (state, _metrics) = sample_state();
    let bare_users: Arc<dyn UserDirectory> = Arc::new(StaticUsers {
        profiles: vec![UserProfile {
            id: UserId::new("user-sender"),
            display_name: "Marc V.".to_string(),
            city: "Villeurbanne".to_string(),
        }],
        addresses: Vec::new(),
    });
    let registry = Arc::new(RedirectionRegistry::new(
        Arc::new(InMemoryMappingStore::new()),
        Arc::new(AddressVault::new(VaultKey::generate())),
        Arc::clone(&bare_users),
        Arc::new(FixedClock),
        RegistryConfig::default(),
    ));
    let stripped = Arc::new(AppState {
        registry,
        users: bare_users,
        resolver: Arc::clone(&state.resolver),
        relay: Arc::clone(&state.relay),
        composer: Arc::clone(&state.composer),
        trades: Arc::clone(&state.trades),
        metrics: Arc::clone(&state.metrics),
        hub: state.hub.clone(),
        seeds: state.seeds.clone(),
        relay_defaults: state.relay_defaults.clone(),
        signature_header: state.signature_header.clone(),
        estimated_delivery_days: state.estimated_delivery_days,
        max_body_bytes: state.max_body_bytes,
    });
    let err = create_label_for(&stripped, "trade-42", "").await.unwrap_err();
    assert_eq!(err, ApiError::Conflict("recipient has no address on file".to_string()));
}

#[tokio::test]
async fn create_label_computes_the_delivery_estimate() {
    let (state, _metrics) = sample_state();
    let (_, body) = create_label_for(&state, "trade-42", "").await.unwrap();
    // 2023-11-14 + 5 days.
    assert_eq!(body.0.estimated_delivery_date.as_deref(), Some("2023-11-19"));
}

// ============================================================================
// SECTION: Uniform Not Found
// ============================================================================

#[tokio::test]
async fn unknown_trade_and_unknown_code_share_one_error() {
    let (state, _metrics) = sample_state();
    let trade_err = create_label_for(&state, "trade-does-not-exist", "").await.unwrap_err();
    let code_err = handle_resolve(State(Arc::clone(&state)), Path("CADOK-ZZZZZZ-0000".to_string()))
        .await
        .unwrap_err();
    assert_eq!(trade_err, ApiError::NotFound);
    assert_eq!(code_err, ApiError::NotFound);
    assert_eq!(trade_err.to_string(), code_err.to_string());
}

// ============================================================================
// SECTION: Code Resolution
// ============================================================================

#[tokio::test]
async fn resolve_returns_the_real_destination_without_consuming() {
    let (state, _metrics) = sample_state();
    let (_, label) = create_label_for(&state, "trade-42", "").await.unwrap();

    let (status, body) =
        handle_resolve(State(Arc::clone(&state)), Path(label.0.redirection_code.clone()))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.0.real_destination.street, "12 Rue des Acacias");
    assert!(!body.0.consumed);
    assert!(body.0.carrier_instructions.contains("Claire Dupont"));

    // A second lookup still succeeds: resolution never transitions state.
    let (_, again) = handle_resolve(State(Arc::clone(&state)), Path(label.0.redirection_code))
        .await
        .unwrap();
    assert!(!again.0.consumed);
}

// ============================================================================
// SECTION: Carrier Webhooks
// ============================================================================

#[tokio::test]
async fn webhook_rejects_a_bad_signature_before_touching_state() {
    let (state, _metrics) = sample_state();
    let (_, label) = create_label_for(&state, "trade-42", "").await.unwrap();
    let body = delivered_event_body(&label.0.redirection_code);

    let mut headers = HeaderMap::new();
    headers.insert("X-Cadok-Signature", hex::encode([0_u8; 32]).parse().unwrap());
    let err = handle_webhook(State(Arc::clone(&state)), headers, Bytes::from(body))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);

    // The mapping is untouched and still resolvable as active.
    let (_, resolved) = handle_resolve(State(Arc::clone(&state)), Path(label.0.redirection_code))
        .await
        .unwrap();
    assert!(!resolved.0.consumed);
}

#[tokio::test]
async fn webhook_without_a_signature_header_is_unauthorized() {
    let (state, _metrics) = sample_state();
    let err = handle_webhook(State(state), HeaderMap::new(), Bytes::from_static(b"{}"))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
}

#[tokio::test]
async fn webhook_consumes_on_delivery_and_replays_idempotently() {
    let (state, _metrics) = sample_state();
    let (_, label) = create_label_for(&state, "trade-42", "").await.unwrap();
    let body = delivered_event_body(&label.0.redirection_code);
    let signature = sign(&body);

    let mut headers = HeaderMap::new();
    headers.insert("X-Cadok-Signature", signature.parse().unwrap());
    let (status, first) =
        handle_webhook(State(Arc::clone(&state)), headers.clone(), Bytes::from(body.clone()))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(first.0.consumed);

    // Duplicate carrier event: same output, no double transition.
    let (_, replay) = handle_webhook(State(Arc::clone(&state)), headers, Bytes::from(body))
        .await
        .unwrap();
    assert!(replay.0.consumed);
}

#[tokio::test]
async fn webhook_rejects_a_malformed_signed_payload() {
    let (state, _metrics) = sample_state();
    let body = b"not json".to_vec();
    let mut headers = HeaderMap::new();
    headers.insert("X-Cadok-Signature", sign(&body).parse().unwrap());
    let err = handle_webhook(State(state), headers, Bytes::from(body)).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn webhook_rejects_an_oversized_body() {
    let (state, _metrics) = sample_state();
    let body = vec![b'a'; state.max_body_bytes + 1];
    let mut headers = HeaderMap::new();
    headers.insert("X-Cadok-Signature", sign(&body).parse().unwrap());
    let err = handle_webhook(State(state), headers, Bytes::from(body)).await.unwrap_err();
    assert_eq!(err, ApiError::PayloadTooLarge);
}

// ============================================================================
// SECTION: Relay Search
// ============================================================================

#[tokio::test]
async fn relay_search_returns_ranked_seed_points() {
    let (state, _metrics) = sample_state();
    let params = RelaySearchParams {
        lat: 45.75,
        lng: 4.85,
        max_distance_km: None,
        min_security_level: None,
        require_anonymization: None,
        limit: None,
    };
    let (status, body) = handle_relay_search(State(state), Query(params)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.0.total_found, 1);
    assert_eq!(body.0.points[0].point.id.as_str(), "relay-1");
    assert!(body.0.points[0].distance_km < 10.0);
    assert!(body.0.failed_networks.is_empty());
}

#[tokio::test]
async fn relay_search_rejects_out_of_range_coordinates() {
    let (state, _metrics) = sample_state();
    let params = RelaySearchParams {
        lat: 123.0,
        lng: 4.85,
        max_distance_km: None,
        min_security_level: None,
        require_anonymization: None,
        limit: None,
    };
    let err = handle_relay_search(State(state), Query(params)).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn relay_search_rejects_an_invalid_security_tier() {
    let (state, _metrics) = sample_state();
    let params = RelaySearchParams {
        lat: 45.75,
        lng: 4.85,
        max_distance_km: None,
        min_security_level: Some(9),
        require_anonymization: None,
        limit: None,
    };
    let err = handle_relay_search(State(state), Query(params)).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn relay_search_filters_on_a_raised_security_tier() {
    let (state, _metrics) = sample_state();
    let params = RelaySearchParams {
        lat: 45.75,
        lng: 4.85,
        max_distance_km: None,
        min_security_level: Some(5),
        require_anonymization: None,
        limit: None,
    };
    let (_, body) = handle_relay_search(State(state), Query(params)).await.unwrap();
    assert_eq!(body.0.total_found, 0);
    assert!(body.0.points.is_empty());
}

// ============================================================================
// SECTION: Metrics and Helpers
// ============================================================================

#[tokio::test]
async fn metrics_record_label_creation_with_the_code() {
    let (state, metrics) = sample_state();
    let (_, body) = create_label_for(&state, "trade-42", "").await.unwrap();
    let events = metrics.events.lock().unwrap();
    let event = events.last().unwrap();
    assert_eq!(event.code.as_deref(), Some(body.0.redirection_code.as_str()));
}

#[tokio::test]
async fn metrics_mask_the_recipient_phone_on_resolution() {
    let (state, metrics) = sample_state();
    let (_, label) = create_label_for(&state, "trade-42", "").await.unwrap();
    let _ = handle_resolve(State(Arc::clone(&state)), Path(label.0.redirection_code))
        .await
        .unwrap();
    let events = metrics.events.lock().unwrap();
    let event = events.last().unwrap();
    assert_eq!(event.masked_contact.as_deref(), Some("+3********78"));
    assert!(events.iter().all(|recorded| {
        recorded.masked_contact.as_deref().is_none_or(|contact| !contact.contains("3612345678"))
    }));
}

#[test]
fn delivery_estimate_formats_a_calendar_date() {
    let date = estimated_delivery_date(Timestamp::from_unix_millis(TEST_NOW_MS), 5);
    assert_eq!(date.as_deref(), Some("2023-11-19"));
}
