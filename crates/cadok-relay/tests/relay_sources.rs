// crates/cadok-relay/tests/relay_sources.rs
// ============================================================================
// Module: Relay Source Tests
// Description: Tests for the first-party catalog, network configuration, and
//              great-circle distance.
// Purpose: Verify source behavior that needs no live network.
// Dependencies: cadok-core, cadok-relay, serde_json, url
// ============================================================================

//! ## Overview
//! Covers the always-available catalog source, configuration defaults for
//! third-party networks, untrusted-response deserialization, and the
//! haversine distance provider against known city pairs.

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

use cadok_core::DistanceProvider;
use cadok_core::GeoPoint;
use cadok_core::PublicAddress;
use cadok_core::RelayKind;
use cadok_core::RelayPoint;
use cadok_core::RelayPointId;
use cadok_core::RelayPointSource;
use cadok_core::SecurityLevel;
use cadok_relay::CatalogSource;
use cadok_relay::FIRST_PARTY_NETWORK;
use cadok_relay::GreatCircleDistance;
use cadok_relay::HttpNetworkConfig;
use url::Url;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const PARIS: GeoPoint = GeoPoint {
    lat: 48.8566,
    lng: 2.3522,
};
const LYON: GeoPoint = GeoPoint {
    lat: 45.7640,
    lng: 4.8357,
};

fn seed_point(id: &str) -> RelayPoint {
    RelayPoint {
        id: RelayPointId::new(id),
        name: format!("Relay {id}"),
        address: PublicAddress {
            street: "3 Place Carnot".to_string(),
            city: "Lyon".to_string(),
            zip_code: "69002".to_string(),
            country: "FR".to_string(),
        },
        kind: RelayKind::TobaccoShop,
        security_level: SecurityLevel::new(4).unwrap(),
        supports_anonymization: true,
        network: FIRST_PARTY_NETWORK.to_string(),
        coordinates: LYON,
        hours: Some("9:00-19:00".to_string()),
        trust_score: Some(0.8),
    }
}

// ============================================================================
// SECTION: Catalog Source
// ============================================================================

#[test]
fn the_catalog_returns_every_seeded_partner() {
    let catalog = CatalogSource::new(vec![seed_point("a"), seed_point("b")]);
    let fetched = catalog.fetch(PARIS).unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(catalog.network(), "cadok-partners");
}

#[test]
fn an_empty_catalog_is_a_valid_source() {
    let catalog = CatalogSource::new(Vec::new());
    assert!(catalog.fetch(PARIS).unwrap().is_empty());
}

// ============================================================================
// SECTION: Network Configuration
// ============================================================================

#[test]
fn network_configuration_defaults_are_bounded() {
    let endpoint = Url::parse("https://partner.example/relays").unwrap();
    let config = HttpNetworkConfig::new("partner-net", endpoint);
    assert_eq!(config.name, "partner-net");
    assert_eq!(config.timeout_ms, 3_000);
    assert_eq!(config.max_response_bytes, 512 * 1024);
}

#[test]
fn relay_point_responses_deserialize_with_stable_labels() {
    let body = serde_json::json!([{
        "id": "mr-204",
        "name": "Pharmacie Centrale",
        "address": {
            "street": "8 Rue Victor Hugo",
            "city": "Lyon",
            "zip_code": "69002",
            "country": "FR"
        },
        "kind": "pharmacy",
        "security_level": 5,
        "supports_anonymization": true,
        "network": "spoofed-by-upstream",
        "coordinates": {"lat": 45.757, "lng": 4.832},
        "hours": null,
        "trust_score": 0.93
    }]);
    let points: Vec<RelayPoint> = serde_json::from_value(body).unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].kind, RelayKind::Pharmacy);
    assert_eq!(points[0].security_level.get(), 5);
}

#[test]
fn out_of_range_security_levels_reject_the_response() {
    let body = serde_json::json!([{
        "id": "mr-204",
        "name": "Pharmacie Centrale",
        "address": {
            "street": "8 Rue Victor Hugo",
            "city": "Lyon",
            "zip_code": "69002",
            "country": "FR"
        },
        "kind": "pharmacy",
        "security_level": 9,
        "supports_anonymization": true,
        "network": "partner-net",
        "coordinates": {"lat": 45.757, "lng": 4.832},
        "hours": null,
        "trust_score": null
    }]);
    let result: Result<Vec<RelayPoint>, _> = serde_json::from_value(body);
    assert!(result.is_err());
}

// ============================================================================
// SECTION: Great-Circle Distance
// ============================================================================

#[test]
fn paris_to_lyon_is_about_392_kilometers() {
    let km = GreatCircleDistance.distance_km(PARIS, LYON).unwrap();
    assert!((385.0..400.0).contains(&km), "got {km}");
}

#[test]
fn distance_is_symmetric_and_zero_at_the_origin() {
    let provider = GreatCircleDistance;
    let forward = provider.distance_km(PARIS, LYON).unwrap();
    let backward = provider.distance_km(LYON, PARIS).unwrap();
    assert!((forward - backward).abs() < 1e-9);
    assert!(provider.distance_km(LYON, LYON).unwrap().abs() < 1e-9);
}

#[test]
fn one_degree_of_longitude_at_the_equator_is_about_111_kilometers() {
    let a = GeoPoint {
        lat: 0.0,
        lng: 0.0,
    };
    let b = GeoPoint {
        lat: 0.0,
        lng: 1.0,
    };
    let km = GreatCircleDistance.distance_km(a, b).unwrap();
    assert!((km - 111.19).abs() < 0.5, "got {km}");
}

#[test]
fn out_of_range_coordinates_are_unavailable() {
    let bad = GeoPoint {
        lat: 91.0,
        lng: 0.0,
    };
    assert!(GreatCircleDistance.distance_km(bad, LYON).is_err());
    let nan = GeoPoint {
        lat: f64::NAN,
        lng: 0.0,
    };
    assert!(GreatCircleDistance.distance_km(LYON, nan).is_err());
}
