// crates/cadok-relay/src/distance.rs
// ============================================================================
// Module: Great-Circle Distance Provider
// Description: Straight-line distance between coordinates.
// Purpose: Default DistanceProvider when no routed-distance backend is wired.
// Dependencies: cadok-core
// ============================================================================

//! ## Overview
//! Haversine great-circle distance. Deployments with a routed-distance
//! backend replace this through the [`DistanceProvider`] port; the directory
//! only consumes the returned kilometer value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use cadok_core::DistanceError;
use cadok_core::GeoPoint;
use cadok_core::interfaces::DistanceProvider;

// ============================================================================
// SECTION: Great-Circle Provider
// ============================================================================

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Straight-line (haversine) distance provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircleDistance;

impl DistanceProvider for GreatCircleDistance {
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, DistanceError> {
        if !coordinates_valid(from) || !coordinates_valid(to) {
            return Err(DistanceError::Unavailable("coordinates out of range".to_string()));
        }
        let lat_a = from.lat.to_radians();
        let lat_b = to.lat.to_radians();
        let d_lat = (to.lat - from.lat).to_radians();
        let d_lng = (to.lng - from.lng).to_radians();

        let half_chord = (d_lat / 2.0).sin().powi(2)
            + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
        let angle = 2.0 * half_chord.sqrt().asin();
        Ok(EARTH_RADIUS_KM * angle)
    }
}

/// Returns true when coordinates are finite and within valid degree ranges.
fn coordinates_valid(point: GeoPoint) -> bool {
    point.lat.is_finite()
        && point.lng.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lng)
}
