// crates/cadok-core/src/runtime/directory.rs
// ============================================================================
// Module: CADOK Relay Directory
// Description: Merged relay point search across partner networks.
// Purpose: Filter and rank relay points by distance, security tier, and
//          anonymization support, degrading per failed source.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The directory merges candidates from every configured network. The
//! first-party catalog is always included; third-party networks are
//! best-effort. A failing source is omitted from results and recorded by
//! name, never propagated as a fatal error: an all-sources-down query is a
//! "no options" result the caller can answer with central-address
//! redirection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::GeoPoint;
use crate::core::RelayPoint;
use crate::core::RelayPointId;
use crate::core::SecurityLevel;
use crate::interfaces::DistanceProvider;
use crate::interfaces::RelayPointSource;

// ============================================================================
// SECTION: Query and Result Types
// ============================================================================

/// Default maximum number of relay points returned.
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// Relay search parameters.
///
/// # Invariants
/// - `max_distance_km` is a positive kilometer radius.
/// - `limit` caps the ranked result, not `total_found`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelayQuery {
    /// Maximum straight-line distance from the origin, in kilometers.
    pub max_distance_km: f64,
    /// Minimum acceptable security tier.
    pub min_security_level: SecurityLevel,
    /// Whether only anonymization-capable partners qualify.
    pub require_anonymization: bool,
    /// Result cap after ranking.
    pub limit: usize,
}

/// A relay point ranked by distance from the query origin.
///
/// # Invariants
/// - `distance_km` is finite and within the query radius.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRelayPoint {
    /// The relay point.
    pub point: RelayPoint,
    /// Distance from the query origin in kilometers.
    pub distance_km: f64,
}

/// Merged, filtered, and ranked relay search result.
///
/// # Invariants
/// - `total_found` counts qualifying points before the cap.
/// - `failed_networks` lists sources omitted due to upstream failure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelaySearch {
    /// Ranked relay points, capped at the query limit.
    pub points: Vec<RankedRelayPoint>,
    /// Number of qualifying points before capping.
    pub total_found: usize,
    /// Networks that failed and were omitted from this result.
    pub failed_networks: Vec<String>,
}

// ============================================================================
// SECTION: Relay Directory
// ============================================================================

/// Merged relay point directory over multiple source networks.
///
/// # Invariants
/// - Source order is significant only for duplicate resolution; ranking is
///   fully determined by distance, security tier, and trust score.
pub struct RelayDirectory {
    /// Source networks, first-party catalog first.
    sources: Vec<Arc<dyn RelayPointSource>>,
    /// Injected distance collaborator.
    distance: Arc<dyn DistanceProvider>,
}

impl RelayDirectory {
    /// Creates a directory over the given sources and distance provider.
    #[must_use]
    pub fn new(
        sources: Vec<Arc<dyn RelayPointSource>>,
        distance: Arc<dyn DistanceProvider>,
    ) -> Self {
        Self {
            sources,
            distance,
        }
    }

    /// Finds relay points near an origin, ordered by ascending distance with
    /// ties broken by descending security tier, then descending trust score.
    ///
    /// This operation never fails: failing sources and uncomputable
    /// distances degrade the result set instead.
    #[must_use]
    pub fn find_near(&self, origin: GeoPoint, query: &RelayQuery) -> RelaySearch {
        let mut failed_networks = Vec::new();
        let mut candidates: Vec<RankedRelayPoint> = Vec::new();

        for source in &self.sources {
            let fetched = match source.fetch(origin) {
                Ok(points) => points,
                Err(_) => {
                    failed_networks.push(source.network().to_string());
                    continue;
                }
            };
            for point in fetched {
                if point.security_level < query.min_security_level {
                    continue;
                }
                if query.require_anonymization && !point.supports_anonymization {
                    continue;
                }
                let Ok(distance_km) = self.distance.distance_km(origin, point.coordinates)
                else {
                    continue;
                };
                if !distance_km.is_finite() || distance_km > query.max_distance_km {
                    continue;
                }
                candidates.push(RankedRelayPoint {
                    point,
                    distance_km,
                });
            }
        }

        candidates.sort_by(rank_order);
        let deduped = dedup_by_id(candidates);
        let total_found = deduped.len();
        let points = deduped.into_iter().take(query.limit).collect();
        RelaySearch {
            points,
            total_found,
            failed_networks,
        }
    }
}

/// Ranking order: distance ascending, security tier descending, trust score
/// descending.
fn rank_order(a: &RankedRelayPoint, b: &RankedRelayPoint) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| b.point.security_level.cmp(&a.point.security_level))
        .then_with(|| {
            let trust_a = a.point.trust_score.unwrap_or(f64::NEG_INFINITY);
            let trust_b = b.point.trust_score.unwrap_or(f64::NEG_INFINITY);
            trust_b.total_cmp(&trust_a)
        })
}

/// Drops duplicate relay point ids, keeping the best-ranked occurrence.
///
/// Input must already be sorted by [`rank_order`].
fn dedup_by_id(ranked: Vec<RankedRelayPoint>) -> Vec<RankedRelayPoint> {
    let mut seen: HashSet<RelayPointId> = HashSet::new();
    ranked.into_iter().filter(|entry| seen.insert(entry.point.id.clone())).collect()
}
