// crates/cadok-relay/src/catalog.rs
// ============================================================================
// Module: First-Party Relay Catalog
// Description: Static relay point source seeded from configuration.
// Purpose: Provide the always-available first-party partner list.
// Dependencies: cadok-core
// ============================================================================

//! ## Overview
//! The first-party catalog is seeded at startup from configuration and never
//! fails. It is always merged into relay search results, so an outage of
//! every third-party network still leaves the vetted partner list available.

// ============================================================================
// SECTION: Imports
// ============================================================================

use cadok_core::GeoPoint;
use cadok_core::RelayPoint;
use cadok_core::SourceError;
use cadok_core::interfaces::RelayPointSource;

// ============================================================================
// SECTION: Catalog Source
// ============================================================================

/// Network name for the first-party catalog.
pub const FIRST_PARTY_NETWORK: &str = "cadok-partners";

/// Static, configuration-seeded relay point source.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    /// Seeded partner entries.
    points: Vec<RelayPoint>,
}

impl CatalogSource {
    /// Creates a catalog over seeded partner entries.
    #[must_use]
    pub fn new(points: Vec<RelayPoint>) -> Self {
        Self {
            points,
        }
    }
}

impl RelayPointSource for CatalogSource {
    fn network(&self) -> &str {
        FIRST_PARTY_NETWORK
    }

    fn fetch(&self, _origin: GeoPoint) -> Result<Vec<RelayPoint>, SourceError> {
        // Distance filtering happens in the directory; the catalog returns
        // every seeded partner.
        Ok(self.points.clone())
    }
}
