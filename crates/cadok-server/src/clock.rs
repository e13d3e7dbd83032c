// crates/cadok-server/src/clock.rs
// ============================================================================
// Module: System Clock
// Description: Wall-clock implementation of the core clock port.
// Purpose: Inject real time into the registry at the host boundary.
// Dependencies: cadok-core
// ============================================================================

//! ## Overview
//! The core crates never read the wall clock directly; this host-side
//! implementation is the single place real time enters the system.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use cadok_core::Clock;
use cadok_core::Timestamp;

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Timestamp::from_unix_millis(millis)
    }
}
