// crates/cadok-server/src/telemetry.rs
// ============================================================================
// Module: Delivery Telemetry
// Description: Observability hooks for delivery operations.
// Purpose: Provide metric events and latency hooks without hard deps.
// Dependencies: cadok-core
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for delivery request counters
//! and latency observations. It is intentionally dependency-light so
//! deployments can plug in Prometheus or OpenTelemetry without redesign.
//! Security posture: telemetry must never carry decrypted destinations or
//! unmasked phone numbers; events carry codes and stable labels only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Delivery operation classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DeliveryOp {
    /// Label generation request.
    LabelCreate,
    /// Redirection code resolution.
    Resolve,
    /// Carrier webhook ingestion.
    Webhook,
    /// Relay point search.
    RelaySearch,
    /// Startup or scheduled expiry sweep.
    Sweep,
}

impl DeliveryOp {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LabelCreate => "label/create",
            Self::Resolve => "redirection/resolve",
            Self::Webhook => "webhook/carrier",
            Self::RelaySearch => "relay/search",
            Self::Sweep => "sweep",
        }
    }
}

/// Delivery operation outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DeliveryOutcome {
    /// Successful request.
    Ok,
    /// Rejected request (authentication, validation, not found).
    Rejected,
    /// Internal failure.
    Error,
    /// Stored destination failed authenticated decryption.
    IntegrityFailure,
}

impl DeliveryOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Rejected => "rejected",
            Self::Error => "error",
            Self::IntegrityFailure => "integrity_failure",
        }
    }
}

/// Delivery metric event payload.
///
/// # Invariants
/// - Optional fields are `None` when the metadata is unavailable.
/// - `code` is the redirection code, never an address or phone.
/// - `masked_contact` is [`cadok_core::mask_phone`] output, never a raw
///   phone number.
#[derive(Debug, Clone)]
pub struct DeliveryMetricEvent {
    /// Operation classification.
    pub op: DeliveryOp,
    /// Operation outcome.
    pub outcome: DeliveryOutcome,
    /// Redirection code when available.
    pub code: Option<String>,
    /// Masked recipient contact, when a destination was decrypted for the
    /// operation.
    pub masked_contact: Option<String>,
    /// Relay networks that failed during a search, when applicable.
    pub failed_networks: Vec<String>,
}

impl DeliveryMetricEvent {
    /// Builds an event with no code, contact, or network metadata.
    #[must_use]
    pub const fn bare(op: DeliveryOp, outcome: DeliveryOutcome) -> Self {
        Self {
            op,
            outcome,
            code: None,
            masked_contact: None,
            failed_networks: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for delivery operations and latencies.
pub trait DeliveryMetrics: Send + Sync {
    /// Records an operation counter event.
    fn record_event(&self, event: DeliveryMetricEvent);
    /// Records a latency observation for the operation.
    fn record_latency(&self, event: DeliveryMetricEvent, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopMetrics;

impl DeliveryMetrics for NoopMetrics {
    fn record_event(&self, _event: DeliveryMetricEvent) {}

    fn record_latency(&self, _event: DeliveryMetricEvent, _latency: Duration) {}
}
