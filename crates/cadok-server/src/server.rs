// crates/cadok-server/src/server.rs
// ============================================================================
// Module: Delivery Server
// Description: HTTP surface for the anonymized-delivery subsystem.
// Purpose: Expose label generation, code resolution, carrier webhooks, and
//          relay search over axum.
// Dependencies: cadok-config, cadok-core, cadok-label, cadok-relay,
//               cadok-store-sqlite, cadok-vault, axum, tokio
// ============================================================================

//! ## Overview
//! The delivery server wires the registry, vault, resolver, relay directory,
//! and label composer behind four HTTP operations. All persistence and
//! upstream calls are blocking and run on the tokio blocking pool; handlers
//! themselves stay async and small.
//!
//! Security posture: unknown trades and unknown codes return the same uniform
//! not-found body, carrier webhooks are authenticated before any state is
//! read, and no response or error ever carries a decrypted destination except
//! the carrier-facing resolution endpoints that exist to provide one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use cadok_config::CadokConfig;
use cadok_core::AddressRecord;
use cadok_core::Clock;
use cadok_core::DestinationCipher;
use cadok_core::GeoPoint;
use cadok_core::MappingStore;
use cadok_core::RedirectionRegistry;
use cadok_core::RegistryError;
use cadok_core::RelayDirectory;
use cadok_core::RelayPoint;
use cadok_core::RelayPointSource;
use cadok_core::RelayQuery;
use cadok_core::ResolverError;
use cadok_core::SecurityLevel;
use cadok_core::Timestamp;
use cadok_core::TradeDirectory;
use cadok_core::TradeId;
use cadok_core::TradeStatus;
use cadok_core::UserDirectory;
use cadok_core::WebhookResolver;
use cadok_core::mask_phone;
use cadok_label::ApparentAddress;
use cadok_label::LabelComposer;
use cadok_label::MinimalPdfRenderer;
use cadok_relay::CatalogSource;
use cadok_relay::GreatCircleDistance;
use cadok_relay::HttpNetworkConfig;
use cadok_relay::HttpNetworkSource;
use cadok_store_sqlite::SqliteMappingStore;
use cadok_vault::AddressVault;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::clock::SystemClock;
use crate::telemetry::DeliveryMetricEvent;
use crate::telemetry::DeliveryMetrics;
use crate::telemetry::DeliveryOp;
use crate::telemetry::DeliveryOutcome;
use crate::telemetry::NoopMetrics;
use crate::upstream::UpstreamClientConfig;
use crate::upstream::UpstreamDirectory;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Hard cap on the relay search radius accepted from callers, in kilometers.
const MAX_RADIUS_KM: f64 = 100.0;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Delivery server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is invalid or a required secret is missing.
    #[error("server configuration error: {0}")]
    Config(String),
    /// A collaborator failed to initialize.
    #[error("server initialization error: {0}")]
    Init(String),
    /// The HTTP transport failed.
    #[error("server transport error: {0}")]
    Transport(String),
}

/// HTTP-facing request errors.
///
/// # Invariants
/// - `NotFound` carries one uniform message for unknown trades and unknown
///   codes alike (no enumeration hints).
/// - `Internal` never echoes collaborator error detail to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ApiError {
    /// Resource does not exist or is no longer resolvable.
    #[error("not found")]
    NotFound,
    /// Request authentication failed.
    #[error("unauthorized")]
    Unauthorized,
    /// Request is malformed.
    #[error("{0}")]
    BadRequest(String),
    /// Request conflicts with current state.
    #[error("{0}")]
    Conflict(String),
    /// Request body exceeds the configured limit.
    #[error("request body too large")]
    PayloadTooLarge,
    /// Internal failure; detail stays server-side.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status for this error.
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

// ============================================================================
// SECTION: Request and Response Bodies
// ============================================================================

/// Label creation request body; an empty body selects the central hub.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct CreateLabelRequest {
    /// First-party catalog relay point to print instead of the central hub.
    /// Third-party network points found through search are not label-eligible.
    pub(crate) relay_point_id: Option<String>,
}

/// Label creation response body.
#[derive(Debug, Serialize)]
pub(crate) struct CreateLabelResponse {
    /// Redirection code printed on the label.
    pub(crate) redirection_code: String,
    /// Rendered PDF, base64-encoded.
    pub(crate) label_pdf_base64: String,
    /// Suggested download filename.
    pub(crate) filename: String,
    /// Sender instructions mirroring the printed label.
    pub(crate) instructions: Vec<String>,
    /// Estimated delivery date (`YYYY-MM-DD`), when computable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) estimated_delivery_date: Option<String>,
    /// Mapping expiry as unix epoch milliseconds.
    pub(crate) expires_at: i64,
}

/// Carrier-facing code resolution response body.
#[derive(Debug, Serialize)]
pub(crate) struct ResolveResponse {
    /// Decrypted real destination, for the carrier only.
    pub(crate) real_destination: AddressRecord,
    /// Carrier delivery instructions.
    pub(crate) carrier_instructions: String,
    /// Whether the mapping is already consumed.
    pub(crate) consumed: bool,
}

/// Carrier webhook acknowledgement body.
#[derive(Debug, Serialize)]
pub(crate) struct WebhookResponse {
    /// Processing status label.
    pub(crate) status: &'static str,
    /// Whether the mapping is consumed after this event.
    pub(crate) consumed: bool,
}

/// Relay search query parameters.
#[derive(Debug, Deserialize)]
pub(crate) struct RelaySearchParams {
    /// Origin latitude in decimal degrees.
    pub(crate) lat: f64,
    /// Origin longitude in decimal degrees.
    pub(crate) lng: f64,
    /// Search radius override in kilometers.
    pub(crate) max_distance_km: Option<f64>,
    /// Minimum security tier override.
    pub(crate) min_security_level: Option<u8>,
    /// Whether only anonymization-capable partners qualify (default true).
    pub(crate) require_anonymization: Option<bool>,
    /// Result cap override; clamped to the configured maximum.
    pub(crate) limit: Option<usize>,
}

/// One ranked relay point in a search response.
#[derive(Debug, Serialize)]
pub(crate) struct RankedPointBody {
    /// The relay point.
    pub(crate) point: RelayPoint,
    /// Distance from the origin in kilometers.
    pub(crate) distance_km: f64,
}

/// Relay search response body.
#[derive(Debug, Serialize)]
pub(crate) struct RelaySearchResponse {
    /// Ranked relay points.
    pub(crate) points: Vec<RankedPointBody>,
    /// Qualifying points before the result cap.
    pub(crate) total_found: usize,
    /// Networks omitted from this result due to upstream failure.
    pub(crate) failed_networks: Vec<String>,
}

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Relay search defaults taken from configuration.
#[derive(Debug, Clone)]
pub(crate) struct RelayDefaults {
    /// Maximum results returned to callers.
    pub(crate) max_results: usize,
    /// Default search radius in kilometers.
    pub(crate) max_distance_km: f64,
    /// Default minimum security tier.
    pub(crate) min_security_level: SecurityLevel,
}

/// Shared state behind every handler.
pub(crate) struct AppState {
    /// Redirection-code registry.
    pub(crate) registry: Arc<RedirectionRegistry>,
    /// Carrier webhook resolver.
    pub(crate) resolver: Arc<WebhookResolver>,
    /// Merged relay point directory.
    pub(crate) relay: Arc<RelayDirectory>,
    /// Label composer.
    pub(crate) composer: Arc<LabelComposer>,
    /// Marketplace trade directory.
    pub(crate) trades: Arc<dyn TradeDirectory>,
    /// Marketplace user directory.
    pub(crate) users: Arc<dyn UserDirectory>,
    /// Metrics sink.
    pub(crate) metrics: Arc<dyn DeliveryMetrics>,
    /// Central redirection hub printed when no relay is chosen.
    pub(crate) hub: ApparentAddress,
    /// First-party relay seeds selectable by id at label creation.
    pub(crate) seeds: Vec<RelayPoint>,
    /// Relay search defaults.
    pub(crate) relay_defaults: RelayDefaults,
    /// Header carrying the carrier webhook signature.
    pub(crate) signature_header: String,
    /// Days added to the creation date for the delivery estimate.
    pub(crate) estimated_delivery_days: u64,
    /// Maximum accepted request body size in bytes.
    pub(crate) max_body_bytes: usize,
}

// ============================================================================
// SECTION: Delivery Server
// ============================================================================

/// Delivery server instance.
pub struct DeliveryServer {
    /// Validated configuration.
    config: CadokConfig,
    /// Shared handler state.
    state: Arc<AppState>,
}

impl DeliveryServer {
    /// Builds a delivery server from configuration.
    ///
    /// Loads secrets from the environment, opens the mapping store, wires the
    /// registry, resolver, relay directory, and composer, and runs one expiry
    /// sweep so stale mappings never survive a restart.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid, a secret is
    /// missing, or a collaborator fails to initialize.
    pub fn from_config(config: CadokConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let key = config.vault.load_key().map_err(|err| ServerError::Config(err.to_string()))?;
        let secret =
            config.webhook.load_secret().map_err(|err| ServerError::Config(err.to_string()))?;

        let store =
            SqliteMappingStore::new(&config.store).map_err(|err| ServerError::Init(err.to_string()))?;
        store.readiness().map_err(|err| ServerError::Init(err.to_string()))?;
        let store: Arc<dyn MappingStore> = Arc::new(store);
        let cipher: Arc<dyn DestinationCipher> = Arc::new(AddressVault::new(key));

        let upstream_url =
            config.upstream.base_url().map_err(|err| ServerError::Config(err.to_string()))?;
        let upstream = Arc::new(
            UpstreamDirectory::new(UpstreamClientConfig {
                base_url: upstream_url,
                timeout_ms: config.upstream.timeout_ms,
                max_response_bytes: config.upstream.max_response_bytes,
            })
            .map_err(|err| ServerError::Init(err.to_string()))?,
        );
        let trades: Arc<dyn TradeDirectory> = upstream.clone();
        let users: Arc<dyn UserDirectory> = upstream;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let registry = Arc::new(RedirectionRegistry::new(
            Arc::clone(&store),
            Arc::clone(&cipher),
            Arc::clone(&users),
            clock,
            config.redirection.registry_config(),
        ));
        let resolver =
            Arc::new(WebhookResolver::new(Arc::clone(&registry), cipher, secret));
        let relay = Arc::new(build_relay_directory(&config)?);
        let composer = Arc::new(LabelComposer::new(
            Arc::new(MinimalPdfRenderer),
            None,
            config.label.tracking_base_url.clone(),
        ));
        let metrics: Arc<dyn DeliveryMetrics> = Arc::new(NoopMetrics);

        registry.sweep_expired().map_err(|err| ServerError::Init(err.to_string()))?;
        metrics.record_event(DeliveryMetricEvent::bare(DeliveryOp::Sweep, DeliveryOutcome::Ok));

        let min_security_level = SecurityLevel::new(config.relay.default_min_security_level)
            .ok_or_else(|| {
                ServerError::Config("relay.default_min_security_level out of range".to_string())
            })?;
        let state = Arc::new(AppState {
            registry,
            resolver,
            relay,
            composer,
            trades,
            users,
            metrics,
            hub: ApparentAddress::CentralHub {
                name: config.hub.name.clone(),
                address: config.hub.address(),
            },
            seeds: config.relay.seeds.clone(),
            relay_defaults: RelayDefaults {
                max_results: config.relay.max_results,
                max_distance_km: config.relay.default_max_distance_km,
                min_security_level,
            },
            signature_header: config.webhook.signature_header.clone(),
            estimated_delivery_days: config.redirection.estimated_delivery_days,
            max_body_bytes: config.server.max_body_bytes,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Serves HTTP requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.config.server.bind_addr;
        let app = router(Arc::clone(&self.state))
            .layer(DefaultBodyLimit::max(self.config.server.max_body_bytes));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the HTTP route table.
fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/trades/{trade_id}/label", post(handle_create_label))
        .route("/redirections/{code}", get(handle_resolve))
        .route("/webhooks/carrier", post(handle_webhook))
        .route("/relay-points/search", get(handle_relay_search))
        .with_state(state)
}

/// Builds the relay directory from the catalog seeds and configured networks.
fn build_relay_directory(config: &CadokConfig) -> Result<RelayDirectory, ServerError> {
    let mut sources: Vec<Arc<dyn RelayPointSource>> =
        vec![Arc::new(CatalogSource::new(config.relay.seeds.clone()))];
    for network in &config.relay.networks {
        let endpoint =
            network.endpoint_url().map_err(|err| ServerError::Config(err.to_string()))?;
        let source = HttpNetworkSource::new(HttpNetworkConfig {
            name: network.name.clone(),
            endpoint,
            timeout_ms: network.timeout_ms,
            max_response_bytes: network.max_response_bytes,
        })
        .map_err(|err| ServerError::Init(err.to_string()))?;
        sources.push(Arc::new(source));
    }
    Ok(RelayDirectory::new(sources, Arc::new(GreatCircleDistance)))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Liveness probe.
pub(crate) async fn handle_health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
        })),
    )
}

/// Creates (or idempotently returns) the delivery label for a trade.
pub(crate) async fn handle_create_label(
    State(state): State<Arc<AppState>>,
    Path(trade_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateLabelResponse>), ApiError> {
    let started = Instant::now();
    if body.len() > state.max_body_bytes {
        return Err(ApiError::PayloadTooLarge);
    }
    let request: CreateLabelRequest = if body.is_empty() {
        CreateLabelRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))?
    };
    let apparent = apparent_address(&state, request.relay_point_id.as_deref())?;

    let task_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        create_label(&task_state, &TradeId::new(trade_id), &apparent)
    })
    .await
    .map_err(|_| ApiError::Internal)?;

    match result {
        Ok(response) => {
            let event = DeliveryMetricEvent {
                op: DeliveryOp::LabelCreate,
                outcome: DeliveryOutcome::Ok,
                code: Some(response.redirection_code.clone()),
                masked_contact: None,
                failed_networks: Vec::new(),
            };
            observe(&state.metrics, event, started);
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(err) => {
            let outcome = failure_outcome(&err);
            observe(
                &state.metrics,
                DeliveryMetricEvent::bare(DeliveryOp::LabelCreate, outcome),
                started,
            );
            Err(err)
        }
    }
}

/// Resolves a redirection code without changing state (carrier lookup).
pub(crate) async fn handle_resolve(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<ResolveResponse>), ApiError> {
    let started = Instant::now();
    let resolver = Arc::clone(&state.resolver);
    let raw_code = code.clone();
    let result = tokio::task::spawn_blocking(move || resolver.resolve_code(&raw_code))
        .await
        .map_err(|_| ApiError::Internal)?;

    match result {
        Ok(resolved) => {
            let event = DeliveryMetricEvent {
                op: DeliveryOp::Resolve,
                outcome: DeliveryOutcome::Ok,
                code: Some(code),
                masked_contact: resolved.real_destination.phone.as_deref().map(mask_phone),
                failed_networks: Vec::new(),
            };
            observe(&state.metrics, event, started);
            Ok((
                StatusCode::OK,
                Json(ResolveResponse {
                    real_destination: resolved.real_destination,
                    carrier_instructions: resolved.carrier_instructions,
                    consumed: resolved.consumed,
                }),
            ))
        }
        Err(err) => {
            let (api, outcome) = map_resolver_error(err);
            observe(
                &state.metrics,
                DeliveryMetricEvent::bare(DeliveryOp::Resolve, outcome),
                started,
            );
            Err(api)
        }
    }
}

/// Handles a signed carrier webhook event.
pub(crate) async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookResponse>), ApiError> {
    let started = Instant::now();
    if body.len() > state.max_body_bytes {
        observe(
            &state.metrics,
            DeliveryMetricEvent::bare(DeliveryOp::Webhook, DeliveryOutcome::Rejected),
            started,
        );
        return Err(ApiError::PayloadTooLarge);
    }
    let Some(signature) = headers
        .get(state.signature_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
    else {
        observe(
            &state.metrics,
            DeliveryMetricEvent::bare(DeliveryOp::Webhook, DeliveryOutcome::Rejected),
            started,
        );
        return Err(ApiError::Unauthorized);
    };

    let resolver = Arc::clone(&state.resolver);
    let raw = body.to_vec();
    let result = tokio::task::spawn_blocking(move || resolver.handle_signed(&raw, &signature))
        .await
        .map_err(|_| ApiError::Internal)?;

    match result {
        Ok(resolved) => {
            let event = DeliveryMetricEvent {
                op: DeliveryOp::Webhook,
                outcome: DeliveryOutcome::Ok,
                code: None,
                masked_contact: resolved.real_destination.phone.as_deref().map(mask_phone),
                failed_networks: Vec::new(),
            };
            observe(&state.metrics, event, started);
            Ok((
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "processed",
                    consumed: resolved.consumed,
                }),
            ))
        }
        Err(err) => {
            let (api, outcome) = map_resolver_error(err);
            observe(
                &state.metrics,
                DeliveryMetricEvent::bare(DeliveryOp::Webhook, outcome),
                started,
            );
            Err(api)
        }
    }
}

/// Searches relay points near an origin.
pub(crate) async fn handle_relay_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RelaySearchParams>,
) -> Result<(StatusCode, Json<RelaySearchResponse>), ApiError> {
    let started = Instant::now();
    let origin = GeoPoint {
        lat: params.lat,
        lng: params.lng,
    };
    if !origin.lat.is_finite()
        || !origin.lng.is_finite()
        || !(-90.0..=90.0).contains(&origin.lat)
        || !(-180.0..=180.0).contains(&origin.lng)
    {
        return Err(ApiError::BadRequest("origin coordinates out of range".to_string()));
    }
    let max_distance_km =
        params.max_distance_km.unwrap_or(state.relay_defaults.max_distance_km);
    if !max_distance_km.is_finite() || max_distance_km <= 0.0 || max_distance_km > MAX_RADIUS_KM {
        return Err(ApiError::BadRequest("max_distance_km out of range".to_string()));
    }
    let min_security_level = match params.min_security_level {
        Some(level) => SecurityLevel::new(level)
            .ok_or_else(|| ApiError::BadRequest("min_security_level out of range".to_string()))?,
        None => state.relay_defaults.min_security_level,
    };
    let limit = params.limit.unwrap_or(state.relay_defaults.max_results);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be positive".to_string()));
    }
    let query = RelayQuery {
        max_distance_km,
        min_security_level,
        require_anonymization: params.require_anonymization.unwrap_or(true),
        limit: limit.min(state.relay_defaults.max_results),
    };

    let relay = Arc::clone(&state.relay);
    let search = tokio::task::spawn_blocking(move || relay.find_near(origin, &query))
        .await
        .map_err(|_| ApiError::Internal)?;

    let event = DeliveryMetricEvent {
        op: DeliveryOp::RelaySearch,
        outcome: DeliveryOutcome::Ok,
        code: None,
        masked_contact: None,
        failed_networks: search.failed_networks.clone(),
    };
    observe(&state.metrics, event, started);

    let points = search
        .points
        .into_iter()
        .map(|ranked| RankedPointBody {
            point: ranked.point,
            distance_km: ranked.distance_km,
        })
        .collect();
    Ok((
        StatusCode::OK,
        Json(RelaySearchResponse {
            points,
            total_found: search.total_found,
            failed_networks: search.failed_networks,
        }),
    ))
}

// ============================================================================
// SECTION: Handler Helpers
// ============================================================================

/// Runs the blocking label creation path.
fn create_label(
    state: &AppState,
    trade_id: &TradeId,
    apparent: &ApparentAddress,
) -> Result<CreateLabelResponse, ApiError> {
    let trade = state
        .trades
        .trade(trade_id)
        .map_err(|_| ApiError::Internal)?
        .ok_or(ApiError::NotFound)?;
    if trade.status != TradeStatus::Accepted {
        return Err(ApiError::Conflict("trade is not in an accepted state".to_string()));
    }

    let mapping = state
        .registry
        .create_mapping(&trade.id, &trade.from_user, &trade.to_user)
        .map_err(map_registry_error)?;
    let sender = state
        .users
        .profile(&trade.from_user)
        .map_err(|_| ApiError::Internal)?
        .ok_or(ApiError::Internal)?;
    let label = state
        .composer
        .compose(&trade, &sender, &mapping, apparent)
        .map_err(|_| ApiError::Internal)?;

    let code = mapping.code.as_str();
    Ok(CreateLabelResponse {
        redirection_code: code.to_string(),
        label_pdf_base64: BASE64.encode(&label.bytes),
        filename: label.filename,
        instructions: sender_instructions(code),
        estimated_delivery_date: estimated_delivery_date(
            mapping.created_at,
            state.estimated_delivery_days,
        ),
        expires_at: mapping.expires_at.as_unix_millis(),
    })
}

/// Resolves the apparent address for a label: a first-party catalog relay
/// point by id, or the central hub when none is requested.
///
/// Only catalog points are label-eligible. Third-party network points appear
/// in search results but cannot serve as the printed address, and a catalog
/// point without anonymized handling is rejected before anything is composed.
fn apparent_address(
    state: &AppState,
    relay_point_id: Option<&str>,
) -> Result<ApparentAddress, ApiError> {
    match relay_point_id {
        Some(id) => {
            let seed = state
                .seeds
                .iter()
                .find(|seed| seed.id.as_str() == id)
                .ok_or_else(|| ApiError::BadRequest("unknown relay point".to_string()))?;
            if !seed.supports_anonymization {
                return Err(ApiError::Conflict(
                    "relay point does not support anonymized delivery".to_string(),
                ));
            }
            Ok(ApparentAddress::Relay(seed.clone()))
        }
        None => Ok(state.hub.clone()),
    }
}

/// Sender instructions mirroring the printed label.
fn sender_instructions(code: &str) -> Vec<String> {
    vec![
        "Stick this label flat on the parcel.".to_string(),
        "Ship to the printed redirection address, exactly as shown.".to_string(),
        "Do not alter the label or add any other address.".to_string(),
        format!("Keep code {code} with your proof of shipment."),
    ]
}

/// Formats the estimated delivery date as `YYYY-MM-DD`.
fn estimated_delivery_date(created_at: Timestamp, days: u64) -> Option<String> {
    let offset_seconds = i64::try_from(days).ok()?.checked_mul(86_400)?;
    let seconds = created_at.as_unix_seconds().checked_add(offset_seconds)?;
    let date = OffsetDateTime::from_unix_timestamp(seconds).ok()?;
    date.format(format_description!("[year]-[month]-[day]")).ok()
}

/// Maps registry failures onto HTTP errors without leaking internal detail.
fn map_registry_error(err: RegistryError) -> ApiError {
    match err {
        RegistryError::AddressMissing => {
            ApiError::Conflict("recipient has no address on file".to_string())
        }
        RegistryError::AddressIncomplete {
            field,
        } => ApiError::Conflict(format!("recipient address incomplete: missing {field}")),
        RegistryError::NotFound => ApiError::NotFound,
        RegistryError::CodeSpaceExhausted {
            ..
        }
        | RegistryError::Cipher(_)
        | RegistryError::Store(_)
        | RegistryError::Directory(_)
        | RegistryError::Concurrency(_) => ApiError::Internal,
    }
}

/// Maps resolver failures onto HTTP errors and metric outcomes.
fn map_resolver_error(err: ResolverError) -> (ApiError, DeliveryOutcome) {
    match err {
        ResolverError::Authentication => (ApiError::Unauthorized, DeliveryOutcome::Rejected),
        ResolverError::NotFound => (ApiError::NotFound, DeliveryOutcome::Rejected),
        ResolverError::InvalidPayload(message) => {
            (ApiError::BadRequest(format!("carrier payload invalid: {message}")), DeliveryOutcome::Rejected)
        }
        ResolverError::Integrity(_) => (ApiError::Internal, DeliveryOutcome::IntegrityFailure),
        ResolverError::Registry(_) => (ApiError::Internal, DeliveryOutcome::Error),
    }
}

/// Classifies an API error for metric labeling.
const fn failure_outcome(err: &ApiError) -> DeliveryOutcome {
    match err {
        ApiError::Internal => DeliveryOutcome::Error,
        ApiError::NotFound
        | ApiError::Unauthorized
        | ApiError::BadRequest(_)
        | ApiError::Conflict(_)
        | ApiError::PayloadTooLarge => DeliveryOutcome::Rejected,
    }
}

/// Records one counter event and one latency observation.
fn observe(metrics: &Arc<dyn DeliveryMetrics>, event: DeliveryMetricEvent, started: Instant) {
    metrics.record_event(event.clone());
    metrics.record_latency(event, started.elapsed());
}

#[cfg(test)]
mod tests;
