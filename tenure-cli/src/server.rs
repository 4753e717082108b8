use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use tenure_core::infrastructure::LeaseManager;
use tenure_core::infrastructure_in_memory::InMemoryLeaseRegistry;

use crate::handlers::*;
use crate::sweep::EvictionSweeper;

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub lease_duration_secs: u32,
    pub eviction_interval_ms: u64,
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<InMemoryLeaseRegistry<ServiceInstance>>,
    pub lease_duration_secs: u32,
    pub api_key: Option<Arc<str>>,
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let registry = Arc::new(InMemoryLeaseRegistry::new());
    let state = AppState {
        registry: Arc::clone(&registry),
        lease_duration_secs: config.lease_duration_secs,
        api_key: config
            .api_key
            .filter(|key| !key.is_empty())
            .map(Arc::from),
    };

    if state.api_key.is_some() {
        tracing::info!("🔐 API key authentication enabled");
    } else {
        tracing::warn!("⚠️  No TENURE_API_KEY set — registry is open (dev mode)");
    }

    let sweeper = tokio::spawn(EvictionSweeper::new(registry, config.eviction_interval_ms).run());

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        lease_duration_secs = config.lease_duration_secs,
        eviction_interval_ms = config.eviction_interval_ms,
        "📋 Tenure registry starting on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Tenure registry stopped");
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health is always open (no auth)
        .route("/health", get(health))
        .route("/instances", post(register_instance))
        .route("/instances", get(list_instances))
        .route("/instances/{app}/{id}", delete(cancel_instance))
        .route("/instances/{app}/{id}/heartbeat", put(heartbeat_instance))
        .route("/instances/{app}/{id}/up", put(instance_up))
        .route("/evict", post(evict_expired))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ─── Auth Middleware ────────────────────────────────────────────────────────

async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // If no API key is configured, allow all requests (dev mode)
    let Some(expected_key) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    // Always allow health check without auth
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if token == expected_key {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("🚫 Unauthorized request to {}", request.uri().path());
        Err(StatusCode::UNAUTHORIZED)
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        registered_instances: state.registry.len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn register_instance(
    State(state): State<AppState>,
    Json(req): Json<RegisterInstanceRequest>,
) -> (StatusCode, Json<ApiResponse<RegisterResponse>>) {
    if let Err(e) = req.validate() {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e)));
    }

    let duration = req.lease_duration_secs.unwrap_or(state.lease_duration_secs);
    let instance = req.into_instance();
    let key = instance.key();
    let lease = state.registry.register(&key, instance, Some(duration));

    tracing::info!(key = %key, duration_ms = lease.duration_ms(), "Instance registered");
    (
        StatusCode::CREATED,
        Json(ApiResponse::ok(RegisterResponse {
            key,
            duration_ms: lease.duration_ms(),
            registration_timestamp: lease.registration_timestamp(),
        })),
    )
}

async fn list_instances(State(state): State<AppState>) -> Json<ApiResponse<Vec<InstanceInfo>>> {
    let instances = state
        .registry
        .leases()
        .into_iter()
        .map(|(key, lease)| InstanceInfo {
            key,
            instance: lease.holder().clone(),
            lease: lease.snapshot(),
        })
        .collect();
    Json(ApiResponse::ok(instances))
}

async fn heartbeat_instance(
    State(state): State<AppState>,
    Path((app, id)): Path<(String, String)>,
) -> (StatusCode, Json<ApiResponse<HeartbeatResponse>>) {
    let key = instance_key(&app, &id);
    if !state.registry.renew(&key) {
        tracing::debug!(key = %key, "Heartbeat for unknown instance");
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(format!("Instance '{}' not registered", key))),
        );
    }

    // A concurrent cancel may remove the lease right after the renewal
    let last_renewal_timestamp = state
        .registry
        .get(&key)
        .map(|lease| lease.last_renewal_timestamp())
        .unwrap_or_default();

    (
        StatusCode::OK,
        Json(ApiResponse::ok(HeartbeatResponse {
            renewed: true,
            key,
            last_renewal_timestamp,
        })),
    )
}

async fn instance_up(
    State(state): State<AppState>,
    Path((app, id)): Path<(String, String)>,
) -> (StatusCode, Json<ApiResponse<String>>) {
    let key = instance_key(&app, &id);
    if state.registry.service_up(&key) {
        tracing::info!(key = %key, "Instance marked up");
        (StatusCode::OK, Json(ApiResponse::ok(format!("Instance '{}' is up", key))))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(format!("Instance '{}' not registered", key))),
        )
    }
}

async fn cancel_instance(
    State(state): State<AppState>,
    Path((app, id)): Path<(String, String)>,
) -> (StatusCode, Json<ApiResponse<String>>) {
    let key = instance_key(&app, &id);
    if state.registry.cancel(&key) {
        tracing::info!(key = %key, "Instance cancelled");
        (StatusCode::OK, Json(ApiResponse::ok(format!("Instance '{}' cancelled", key))))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(format!("Instance '{}' not registered", key))),
        )
    }
}

async fn evict_expired(State(state): State<AppState>) -> Json<ApiResponse<EvictResponse>> {
    let keys: Vec<String> = state
        .registry
        .evict(0)
        .into_iter()
        .map(|evicted| evicted.key)
        .collect();
    tracing::info!(evicted = keys.len(), "Expired leases evicted on request");
    Json(ApiResponse::ok(EvictResponse {
        evicted: keys.len(),
        keys,
    }))
}
