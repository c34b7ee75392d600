use std::{
    collections::HashMap,
    env,
    net::SocketAddr,
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::body::Body;
use axum::{
    extract::rejection::JsonRejection,
    extract::{Path as UrlPath, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, Request, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use config::Config;
use egress_core::prelude::{
    AuditQueryProxy, BypassConfig, ChatRequest, ChatService, ConsentIssuer, ContextRehydrator,
    GatewayProxy, GatewayUpstream, ModelSpec, OrgAuthenticator, OrgKeySources, Passthrough,
    PurposeResolver, TelemetryEmitter, DEFAULT_PURPOSE, DEMO_ORG_KEY,
};
use egress_errors::prelude::ProxyError;
use egress_storage::prelude::{
    ConsentRecord, ConsentStore, ContextRecord, ContextStore, MemoryConsentStore,
    MemoryContextStore, MemoryDirectory, OrgDirectory, Organization, StorePool, Stores,
};
use egress_types::prelude::{epoch_ms, OrgId, OrgKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = EgressConfig::load()?;
    let state = AppState::new(config.clone())?;

    let app = router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.address, config.server.port)
        .parse()
        .context("invalid server address/port")?;

    info!(%addr, "egress proxy listening");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("egress proxy server failure")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/metrics", get(metrics))
        .route("/osdk/ping", post(osdk_ping))
        .route("/osdk/chat", post(osdk_chat))
        .route("/osdk/overlay", get(osdk_overlay))
        .route("/osdk/receipt", get(osdk_receipt))
        .route("/osdk/fragments", get(osdk_fragments))
        .route("/osdk/recent-sessions", get(osdk_recent_sessions))
        .route("/api/consents", post(create_consent))
        .route("/api/consents/:id/revoke", post(revoke_consent))
        .route("/api/contexts", post(create_context))
        .route("/api/contexts/:id", get(get_context))
        .route(
            "/api/contexts/by-subject/:subject_id/latest",
            get(latest_context),
        )
        .with_state(state.clone())
        .layer(from_fn_with_state(state, metrics_middleware))
}

fn init_tracing() {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .finish(),
    )
    .is_err()
    {
        // Subscriber already set by tests or external runtime.
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
struct EgressConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    upstream: UpstreamConfig,
    #[serde(default)]
    auth: AuthConfig,
    #[serde(default)]
    policy: PolicyConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    orgs: Vec<OrgSeed>,
}

impl EgressConfig {
    fn load() -> anyhow::Result<Self> {
        let config_file =
            env::var("EGRESS_CONFIG_FILE").unwrap_or_else(|_| "config/egress.local.toml".to_string());

        let mut builder = Config::builder()
            .set_default("server.address", ServerConfig::default_address())?
            .set_default("server.port", ServerConfig::default_port())?;

        if Path::new(&config_file).exists() {
            builder = builder.add_source(config::File::from(Path::new(&config_file)));
        }

        builder = builder.add_source(config::Environment::with_prefix("EGRESS").separator("__"));

        let config: EgressConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ServerConfig {
    #[serde(default = "ServerConfig::default_address")]
    address: String,
    #[serde(default = "ServerConfig::default_port")]
    port: u16,
}

impl ServerConfig {
    fn default_address() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        8088
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: Self::default_address(),
            port: Self::default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct UpstreamConfig {
    /// Model gateway base URL. Unset means stub mode: chat answers locally
    /// and the audit surfaces report the gateway as unconfigured.
    #[serde(default)]
    gateway_url: Option<String>,
    #[serde(default)]
    control_plane_url: Option<String>,
    #[serde(default)]
    context_service_url: Option<String>,
    #[serde(default)]
    provider_api_key: Option<String>,
    #[serde(default)]
    provider_api_key_env: Option<String>,
    #[serde(default = "UpstreamConfig::default_budget_secs")]
    request_budget_secs: u64,
    #[serde(default)]
    model: ModelConfig,
}

impl UpstreamConfig {
    fn default_budget_secs() -> u64 {
        20
    }

    fn provider_key(&self) -> anyhow::Result<Option<String>> {
        if let Some(key) = self.provider_api_key.as_ref() {
            return Ok(Some(key.clone()));
        }
        if let Some(env_var) = self.provider_api_key_env.as_ref() {
            let value = env::var(env_var)
                .with_context(|| format!("provider api key env {env_var} not set"))?;
            return Ok(Some(value));
        }
        Ok(None)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            control_plane_url: None,
            context_service_url: None,
            provider_api_key: None,
            provider_api_key_env: None,
            request_budget_secs: Self::default_budget_secs(),
            model: ModelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ModelConfig {
    #[serde(default = "ModelConfig::default_provider")]
    provider: String,
    #[serde(default = "ModelConfig::default_model")]
    model: String,
}

impl ModelConfig {
    fn default_provider() -> String {
        "openai".to_string()
    }

    fn default_model() -> String {
        "gpt-4.1-mini".to_string()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Self::default_provider(),
            model: Self::default_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
struct AuthConfig {
    #[serde(default)]
    default_org_key: Option<String>,
    #[serde(default)]
    bypass: BypassSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct BypassSettings {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "BypassSettings::default_org_key")]
    org_key: String,
    #[serde(default = "BypassSettings::default_org_id")]
    org_id: String,
    #[serde(default = "BypassSettings::default_org_name")]
    org_name: String,
}

impl BypassSettings {
    fn default_org_key() -> String {
        DEMO_ORG_KEY.to_string()
    }

    fn default_org_id() -> String {
        "org-demo".to_string()
    }

    fn default_org_name() -> String {
        "Demo Org".to_string()
    }
}

impl Default for BypassSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            org_key: Self::default_org_key(),
            org_id: Self::default_org_id(),
            org_name: Self::default_org_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct PolicyConfig {
    #[serde(default = "PolicyConfig::default_purpose")]
    default_purpose: String,
    #[serde(default)]
    purposes: HashMap<String, String>,
}

impl PolicyConfig {
    fn default_purpose() -> String {
        DEFAULT_PURPOSE.to_string()
    }

    fn resolver(&self) -> PurposeResolver {
        if self.purposes.is_empty() && self.default_purpose == DEFAULT_PURPOSE {
            return PurposeResolver::with_defaults();
        }
        PurposeResolver::new(self.purposes.clone(), self.default_purpose.clone())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_purpose: Self::default_purpose(),
            purposes: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
struct StorageConfig {
    #[serde(default)]
    pool: PoolConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct PoolConfig {
    #[serde(default = "PoolConfig::default_max_connections")]
    max_connections: usize,
    #[serde(default = "PoolConfig::default_acquire_timeout_ms")]
    acquire_timeout_ms: u64,
}

impl PoolConfig {
    fn default_max_connections() -> usize {
        16
    }

    fn default_acquire_timeout_ms() -> u64 {
        1_000
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: Self::default_max_connections(),
            acquire_timeout_ms: Self::default_acquire_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct OrgSeed {
    id: String,
    org_key: String,
    name: String,
}

/// Base URLs are joined against, so they must end with a slash.
fn parse_base(raw: &str, field: &str) -> anyhow::Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).with_context(|| format!("invalid {field} url: {raw}"))
}

#[derive(Clone)]
struct AppState {
    version: VersionInfo,
    metrics: EgressMetrics,
    authenticator: Arc<OrgAuthenticator>,
    chat: Arc<ChatService>,
    audit: Option<Arc<AuditQueryProxy>>,
    pool: StorePool,
    default_org_key: Option<String>,
}

impl AppState {
    fn new(config: EgressConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();

        let directory = MemoryDirectory::seed(config.orgs.iter().map(|seed| Organization {
            id: OrgId(seed.id.clone()),
            org_key: OrgKey(seed.org_key.clone()),
            name: seed.name.clone(),
        }));
        let pool = StorePool::new(
            Stores {
                directory: Arc::new(directory),
                consents: Arc::new(MemoryConsentStore::new()),
                contexts: Arc::new(MemoryContextStore::new()),
            },
            config.storage.pool.max_connections,
            Duration::from_millis(config.storage.pool.acquire_timeout_ms),
        );

        let authenticator = Arc::new(OrgAuthenticator::new(
            Arc::new(pool.clone()) as Arc<dyn OrgDirectory>,
            config.auth.default_org_key.clone(),
            BypassConfig {
                enabled: config.auth.bypass.enabled,
                org_key: config.auth.bypass.org_key.clone(),
                org_id: config.auth.bypass.org_id.clone(),
                org_name: config.auth.bypass.org_name.clone(),
            },
        ));

        let telemetry = match config.upstream.control_plane_url.as_deref() {
            Some(raw) => {
                let base = parse_base(raw, "control_plane")?;
                let ingest = base.join("ingest").context("control plane ingest url")?;
                TelemetryEmitter::new(client.clone(), ingest)
            }
            None => TelemetryEmitter::disabled(),
        };

        let rehydrator = match config.upstream.context_service_url.as_deref() {
            Some(raw) => {
                ContextRehydrator::new(client.clone(), Some(parse_base(raw, "context_service")?))
            }
            None => ContextRehydrator::disabled(client.clone()),
        };

        let (upstream, audit) = match config.upstream.gateway_url.as_deref() {
            Some(raw) => {
                let base = parse_base(raw, "gateway")?;
                let provider_key = config.upstream.provider_key()?;
                let upstream = GatewayUpstream {
                    consents: ConsentIssuer::new(client.clone(), &base)
                        .map_err(|err| anyhow::anyhow!("{err}"))?,
                    proxy: GatewayProxy::new(
                        client.clone(),
                        &base,
                        provider_key,
                        ModelSpec {
                            provider: config.upstream.model.provider.clone(),
                            model: config.upstream.model.model.clone(),
                        },
                    )
                    .map_err(|err| anyhow::anyhow!("{err}"))?,
                };
                let audit = Arc::new(AuditQueryProxy::new(client.clone(), base));
                (Some(upstream), Some(audit))
            }
            None => (None, None),
        };

        let chat = Arc::new(ChatService::new(
            authenticator.clone(),
            config.policy.resolver(),
            rehydrator,
            upstream,
            telemetry,
            Duration::from_secs(config.upstream.request_budget_secs),
        ));

        Ok(Self {
            version: VersionInfo::from_env(),
            metrics: EgressMetrics::default(),
            authenticator,
            chat,
            audit,
            pool,
            default_org_key: config.auth.default_org_key,
        })
    }
}

#[derive(Clone)]
struct VersionInfo {
    version: String,
    commit: Option<String>,
}

impl VersionInfo {
    fn from_env() -> Self {
        Self {
            version: env::var("EGRESS_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            commit: env::var("GIT_COMMIT_HASH").ok(),
        }
    }
}

fn org_sources(headers: &HeaderMap) -> OrgKeySources {
    OrgKeySources {
        header: header_value(headers, "x-org-key"),
        principal: None,
        cookie: headers
            .get("cookie")
            .and_then(|value| value.to_str().ok())
            .and_then(org_key_cookie),
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn org_key_cookie(cookie_header: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "org_key" && !value.is_empty()).then(|| value.to_string())
    })
}

fn error_response(err: ProxyError) -> Response {
    let obj = err.into_inner();
    if let Some(dev) = &obj.message_dev {
        tracing::warn!(code = obj.wire, detail = %dev, "request failed");
    }
    let status = StatusCode::from_u16(obj.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(obj.to_public())).into_response()
}

fn relay_response(relayed: Passthrough) -> Response {
    let status = StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = relayed.content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from(relayed.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct VersionResponse {
    version: String,
    commit: Option<String>,
}

async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(VersionResponse {
        version: state.version.version.clone(),
        commit: state.version.commit.clone(),
    })
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot().await)
}

async fn osdk_ping(body: Result<Json<Value>, JsonRejection>) -> Response {
    let echo = body.map(|Json(value)| value).unwrap_or(Value::Null);
    Json(json!({"ok": true, "echo": echo})).into_response()
}

async fn osdk_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let payload = match body {
        Ok(Json(value)) => value,
        Err(rejection) => {
            return error_response(ProxyError::bad_request(&rejection.to_string()));
        }
    };
    let request: ChatRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(err) => return error_response(ProxyError::bad_request(&err.to_string())),
    };

    match state.chat.handle(&org_sources(&headers), request).await {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct AuditQuery {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// Demo-surface org key: header, then session cookie, then process default,
/// then the demo fallback. Audit queries relay the key upstream without a
/// directory round trip.
fn audit_org_key(state: &AppState, headers: &HeaderMap) -> OrgKey {
    let sources = org_sources(headers);
    let key = sources
        .header
        .as_deref()
        .or(sources.cookie.as_deref())
        .or(state.default_org_key.as_deref())
        .unwrap_or(DEMO_ORG_KEY);
    OrgKey(key.to_string())
}

enum AuditKind {
    Overlay,
    Receipt,
    Fragments,
}

async fn relay_audit(
    state: AppState,
    headers: HeaderMap,
    query: AuditQuery,
    kind: AuditKind,
) -> Response {
    // session_id validation comes first so the 400 fires even in stub mode.
    let Some(session_id) = query.session_id.as_deref() else {
        return error_response(ProxyError::missing_session_id());
    };
    let Some(audit) = state.audit.as_ref() else {
        return error_response(ProxyError::gateway_failed("gateway upstream not configured"));
    };
    let org_key = audit_org_key(&state, &headers);

    let relayed = match kind {
        AuditKind::Overlay => audit.overlay(session_id, &org_key).await,
        AuditKind::Receipt => audit.receipt(session_id, &org_key).await,
        AuditKind::Fragments => audit.fragments(session_id, &org_key).await,
    };
    match relayed {
        Ok(relayed) => relay_response(relayed),
        Err(err) => error_response(err),
    }
}

async fn osdk_overlay(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Response {
    relay_audit(state, headers, query, AuditKind::Overlay).await
}

async fn osdk_receipt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Response {
    relay_audit(state, headers, query, AuditKind::Receipt).await
}

async fn osdk_fragments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Response {
    relay_audit(state, headers, query, AuditKind::Fragments).await
}

async fn osdk_recent_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Response {
    let Some(audit) = state.audit.as_ref() else {
        return error_response(ProxyError::gateway_failed("gateway upstream not configured"));
    };
    let org_key = audit_org_key(&state, &headers);
    match audit
        .recent_sessions(&org_key, query.user_id.as_deref())
        .await
    {
        Ok(relayed) => relay_response(relayed),
        Err(err) => error_response(err),
    }
}

async fn authorize_api(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Organization, ProxyError> {
    let key = state.authenticator.resolve_strict(&org_sources(headers))?;
    state.authenticator.validate(&key).await
}

#[derive(Deserialize)]
struct CreateConsentBody {
    #[serde(default)]
    id: Option<String>,
    subject_id: String,
    purpose: String,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    meta: Value,
}

async fn create_consent(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateConsentBody>, JsonRejection>,
) -> Response {
    let org = match authorize_api(&state, &headers).await {
        Ok(org) => org,
        Err(err) => return error_response(err),
    };
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return error_response(ProxyError::bad_request(&rejection.to_string())),
    };

    let record = ConsentRecord {
        id: body
            .id
            .unwrap_or_else(|| format!("consent-{}", uuid::Uuid::new_v4())),
        org_id: org.id,
        subject_id: body.subject_id,
        purpose: body.purpose,
        scopes: body.scopes,
        version: body.version.unwrap_or(1),
        granted_at: epoch_ms(),
        revoked_at: None,
        meta: body.meta,
    };
    let id = record.id.clone();
    match ConsentStore::insert(&state.pool, record).await {
        Ok(()) => Json(json!({"id": id})).into_response(),
        Err(err) => error_response(err.into()),
    }
}

async fn revoke_consent(
    State(state): State<AppState>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Response {
    let org = match authorize_api(&state, &headers).await {
        Ok(org) => org,
        Err(err) => return error_response(err),
    };
    match ConsentStore::revoke(&state.pool, &org.id, &id, epoch_ms()).await {
        Ok(()) => Json(json!({"ok": true})).into_response(),
        Err(err) => error_response(err.into()),
    }
}

#[derive(Deserialize)]
struct CreateContextBody {
    #[serde(default)]
    id: Option<String>,
    subject_id: String,
    #[serde(default)]
    label: Option<String>,
    json: Value,
}

async fn create_context(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateContextBody>, JsonRejection>,
) -> Response {
    let org = match authorize_api(&state, &headers).await {
        Ok(org) => org,
        Err(err) => return error_response(err),
    };
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return error_response(ProxyError::bad_request(&rejection.to_string())),
    };

    let record = ContextRecord {
        id: body
            .id
            .unwrap_or_else(|| format!("ctx-{}", uuid::Uuid::new_v4())),
        org_id: org.id,
        subject_id: body.subject_id,
        label: body.label.unwrap_or_default(),
        json: body.json,
        created_at: epoch_ms(),
    };
    let id = record.id.clone();
    match ContextStore::insert(&state.pool, record).await {
        Ok(()) => Json(json!({"id": id})).into_response(),
        Err(err) => error_response(err.into()),
    }
}

async fn get_context(
    State(state): State<AppState>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Response {
    let org = match authorize_api(&state, &headers).await {
        Ok(org) => org,
        Err(err) => return error_response(err),
    };
    match ContextStore::get(&state.pool, &org.id, &id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_response(ProxyError::not_found(&format!("context {id} not found"))),
        Err(err) => error_response(err.into()),
    }
}

async fn latest_context(
    State(state): State<AppState>,
    headers: HeaderMap,
    UrlPath(subject_id): UrlPath<String>,
) -> Response {
    let org = match authorize_api(&state, &headers).await {
        Ok(org) => org,
        Err(err) => return error_response(err),
    };
    match state.pool.latest_for_subject(&org.id, &subject_id).await {
        Ok(Some(record)) => Json(record).into_response(),
        // No context yet is a normal answer, not an error.
        Ok(None) => Json(Value::Null).into_response(),
        Err(err) => error_response(err.into()),
    }
}

async fn metrics_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    let status = response.status();
    state.metrics.record(&path, status, start.elapsed()).await;
    Ok(response)
}

#[derive(Clone, Default)]
struct EgressMetrics {
    inner: Arc<tokio::sync::Mutex<MetricsInner>>,
}

#[derive(Default)]
struct MetricsInner {
    total_requests: u64,
    total_errors: u64,
    routes: HashMap<String, RouteStats>,
}

#[derive(Default)]
struct RouteStats {
    request_count: u64,
    error_count: u64,
    total_latency_ms: u64,
}

impl EgressMetrics {
    async fn record(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut inner = self.inner.lock().await;
        inner.total_requests += 1;
        if status.is_client_error() || status.is_server_error() {
            inner.total_errors += 1;
        }
        let stats = inner.routes.entry(route.to_string()).or_default();
        stats.request_count += 1;
        if status.is_client_error() || status.is_server_error() {
            stats.error_count += 1;
        }
        stats.total_latency_ms += latency.as_millis() as u64;
    }

    async fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().await;
        let routes = inner
            .routes
            .iter()
            .map(|(route, stats)| RouteMetrics {
                route: route.clone(),
                requests: stats.request_count,
                errors: stats.error_count,
                avg_latency_ms: if stats.request_count > 0 {
                    Some(stats.total_latency_ms as f64 / stats.request_count as f64)
                } else {
                    None
                },
            })
            .collect();
        MetricsSnapshot {
            total_requests: inner.total_requests,
            total_errors: inner.total_errors,
            routes,
        }
    }
}

#[derive(Serialize)]
struct MetricsSnapshot {
    total_requests: u64,
    total_errors: u64,
    routes: Vec<RouteMetrics>,
}

#[derive(Serialize)]
struct RouteMetrics {
    route: String,
    requests: u64,
    errors: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    avg_latency_ms: Option<f64>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
