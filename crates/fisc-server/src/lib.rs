//! Fisc Web Server
//!
//! Axum-based REST API for the Fisc personal finance application.
//!
//! Security features:
//! - Identity comes from the fronting authentication provider (header),
//!   with API keys for internal services and --no-auth for local dev
//! - Every mutating handler consults the ability engine
//! - Restrictive CORS policy and security headers
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use fisc_core::ability::{AbilitySet, Action, SubjectRef};
use fisc_core::ai::{AIClient, ModelBackend};
use fisc_core::models::{AppUser, UserStatus};
use fisc_core::payments::CheckoutClient;
use fisc_core::store::Store;

mod handlers;

/// Maximum accepted document payload size after base64 decoding (10 MB)
pub const MAX_DOCUMENT_SIZE: usize = 10 * 1024 * 1024;

/// Header carrying the authenticated user's email, set by the fronting
/// auth provider (reverse proxy). Never trusted when the request did
/// not pass the auth middleware.
pub const USER_EMAIL_HEADER: &str = "x-fisc-user-email";

/// Optional header carrying the user's display name for first sign-in
pub const USER_NAME_HEADER: &str = "x-fisc-user-name";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// API keys for internal service authentication
    /// Format: "Bearer <key>" in Authorization header
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub store: Store,
    pub config: ServerConfig,
    pub ai: Option<AIClient>,
    pub checkout: CheckoutClient,
}

/// Authentication middleware - validates the identity header or API keys
///
/// The identity header is safe when the server sits behind the
/// authentication proxy (which strips and rewrites it). API keys are
/// compared in constant time to prevent timing attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let header_user = request
        .headers()
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    if let Some(email) = header_user {
        info!(user = %email, path = %request.uri().path(), "Authenticated via identity header");
        return next.run(request).await;
    }

    // Check for API key in Authorization header (Bearer token)
    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        info!(user = "api-key", path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time
/// comparison to prevent timing attacks.
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    for key in valid_keys {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        if provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes)) {
            return true;
        }
    }
    false
}

/// Resolve the request principal from the identity header.
///
/// The projection is created on first sign-in. Suspended accounts are
/// rejected here, before any handler logic runs.
pub(crate) fn current_user(state: &AppState, headers: &HeaderMap) -> Result<Option<AppUser>, AppError> {
    let Some(email) = headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };

    let display_name = headers
        .get(USER_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());

    let user = state.store.upsert_user(email, &display_name)?;
    if user.status == UserStatus::Suspended {
        return Err(AppError::forbidden("Account suspended"));
    }
    Ok(Some(user))
}

/// Resolve the request principal, failing when absent
pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<AppUser, AppError> {
    current_user(state, headers)?
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, "Authentication required"))
}

/// Check an ability and convert denial into a 403
pub(crate) fn require_can(
    abilities: &AbilitySet,
    action: Action,
    subject: SubjectRef<'_>,
    field: Option<&str>,
) -> Result<(), AppError> {
    if abilities.can(action, subject, field) {
        Ok(())
    } else {
        Err(AppError::forbidden("Access denied"))
    }
}

/// Build the application router
pub fn create_router(store: Store, config: ServerConfig) -> Router {
    let ai = AIClient::from_env();
    let checkout = CheckoutClient::from_env();
    create_router_with_options(store, config, ai, checkout)
}

/// Build the router with explicit collaborators (used by tests)
pub fn create_router_with_options(
    store: Store,
    config: ServerConfig,
    ai: Option<AIClient>,
    checkout: CheckoutClient,
) -> Router {
    match ai {
        Some(ref client) => {
            info!(
                "Model backend configured: {} (model: {})",
                client.host(),
                client.model()
            );
        }
        None => {
            info!("Model backend not configured (set OLLAMA_HOST to enable AI features)");
        }
    }

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        ai,
        checkout,
    });

    let api_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        // Users (admin surface)
        .route("/users", get(handlers::list_users))
        .route(
            "/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // Personal record collections (generic document CRUD)
        .route(
            "/records/:collection",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/records/:collection/:id",
            get(handlers::get_record)
                .put(handlers::update_record)
                .delete(handlers::delete_record),
        )
        // AI-assisted data entry
        .route("/extract/payslip", post(handlers::extract_payslip))
        .route("/extract/statement", post(handlers::extract_statement))
        .route("/budget/suggestions", get(handlers::budget_suggestions))
        // Plans and checkout
        .route(
            "/plans",
            get(handlers::list_plans).post(handlers::create_plan),
        )
        .route(
            "/plans/:id",
            axum::routing::put(handlers::update_plan).delete(handlers::delete_plan),
        )
        .route("/plans/:id/checkout", post(handlers::create_checkout))
        // Educational content
        .route(
            "/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        .route(
            "/courses/:id",
            axum::routing::put(handlers::update_course).delete(handlers::delete_course),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint (unauthenticated)
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Run the server until shutdown
pub async fn serve(store: Store, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(store, config);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Fisc server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<String>,
}

impl AppError {
    pub fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn forbidden(msg: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(ref err) = self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

/// Map the core error taxonomy onto user-safe responses. Anything
/// unexpected becomes a generic 500 with the detail kept for the log.
impl From<fisc_core::Error> for AppError {
    fn from(err: fisc_core::Error) -> Self {
        use fisc_core::Error;
        match err {
            Error::InvalidInput(msg) => Self::bad_request(&msg),
            Error::ModelOutputInvalid(_) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Could not determine key data from the document",
            ),
            Error::ModelUnavailable(msg) => {
                warn!(error = %msg, "Transient backend failure");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable, please try again",
                )
            }
            Error::PermissionDenied(_) => Self::forbidden("Access denied"),
            Error::NotFound(what) => Self::not_found(&format!("Not found: {}", what)),
            Error::Configuration(msg) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Server configuration error".to_string(),
                internal: Some(msg),
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "An internal error occurred".to_string(),
                internal: Some(other.to_string()),
            },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err.to_string()),
        }
    }
}
