use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main entry point (main.rs).
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application from the `#[utoipa::path]` and `ToSchema` annotations.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_jobs, handlers::get_job_details, handlers::create_job,
        handlers::update_job, handlers::delete_job,
        handlers::list_categories, handlers::get_category_details,
        handlers::create_category, handlers::update_category, handlers::delete_category,
        handlers::list_applications, handlers::get_application_details,
        handlers::create_application, handlers::update_application, handlers::delete_application,
        handlers::get_me, handlers::get_dashboard_stats, handlers::register_user
    ),
    components(
        schemas(
            models::Job, models::CreateJobRequest, models::UpdateJobRequest,
            models::Category, models::CategoryRequest,
            models::Application, models::CreateApplicationRequest,
            models::UpdateApplicationRequest, models::ApplicationStatus,
            models::JobType, models::ExperienceLevel, models::Role,
            models::User, models::UserProfile, models::RegisterUserRequest,
            models::DashboardStats,
        )
    ),
    tags(
        (name = "job-board", description = "Job Board API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding the application
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These allow handlers and the AuthUser extractor to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the authenticated and admin routers. It
/// attempts to extract `AuthUser` from the request; if authentication (JWT
/// validation, DB lookup) fails, the extractor rejects the request with 401
/// before any handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated routes: protected by the auth middleware.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: nested under '/admin', behind the same authentication
        // layer. The admin role check happens inside the handlers.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .with_state(state);

    // Observability and correlation layers (applied outermost).
    base_router
        .layer(
            ServiceBuilder::new()
                // Request ID generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Request tracing: wraps the request/response lifecycle in a
                // span carrying the generated request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes TraceLayer's span creation: extracts the `x-request-id` header
/// and includes it in the structured logging metadata alongside the HTTP
/// method and URI, so every log line for one request is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
