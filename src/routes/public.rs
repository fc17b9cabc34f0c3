use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are unauthenticated and accessible to any client, anonymous
/// or logged-in: the read side of jobs and categories, registration, and the
/// health probe. Job and category reads carry no visibility restriction at
/// all; the listing filters are search conveniences, not access control.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated probe for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // New user creation: external auth signup mirrored into local users.
        .route("/register", post(handlers::register_user))
        // GET /jobs?category=...&type=...&experienceLevel=...&location=...&is_active=...&search=...&ordering=...
        // Lists jobs with exact-match filters, free-text search, and ordering.
        .route("/jobs", get(handlers::list_jobs))
        // GET /jobs/{id}
        // Detailed view of a single job.
        .route("/jobs/{id}", get(handlers::get_job_details))
        // GET /categories
        // Lists all categories. Readable by anyone; writes live on the
        // authenticated router behind the admin check.
        .route("/categories", get(handlers::list_categories))
        // GET /categories/{id}
        .route("/categories/{id}", get(handlers::get_category_details))
}
