use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Routes exclusively for users with the admin role, nested under `/admin`.
/// The router sits behind the authentication middleware; the role check
/// itself happens inside the handlers via the access module, so a regular
/// user reaching these paths receives a 403 with the denial reason.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters: job, application, and user totals plus the
        // application-per-job conversion rate.
        .route("/stats", get(handlers::get_dashboard_stats))
}
