use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any user who has passed the authentication layer. Every handler
/// here relies on the `AuthUser` extractor middleware on the layer above this
/// module, then applies its own authorization decision from the access
/// module: admin-only for job posting and category writes, admin-or-owner for
/// job mutation, and the visibility scope for everything touching
/// applications.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The authenticated user's stored profile.
        .route("/me", get(handlers::get_me))
        // --- Jobs (write side) ---
        // POST /jobs
        // Posts a new job. Admin-only; posted_by is taken from the session.
        .route("/jobs", post(handlers::create_job))
        // PUT/DELETE /jobs/{id}
        // Modifies or removes a job. Allowed for admins and the job's owner.
        .route(
            "/jobs/{id}",
            put(handlers::update_job).delete(handlers::delete_job),
        )
        // --- Categories (write side) ---
        // POST /categories
        // Admin-only create.
        .route("/categories", post(handlers::create_category))
        // PUT/DELETE /categories/{id}
        // Admin-only rename and delete.
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // --- Applications ---
        // GET /applications
        // Lists the applications visible to the principal (all for admins,
        // own rows otherwise). POST submits a new application for the
        // requesting user, with the duplicate (job, applicant) check.
        .route(
            "/applications",
            get(handlers::list_applications).post(handlers::create_application),
        )
        // GET/PUT/DELETE /applications/{id}
        // Single-row access under the same visibility scope as the listing.
        .route(
            "/applications/{id}",
            get(handlers::get_application_details)
                .put(handlers::update_application)
                .delete(handlers::delete_application),
        )
}
