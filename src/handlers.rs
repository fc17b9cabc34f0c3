use crate::{
    AppState, access,
    access::JobAction,
    auth::AuthUser,
    error::ApiError,
    models::{
        self, Application, Category, CategoryRequest, CreateApplicationRequest, CreateJobRequest,
        DashboardStats, Job, JobQuery, RegisterUserRequest, Role, UpdateApplicationRequest,
        UpdateJobRequest, User, UserProfile,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

/// AuthSignupResponse
///
/// Minimal struct to deserialize the external auth provider's signup response,
/// capturing the newly created user's UUID.
#[derive(Deserialize)]
struct AuthSignupResponse {
    id: Uuid,
}

// --- Job Handlers ---

/// list_jobs
///
/// [Public Route] Lists jobs with exact-match filters, free-text search, and
/// ordering. Readable by anyone, including anonymous clients.
#[utoipa::path(
    get,
    path = "/jobs",
    params(JobQuery),
    responses((status = 200, description = "List filtered jobs", body = [Job]))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> Json<Vec<models::Job>> {
    let jobs = state.repo.list_jobs(query).await;
    Json(jobs)
}

/// get_job_details
///
/// [Public Route] Retrieves a single job by ID.
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses((status = 200, description = "Found", body = Job), (status = 404, description = "Not Found"))
)]
pub async fn get_job_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Job>, ApiError> {
    match state.repo.get_job(id).await {
        Some(job) => Ok(Json(job)),
        None => Err(ApiError::NotFound),
    }
}

/// create_job
///
/// [Authenticated Route] Posts a new job. Admin-only; `posted_by` is always
/// the authenticated principal, regardless of the payload.
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 200, description = "Created", body = Job),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_job(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<models::CreateJobRequest>,
) -> Result<Json<models::Job>, ApiError> {
    access::authorize_job_create(&user)?;
    let job = state.repo.create_job(payload, user.id).await?;
    Ok(Json(job))
}

/// update_job
///
/// [Authenticated Route] Modifies a job. Allowed for admins and for the job's
/// owner; everyone else receives a 403 with the denial reason. The row is
/// fetched first so the ownership decision runs against current data.
#[utoipa::path(
    put,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobRequest,
    responses(
        (status = 200, description = "Updated", body = Job),
        (status = 403, description = "Not owner or admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<models::UpdateJobRequest>,
) -> Result<Json<models::Job>, ApiError> {
    let job = state.repo.get_job(id).await.ok_or(ApiError::NotFound)?;
    access::authorize_job_mutation(&user, &job, JobAction::Update)?;

    match state.repo.update_job(id, payload).await? {
        Some(updated) => Ok(Json(updated)),
        // The row vanished between the ownership check and the update.
        None => Err(ApiError::NotFound),
    }
}

/// delete_job
///
/// [Authenticated Route] Removes a job. Same ownership rule as update.
#[utoipa::path(
    delete,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner or admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let job = state.repo.get_job(id).await.ok_or(ApiError::NotFound)?;
    access::authorize_job_mutation(&user, &job, JobAction::Delete)?;

    if state.repo.delete_job(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Category Handlers ---

/// list_categories
///
/// [Public Route] Lists all categories, alphabetically.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<models::Category>> {
    Json(state.repo.list_categories().await)
}

/// get_category_details
///
/// [Public Route] Retrieves a single category by ID.
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses((status = 200, description = "Found", body = Category), (status = 404, description = "Not Found"))
)]
pub async fn get_category_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Category>, ApiError> {
    match state.repo.get_category(id).await {
        Some(category) => Ok(Json(category)),
        None => Err(ApiError::NotFound),
    }
}

/// create_category
///
/// [Authenticated Route] Creates a category. Reads are public, every write is
/// admin-only.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Created", body = Category),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<models::CategoryRequest>,
) -> Result<Json<models::Category>, ApiError> {
    access::authorize_category_write(&user)?;
    let category = state.repo.create_category(payload).await?;
    Ok(Json(category))
}

/// update_category
///
/// [Authenticated Route] Renames a category. Admin-only.
#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<models::CategoryRequest>,
) -> Result<Json<models::Category>, ApiError> {
    access::authorize_category_write(&user)?;
    match state.repo.update_category(id, payload).await? {
        Some(category) => Ok(Json(category)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_category
///
/// [Authenticated Route] Removes a category. Admin-only.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    access::authorize_category_write(&user)?;
    if state.repo.delete_category(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Application Handlers ---

/// list_applications
///
/// [Authenticated Route] Lists applications visible to the principal: all of
/// them for an admin, only the user's own for everyone else. The narrowing
/// happens inside the repository query.
#[utoipa::path(
    get,
    path = "/applications",
    responses((status = 200, description = "Visible applications", body = [Application]))
)]
pub async fn list_applications(
    user: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::Application>> {
    let scope = access::application_scope(&user);
    Json(state.repo.list_applications(scope).await)
}

/// get_application_details
///
/// [Authenticated Route] Retrieves one application, subject to the same
/// visibility scope as the listing. Rows outside the scope return 404 rather
/// than 403, so their existence is not revealed.
#[utoipa::path(
    get,
    path = "/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Found", body = Application),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn get_application_details(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Application>, ApiError> {
    let scope = access::application_scope(&user);
    match state.repo.get_application(id, scope).await {
        Some(application) => Ok(Json(application)),
        None => Err(ApiError::NotFound),
    }
}

/// create_application
///
/// [Authenticated Route] Submits an application. The applicant is always the
/// requesting principal. Validation order: payload field checks first, then
/// the duplicate (job, applicant) check, then persistence, where the unique
/// constraint backstops the duplicate check under concurrency.
#[utoipa::path(
    post,
    path = "/applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 200, description = "Created", body = Application),
        (status = 400, description = "Validation error (blank field or duplicate application)")
    )
)]
pub async fn create_application(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<models::CreateApplicationRequest>,
) -> Result<Json<models::Application>, ApiError> {
    validate_application_payload(&payload)?;

    if state.repo.has_applied(payload.job_id, user.id).await? {
        return Err(access::duplicate_application_error());
    }

    let application = state.repo.create_application(payload, user.id).await?;
    Ok(Json(application))
}

/// Required-field validation for application payloads. Runs before the
/// duplicate check so a blank submission never consumes the uniqueness slot.
fn validate_application_payload(payload: &CreateApplicationRequest) -> Result<(), ApiError> {
    for (field, value) in [
        ("full_name", &payload.full_name),
        ("email", &payload.email),
        ("cover_letter", &payload.cover_letter),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} may not be blank.")));
        }
    }
    Ok(())
}

/// update_application
///
/// [Authenticated Route] Changes an application's review status. Any row the
/// principal can see, the principal can update: visibility implies
/// reachability, and reachability implies mutability. There is deliberately
/// no separate update permission beyond the scope.
#[utoipa::path(
    put,
    path = "/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateApplicationRequest,
    responses(
        (status = 200, description = "Updated", body = Application),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn update_application(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<models::UpdateApplicationRequest>,
) -> Result<Json<models::Application>, ApiError> {
    let scope = access::application_scope(&user);
    match state
        .repo
        .set_application_status(id, scope, payload.status)
        .await?
    {
        Some(application) => Ok(Json(application)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_application
///
/// [Authenticated Route] Withdraws an application. Scoped exactly like reads
/// and updates.
#[utoipa::path(
    delete,
    path = "/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn delete_application(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let scope = access::application_scope(&user);
    if state.repo.delete_application(id, scope).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Profile / Stats / Registration ---

/// get_me
///
/// [Authenticated Route] Returns the authenticated user's profile as stored.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let record = state.repo.get_user(user.id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(UserProfile {
        id: record.id,
        email: record.email,
        role: record.role,
    }))
}

/// get_dashboard_stats
///
/// [Admin Route] Aggregate counters for the admin dashboard. The role check
/// runs before any counting work.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = DashboardStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_dashboard_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    access::authorize_dashboard(&user)?;
    Ok(Json(state.repo.get_stats().await?))
}

/// register_user
///
/// [Public Route] Handles user registration via the external auth provider:
/// the credentials go to the provider's signup endpoint, and the returned
/// user UUID is mirrored into the local `users` table. The stored role is
/// always `Regular`; admin status is only granted through the superuser
/// bootstrap at startup.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Rejected by auth provider")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, ApiError> {
    let client = reqwest::Client::new();
    let signup_url = format!("{}/auth/v1/signup", state.config.auth_url);

    let response = client
        .post(signup_url)
        .header("apikey", &state.config.auth_api_key)
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await?;

    if !response.status().is_success() {
        // The provider rejected the signup (duplicate email, weak password).
        return Err(ApiError::AuthRejected(
            "Registration rejected by auth provider.".to_string(),
        ));
    }

    let created = response.json::<AuthSignupResponse>().await?;

    let new_user = User {
        id: created.id,
        email: payload.email,
        role: Role::Regular,
    };

    let user = state.repo.create_user(new_user).await?;
    Ok(Json(user))
}
