use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use job_board::{
    AppState,
    access::ApplicationScope,
    auth::AuthUser,
    config::AppConfig,
    error::ApiError,
    handlers,
    models::{
        Application, ApplicationStatus, Category, CategoryRequest, CreateApplicationRequest,
        CreateJobRequest, DashboardStats, Job, JobQuery, Role, UpdateApplicationRequest,
        UpdateJobRequest, User,
    },
    repository::Repository,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// Central control point for testing handler logic. Handlers depend on the
// Repository trait, so the mock both serves pre-canned rows and records the
// arguments handlers pass down, which is how the ownership-forcing and
// scope-narrowing behavior is asserted.
#[derive(Default)]
struct MockRepoControl {
    // Pre-canned outputs
    job_to_return: Option<Job>,
    delete_result: bool,
    has_applied_result: bool,
    stats_to_return: DashboardStats,
    user_to_return: Option<User>,

    // Recorded inputs
    created_job_owner: Mutex<Option<Uuid>>,
    created_application_applicant: Mutex<Option<Uuid>>,
    list_applications_scope: Mutex<Option<ApplicationScope>>,
    status_update_scope: Mutex<Option<ApplicationScope>>,
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn list_jobs(&self, _query: JobQuery) -> Vec<Job> {
        vec![]
    }
    async fn get_job(&self, _id: Uuid) -> Option<Job> {
        self.job_to_return.clone()
    }
    async fn create_job(&self, req: CreateJobRequest, posted_by: Uuid) -> Result<Job, ApiError> {
        *self.created_job_owner.lock().unwrap() = Some(posted_by);
        Ok(Job {
            id: Uuid::new_v4(),
            title: req.title,
            posted_by,
            ..Job::default()
        })
    }
    async fn update_job(&self, _id: Uuid, _req: UpdateJobRequest) -> Result<Option<Job>, ApiError> {
        Ok(self.job_to_return.clone())
    }
    async fn delete_job(&self, _id: Uuid) -> bool {
        self.delete_result
    }

    async fn list_categories(&self) -> Vec<Category> {
        vec![]
    }
    async fn get_category(&self, _id: Uuid) -> Option<Category> {
        None
    }
    async fn create_category(&self, req: CategoryRequest) -> Result<Category, ApiError> {
        Ok(Category {
            id: Uuid::new_v4(),
            name: req.name,
        })
    }
    async fn update_category(
        &self,
        id: Uuid,
        req: CategoryRequest,
    ) -> Result<Option<Category>, ApiError> {
        Ok(Some(Category { id, name: req.name }))
    }
    async fn delete_category(&self, _id: Uuid) -> bool {
        self.delete_result
    }

    async fn list_applications(&self, scope: ApplicationScope) -> Vec<Application> {
        *self.list_applications_scope.lock().unwrap() = Some(scope);
        vec![]
    }
    async fn get_application(&self, _id: Uuid, _scope: ApplicationScope) -> Option<Application> {
        None
    }
    async fn has_applied(&self, _job_id: Uuid, _applicant_id: Uuid) -> Result<bool, ApiError> {
        Ok(self.has_applied_result)
    }
    async fn create_application(
        &self,
        req: CreateApplicationRequest,
        applicant_id: Uuid,
    ) -> Result<Application, ApiError> {
        *self.created_application_applicant.lock().unwrap() = Some(applicant_id);
        Ok(Application {
            id: Uuid::new_v4(),
            job_id: req.job_id,
            applicant_id,
            full_name: req.full_name,
            ..Application::default()
        })
    }
    async fn set_application_status(
        &self,
        id: Uuid,
        scope: ApplicationScope,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, ApiError> {
        *self.status_update_scope.lock().unwrap() = Some(scope);
        Ok(Some(Application {
            id,
            status,
            ..Application::default()
        }))
    }
    async fn delete_application(&self, _id: Uuid, _scope: ApplicationScope) -> bool {
        self.delete_result
    }

    async fn get_user(&self, _id: Uuid) -> Option<User> {
        self.user_to_return.clone()
    }
    async fn create_user(&self, user: User) -> Result<User, ApiError> {
        Ok(user)
    }
    async fn ensure_superuser(&self, _id: Uuid, _email: &str) -> Result<(), ApiError> {
        Ok(())
    }
    async fn seed_categories(&self, _names: &[&str]) -> Result<u64, ApiError> {
        Ok(0)
    }

    async fn get_stats(&self) -> Result<DashboardStats, ApiError> {
        Ok(self.stats_to_return.clone())
    }
}

// --- Helpers ---

fn state_with(mock: Arc<MockRepoControl>) -> AppState {
    AppState {
        repo: mock,
        config: AppConfig::default(),
    }
}

fn admin() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        role: Role::Admin,
    }
}

fn regular() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        role: Role::Regular,
    }
}

fn job_payload() -> CreateJobRequest {
    CreateJobRequest {
        title: "Backend Engineer".to_string(),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
        description: "Build the backend".to_string(),
        requirements: "Rust".to_string(),
        category_id: Uuid::new_v4(),
        ..CreateJobRequest::default()
    }
}

fn application_payload(job_id: Uuid) -> CreateApplicationRequest {
    CreateApplicationRequest {
        job_id,
        full_name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        phone: "+1-555-0100".to_string(),
        cover_letter: "I would like to apply.".to_string(),
        ..CreateApplicationRequest::default()
    }
}

// --- Job Handler Tests ---

#[tokio::test]
async fn test_create_job_denied_for_regular_user() {
    let mock = Arc::new(MockRepoControl::default());
    let state = state_with(mock.clone());

    let result = handlers::create_job(regular(), State(state), Json(job_payload())).await;

    match result {
        Err(ApiError::Forbidden(reason)) => assert_eq!(reason, "Only admins can post jobs."),
        other => panic!("expected Forbidden, got {:?}", other.map(|j| j.0)),
    }
    // The repository must never have been reached.
    assert!(mock.created_job_owner.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_create_job_forces_posted_by_to_principal() {
    let mock = Arc::new(MockRepoControl::default());
    let state = state_with(mock.clone());
    let user = admin();

    let result = handlers::create_job(user.clone(), State(state), Json(job_payload())).await;

    let Json(job) = result.expect("admin create should succeed");
    assert_eq!(job.posted_by, user.id);
    assert_eq!(*mock.created_job_owner.lock().unwrap(), Some(user.id));
}

#[tokio::test]
async fn test_update_job_denied_for_non_owner_regular_user() {
    let mock = Arc::new(MockRepoControl {
        job_to_return: Some(Job {
            posted_by: Uuid::new_v4(),
            ..Job::default()
        }),
        ..MockRepoControl::default()
    });
    let state = state_with(mock);

    let result = handlers::update_job(
        regular(),
        State(state),
        Path(Uuid::new_v4()),
        Json(UpdateJobRequest::default()),
    )
    .await;

    match result {
        Err(ApiError::Forbidden(reason)) => assert_eq!(reason, "You can only edit your own jobs."),
        other => panic!("expected Forbidden, got {:?}", other.map(|j| j.0)),
    }
}

#[tokio::test]
async fn test_update_job_allowed_for_owner_regardless_of_role() {
    let user = regular();
    let mock = Arc::new(MockRepoControl {
        job_to_return: Some(Job {
            posted_by: user.id,
            ..Job::default()
        }),
        ..MockRepoControl::default()
    });
    let state = state_with(mock);

    let result = handlers::update_job(
        user,
        State(state),
        Path(Uuid::new_v4()),
        Json(UpdateJobRequest::default()),
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_update_job_allowed_for_admin_who_is_not_owner() {
    let mock = Arc::new(MockRepoControl {
        job_to_return: Some(Job {
            posted_by: Uuid::new_v4(),
            ..Job::default()
        }),
        ..MockRepoControl::default()
    });
    let state = state_with(mock);

    let result = handlers::update_job(
        admin(),
        State(state),
        Path(Uuid::new_v4()),
        Json(UpdateJobRequest::default()),
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_update_job_missing_row_is_not_found() {
    let mock = Arc::new(MockRepoControl::default());
    let state = state_with(mock);

    let result = handlers::update_job(
        admin(),
        State(state),
        Path(Uuid::new_v4()),
        Json(UpdateJobRequest::default()),
    )
    .await;

    assert!(matches!(result, Err(ApiError::NotFound)));
}

#[tokio::test]
async fn test_delete_job_allowed_for_owner() {
    let user = regular();
    let mock = Arc::new(MockRepoControl {
        job_to_return: Some(Job {
            posted_by: user.id,
            ..Job::default()
        }),
        delete_result: true,
        ..MockRepoControl::default()
    });
    let state = state_with(mock);

    let result = handlers::delete_job(user, State(state), Path(Uuid::new_v4())).await;

    assert_eq!(result.unwrap(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_job_denied_for_non_owner_regular_user() {
    let mock = Arc::new(MockRepoControl {
        job_to_return: Some(Job {
            posted_by: Uuid::new_v4(),
            ..Job::default()
        }),
        delete_result: true,
        ..MockRepoControl::default()
    });
    let state = state_with(mock);

    let result = handlers::delete_job(regular(), State(state), Path(Uuid::new_v4())).await;

    match result {
        Err(ApiError::Forbidden(reason)) => {
            assert_eq!(reason, "You can only delete your own jobs.")
        }
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

// --- Category Handler Tests ---

#[tokio::test]
async fn test_create_category_denied_for_regular_user() {
    let state = state_with(Arc::new(MockRepoControl::default()));

    let result = handlers::create_category(
        regular(),
        State(state),
        Json(CategoryRequest {
            name: "Engineering".to_string(),
        }),
    )
    .await;

    match result {
        Err(ApiError::Forbidden(reason)) => {
            assert_eq!(reason, "You do not have permission to perform this action.")
        }
        other => panic!("expected Forbidden, got {:?}", other.map(|j| j.0)),
    }
}

#[tokio::test]
async fn test_create_category_allowed_for_admin() {
    let state = state_with(Arc::new(MockRepoControl::default()));

    let result = handlers::create_category(
        admin(),
        State(state),
        Json(CategoryRequest {
            name: "Engineering".to_string(),
        }),
    )
    .await;

    let Json(category) = result.expect("admin create should succeed");
    assert_eq!(category.name, "Engineering");
}

#[tokio::test]
async fn test_delete_category_denied_for_regular_user() {
    let state = state_with(Arc::new(MockRepoControl {
        delete_result: true,
        ..MockRepoControl::default()
    }));

    let result = handlers::delete_category(regular(), State(state), Path(Uuid::new_v4())).await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));
}

// --- Application Handler Tests ---

#[tokio::test]
async fn test_list_applications_scoped_to_regular_user() {
    let mock = Arc::new(MockRepoControl::default());
    let state = state_with(mock.clone());
    let user = regular();

    let _ = handlers::list_applications(user.clone(), State(state)).await;

    assert_eq!(
        *mock.list_applications_scope.lock().unwrap(),
        Some(ApplicationScope::Applicant(user.id))
    );
}

#[tokio::test]
async fn test_list_applications_unrestricted_for_admin() {
    let mock = Arc::new(MockRepoControl::default());
    let state = state_with(mock.clone());

    let _ = handlers::list_applications(admin(), State(state)).await;

    assert_eq!(
        *mock.list_applications_scope.lock().unwrap(),
        Some(ApplicationScope::All)
    );
}

#[tokio::test]
async fn test_create_application_forces_applicant_to_principal() {
    let mock = Arc::new(MockRepoControl::default());
    let state = state_with(mock.clone());
    let user = regular();

    let result = handlers::create_application(
        user.clone(),
        State(state),
        Json(application_payload(Uuid::new_v4())),
    )
    .await;

    let Json(application) = result.expect("create should succeed");
    assert_eq!(application.applicant_id, user.id);
    assert_eq!(
        *mock.created_application_applicant.lock().unwrap(),
        Some(user.id)
    );
}

#[tokio::test]
async fn test_create_application_rejects_duplicate() {
    let mock = Arc::new(MockRepoControl {
        has_applied_result: true,
        ..MockRepoControl::default()
    });
    let state = state_with(mock.clone());

    let result = handlers::create_application(
        regular(),
        State(state),
        Json(application_payload(Uuid::new_v4())),
    )
    .await;

    match result {
        Err(ApiError::Validation(reason)) => {
            assert_eq!(reason, "You have already applied for this job.")
        }
        other => panic!("expected Validation, got {:?}", other.map(|j| j.0)),
    }
    // A duplicate must never reach the insert.
    assert!(mock.created_application_applicant.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_create_application_field_validation_runs_before_duplicate_check() {
    // Even with a duplicate on record, a blank cover letter must be reported
    // first: field checks precede the uniqueness check.
    let mock = Arc::new(MockRepoControl {
        has_applied_result: true,
        ..MockRepoControl::default()
    });
    let state = state_with(mock);

    let mut payload = application_payload(Uuid::new_v4());
    payload.cover_letter = "   ".to_string();

    let result = handlers::create_application(regular(), State(state), Json(payload)).await;

    match result {
        Err(ApiError::Validation(reason)) => {
            assert_eq!(reason, "cover_letter may not be blank.")
        }
        other => panic!("expected Validation, got {:?}", other.map(|j| j.0)),
    }
}

#[tokio::test]
async fn test_update_application_passes_visibility_scope() {
    let mock = Arc::new(MockRepoControl::default());
    let state = state_with(mock.clone());
    let user = regular();

    let result = handlers::update_application(
        user.clone(),
        State(state),
        Path(Uuid::new_v4()),
        Json(UpdateApplicationRequest {
            status: ApplicationStatus::Reviewed,
        }),
    )
    .await;

    let Json(application) = result.expect("scoped update should succeed");
    assert_eq!(application.status, ApplicationStatus::Reviewed);
    assert_eq!(
        *mock.status_update_scope.lock().unwrap(),
        Some(ApplicationScope::Applicant(user.id))
    );
}

// --- Dashboard / Profile Tests ---

#[tokio::test]
async fn test_dashboard_stats_denied_for_regular_user() {
    let state = state_with(Arc::new(MockRepoControl::default()));

    let result = handlers::get_dashboard_stats(regular(), State(state)).await;

    match result {
        Err(ApiError::Forbidden(reason)) => {
            assert_eq!(reason, "Only admins can view dashboard stats.")
        }
        other => panic!("expected Forbidden, got {:?}", other.map(|j| j.0)),
    }
}

#[tokio::test]
async fn test_dashboard_stats_returned_for_admin() {
    let state = state_with(Arc::new(MockRepoControl {
        stats_to_return: DashboardStats {
            jobs: 10,
            applications: 25,
            users: 3,
            conversion_rate: 250.0,
        },
        ..MockRepoControl::default()
    }));

    let Json(stats) = handlers::get_dashboard_stats(admin(), State(state))
        .await
        .expect("admin stats should succeed");

    assert_eq!(stats.jobs, 10);
    assert_eq!(stats.conversion_rate, 250.0);
}

#[tokio::test]
async fn test_get_me_returns_stored_profile() {
    let user_id = Uuid::new_v4();
    let state = state_with(Arc::new(MockRepoControl {
        user_to_return: Some(User {
            id: user_id,
            email: "me@example.com".to_string(),
            role: Role::Regular,
        }),
        ..MockRepoControl::default()
    }));

    let Json(profile) = handlers::get_me(
        AuthUser {
            id: user_id,
            role: Role::Regular,
        },
        State(state),
    )
    .await
    .expect("profile should resolve");

    assert_eq!(profile.id, user_id);
    assert_eq!(profile.email, "me@example.com");
    assert_eq!(profile.role, Role::Regular);
}
