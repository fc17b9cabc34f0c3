use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{Job, Role},
};

/// ApplicationScope
///
/// The collection-visibility rule for applications, applied at the SQL query
/// level so list endpoints can never leak rows post-hoc filtering would have
/// dropped. Admins see everything; a regular user sees exactly the rows they
/// submitted. The same scope addresses single rows on update and delete, so
/// reachability always equals visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationScope {
    /// No restriction (admin).
    All,
    /// Only rows where `applicant_id` matches the given user.
    Applicant(Uuid),
}

/// JobAction
///
/// The two ownership-gated job mutations, kept as a closed enum so the denial
/// message matches the operation being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Update,
    Delete,
}

/// application_scope
///
/// Query-narrowing decision: which application rows is this principal allowed
/// to see?
pub fn application_scope(user: &AuthUser) -> ApplicationScope {
    match user.role {
        Role::Admin => ApplicationScope::All,
        Role::Regular => ApplicationScope::Applicant(user.id),
    }
}

/// authorize_category_write
///
/// Category create/update/delete is admin-only; reads are public and never
/// pass through here.
pub fn authorize_category_write(user: &AuthUser) -> Result<(), ApiError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Regular => Err(ApiError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        )),
    }
}

/// authorize_job_create
///
/// Posting a job requires the admin role. (Ownership is irrelevant here: the
/// caller becomes the owner.)
pub fn authorize_job_create(user: &AuthUser) -> Result<(), ApiError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Regular => Err(ApiError::Forbidden("Only admins can post jobs.".to_string())),
    }
}

/// authorize_job_mutation
///
/// Update and delete share one rule: allowed for admins, and for the user the
/// job's `posted_by` points at, regardless of their role.
pub fn authorize_job_mutation(user: &AuthUser, job: &Job, action: JobAction) -> Result<(), ApiError> {
    if user.role == Role::Admin || job.posted_by == user.id {
        return Ok(());
    }
    let reason = match action {
        JobAction::Update => "You can only edit your own jobs.",
        JobAction::Delete => "You can only delete your own jobs.",
    };
    Err(ApiError::Forbidden(reason.to_string()))
}

/// authorize_dashboard
///
/// The aggregate statistics endpoint is admin-only.
pub fn authorize_dashboard(user: &AuthUser) -> Result<(), ApiError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Regular => Err(ApiError::Forbidden(
            "Only admins can view dashboard stats.".to_string(),
        )),
    }
}

/// duplicate_application_error
///
/// The validation rejection for a second application to the same job by the
/// same applicant. Shared by the pre-insert check and the unique-constraint
/// backstop so both paths surface the identical message.
pub fn duplicate_application_error() -> ApiError {
    ApiError::Validation("You have already applied for this job.".to_string())
}
