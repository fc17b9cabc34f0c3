use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enumerated Fields ---

/// Role
///
/// The RBAC field carried by every user record. A closed enum rather than a free
/// string, so role checks are exhaustive matches and a typo cannot silently
/// grant or withhold permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Regular,
}

impl Role {
    /// The canonical lowercase form stored in the `users.role` text column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Regular => "regular",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(Role::Admin),
            "regular" => Ok(Role::Regular),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// JobType
///
/// Employment type of a job posting. Stored as kebab-case text (`full-time`,
/// `part-time`, `contract`, `remote`), matching the wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Remote,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Remote => "remote",
        }
    }
}

impl TryFrom<String> for JobType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "remote" => Ok(JobType::Remote),
            other => Err(format!("unknown job type: {other}")),
        }
    }
}

/// ExperienceLevel
///
/// Seniority bracket of a job posting. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ExperienceLevel {
    #[default]
    Entry,
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
        }
    }
}

impl TryFrom<String> for ExperienceLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "entry" => Ok(ExperienceLevel::Entry),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            other => Err(format!("unknown experience level: {other}")),
        }
    }
}

/// ApplicationStatus
///
/// Review status of an application. New applications always start as `Pending`.
/// No transition rules are enforced between the variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status: {other}")),
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The user's canonical identity record in the `public.users` table, mirrored
/// from the external auth provider. This is the authorization principal: the
/// `role` field drives every admin check in the access module.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Category
///
/// A job category from the `public.categories` table. Names are unique; only
/// admins may create, rename, or delete categories.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Job
///
/// A job posting from the `public.jobs` table. `posted_by` records the owner
/// and is set server-side at creation; no write path accepts it from a client.
///
/// The JSON field names `type` and `experienceLevel` are kept for API
/// compatibility with the existing frontends.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub currency: String,

    // 'type' is a reserved keyword in Rust; the column is named job_type and
    // only the JSON key keeps the original name.
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub job_type: JobType,

    #[serde(rename = "experienceLevel")]
    #[sqlx(try_from = "String")]
    pub experience_level: ExperienceLevel,

    // FK to public.categories.id.
    pub category_id: Uuid,
    // FK to public.users.id (Owner).
    pub posted_by: Uuid,

    #[ts(type = "string")]
    pub posted_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,

    pub is_active: bool,
}

/// Application
///
/// One user's submission to one job, from the `public.applications` table.
/// At most one row may exist per `(job_id, applicant_id)` pair; the table
/// carries a unique constraint on that pair as the concurrency backstop for
/// the pre-insert duplicate check.
///
/// The contact fields are a snapshot taken at application time, so later
/// profile edits do not rewrite historical applications.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    // FK to public.users.id (Owner). Always the requesting principal.
    pub applicant_id: Uuid,

    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,

    pub cover_letter: String,
    pub resume_link: Option<String>,

    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,

    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateJobRequest
///
/// Input payload for posting a new job (POST /jobs). Deliberately has no
/// `posted_by` field: ownership is taken from the authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    /// Defaults to "USD" when omitted.
    pub currency: Option<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(rename = "experienceLevel")]
    pub experience_level: ExperienceLevel,
    pub category_id: Uuid,
}

/// UpdateJobRequest
///
/// Partial update payload for PUT /jobs/{id}. Uses `Option<T>` for all fields
/// so only the provided columns are rewritten (COALESCE in the repository).
/// `posted_by` is intentionally absent: it is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,

    #[serde(rename = "experienceLevel", skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// CategoryRequest
///
/// Input payload for creating or renaming a category (admin only).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryRequest {
    pub name: String,
}

/// CreateApplicationRequest
///
/// Input payload for applying to a job (POST /applications). Has no
/// `applicant_id` field: the applicant is always the requesting principal,
/// which rules out impersonation by construction.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateApplicationRequest {
    pub job_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,
    pub cover_letter: String,
    pub resume_link: Option<String>,
}

/// UpdateApplicationRequest
///
/// Update payload for PUT /applications/{id}. Only the review status is
/// mutable after submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateApplicationRequest {
    pub status: ApplicationStatus,
}

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /register).
/// The password is only passed through to the external auth provider and never
/// persisted or logged by this application. Note there is no `role` field:
/// every self-registered user is stored as `Role::Regular`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// JobQuery
///
/// Accepted query parameters for the public job listing endpoint (GET /jobs).
/// Filter names mirror the JSON field names (`type`, `experienceLevel`).
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct JobQuery {
    /// Exact-match filter on the job's category id.
    pub category: Option<Uuid>,
    /// Exact-match filter on the employment type.
    #[serde(rename = "type")]
    pub job_type: Option<JobType>,
    /// Exact-match filter on the seniority bracket.
    #[serde(rename = "experienceLevel")]
    pub experience_level: Option<ExperienceLevel>,
    /// Exact-match filter on the location string.
    pub location: Option<String>,
    /// Filter on the active flag.
    pub is_active: Option<bool>,
    /// Case-insensitive substring search over title, description, company
    /// and location.
    pub search: Option<String>,
    /// Sort key: `posted_at` or `salary_min`, prefixed with `-` for
    /// descending. Defaults to newest-first.
    pub ordering: Option<String>,
}

// --- Dashboard & Profile Schemas (Output) ---

/// DashboardStats
///
/// Output schema for the administrative statistics endpoint (GET /admin/stats).
/// `conversion_rate` is applications per job expressed as a percentage,
/// rounded to one decimal place, and 0 when there are no jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub jobs: i64,
    pub applications: i64,
    pub users: i64,
    // Sent as "conversionRate" in JSON for API compatibility.
    #[serde(rename = "conversionRate")]
    pub conversion_rate: f64,
}

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}
