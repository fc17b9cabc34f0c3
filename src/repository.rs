use crate::access::ApplicationScope;
use crate::error::ApiError;
use crate::models::{
    Application, ApplicationStatus, Category, CategoryRequest, CreateApplicationRequest,
    CreateJobRequest, DashboardStats, Job, JobQuery, UpdateJobRequest, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations, allowing handlers to
/// interact with the data layer without knowing the concrete implementation
/// (Postgres in production, a mock in tests).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) shareable across axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Jobs ---
    // Public listing with filtering, search and ordering. No visibility
    // restriction: job reads are open to everyone.
    async fn list_jobs(&self, query: JobQuery) -> Vec<Job>;
    async fn get_job(&self, id: Uuid) -> Option<Job>;
    // `posted_by` is supplied by the caller from the authenticated session,
    // never from the payload.
    async fn create_job(&self, req: CreateJobRequest, posted_by: Uuid) -> Result<Job, ApiError>;
    // Partial update via COALESCE; ownership is checked by the caller before
    // this runs, and `posted_by` is never touched.
    async fn update_job(&self, id: Uuid, req: UpdateJobRequest) -> Result<Option<Job>, ApiError>;
    async fn delete_job(&self, id: Uuid) -> bool;

    // --- Categories ---
    async fn list_categories(&self) -> Vec<Category>;
    async fn get_category(&self, id: Uuid) -> Option<Category>;
    async fn create_category(&self, req: CategoryRequest) -> Result<Category, ApiError>;
    async fn update_category(
        &self,
        id: Uuid,
        req: CategoryRequest,
    ) -> Result<Option<Category>, ApiError>;
    async fn delete_category(&self, id: Uuid) -> bool;

    // --- Applications ---
    // All application access is scoped: the ApplicationScope narrows every
    // query to the rows the principal may see, so a row that is not visible
    // is also not reachable for update or delete.
    async fn list_applications(&self, scope: ApplicationScope) -> Vec<Application>;
    async fn get_application(&self, id: Uuid, scope: ApplicationScope) -> Option<Application>;
    // Pre-insert duplicate check for the (job, applicant) pair.
    async fn has_applied(&self, job_id: Uuid, applicant_id: Uuid) -> Result<bool, ApiError>;
    // `applicant_id` is supplied by the caller from the authenticated session.
    // The unique constraint on (job_id, applicant_id) backstops the pre-check
    // under concurrent double-submission.
    async fn create_application(
        &self,
        req: CreateApplicationRequest,
        applicant_id: Uuid,
    ) -> Result<Application, ApiError>;
    async fn set_application_status(
        &self,
        id: Uuid,
        scope: ApplicationScope,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, ApiError>;
    async fn delete_application(&self, id: Uuid, scope: ApplicationScope) -> bool;

    // --- Users / Bootstrap ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn create_user(&self, user: User) -> Result<User, ApiError>;
    // Startup hook: upsert the configured superuser with the admin role.
    async fn ensure_superuser(&self, id: Uuid, email: &str) -> Result<(), ApiError>;
    // Startup hook: idempotently insert the default category names, returning
    // how many were newly created.
    async fn seed_categories(&self, names: &[&str]) -> Result<u64, ApiError>;

    // --- Dashboard ---
    async fn get_stats(&self) -> Result<DashboardStats, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by Postgres.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const JOB_COLUMNS: &str = "id, title, company, location, description, requirements, \
     salary_min, salary_max, currency, job_type, experience_level, \
     category_id, posted_by, posted_at, updated_at, is_active";

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, full_name, email, phone, \
     linkedin, portfolio, cover_letter, resume_link, status, applied_at";

/// Maps the `ordering` query parameter to a whitelisted ORDER BY clause.
/// Unknown values fall back to the default newest-first ordering, so no
/// client-provided string ever reaches the SQL text.
fn job_order_clause(ordering: Option<&str>) -> &'static str {
    match ordering {
        Some("posted_at") => "posted_at ASC",
        Some("salary_min") => "salary_min ASC",
        Some("-salary_min") => "salary_min DESC",
        _ => "posted_at DESC",
    }
}

/// True when the error is a Postgres unique-constraint violation (23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// True when the error is a Postgres foreign-key violation (23503), i.e. the
/// payload referenced a job, category, or user that does not exist.
fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- JOBS ---

    /// Implements the flexible filter/search/order listing using QueryBuilder
    /// for safe parameterization; every filter value is bound, and the ORDER
    /// BY clause comes from a whitelist.
    async fn list_jobs(&self, query: JobQuery) -> Vec<Job> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE TRUE"));

        if let Some(category) = query.category {
            builder.push(" AND category_id = ");
            builder.push_bind(category);
        }

        if let Some(job_type) = query.job_type {
            builder.push(" AND job_type = ");
            builder.push_bind(job_type.as_str());
        }

        if let Some(level) = query.experience_level {
            builder.push(" AND experience_level = ");
            builder.push_bind(level.as_str());
        }

        if let Some(location) = query.location {
            builder.push(" AND location = ");
            builder.push_bind(location);
        }

        if let Some(is_active) = query.is_active {
            builder.push(" AND is_active = ");
            builder.push_bind(is_active);
        }

        if let Some(search) = query.search {
            // Case-insensitive search across title, description, company and
            // location.
            let pattern = format!("%{}%", search);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR company ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR location ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY ");
        builder.push(job_order_clause(query.ordering.as_deref()));

        match builder.build_query_as::<Job>().fetch_all(&self.pool).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("list_jobs error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_job(&self, id: Uuid) -> Option<Job> {
        sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_job error: {:?}", e);
                None
            })
    }

    /// Inserts a new job owned by `posted_by`. A foreign-key violation means
    /// the referenced category does not exist and surfaces as NotFound.
    async fn create_job(&self, req: CreateJobRequest, posted_by: Uuid) -> Result<Job, ApiError> {
        let new_id = Uuid::new_v4();
        let currency = req.currency.unwrap_or_else(|| "USD".to_string());

        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs
                (id, title, company, location, description, requirements,
                 salary_min, salary_max, currency, job_type, experience_level,
                 category_id, posted_by, posted_at, updated_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW(), true)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(new_id)
        .bind(req.title)
        .bind(req.company)
        .bind(req.location)
        .bind(req.description)
        .bind(req.requirements)
        .bind(req.salary_min)
        .bind(req.salary_max)
        .bind(currency)
        .bind(req.job_type.as_str())
        .bind(req.experience_level.as_str())
        .bind(req.category_id)
        .bind(posted_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ApiError::NotFound
            } else {
                ApiError::from(e)
            }
        })
    }

    /// Updates a job in place. Uses COALESCE so only the provided fields are
    /// rewritten. `posted_by` and `posted_at` are never part of the SET list.
    async fn update_job(&self, id: Uuid, req: UpdateJobRequest) -> Result<Option<Job>, ApiError> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                company = COALESCE($3, company),
                location = COALESCE($4, location),
                description = COALESCE($5, description),
                requirements = COALESCE($6, requirements),
                salary_min = COALESCE($7, salary_min),
                salary_max = COALESCE($8, salary_max),
                currency = COALESCE($9, currency),
                job_type = COALESCE($10, job_type),
                experience_level = COALESCE($11, experience_level),
                category_id = COALESCE($12, category_id),
                is_active = COALESCE($13, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.company)
        .bind(req.location)
        .bind(req.description)
        .bind(req.requirements)
        .bind(req.salary_min)
        .bind(req.salary_max)
        .bind(req.currency)
        .bind(req.job_type.map(|t| t.as_str()))
        .bind(req.experience_level.map(|l| l.as_str()))
        .bind(req.category_id)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ApiError::NotFound
            } else {
                ApiError::from(e)
            }
        })
    }

    async fn delete_job(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_job error: {:?}", e);
                false
            }
        }
    }

    // --- CATEGORIES ---

    async fn list_categories(&self) -> Vec<Category> {
        match sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
        {
            Ok(categories) => categories,
            Err(e) => {
                tracing::error!("list_categories error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_category(&self, id: Uuid) -> Option<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_category error: {:?}", e);
                None
            })
    }

    /// Inserts a category. The unique constraint on `name` turns a duplicate
    /// into a client-visible validation error.
    async fn create_category(&self, req: CategoryRequest) -> Result<Category, ApiError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(req.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Validation("Category with this name already exists.".to_string())
            } else {
                ApiError::from(e)
            }
        })
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: CategoryRequest,
    ) -> Result<Option<Category>, ApiError> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(req.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Validation("Category with this name already exists.".to_string())
            } else {
                ApiError::from(e)
            }
        })
    }

    async fn delete_category(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_category error: {:?}", e);
                false
            }
        }
    }

    // --- APPLICATIONS ---

    /// Lists applications narrowed to the principal's scope. The restriction
    /// is part of the query itself, not a post-hoc filter.
    async fn list_applications(&self, scope: ApplicationScope) -> Vec<Application> {
        let result = match scope {
            ApplicationScope::All => {
                sqlx::query_as::<_, Application>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications ORDER BY applied_at DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
            ApplicationScope::Applicant(user_id) => {
                sqlx::query_as::<_, Application>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications \
                     WHERE applicant_id = $1 ORDER BY applied_at DESC"
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
        };

        match result {
            Ok(applications) => applications,
            Err(e) => {
                tracing::error!("list_applications error: {:?}", e);
                vec![]
            }
        }
    }

    /// Retrieves one application if it falls inside the principal's scope.
    /// A row outside the scope behaves exactly like a missing row.
    async fn get_application(&self, id: Uuid, scope: ApplicationScope) -> Option<Application> {
        let result = match scope {
            ApplicationScope::All => {
                sqlx::query_as::<_, Application>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
            }
            ApplicationScope::Applicant(user_id) => {
                sqlx::query_as::<_, Application>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications \
                     WHERE id = $1 AND applicant_id = $2"
                ))
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
            }
        };

        result.unwrap_or_else(|e| {
            tracing::error!("get_application error: {:?}", e);
            None
        })
    }

    async fn has_applied(&self, job_id: Uuid, applicant_id: Uuid) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE job_id = $1 AND applicant_id = $2)",
        )
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Inserts a new application for `applicant_id`. The unique constraint on
    /// (job_id, applicant_id) closes the read-then-write race left open by
    /// the pre-insert check: a concurrent double-submission loses here and
    /// surfaces the same validation error. A foreign-key violation means the
    /// job does not exist.
    async fn create_application(
        &self,
        req: CreateApplicationRequest,
        applicant_id: Uuid,
    ) -> Result<Application, ApiError> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications
                (id, job_id, applicant_id, full_name, email, phone,
                 linkedin, portfolio, cover_letter, resume_link, status, applied_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', NOW())
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(req.job_id)
        .bind(applicant_id)
        .bind(req.full_name)
        .bind(req.email)
        .bind(req.phone)
        .bind(req.linkedin)
        .bind(req.portfolio)
        .bind(req.cover_letter)
        .bind(req.resume_link)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                crate::access::duplicate_application_error()
            } else if is_foreign_key_violation(&e) {
                ApiError::NotFound
            } else {
                ApiError::from(e)
            }
        })
    }

    /// Changes the review status of an application reachable under the given
    /// scope. Like retrieval, a row outside the scope is indistinguishable
    /// from a missing one.
    async fn set_application_status(
        &self,
        id: Uuid,
        scope: ApplicationScope,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, ApiError> {
        let result = match scope {
            ApplicationScope::All => {
                sqlx::query_as::<_, Application>(&format!(
                    "UPDATE applications SET status = $2 WHERE id = $1 \
                     RETURNING {APPLICATION_COLUMNS}"
                ))
                .bind(id)
                .bind(status.as_str())
                .fetch_optional(&self.pool)
                .await
            }
            ApplicationScope::Applicant(user_id) => {
                sqlx::query_as::<_, Application>(&format!(
                    "UPDATE applications SET status = $2 \
                     WHERE id = $1 AND applicant_id = $3 \
                     RETURNING {APPLICATION_COLUMNS}"
                ))
                .bind(id)
                .bind(status.as_str())
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
            }
        };

        result.map_err(ApiError::from)
    }

    async fn delete_application(&self, id: Uuid, scope: ApplicationScope) -> bool {
        let result = match scope {
            ApplicationScope::All => {
                sqlx::query("DELETE FROM applications WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await
            }
            ApplicationScope::Applicant(user_id) => {
                sqlx::query("DELETE FROM applications WHERE id = $1 AND applicant_id = $2")
                    .bind(id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
            }
        };

        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_application error: {:?}", e);
                false
            }
        }
    }

    // --- USERS / BOOTSTRAP ---

    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, email, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or(None)
    }

    /// Creates the mirror user record after the external auth provider has
    /// accepted the signup.
    async fn create_user(&self, user: User) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, role) VALUES ($1, $2, $3) RETURNING id, email, role",
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Validation("A user with this email already exists.".to_string())
            } else {
                ApiError::from(e)
            }
        })
    }

    /// Upserts the configured superuser with the admin role. Run once at
    /// startup; safe to repeat.
    async fn ensure_superuser(&self, id: Uuid, email: &str) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO users (id, email, role) VALUES ($1, $2, 'admin') \
             ON CONFLICT (id) DO UPDATE SET role = 'admin'",
        )
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts the default category names, skipping the ones that already
    /// exist. Returns the number of newly created rows.
    async fn seed_categories(&self, names: &[&str]) -> Result<u64, ApiError> {
        let mut created = 0;
        for name in names {
            let res = sqlx::query(
                "INSERT INTO categories (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .execute(&self.pool)
            .await?;
            created += res.rows_affected();
        }
        Ok(created)
    }

    // --- DASHBOARD ---

    /// Compiles the dashboard counters in a single call. The conversion rate
    /// is applications per job as a percentage, rounded to one decimal place,
    /// guarded against an empty job table.
    async fn get_stats(&self) -> Result<DashboardStats, ApiError> {
        let jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        let applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardStats {
            jobs,
            applications,
            users,
            conversion_rate: conversion_rate(applications, jobs),
        })
    }
}

/// Applications per job as a percentage, rounded to one decimal place.
/// Returns 0 when there are no jobs.
pub fn conversion_rate(applications: i64, jobs: i64) -> f64 {
    if jobs == 0 {
        return 0.0;
    }
    let rate = applications as f64 / jobs as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}
