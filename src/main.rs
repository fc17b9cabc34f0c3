use job_board::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Embedded schema migrations, applied at startup. The initial migration
/// carries the unique constraint on applications(job_id, applicant_id) that
/// backstops the duplicate-application check.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Default category names seeded into a fresh local database.
const DEFAULT_CATEGORIES: [&str; 10] = [
    "Engineering",
    "Design",
    "Product",
    "Marketing",
    "Sales",
    "Customer Support",
    "Data Science",
    "Finance",
    "HR",
    "Operations",
];

/// The asynchronous entry point: initializes configuration, logging, the
/// database, the bootstrap hooks, and the HTTP server.
#[tokio::main]
async fn main() {
    // Configuration and environment loading (fail-fast on missing secrets).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // Log level defaults, overridable through RUST_LOG.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "job_board=debug,tower_http=info,axum=trace".into());

    // Structured logging format selected by the runtime environment:
    // pretty output for local debugging, JSON for log aggregators.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // Database initialization.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    MIGRATOR
        .run(&pool)
        .await
        .expect("FATAL: Failed to apply database migrations.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // Superuser bootstrap: upsert the configured admin account, if any.
    match config.superuser_id {
        Some(id) => {
            repo.ensure_superuser(id, &config.superuser_email)
                .await
                .expect("FATAL: Failed to bootstrap superuser.");
            tracing::info!("Superuser {} ensured with admin role", config.superuser_email);
        }
        None => {
            tracing::info!("SUPERUSER_ID not set. Skipping superuser bootstrap.");
        }
    }

    // LOCAL-ONLY: seed the default categories for the dev database.
    if config.env == Env::Local {
        match repo.seed_categories(&DEFAULT_CATEGORIES).await {
            Ok(created) => tracing::info!("Category seeding complete. Created {} new", created),
            Err(e) => tracing::error!("Category seeding failed: {:?}", e),
        }
    }

    let app_state = AppState { repo, config };

    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:8000").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:8000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:8000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
