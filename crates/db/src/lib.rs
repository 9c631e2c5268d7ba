//! PostgreSQL and Redis storage for the award search service.
//!
//! - [`models`]: `FromRow` structs matching the tables in `db/migrations`
//! - [`repositories`]: zero-sized repos taking `&PgPool`
//! - [`store`]: adapters implementing the core collaborator traits
//! - [`redis_cache`]: Redis-backed result cache

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod redis_cache;
pub mod repositories;
pub mod store;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
