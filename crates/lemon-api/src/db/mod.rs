// SPDX-License-Identifier: BUSL-1.1
//! # Database Persistence Layer
//!
//! Postgres persistence for the Lemon Stack via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, the
//! API writes users, catalog, cart lines, and orders through to
//! PostgreSQL and hydrates the in-memory stores from it at startup.
//! When absent, the API operates in in-memory-only mode (suitable for
//! development and testing).
//!
//! The one multi-statement write is order conversion
//! ([`orders::persist_conversion`]): a single transaction inserts the
//! order row and its item snapshots and deletes exactly the consumed
//! cart lines — commit-or-rollback on every exit path, so no partial
//! order/items/cart state is ever observable.

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod users;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration
/// fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    // Run embedded migrations.
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
