// SPDX-License-Identifier: BUSL-1.1
//! User and role-membership persistence.
//!
//! A user's role set is replaced wholesale inside one transaction on
//! every role change, so the membership rows always mirror the
//! in-memory registry.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use lemon_auth::{Role, RoleSet};
use lemon_core::{UserId, Username};

use crate::state::UserRecord;

/// Save a user record and its role memberships (upsert).
pub async fn upsert(pool: &PgPool, record: &UserRecord) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, username, created_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username",
    )
    .bind(record.id.as_uuid())
    .bind(record.username.as_str())
    .bind(record.created_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(record.id.as_uuid())
        .execute(&mut *tx)
        .await?;
    for role in record.roles.iter() {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(record.id.as_uuid())
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}

/// Load all users with their role sets for hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let user_rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, created_at FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let role_rows =
        sqlx::query_as::<_, RoleRow>("SELECT user_id, role FROM user_roles").fetch_all(pool).await?;

    let mut roles_by_user: std::collections::HashMap<Uuid, RoleSet> = std::collections::HashMap::new();
    for row in role_rows {
        match Role::parse(&row.role) {
            Some(role) => roles_by_user.entry(row.user_id).or_default().insert(role),
            None => {
                tracing::warn!(value = %row.role, user_id = %row.user_id, "unrecognized role in database, skipping");
            }
        }
    }

    let mut records = Vec::with_capacity(user_rows.len());
    for row in user_rows {
        let username = Username::new(row.username).map_err(|e| {
            sqlx::Error::Protocol(format!("corrupt username for user {}: {e}", row.id))
        })?;
        records.push(UserRecord {
            id: UserId::from_uuid(row.id),
            username,
            roles: roles_by_user.remove(&row.id).unwrap_or_default(),
            created_at: row.created_at,
        });
    }
    Ok(records)
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    user_id: Uuid,
    role: String,
}
