// SPDX-License-Identifier: BUSL-1.1
//! Cart-line persistence.
//!
//! The `cart_lines_user_item_unique` constraint backs the in-memory
//! duplicate check; a unique violation surfaced from [`insert_line`] is
//! the authoritative duplicate-item signal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use lemon_core::{CartLineId, MenuItemId, UserId};
use lemon_orders::CartLine;

/// Insert a new cart line.
pub async fn insert_line(pool: &PgPool, line: &CartLine) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO cart_lines (id, user_id, menu_item_id, quantity, unit_price, line_price, added_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(line.id.as_uuid())
    .bind(line.user_id.as_uuid())
    .bind(line.menu_item_id.as_uuid())
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.line_price)
    .bind(line.added_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a specific set of cart lines by id.
pub async fn delete_lines(pool: &PgPool, ids: &[CartLineId]) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }
    let raw: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
    sqlx::query("DELETE FROM cart_lines WHERE id = ANY($1)")
        .bind(&raw)
        .execute(pool)
        .await?;
    Ok(())
}

/// Load all cart lines for hydration, oldest first.
pub async fn load_all(pool: &PgPool) -> Result<Vec<CartLine>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        "SELECT id, user_id, menu_item_id, quantity, unit_price, line_price, added_at
         FROM cart_lines ORDER BY added_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| CartLine {
            id: CartLineId::from_uuid(r.id),
            user_id: UserId::from_uuid(r.user_id),
            menu_item_id: MenuItemId::from_uuid(r.menu_item_id),
            quantity: r.quantity,
            unit_price: r.unit_price,
            line_price: r.line_price,
            added_at: r.added_at,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: Uuid,
    user_id: Uuid,
    menu_item_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    line_price: Decimal,
    added_at: DateTime<Utc>,
}
