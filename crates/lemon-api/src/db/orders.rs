// SPDX-License-Identifier: BUSL-1.1
//! Order persistence, including the conversion transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use lemon_core::{CartLineId, MenuItemId, OrderId, OrderItemId, UserId};
use lemon_orders::{OrderItemRecord, OrderRecord, OrderStatus};

/// Persist a cart-to-order conversion as a single transaction.
///
/// Inserts the order row and every item snapshot and deletes exactly
/// the consumed cart lines. Any failure rolls the whole scope back —
/// an order without its items, or a cart cleared without its order,
/// is never observable.
pub async fn persist_conversion(
    pool: &PgPool,
    order: &OrderRecord,
    consumed: &[CartLineId],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    insert_order_row(&mut tx, order).await?;
    for item in &order.items {
        insert_item_row(&mut tx, item).await?;
    }

    let ids: Vec<Uuid> = consumed.iter().map(|id| *id.as_uuid()).collect();
    sqlx::query("DELETE FROM cart_lines WHERE id = ANY($1)")
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

async fn insert_order_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &OrderRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, user_id, delivery_crew_id, status, total, placed_on, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(order.id.as_uuid())
    .bind(order.user_id.as_uuid())
    .bind(order.delivery_crew.as_ref().map(|id| *id.as_uuid()))
    .bind(order.status.as_i16())
    .bind(order.total)
    .bind(order.placed_on)
    .bind(order.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_item_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item: &OrderItemRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_items (id, order_id, menu_item_id, quantity, unit_price, line_price)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(item.id.as_uuid())
    .bind(item.order_id.as_uuid())
    .bind(item.menu_item_id.as_uuid())
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.line_price)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Update an order's mutable fields (delivery crew and status).
pub async fn update_mutable(pool: &PgPool, order: &OrderRecord) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET delivery_crew_id = $2, status = $3 WHERE id = $1")
        .bind(order.id.as_uuid())
        .bind(order.delivery_crew.as_ref().map(|id| *id.as_uuid()))
        .bind(order.status.as_i16())
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete an order; item snapshots go with it via ON DELETE CASCADE.
pub async fn delete(pool: &PgPool, id: &OrderId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(())
}

/// Load all orders with their item snapshots for hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<OrderRecord>, sqlx::Error> {
    let order_rows = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, delivery_crew_id, status, total, placed_on, created_at
         FROM orders ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(order_rows.len());
    for row in order_rows {
        let items = load_items_for_order(pool, row.id).await?;
        records.push(OrderRecord {
            id: OrderId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            delivery_crew: row.delivery_crew_id.map(UserId::from_uuid),
            status: parse_status(row.status, row.id),
            total: row.total,
            placed_on: row.placed_on,
            created_at: row.created_at,
            items,
        });
    }
    Ok(records)
}

/// Load the item snapshots for one order.
async fn load_items_for_order(
    pool: &PgPool,
    order_id: Uuid,
) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, menu_item_id, quantity, unit_price, line_price
         FROM order_items WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| OrderItemRecord {
            id: OrderItemId::from_uuid(r.id),
            order_id: OrderId::from_uuid(r.order_id),
            menu_item_id: MenuItemId::from_uuid(r.menu_item_id),
            quantity: r.quantity,
            unit_price: r.unit_price,
            line_price: r.line_price,
        })
        .collect())
}

fn parse_status(value: i16, order_id: Uuid) -> OrderStatus {
    match OrderStatus::from_i16(value) {
        Some(status) => status,
        None => {
            tracing::warn!(value, order_id = %order_id, "unrecognized order status in database, defaulting to Pending");
            OrderStatus::Pending
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    delivery_crew_id: Option<Uuid>,
    status: i16,
    total: Decimal,
    placed_on: NaiveDate,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    menu_item_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    line_price: Decimal,
}
