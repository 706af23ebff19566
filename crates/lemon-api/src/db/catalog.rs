// SPDX-License-Identifier: BUSL-1.1
//! Catalog persistence: categories and menu items.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use lemon_core::{CategoryId, MenuItemId};

use crate::state::{CategoryRecord, MenuItemRecord};

/// Save a category (upsert).
pub async fn upsert_category(pool: &PgPool, record: &CategoryRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO categories (id, slug, title)
         VALUES ($1, $2, $3)
         ON CONFLICT (id) DO UPDATE SET slug = EXCLUDED.slug, title = EXCLUDED.title",
    )
    .bind(record.id.as_uuid())
    .bind(&record.slug)
    .bind(&record.title)
    .execute(pool)
    .await?;
    Ok(())
}

/// Save a menu item (upsert).
pub async fn upsert_menu_item(pool: &PgPool, record: &MenuItemRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO menu_items (id, title, price, featured, category_id)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            price = EXCLUDED.price,
            featured = EXCLUDED.featured,
            category_id = EXCLUDED.category_id",
    )
    .bind(record.id.as_uuid())
    .bind(&record.title)
    .bind(record.price)
    .bind(record.featured)
    .bind(record.category_id.as_uuid())
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a menu item. Pending cart lines referencing it are removed by
/// the schema's ON DELETE CASCADE; order-item snapshots are untouched.
pub async fn delete_menu_item(pool: &PgPool, id: &MenuItemId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM menu_items WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(())
}

/// Load all categories for hydration.
pub async fn load_all_categories(pool: &PgPool) -> Result<Vec<CategoryRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, slug, title FROM categories ORDER BY slug")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| CategoryRecord {
            id: CategoryId::from_uuid(r.id),
            slug: r.slug,
            title: r.title,
        })
        .collect())
}

/// Load all menu items for hydration.
pub async fn load_all_menu_items(pool: &PgPool) -> Result<Vec<MenuItemRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MenuItemRow>(
        "SELECT id, title, price, featured, category_id FROM menu_items ORDER BY title",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| MenuItemRecord {
            id: MenuItemId::from_uuid(r.id),
            title: r.title,
            price: r.price,
            featured: r.featured,
            category_id: CategoryId::from_uuid(r.category_id),
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    slug: String,
    title: String,
}

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: Uuid,
    title: String,
    price: Decimal,
    featured: bool,
    category_id: Uuid,
}
