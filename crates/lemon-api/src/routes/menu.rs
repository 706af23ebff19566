//! # Menu API
//!
//! Catalog endpoints. Reads are open to every authenticated principal;
//! writes pass the menu-write exclusion rule (principals holding
//! Customer or DeliveryCrew are refused, so writes are Manager-only by
//! exclusion).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use lemon_auth::{authorize, Action};
use lemon_core::{validate_price, CategoryId, MenuItemId};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, CategoryRecord, MenuItemRecord};

const MAX_TITLE_LEN: usize = 255;

/// Request to create or fully replace a menu item.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuItemRequest {
    pub title: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[serde(default)]
    pub featured: bool,
    pub category_id: CategoryId,
}

impl Validate for MenuItemRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.title.len() > MAX_TITLE_LEN {
            return Err(format!("title must not exceed {MAX_TITLE_LEN} characters"));
        }
        validate_price(self.price).map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Request to partially update a menu item. Absent fields keep their
/// current value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuItemPatch {
    pub title: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub featured: Option<bool>,
    pub category_id: Option<CategoryId>,
}

impl Validate for MenuItemPatch {
    fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("title must not be empty".to_string());
            }
            if title.len() > MAX_TITLE_LEN {
                return Err(format!("title must not exceed {MAX_TITLE_LEN} characters"));
            }
        }
        if let Some(price) = self.price {
            validate_price(price).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Request to create a category.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub slug: String,
    pub title: String,
}

impl Validate for CategoryRequest {
    fn validate(&self) -> Result<(), String> {
        if self.slug.is_empty() || self.slug.len() > 200 {
            return Err("slug must be 1-200 characters".to_string());
        }
        if !self
            .slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err("slug must contain only lowercase letters, digits, and dashes".to_string());
        }
        if self.title.trim().is_empty() || self.title.len() > MAX_TITLE_LEN {
            return Err(format!("title must be 1-{MAX_TITLE_LEN} characters"));
        }
        Ok(())
    }
}

/// Build the menu router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/menu-items", get(list_menu_items).post(create_menu_item))
        .route(
            "/api/menu-items/:id",
            get(get_menu_item)
                .put(update_menu_item)
                .patch(patch_menu_item)
                .delete(delete_menu_item),
        )
        .route("/api/categories", get(list_categories).post(create_category))
}

/// GET /api/menu-items — List the menu.
#[utoipa::path(
    get,
    path = "/api/menu-items",
    responses(
        (status = 200, description = "Menu items", body = [MenuItemRecord]),
    ),
    tag = "menu"
)]
pub(crate) async fn list_menu_items(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<MenuItemRecord>>, AppError> {
    authorize(&caller, &Action::MenuRead)?;
    let mut items = state.menu_items.list();
    items.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    Ok(Json(items))
}

/// POST /api/menu-items — Create a menu item.
#[utoipa::path(
    post,
    path = "/api/menu-items",
    request_body = MenuItemRequest,
    responses(
        (status = 201, description = "Item created", body = MenuItemRecord),
        (status = 401, description = "Caller holds an unprivileged role", body = crate::error::ErrorBody),
    ),
    tag = "menu"
)]
pub(crate) async fn create_menu_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<MenuItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MenuItemRecord>), AppError> {
    authorize(&caller, &Action::MenuWrite)?;
    let req = extract_validated_json(body)?;

    if state.categories.get(&req.category_id).is_none() {
        return Err(AppError::InvalidInput(format!(
            "unknown category {}",
            req.category_id
        )));
    }

    let record = MenuItemRecord {
        id: MenuItemId::new(),
        title: req.title,
        price: req.price,
        featured: req.featured,
        category_id: req.category_id,
    };
    state.menu_items.insert(record.id, record.clone());

    // Write-through. Failure is surfaced to the client because the
    // in-memory record would be lost on restart.
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::catalog::upsert_menu_item(pool, &record).await {
            tracing::error!(item_id = %record.id, error = %e, "failed to persist menu item");
            return Err(AppError::Internal(
                "menu item recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/menu-items/:id — Read one menu item.
#[utoipa::path(
    get,
    path = "/api/menu-items/{id}",
    params(("id" = MenuItemId, Path, description = "Menu item ID")),
    responses(
        (status = 200, description = "Item found", body = MenuItemRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "menu"
)]
pub(crate) async fn get_menu_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<MenuItemId>,
) -> Result<Json<MenuItemRecord>, AppError> {
    authorize(&caller, &Action::MenuRead)?;
    let item = state
        .menu_items
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("menu item {id} not found")))?;
    Ok(Json(item))
}

/// PUT /api/menu-items/:id — Replace a menu item.
#[utoipa::path(
    put,
    path = "/api/menu-items/{id}",
    params(("id" = MenuItemId, Path, description = "Menu item ID")),
    request_body = MenuItemRequest,
    responses(
        (status = 200, description = "Item replaced", body = MenuItemRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "menu"
)]
pub(crate) async fn update_menu_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<MenuItemId>,
    body: Result<Json<MenuItemRequest>, JsonRejection>,
) -> Result<Json<MenuItemRecord>, AppError> {
    authorize(&caller, &Action::MenuWrite)?;
    if state.menu_items.get(&id).is_none() {
        return Err(AppError::NotFound(format!("menu item {id} not found")));
    }
    let req = extract_validated_json(body)?;

    if state.categories.get(&req.category_id).is_none() {
        return Err(AppError::InvalidInput(format!(
            "unknown category {}",
            req.category_id
        )));
    }

    let record = MenuItemRecord {
        id,
        title: req.title,
        price: req.price,
        featured: req.featured,
        category_id: req.category_id,
    };
    state.menu_items.insert(id, record.clone());
    persist_menu_item(&state, &record).await?;
    Ok(Json(record))
}

/// PATCH /api/menu-items/:id — Partially update a menu item.
#[utoipa::path(
    patch,
    path = "/api/menu-items/{id}",
    params(("id" = MenuItemId, Path, description = "Menu item ID")),
    request_body = MenuItemPatch,
    responses(
        (status = 200, description = "Item updated", body = MenuItemRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "menu"
)]
pub(crate) async fn patch_menu_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<MenuItemId>,
    body: Result<Json<MenuItemPatch>, JsonRejection>,
) -> Result<Json<MenuItemRecord>, AppError> {
    authorize(&caller, &Action::MenuWrite)?;
    let mut record = state
        .menu_items
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("menu item {id} not found")))?;
    let req = extract_validated_json(body)?;

    if let Some(category_id) = req.category_id {
        if state.categories.get(&category_id).is_none() {
            return Err(AppError::InvalidInput(format!(
                "unknown category {category_id}"
            )));
        }
        record.category_id = category_id;
    }
    if let Some(title) = req.title {
        record.title = title;
    }
    if let Some(price) = req.price {
        // Existing cart lines keep their snapshot; only future adds see
        // the new price.
        record.price = price;
    }
    if let Some(featured) = req.featured {
        record.featured = featured;
    }

    state.menu_items.insert(id, record.clone());
    persist_menu_item(&state, &record).await?;
    Ok(Json(record))
}

/// DELETE /api/menu-items/:id — Delete a menu item.
///
/// Pending cart lines for the item are dropped; order-item snapshots
/// are untouched.
#[utoipa::path(
    delete,
    path = "/api/menu-items/{id}",
    params(("id" = MenuItemId, Path, description = "Menu item ID")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "menu"
)]
pub(crate) async fn delete_menu_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<MenuItemId>,
) -> Result<StatusCode, AppError> {
    authorize(&caller, &Action::MenuWrite)?;
    if state.menu_items.remove(&id).is_none() {
        return Err(AppError::NotFound(format!("menu item {id} not found")));
    }
    let dropped = state.carts.remove_item_lines(&id);
    if dropped > 0 {
        tracing::info!(item_id = %id, dropped, "dropped pending cart lines for deleted menu item");
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::catalog::delete_menu_item(pool, &id).await {
            tracing::error!(item_id = %id, error = %e, "failed to delete menu item from database");
            return Err(AppError::Internal(
                "menu item removed in-memory but database delete failed".to_string(),
            ));
        }
    }
    Ok(StatusCode::OK)
}

/// GET /api/categories — List categories.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories", body = [CategoryRecord]),
    ),
    tag = "menu"
)]
pub(crate) async fn list_categories(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<CategoryRecord>>, AppError> {
    authorize(&caller, &Action::MenuRead)?;
    let mut categories = state.categories.list();
    categories.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(Json(categories))
}

/// POST /api/categories — Create a category.
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryRecord),
        (status = 401, description = "Caller holds an unprivileged role", body = crate::error::ErrorBody),
    ),
    tag = "menu"
)]
pub(crate) async fn create_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryRecord>), AppError> {
    authorize(&caller, &Action::MenuWrite)?;
    let req = extract_validated_json(body)?;

    if state.categories.list().iter().any(|c| c.slug == req.slug) {
        return Err(AppError::InvalidInput(format!(
            "category slug {:?} already exists",
            req.slug
        )));
    }

    let record = CategoryRecord {
        id: CategoryId::new(),
        slug: req.slug,
        title: req.title,
    };
    state.categories.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::catalog::upsert_category(pool, &record).await {
            tracing::error!(category_id = %record.id, error = %e, "failed to persist category");
            return Err(AppError::Internal(
                "category recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn persist_menu_item(state: &AppState, record: &MenuItemRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::catalog::upsert_menu_item(pool, record).await {
            tracing::error!(item_id = %record.id, error = %e, "failed to persist menu item");
            return Err(AppError::Internal(
                "menu item updated in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
