//! # Cart API
//!
//! The customer's cart ledger. Every route is Customer-only; the cart
//! in scope is always the caller's own — there is no way to address
//! another customer's cart.
//!
//! Adding a line snapshots the menu price at that moment; a second add
//! for the same item is rejected with `DUPLICATE_ITEM`, leaving the
//! original line untouched. Clearing is idempotent.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use lemon_auth::{authorize, Action};
use lemon_core::MenuItemId;
use lemon_orders::CartLine;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request to add one menu item to the caller's cart.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CartAddRequest {
    pub menu_item_id: MenuItemId,
    pub quantity: i32,
}

impl Validate for CartAddRequest {
    fn validate(&self) -> Result<(), String> {
        if self.quantity < 1 {
            return Err("quantity must be a positive integer".to_string());
        }
        Ok(())
    }
}

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/cart/menu-items",
        get(list_cart).post(add_to_cart).delete(clear_cart),
    )
}

/// GET /api/cart/menu-items — List the caller's cart.
#[utoipa::path(
    get,
    path = "/api/cart/menu-items",
    responses(
        (status = 200, description = "Cart lines", body = [CartLine]),
        (status = 401, description = "Caller is not a customer", body = crate::error::ErrorBody),
    ),
    tag = "cart"
)]
pub(crate) async fn list_cart(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<CartLine>>, AppError> {
    authorize(&caller, &Action::CartView)?;
    Ok(Json(state.carts.list(&caller.user_id())))
}

/// POST /api/cart/menu-items — Add a line to the caller's cart.
#[utoipa::path(
    post,
    path = "/api/cart/menu-items",
    request_body = CartAddRequest,
    responses(
        (status = 201, description = "Line added", body = CartLine),
        (status = 400, description = "Duplicate item or invalid quantity", body = crate::error::ErrorBody),
        (status = 404, description = "Menu item not found", body = crate::error::ErrorBody),
    ),
    tag = "cart"
)]
pub(crate) async fn add_to_cart(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CartAddRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CartLine>), AppError> {
    authorize(&caller, &Action::CartAdd)?;
    let req = extract_validated_json(body)?;

    let item = state
        .menu_items
        .get(&req.menu_item_id)
        .ok_or_else(|| AppError::NotFound(format!("menu item {} not found", req.menu_item_id)))?;

    // Snapshot the current menu price into the line; later catalog
    // price changes never touch it.
    let line = CartLine::new(caller.user_id(), item.id, req.quantity, item.price)?;
    let line = state.carts.add(line)?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::cart::insert_line(pool, &line).await {
            // The store accepted the line, so a database conflict means
            // the two layers disagree; the constraint is authoritative.
            state.carts.remove_line(&caller.user_id(), &line.id);
            tracing::error!(user = %caller.username, error = %e, "failed to persist cart line");
            return Err(AppError::from(e));
        }
    }

    Ok((StatusCode::CREATED, Json(line)))
}

/// DELETE /api/cart/menu-items — Clear the caller's cart.
///
/// Idempotent: clearing an empty cart succeeds with no effect.
#[utoipa::path(
    delete,
    path = "/api/cart/menu-items",
    responses(
        (status = 200, description = "Cart cleared"),
        (status = 401, description = "Caller is not a customer", body = crate::error::ErrorBody),
    ),
    tag = "cart"
)]
pub(crate) async fn clear_cart(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<StatusCode, AppError> {
    authorize(&caller, &Action::CartClear)?;

    let taken = state.carts.take_all(&caller.user_id());
    if taken.is_empty() {
        return Ok(StatusCode::OK);
    }

    if let Some(pool) = &state.db_pool {
        let ids: Vec<_> = taken.iter().map(|l| l.id).collect();
        if let Err(e) = crate::db::cart::delete_lines(pool, &ids).await {
            // Put the lines back so the two layers stay in agreement.
            state.carts.restore(caller.user_id(), taken);
            tracing::error!(user = %caller.username, error = %e, "failed to clear cart in database");
            return Err(AppError::Internal(
                "cart cleared in-memory but database delete failed".to_string(),
            ));
        }
    }

    Ok(StatusCode::OK)
}
