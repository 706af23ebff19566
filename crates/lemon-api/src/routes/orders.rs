// SPDX-License-Identifier: BUSL-1.1
//! # Orders API
//!
//! Role-filtered listing, the cart-to-order conversion, and the
//! role-gated single-order lifecycle.
//!
//! Single-order routes resolve the order first — an unknown id is 404
//! for every caller — and then apply the per-method gate, matching the
//! service's observed contract (the owner-only detail read refuses
//! even a Manager with 403).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use lemon_auth::{authorize, order_list_scope, Action, OrderScope};
use lemon_core::{OrderId, UserId};
use lemon_orders::{build_order, OrderRecord, OrderStatus};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Full replace of an order's mutable fields. Everything else on the
/// order (owner, total, items, dates) is immutable after conversion.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderReplaceRequest {
    /// Delivery-crew assignment; `null` unassigns.
    pub delivery_crew: Option<UserId>,
    /// New status. The full replace may set any value.
    pub status: OrderStatus,
}

impl Validate for OrderReplaceRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Status-only partial update. The body must touch exactly the
/// `status` field: unknown fields fail deserialization, which is how a
/// multi-field patch is rejected before any gate or mutation runs.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderStatusPatch {
    pub status: OrderStatus,
}

impl Validate for OrderStatusPatch {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(place_order))
        .route(
            "/api/orders/:id",
            get(get_order)
                .put(replace_order)
                .patch(patch_order_status)
                .delete(delete_order),
        )
}

/// GET /api/orders — List orders visible to the caller.
///
/// Manager sees all orders, DeliveryCrew the ones assigned to them,
/// everyone else their own. Items are embedded.
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders in the caller's scope", body = [OrderRecord]),
    ),
    tag = "orders"
)]
pub(crate) async fn list_orders(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    authorize(&caller, &Action::OrderList)?;

    let scope = order_list_scope(&caller);
    let mut orders: Vec<OrderRecord> = state
        .orders
        .list()
        .into_iter()
        .filter(|order| match scope {
            OrderScope::All => true,
            OrderScope::AssignedTo(crew) => order.delivery_crew == Some(crew),
            OrderScope::OwnedBy(customer) => order.user_id == customer,
        })
        .collect();
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(Json(orders))
}

/// POST /api/orders — Convert the caller's cart into an order.
///
/// The caller's cart lines are taken in one atomic step, aggregated
/// into an order with item snapshots, persisted in a single database
/// transaction, and only then acknowledged. On a persistence failure
/// the lines are restored — no partial order, items, or cart state is
/// ever observable.
#[utoipa::path(
    post,
    path = "/api/orders",
    responses(
        (status = 201, description = "Order placed", body = OrderRecord),
        (status = 400, description = "Empty cart", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
pub(crate) async fn place_order(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<(StatusCode, Json<OrderRecord>), AppError> {
    authorize(&caller, &Action::OrderPlace)?;

    // Take the cart in one critical section. A concurrent conversion
    // gets an empty cart; a concurrent add lands in the next order.
    let lines = state.carts.take_all(&caller.user_id());
    let order = match build_order(caller.user_id(), &lines) {
        Ok(order) => order,
        Err(e) => return Err(e.into()),
    };

    if let Some(pool) = &state.db_pool {
        let consumed: Vec<_> = lines.iter().map(|l| l.id).collect();
        if let Err(e) = crate::db::orders::persist_conversion(pool, &order, &consumed).await {
            state.carts.restore(caller.user_id(), lines);
            tracing::error!(user = %caller.username, error = %e, "order conversion transaction failed");
            return Err(AppError::Internal(
                "order conversion failed; cart is unchanged".to_string(),
            ));
        }
    }

    state.orders.insert(order.id, order.clone());
    tracing::info!(
        order_id = %order.id,
        user = %caller.username,
        total = %order.total,
        items = order.items.len(),
        "order placed"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/:id — Read one order.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = OrderId, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order found", body = OrderRecord),
        (status = 403, description = "Caller does not own the order", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
pub(crate) async fn get_order(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderRecord>, AppError> {
    let order = fetch_order(&state, &id)?;
    authorize(&caller, &Action::OrderRead { owner: order.user_id })?;
    Ok(Json(order))
}

/// PUT /api/orders/:id — Replace the order's mutable fields.
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = OrderId, Path, description = "Order ID")),
    request_body = OrderReplaceRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderRecord),
        (status = 403, description = "Caller is not a manager", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
pub(crate) async fn replace_order(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<OrderId>,
    body: Result<Json<OrderReplaceRequest>, JsonRejection>,
) -> Result<Json<OrderRecord>, AppError> {
    let mut order = fetch_order(&state, &id)?;
    authorize(&caller, &Action::OrderReplace)?;
    let req = extract_validated_json(body)?;

    if let Some(crew_id) = &req.delivery_crew {
        if state.users.get(crew_id).is_none() {
            return Err(AppError::InvalidInput(format!(
                "unknown delivery crew user {crew_id}"
            )));
        }
    }

    // The full replace sets status directly; the single-field
    // transition gate applies only to the PATCH path.
    order.delivery_crew = req.delivery_crew;
    order.status = req.status;

    state.orders.insert(order.id, order.clone());
    persist_order_update(&state, &order).await?;
    Ok(Json(order))
}

/// PATCH /api/orders/:id — Status-only update.
#[utoipa::path(
    patch,
    path = "/api/orders/{id}",
    params(("id" = OrderId, Path, description = "Order ID")),
    request_body = OrderStatusPatch,
    responses(
        (status = 200, description = "Status updated", body = OrderRecord),
        (status = 400, description = "Multi-field body or illegal transition", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not manager or delivery crew", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
pub(crate) async fn patch_order_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<OrderId>,
    body: Result<Json<OrderStatusPatch>, JsonRejection>,
) -> Result<Json<OrderRecord>, AppError> {
    let mut order = fetch_order(&state, &id)?;
    authorize(&caller, &Action::OrderStatusUpdate)?;
    let req = extract_validated_json(body)?;

    order.status = order.status.patch_transition(req.status)?;

    state.orders.insert(order.id, order.clone());
    persist_order_update(&state, &order).await?;
    tracing::info!(order_id = %order.id, status = %order.status, by = %caller.username, "order status updated");
    Ok(Json(order))
}

/// DELETE /api/orders/:id — Delete an order and its item snapshots.
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = OrderId, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 403, description = "Caller is not a manager", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
pub(crate) async fn delete_order(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<OrderId>,
) -> Result<StatusCode, AppError> {
    // Resolve first so unknown ids read as 404 regardless of role.
    fetch_order(&state, &id)?;
    authorize(&caller, &Action::OrderDelete)?;

    state.orders.remove(&id);
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::orders::delete(pool, &id).await {
            tracing::error!(order_id = %id, error = %e, "failed to delete order from database");
            return Err(AppError::Internal(
                "order removed in-memory but database delete failed".to_string(),
            ));
        }
    }
    Ok(StatusCode::OK)
}

fn fetch_order(state: &AppState, id: &OrderId) -> Result<OrderRecord, AppError> {
    state
        .orders
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
}

pub(crate) async fn persist_order_update(state: &AppState, order: &OrderRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::orders::update_mutable(pool, order).await {
            tracing::error!(order_id = %order.id, error = %e, "failed to persist order update");
            return Err(AppError::Internal(
                "order updated in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
