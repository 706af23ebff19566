//! # Role-Group Membership API
//!
//! Manager-administered membership of the manager, delivery-crew, and
//! customer groups. Listing and adding are Manager-gated; removal is
//! Manager-gated too and idempotent — removing a user who is not a
//! member succeeds with no effect.
//!
//! Role changes take effect on the target user's next request, when
//! the auth middleware re-resolves their role set.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use lemon_auth::{authorize, Action, Role};
use lemon_core::Username;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, UserRecord};

/// Request naming the user to add to a group.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GroupAddRequest {
    pub username: Username,
}

impl Validate for GroupAddRequest {
    fn validate(&self) -> Result<(), String> {
        // Username format is enforced by its deserializer.
        Ok(())
    }
}

/// Build the role-group router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/groups/manager/users",
            get(list_managers).post(add_manager),
        )
        .route("/api/groups/manager/users/:username", delete(remove_manager))
        .route(
            "/api/groups/delivery-crew/users",
            get(list_delivery_crew).post(add_delivery_crew),
        )
        .route(
            "/api/groups/delivery-crew/users/:username",
            delete(remove_delivery_crew),
        )
        .route(
            "/api/groups/customer/users",
            get(list_customers).post(add_customer),
        )
        .route(
            "/api/groups/customer/users/:username",
            delete(remove_customer),
        )
}

/// GET /api/groups/manager/users — List managers.
#[utoipa::path(
    get,
    path = "/api/groups/manager/users",
    responses(
        (status = 200, description = "Group members", body = [UserRecord]),
        (status = 401, description = "Caller is not a manager", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn list_managers(
    state: State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    list_members(state, caller, Role::Manager)
}

/// POST /api/groups/manager/users — Add a manager.
#[utoipa::path(
    post,
    path = "/api/groups/manager/users",
    request_body = GroupAddRequest,
    responses(
        (status = 201, description = "Member added", body = UserRecord),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn add_manager(
    state: State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GroupAddRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    add_member(state, caller, Role::Manager, body).await
}

/// DELETE /api/groups/manager/users/:username — Remove a manager.
#[utoipa::path(
    delete,
    path = "/api/groups/manager/users/{username}",
    params(("username" = String, Path, description = "Username to remove")),
    responses(
        (status = 200, description = "Member removed (idempotent)"),
        (status = 403, description = "Caller is not a manager", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn remove_manager(
    state: State<AppState>,
    caller: CallerIdentity,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    remove_member(state, caller, Role::Manager, username).await
}

/// GET /api/groups/delivery-crew/users — List delivery crew.
#[utoipa::path(
    get,
    path = "/api/groups/delivery-crew/users",
    responses(
        (status = 200, description = "Group members", body = [UserRecord]),
        (status = 401, description = "Caller is not a manager", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn list_delivery_crew(
    state: State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    list_members(state, caller, Role::DeliveryCrew)
}

/// POST /api/groups/delivery-crew/users — Add a delivery-crew member.
#[utoipa::path(
    post,
    path = "/api/groups/delivery-crew/users",
    request_body = GroupAddRequest,
    responses(
        (status = 201, description = "Member added", body = UserRecord),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn add_delivery_crew(
    state: State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GroupAddRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    add_member(state, caller, Role::DeliveryCrew, body).await
}

/// DELETE /api/groups/delivery-crew/users/:username — Remove a
/// delivery-crew member.
#[utoipa::path(
    delete,
    path = "/api/groups/delivery-crew/users/{username}",
    params(("username" = String, Path, description = "Username to remove")),
    responses(
        (status = 200, description = "Member removed (idempotent)"),
        (status = 401, description = "Caller is not a manager", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn remove_delivery_crew(
    state: State<AppState>,
    caller: CallerIdentity,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    remove_member(state, caller, Role::DeliveryCrew, username).await
}

/// GET /api/groups/customer/users — List customers.
#[utoipa::path(
    get,
    path = "/api/groups/customer/users",
    responses(
        (status = 200, description = "Group members", body = [UserRecord]),
        (status = 401, description = "Caller is not a manager", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn list_customers(
    state: State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    list_members(state, caller, Role::Customer)
}

/// POST /api/groups/customer/users — Add a customer.
#[utoipa::path(
    post,
    path = "/api/groups/customer/users",
    request_body = GroupAddRequest,
    responses(
        (status = 201, description = "Member added", body = UserRecord),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn add_customer(
    state: State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GroupAddRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    add_member(state, caller, Role::Customer, body).await
}

/// DELETE /api/groups/customer/users/:username — Remove a customer.
#[utoipa::path(
    delete,
    path = "/api/groups/customer/users/{username}",
    params(("username" = String, Path, description = "Username to remove")),
    responses(
        (status = 200, description = "Member removed (idempotent)"),
        (status = 401, description = "Caller is not a manager", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "groups"
)]
pub(crate) async fn remove_customer(
    state: State<AppState>,
    caller: CallerIdentity,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    remove_member(state, caller, Role::Customer, username).await
}

// ---------------------------------------------------------------------------
// Shared implementations
// ---------------------------------------------------------------------------

fn list_members(
    State(state): State<AppState>,
    caller: CallerIdentity,
    group: Role,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    authorize(&caller, &Action::GroupList(group))?;
    Ok(Json(state.users.list_with_role(group)))
}

pub(crate) async fn add_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    group: Role,
    body: Result<Json<GroupAddRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    authorize(&caller, &Action::GroupAdd(group))?;
    let req = extract_validated_json(body)?;

    let record = state
        .users
        .update_roles(&req.username, |roles| roles.insert(group))
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", req.username)))?;

    persist_user(&state, &record).await?;
    tracing::info!(username = %record.username, group = %group, by = %caller.username, "added user to role group");
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn remove_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    group: Role,
    username: String,
) -> Result<StatusCode, AppError> {
    authorize(&caller, &Action::GroupRemove(group))?;
    let username = Username::new(username)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    // Idempotent: removing an absent membership is a successful no-op,
    // but the user itself must exist.
    let record = state
        .users
        .update_roles(&username, |roles| roles.remove(group))
        .ok_or_else(|| AppError::NotFound(format!("user {username} not found")))?;

    persist_user(&state, &record).await?;
    tracing::info!(username = %record.username, group = %group, by = %caller.username, "removed user from role group");
    Ok(StatusCode::OK)
}

pub(crate) async fn persist_user(state: &AppState, record: &UserRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::upsert(pool, record).await {
            tracing::error!(username = %record.username, error = %e, "failed to persist role change");
            return Err(AppError::Internal(
                "role change applied in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
