//! # Authentication Middleware
//!
//! Identity verification happens upstream: the fronting gateway
//! authenticates the caller and forwards the principal's username in
//! `X-Forwarded-User`. This middleware:
//!
//! 1. optionally verifies the service bearer token
//!    (`Authorization: Bearer ...` against `LEMON_AUTH_TOKEN`, compared
//!    in constant time), rejecting gateway-bypassing callers;
//! 2. resolves the forwarded username against the user registry,
//!    provisioning a record with an empty role set on first sight; and
//! 3. injects a [`CallerIdentity`] (the principal plus its resolved
//!    role set) into request extensions for handlers to extract.
//!
//! Requests without a valid principal never reach a handler.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use lemon_auth::{Principal, RoleSet};
use lemon_core::{UserId, Username};

use crate::error::AppError;
use crate::state::{AppState, UserRecord};

/// Header carrying the gateway-authenticated username.
pub const FORWARDED_USER_HEADER: &str = "x-forwarded-user";

// ---------------------------------------------------------------------------
// SecretString
// ---------------------------------------------------------------------------

/// A secret token held in zeroizing memory and compared in constant
/// time. `Debug` never prints the value.
#[derive(Clone)]
pub struct SecretString(std::sync::Arc<Zeroizing<String>>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(std::sync::Arc::new(Zeroizing::new(value.into())))
    }

    /// Constant-time equality against a candidate value.
    pub fn ct_eq(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(..)")
    }
}

// ---------------------------------------------------------------------------
// CallerIdentity
// ---------------------------------------------------------------------------

/// The authenticated caller, extracted by handlers.
#[derive(Debug, Clone)]
pub struct CallerIdentity(Principal);

impl CallerIdentity {
    /// The resolved principal.
    pub fn principal(&self) -> &Principal {
        &self.0
    }

    /// The caller's user id.
    pub fn user_id(&self) -> UserId {
        self.0.id
    }
}

impl std::ops::Deref for CallerIdentity {
    type Target = Principal;

    fn deref(&self) -> &Principal {
        &self.0
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| {
                AppError::Unauthorized("authentication required".to_string()).into_response()
            })
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Authenticate the request and attach the caller identity.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Service token gate, when configured.
    if let Some(expected) = &state.config.auth_token {
        let presented = bearer_token(&req)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
        if !expected.ct_eq(presented) {
            return Err(AppError::Unauthorized("invalid bearer token".to_string()));
        }
    }

    // Forwarded principal.
    let raw = req
        .headers()
        .get(FORWARDED_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing authenticated principal".to_string()))?;
    let username = Username::new(raw)
        .map_err(|e| AppError::Unauthorized(format!("invalid principal: {e}")))?;

    // Resolve against the registry, provisioning on first sight.
    let (record, created) = state.users.get_or_insert_with(&username, || UserRecord {
        id: UserId::new(),
        username: username.clone(),
        roles: RoleSet::empty(),
        created_at: Utc::now(),
    });
    if created {
        tracing::info!(username = %username, user_id = %record.id, "provisioned new principal");
        if let Some(pool) = &state.db_pool {
            if let Err(e) = crate::db::users::upsert(pool, &record).await {
                tracing::error!(username = %username, error = %e, "failed to persist provisioned user");
                return Err(AppError::Internal(
                    "user provisioned in-memory but database persist failed".to_string(),
                ));
            }
        }
    }

    let principal = Principal::new(record.id, record.username, record.roles);
    req.extensions_mut().insert(CallerIdentity(principal));

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
