//! # lemon-api — Axum API Service for the Lemon Stack
//!
//! Role-gated restaurant order management: menu catalog, per-customer
//! cart ledger, cart-to-order conversion, order lifecycle, and
//! role-group administration.
//!
//! ## API Surface
//!
//! | Prefix                  | Module              | Domain               |
//! |-------------------------|---------------------|----------------------|
//! | `/api/menu-items*`      | [`routes::menu`]    | Menu catalog         |
//! | `/api/categories`       | [`routes::menu`]    | Categories           |
//! | `/api/cart/menu-items`  | [`routes::cart`]    | Cart ledger          |
//! | `/api/orders*`          | [`routes::orders`]  | Orders & conversion  |
//! | `/api/groups/*`         | [`routes::groups`]  | Role-group admin     |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! Health probes (`/health/*`), `/metrics`, and `/openapi.json` are
//! mounted outside the auth middleware so they remain accessible
//! without credentials.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Check if metrics are enabled via the `LEMON_METRICS_ENABLED` env
/// var. Defaults to `true` when the variable is absent or set to
/// anything other than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("LEMON_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let metrics_on = metrics_enabled();

    // Authenticated API routes.
    //
    // Body size limit: 1 MiB. No route on this surface carries a larger
    // legitimate payload.
    let api = Router::new()
        .merge(routes::menu::router())
        .merge(routes::cart::router())
        .merge(routes::orders::router())
        .merge(routes::groups::router());

    let mut api = api
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    // Only register the metrics middleware when metrics are enabled.
    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Unauthenticated probes and documents.
    let mut unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .merge(openapi::router());

    if metrics_on {
        unauthenticated = unauthenticated
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    let unauthenticated = unauthenticated.with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// GET /metrics — Prometheus metrics scrape endpoint.
///
/// Updates domain gauges from current `AppState` on each scrape (pull
/// model), then gathers and encodes all metrics in Prometheus text
/// exposition format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    // -- Update domain gauges from AppState --

    let orders = state.orders.list();
    metrics.orders_total().reset();
    for status in [
        lemon_orders::OrderStatus::Pending,
        lemon_orders::OrderStatus::Delivered,
    ] {
        let count = orders.iter().filter(|o| o.status == status).count();
        metrics
            .orders_total()
            .with_label_values(&[&status.to_string().to_lowercase()])
            .set(count as f64);
    }

    metrics
        .menu_items_total()
        .set(state.menu_items.len() as f64);
    metrics
        .cart_lines_total()
        .set(state.carts.total_lines() as f64);
    metrics.users_total().set(state.users.len() as f64);

    // -- Gather and encode --
    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application is ready to serve
/// traffic.
///
/// Checks:
/// - In-memory stores are accessible.
/// - Database connection is healthy (when configured).
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    // Verify stores are accessible (locks acquirable).
    let _ = state.users.len();
    let _ = state.menu_items.len();
    let _ = state.carts.total_lines();
    let _ = state.orders.len();

    // Verify database connection (when configured).
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
