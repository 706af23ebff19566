//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the service bearer-token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Service bearer token. Set via LEMON_AUTH_TOKEN env var. \
                             The authenticated principal is forwarded in X-Forwarded-User.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lemon Stack — Restaurant Order Management API",
        version = "0.3.2",
        description = "Role-gated menu, cart, and order management for the Little Lemon restaurant.\n\nProvides:\n- **Menu catalog** readable by every authenticated principal, writable under the menu-write exclusion rule\n- **Cart ledger** per customer with price snapshotting and duplicate-item rejection\n- **Order conversion** turning a cart into an immutable order in one transaction\n- **Order lifecycle** with role-differentiated transition rights (status updates, crew assignment, deletion)\n- **Role-group administration** for the manager, delivery-crew, and customer groups\n\nAuthentication happens upstream; the gateway forwards the principal in `X-Forwarded-User`. Health probes (`/health/*`) and `/metrics` are unauthenticated.",
        license(name = "BUSL-1.1"),
        contact(name = "Little Lemon", url = "https://littlelemon.example")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Menu ────────────────────────────────────────────────────────
        crate::routes::menu::list_menu_items,
        crate::routes::menu::create_menu_item,
        crate::routes::menu::get_menu_item,
        crate::routes::menu::update_menu_item,
        crate::routes::menu::patch_menu_item,
        crate::routes::menu::delete_menu_item,
        crate::routes::menu::list_categories,
        crate::routes::menu::create_category,
        // ── Cart ────────────────────────────────────────────────────────
        crate::routes::cart::list_cart,
        crate::routes::cart::add_to_cart,
        crate::routes::cart::clear_cart,
        // ── Orders ──────────────────────────────────────────────────────
        crate::routes::orders::list_orders,
        crate::routes::orders::place_order,
        crate::routes::orders::get_order,
        crate::routes::orders::replace_order,
        crate::routes::orders::patch_order_status,
        crate::routes::orders::delete_order,
        // ── Role groups ─────────────────────────────────────────────────
        crate::routes::groups::list_managers,
        crate::routes::groups::add_manager,
        crate::routes::groups::remove_manager,
        crate::routes::groups::list_delivery_crew,
        crate::routes::groups::add_delivery_crew,
        crate::routes::groups::remove_delivery_crew,
        crate::routes::groups::list_customers,
        crate::routes::groups::add_customer,
        crate::routes::groups::remove_customer,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::state::UserRecord,
        crate::state::CategoryRecord,
        crate::state::MenuItemRecord,
        crate::routes::menu::MenuItemRequest,
        crate::routes::menu::MenuItemPatch,
        crate::routes::menu::CategoryRequest,
        crate::routes::cart::CartAddRequest,
        crate::routes::orders::OrderReplaceRequest,
        crate::routes::orders::OrderStatusPatch,
        crate::routes::groups::GroupAddRequest,
        lemon_auth::Role,
        lemon_auth::RoleSet,
        lemon_auth::Principal,
        lemon_orders::CartLine,
        lemon_orders::OrderRecord,
        lemon_orders::OrderItemRecord,
        lemon_orders::OrderStatus,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "menu", description = "Menu catalog and categories"),
        (name = "cart", description = "Customer cart ledger"),
        (name = "orders", description = "Order conversion and lifecycle"),
        (name = "groups", description = "Role-group membership administration"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router (unauthenticated).
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

/// GET /openapi.json — the generated OpenAPI document.
async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates_and_contains_core_paths() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("/api/menu-items"));
        assert!(json.contains("/api/cart/menu-items"));
        assert!(json.contains("/api/orders"));
        assert!(json.contains("/api/groups/manager/users"));
    }
}
