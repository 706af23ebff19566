// SPDX-License-Identifier: BUSL-1.1
//! # Integration Tests for lemon-api
//!
//! Exercises the full router in in-memory mode: authentication
//! middleware, menu authorization, the cart ledger's duplicate and
//! snapshot rules, cart-to-order conversion, order list scoping, the
//! status state machine gates, role-group administration, health
//! probes, metrics, and OpenAPI generation.
//!
//! Principals are forwarded via `X-Forwarded-User` the way the fronting
//! gateway does it; users are provisioned on first sight, and `boss` is
//! the bootstrap manager.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use lemon_api::state::{AppConfig, AppState};
use lemon_core::Username;

/// Helper: build the test app with `boss` as bootstrap manager.
async fn test_app() -> axum::Router {
    let config = AppConfig {
        port: 8080,
        auth_token: None,
        bootstrap_manager: Some(Username::new("boss").unwrap()),
    };
    let state = AppState::with_config(config, None);
    state.apply_bootstrap_manager().await.unwrap();
    lemon_api::app(state)
}

/// Helper: build the test app with a service bearer token configured.
async fn test_app_with_token(token: &str) -> axum::Router {
    let config = AppConfig {
        port: 8080,
        auth_token: Some(lemon_api::auth::SecretString::new(token)),
        bootstrap_manager: Some(Username::new("boss").unwrap()),
    };
    let state = AppState::with_config(config, None);
    state.apply_bootstrap_manager().await.unwrap();
    lemon_api::app(state)
}

/// Helper: build a request with an optional forwarded principal and
/// JSON body.
fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-forwarded-user", user);
    }
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper: send a request through a clone of the app.
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(request(method, uri, user, body))
        .await
        .unwrap()
}

/// Helper: read a response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: read a response body as a string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: provision a user by making any authenticated request.
async fn provision(app: &axum::Router, user: &str) {
    let response = send(app, "GET", "/api/menu-items", Some(user), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Helper: add a provisioned user to a role group as `boss`.
async fn grant(app: &axum::Router, group: &str, user: &str) -> Value {
    provision(app, user).await;
    let response = send(
        app,
        "POST",
        &format!("/api/groups/{group}/users"),
        Some("boss"),
        Some(json!({ "username": user })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Helper: create a category as `boss`, returning its id.
async fn seed_category(app: &axum::Router, slug: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/categories",
        Some("boss"),
        Some(json!({ "slug": slug, "title": "Mains" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

/// Helper: create a menu item as `boss`, returning its id.
async fn seed_menu_item(app: &axum::Router, category_id: &str, title: &str, price: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/menu-items",
        Some("boss"),
        Some(json!({
            "title": title,
            "price": price,
            "featured": false,
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

/// Helper: add an item to a customer's cart.
async fn cart_add(app: &axum::Router, user: &str, item_id: &str, quantity: i32) -> axum::http::Response<Body> {
    send(
        app,
        "POST",
        "/api/cart/menu-items",
        Some(user),
        Some(json!({ "menu_item_id": item_id, "quantity": quantity })),
    )
    .await
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let app = test_app().await;
    let response = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let app = test_app().await;
    let response = send(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Authentication middleware ------------------------------------------------

#[tokio::test]
async fn test_missing_principal_is_unauthorized() {
    let app = test_app().await;
    let response = send(&app, "GET", "/api/menu-items", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_malformed_principal_is_unauthorized() {
    let app = test_app().await;
    let response = send(&app, "GET", "/api/menu-items", Some("not a name"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_service_token_is_enforced() {
    let app = test_app_with_token("swordfish").await;

    // No token at all.
    let response = send(&app, "GET", "/api/menu-items", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/menu-items")
                .header("x-forwarded-user", "alice")
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct token.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/menu-items")
                .header("x-forwarded-user", "alice")
                .header("authorization", "Bearer swordfish")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_probes_skip_auth() {
    let app = test_app_with_token("swordfish").await;
    let response = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Menu authorization -------------------------------------------------------

#[tokio::test]
async fn test_anyone_reads_menu() {
    let app = test_app().await;
    let response = send(&app, "GET", "/api/menu-items", Some("random-visitor"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_customer_cannot_create_menu_item() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    grant(&app, "customer", "alice").await;

    let response = send(
        &app,
        "POST",
        "/api/menu-items",
        Some("alice"),
        Some(json!({ "title": "Pasta", "price": "12.50", "category_id": category_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delivery_crew_cannot_modify_menu() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "delivery-crew", "bob").await;

    let response = send(
        &app,
        "DELETE",
        &format!("/api/menu-items/{item_id}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_manager_creates_updates_and_deletes_menu_item() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;

    // Full replace.
    let response = send(
        &app,
        "PUT",
        &format!("/api/menu-items/{item_id}"),
        Some("boss"),
        Some(json!({ "title": "Pasta al forno", "price": "14.00", "featured": true, "category_id": category_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Pasta al forno");
    assert_eq!(body["featured"], true);

    // Partial update.
    let response = send(
        &app,
        "PATCH",
        &format!("/api/menu-items/{item_id}"),
        Some("boss"),
        Some(json!({ "price": "15.25" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["price"], "15.25");

    // Delete.
    let response = send(
        &app,
        "DELETE",
        &format!("/api/menu-items/{item_id}"),
        Some("boss"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        &format!("/api/menu-items/{item_id}"),
        Some("boss"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_roleless_principal_writes_menu_by_exclusion() {
    // Manager-only *by exclusion*: a principal with no roles passes the
    // menu-write gate.
    let app = test_app().await;
    let response = send(
        &app,
        "POST",
        "/api/categories",
        Some("ops"),
        Some(json!({ "slug": "drinks", "title": "Drinks" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_menu_item_validation() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;

    // Non-positive price.
    let response = send(
        &app,
        "POST",
        "/api/menu-items",
        Some("boss"),
        Some(json!({ "title": "Free lunch", "price": "0", "category_id": category_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown category.
    let response = send(
        &app,
        "POST",
        "/api/menu-items",
        Some("boss"),
        Some(json!({ "title": "Pasta", "price": "12.50", "category_id": "00000000-0000-0000-0000-000000000000" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
}

// -- Cart ledger --------------------------------------------------------------

#[tokio::test]
async fn test_cart_requires_customer_role() {
    let app = test_app().await;
    provision(&app, "walkin").await;

    let response = send(&app, "GET", "/api/cart/menu-items", Some("walkin"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Managers are not customers either.
    let response = send(&app, "GET", "/api/cart/menu-items", Some("boss"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_add_snapshots_price() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;

    let response = cart_add(&app, "alice", &item_id, 2).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let line = body_json(response).await;
    assert_eq!(line["unit_price"], "12.50");
    assert_eq!(line["line_price"], "25.00");
    assert_eq!(line["quantity"], 2);

    // A later price change does not touch the existing line.
    let response = send(
        &app,
        "PATCH",
        &format!("/api/menu-items/{item_id}"),
        Some("boss"),
        Some(json!({ "price": "99.00" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/cart/menu-items", Some("alice"), None).await;
    let lines = body_json(response).await;
    assert_eq!(lines[0]["unit_price"], "12.50");
    assert_eq!(lines[0]["line_price"], "25.00");
}

#[tokio::test]
async fn test_duplicate_cart_add_is_rejected_and_original_kept() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;

    assert_eq!(cart_add(&app, "alice", &item_id, 2).await.status(), StatusCode::CREATED);

    let response = cart_add(&app, "alice", &item_id, 5).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "DUPLICATE_ITEM");

    // Exactly one line, with the original quantity and price.
    let response = send(&app, "GET", "/api/cart/menu-items", Some("alice"), None).await;
    let lines = body_json(response).await;
    assert_eq!(lines.as_array().unwrap().len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(lines[0]["line_price"], "25.00");
}

#[tokio::test]
async fn test_cart_add_validates_quantity_and_item() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;

    let response = cart_add(&app, "alice", &item_id, 0).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");

    let response = cart_add(&app, "alice", "00000000-0000-0000-0000-000000000000", 1).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_clear_is_idempotent() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;
    cart_add(&app, "alice", &item_id, 1).await;

    let response = send(&app, "DELETE", "/api/cart/menu-items", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Clearing an empty cart succeeds with no effect.
    let response = send(&app, "DELETE", "/api/cart/menu-items", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/cart/menu-items", Some("alice"), None).await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_carts_are_isolated_per_customer() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;
    grant(&app, "customer", "carol").await;

    cart_add(&app, "alice", &item_id, 1).await;

    let response = send(&app, "GET", "/api/cart/menu-items", Some("carol"), None).await;
    assert_eq!(body_json(response).await, json!([]));

    // Same item in a different cart is not a duplicate.
    assert_eq!(cart_add(&app, "carol", &item_id, 3).await.status(), StatusCode::CREATED);
}

// -- Order conversion ---------------------------------------------------------

#[tokio::test]
async fn test_place_order_converts_cart() {
    // Alice adds 12.50 × 2 and 5.00 × 1, places the order, and her cart
    // is empty afterwards.
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let pasta = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    let soda = seed_menu_item(&app, &category_id, "Soda", "5.00").await;
    grant(&app, "customer", "alice").await;

    cart_add(&app, "alice", &pasta, 2).await;
    cart_add(&app, "alice", &soda, 1).await;

    let response = send(&app, "POST", "/api/orders", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["total"], "30.00");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["delivery_crew"], Value::Null);

    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let pasta_item = items.iter().find(|i| i["menu_item_id"] == pasta.as_str()).unwrap();
    assert_eq!(pasta_item["quantity"], 2);
    assert_eq!(pasta_item["unit_price"], "12.50");
    assert_eq!(pasta_item["line_price"], "25.00");
    let soda_item = items.iter().find(|i| i["menu_item_id"] == soda.as_str()).unwrap();
    assert_eq!(soda_item["line_price"], "5.00");

    // Cart is now empty.
    let response = send(&app, "GET", "/api/cart/menu-items", Some("alice"), None).await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_place_order_with_empty_cart_fails() {
    let app = test_app().await;
    grant(&app, "customer", "alice").await;

    let response = send(&app, "POST", "/api/orders", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "EMPTY_CART");

    // No order was created.
    let response = send(&app, "GET", "/api/orders", Some("alice"), None).await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_second_conversion_needs_a_new_cart() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;
    cart_add(&app, "alice", &item_id, 1).await;

    assert_eq!(
        send(&app, "POST", "/api/orders", Some("alice"), None).await.status(),
        StatusCode::CREATED
    );
    // The cart was consumed by the first conversion.
    let response = send(&app, "POST", "/api/orders", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "EMPTY_CART");
}

// -- Order listing and scoping ------------------------------------------------

#[tokio::test]
async fn test_order_list_is_role_scoped() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;
    grant(&app, "customer", "carol").await;
    let bob = grant(&app, "delivery-crew", "bob").await;

    cart_add(&app, "alice", &item_id, 1).await;
    let alice_order = body_json(send(&app, "POST", "/api/orders", Some("alice"), None).await).await;
    cart_add(&app, "carol", &item_id, 2).await;
    send(&app, "POST", "/api/orders", Some("carol"), None).await;

    // Manager sees all orders.
    let response = send(&app, "GET", "/api/orders", Some("boss"), None).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    // Customers see only their own.
    let response = send(&app, "GET", "/api/orders", Some("carol"), None).await;
    let carol_orders = body_json(response).await;
    assert_eq!(carol_orders.as_array().unwrap().len(), 1);
    assert_eq!(carol_orders[0]["total"], "25.00");

    // Unassigned crew sees nothing.
    let response = send(&app, "GET", "/api/orders", Some("bob"), None).await;
    assert_eq!(body_json(response).await, json!([]));

    // Assign bob to alice's order; now he sees exactly it.
    let order_id = alice_order["id"].as_str().unwrap();
    let response = send(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}"),
        Some("boss"),
        Some(json!({ "delivery_crew": bob["id"], "status": "pending" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/orders", Some("bob"), None).await;
    let bob_orders = body_json(response).await;
    assert_eq!(bob_orders.as_array().unwrap().len(), 1);
    assert_eq!(bob_orders[0]["id"], order_id);
}

// -- Single order access ------------------------------------------------------

#[tokio::test]
async fn test_order_detail_is_owner_only() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;
    grant(&app, "customer", "carol").await;

    cart_add(&app, "alice", &item_id, 1).await;
    let order = body_json(send(&app, "POST", "/api/orders", Some("alice"), None).await).await;
    let order_id = order["id"].as_str().unwrap();

    // Owner reads it.
    let response = send(&app, "GET", &format!("/api/orders/{order_id}"), Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Another customer is forbidden.
    let response = send(&app, "GET", &format!("/api/orders/{order_id}"), Some("carol"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The detail read is owner-only — even the manager is refused.
    let response = send(&app, "GET", &format!("/api/orders/{order_id}"), Some("boss"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown order id is 404.
    let response = send(
        &app,
        "GET",
        "/api/orders/00000000-0000-0000-0000-000000000000",
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Order status state machine -----------------------------------------------

#[tokio::test]
async fn test_status_patch_rights_and_single_field_rule() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;
    grant(&app, "delivery-crew", "bob").await;

    cart_add(&app, "alice", &item_id, 1).await;
    let order = body_json(send(&app, "POST", "/api/orders", Some("alice"), None).await).await;
    let order_id = order["id"].as_str().unwrap();

    // The customer has no transition rights.
    let response = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some("alice"),
        Some(json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A multi-field body is rejected before any mutation.
    let response = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some("bob"),
        Some(json!({ "status": "delivered", "total": "999" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");

    // Status alone succeeds. Note: bob is not assigned to this order;
    // the crew's status-update right is not scoped to assignment.
    let response = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some("bob"),
        Some(json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "delivered");

    // The multi-field rejection never mutated the order.
    let response = send(&app, "GET", &format!("/api/orders/{order_id}"), Some("alice"), None).await;
    let order = body_json(response).await;
    assert_eq!(order["total"], "12.50");
    assert_eq!(order["status"], "delivered");
}

#[tokio::test]
async fn test_delivered_cannot_be_patched_back_to_pending() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;
    grant(&app, "delivery-crew", "bob").await;

    cart_add(&app, "alice", &item_id, 1).await;
    let order = body_json(send(&app, "POST", "/api/orders", Some("alice"), None).await).await;
    let order_id = order["id"].as_str().unwrap();

    let patch = |status: &str| {
        json!({ "status": status })
    };
    let response = send(&app, "PATCH", &format!("/api/orders/{order_id}"), Some("bob"), Some(patch("delivered"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Same-state write is an accepted no-op.
    let response = send(&app, "PATCH", &format!("/api/orders/{order_id}"), Some("bob"), Some(patch("delivered"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Winding back is rejected on the patch path.
    let response = send(&app, "PATCH", &format!("/api/orders/{order_id}"), Some("bob"), Some(patch("pending"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The manager's full replace may set any status.
    let response = send(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}"),
        Some("boss"),
        Some(json!({ "delivery_crew": null, "status": "pending" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "pending");
}

#[tokio::test]
async fn test_order_replace_is_manager_only() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;
    grant(&app, "delivery-crew", "bob").await;

    cart_add(&app, "alice", &item_id, 1).await;
    let order = body_json(send(&app, "POST", "/api/orders", Some("alice"), None).await).await;
    let order_id = order["id"].as_str().unwrap();

    let body = json!({ "delivery_crew": null, "status": "delivered" });
    for user in ["alice", "bob"] {
        let response = send(&app, "PUT", &format!("/api/orders/{order_id}"), Some(user), Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{user} must not replace orders");
    }

    // Unknown crew assignment is rejected.
    let response = send(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}"),
        Some("boss"),
        Some(json!({ "delivery_crew": "00000000-0000-0000-0000-000000000000", "status": "pending" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_delete_is_manager_only() {
    let app = test_app().await;
    let category_id = seed_category(&app, "mains").await;
    let item_id = seed_menu_item(&app, &category_id, "Pasta", "12.50").await;
    grant(&app, "customer", "alice").await;

    cart_add(&app, "alice", &item_id, 1).await;
    let order = body_json(send(&app, "POST", "/api/orders", Some("alice"), None).await).await;
    let order_id = order["id"].as_str().unwrap();

    let response = send(&app, "DELETE", &format!("/api/orders/{order_id}"), Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, "DELETE", &format!("/api/orders/{order_id}"), Some("boss"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/api/orders/{order_id}"), Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Role-group administration ------------------------------------------------

#[tokio::test]
async fn test_group_admin_requires_manager() {
    let app = test_app().await;
    grant(&app, "customer", "alice").await;

    let response = send(&app, "GET", "/api/groups/manager/users", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/groups/delivery-crew/users",
        Some("alice"),
        Some(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Removal denial classes differ per group (observed asymmetry).
    let response = send(&app, "DELETE", "/api/groups/manager/users/boss", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = send(&app, "DELETE", "/api/groups/delivery-crew/users/bob", Some("alice"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_group_membership_lifecycle() {
    let app = test_app().await;
    provision(&app, "bob").await;

    // Add bob to the delivery crew.
    let response = send(
        &app,
        "POST",
        "/api/groups/delivery-crew/users",
        Some("boss"),
        Some(json!({ "username": "bob" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let bob = body_json(response).await;
    assert!(bob["roles"].as_array().unwrap().contains(&json!("delivery-crew")));

    // He shows up in the listing.
    let response = send(&app, "GET", "/api/groups/delivery-crew/users", Some("boss"), None).await;
    let members = body_json(response).await;
    assert_eq!(members.as_array().unwrap().len(), 1);
    assert_eq!(members[0]["username"], "bob");

    // Remove him; the listing is empty again.
    let response = send(&app, "DELETE", "/api/groups/delivery-crew/users/bob", Some("boss"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, "GET", "/api/groups/delivery-crew/users", Some("boss"), None).await;
    assert_eq!(body_json(response).await, json!([]));

    // Removal is idempotent.
    let response = send(&app, "DELETE", "/api/groups/delivery-crew/users/bob", Some("boss"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_group_add_unknown_user_is_404() {
    let app = test_app().await;
    let response = send(
        &app,
        "POST",
        "/api/groups/customer/users",
        Some("boss"),
        Some(json!({ "username": "ghost" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_grant_takes_effect_on_next_request() {
    let app = test_app().await;
    provision(&app, "dave").await;

    // Not yet a customer.
    let response = send(&app, "GET", "/api/cart/menu-items", Some("dave"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    send(
        &app,
        "POST",
        "/api/groups/customer/users",
        Some("boss"),
        Some(json!({ "username": "dave" })),
    )
    .await;

    let response = send(&app, "GET", "/api/cart/menu-items", Some("dave"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Method routing -----------------------------------------------------------

#[tokio::test]
async fn test_unrouted_method_is_405() {
    let app = test_app().await;
    let response = send(&app, "POST", "/api/orders/00000000-0000-0000-0000-000000000000", Some("boss"), Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// -- Observability ------------------------------------------------------------

#[tokio::test]
async fn test_metrics_endpoint_reports_domain_gauges() {
    let app = test_app().await;
    provision(&app, "alice").await;

    let response = send(&app, "GET", "/metrics", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_string(response).await;
    assert!(text.contains("lemon_http_requests_total"));
    assert!(text.contains("lemon_orders_total"));
    assert!(text.contains("lemon_users_total"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app().await;
    let response = send(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert!(spec["paths"]["/api/orders"].is_object());
    assert!(spec["paths"]["/api/cart/menu-items"].is_object());
}
