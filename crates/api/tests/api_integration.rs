//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    api::create_app(api::create_default_state(), get_metrics_handle())
}

/// Identity headers as the gateway would forward them.
struct As {
    user_id: &'static str,
    username: &'static str,
    roles: &'static str,
}

const ALICE: As = As {
    user_id: "u-alice",
    username: "alice",
    roles: "CLIENT",
};
const BOB: As = As {
    user_id: "u-bob",
    username: "bob",
    roles: "CLIENT",
};
const ADMIN: As = As {
    user_id: "u-admin",
    username: "ops",
    roles: "ADMIN",
};

fn request(method: &str, uri: &str, identity: Option<&As>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(identity) = identity {
        builder = builder
            .header("x-user-id", identity.user_id)
            .header("x-user-name", identity.username)
            .header("x-user-roles", identity.roles)
            .header("authorization", "Bearer test-token");
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Seeds one product as the admin and returns its id.
async fn seed_product(app: &Router, name: &str, cents: i64, stock: u32) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/products",
            Some(&ADMIN),
            Some(json!({
                "name": name,
                "description": "integration fixture",
                "unit_price_cents": cents,
                "stock_quantity": stock,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn place_order(app: &Router, who: &As, product_id: &str, quantity: u32) -> (StatusCode, Value) {
    send(
        app,
        request(
            "POST",
            "/api/orders",
            Some(who),
            Some(json!({
                "items": [{ "product_id": product_id, "quantity": quantity }]
            })),
        ),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, body) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let response = app
        .oneshot(request("GET", "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = setup();
    let (status, _) = send(&app, request("GET", "/api/products", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_product_crud_requires_admin() {
    let app = setup();

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/products",
            Some(&ALICE),
            Some(json!({
                "name": "Widget",
                "unit_price_cents": 1000,
                "stock_quantity": 5,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let id = seed_product(&app, "Widget", 1000, 5).await;

    // Clients can read.
    let (status, body) = send(
        &app,
        request("GET", &format!("/api/products/{id}"), Some(&ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Widget");

    // Only admins can delete.
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/products/{id}"), Some(&ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/products/{id}"), Some(&ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_check_and_reduce_stock() {
    let app = setup();
    let id = seed_product(&app, "Widget", 1000, 10).await;

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/products/{id}/check-stock?quantity=10"),
            Some(&ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));

    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/api/products/{id}/reduce-stock?quantity=8"),
            Some(&ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The guard now rejects and reports what is left.
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/products/{id}/reduce-stock?quantity=8"),
            Some(&ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "insufficient-stock");
    assert_eq!(body["available"], 2);
}

#[tokio::test]
async fn test_order_placement_happy_path() {
    let app = setup();
    let id = seed_product(&app, "Widget", 1000, 10).await;

    let (status, body) = place_order(&app, &ALICE, &id, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "CONFIRMED");
    assert_eq!(body["total_amount_cents"], 2000);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["items"][0]["subtotal_cents"], 2000);

    // The reservation engine saw the reduction.
    let (_, product) = send(
        &app,
        request("GET", &format!("/api/products/{id}"), Some(&ALICE), None),
    )
    .await;
    assert_eq!(product["stock_quantity"], 8);
}

#[tokio::test]
async fn test_order_placement_requires_client_role() {
    let app = setup();
    let id = seed_product(&app, "Widget", 1000, 10).await;

    let (status, _) = place_order(&app, &ADMIN, &id, 1).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_order_rejections_are_mapped() {
    let app = setup();
    let id = seed_product(&app, "Widget", 1000, 1).await;

    // Insufficient stock.
    let (status, body) = place_order(&app, &ALICE, &id, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "insufficient-stock");

    // Unknown product.
    let (status, _) = place_order(&app, &ALICE, "ghost", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Empty item list.
    let (status, _) = send(
        &app,
        request("POST", "/api/orders", Some(&ALICE), Some(json!({"items": []}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_reads_are_gated() {
    let app = setup();
    let id = seed_product(&app, "Widget", 1000, 10).await;
    let (_, order) = place_order(&app, &ALICE, &id, 1).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/orders/{order_id}"), Some(&BOB), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("GET", &format!("/api/orders/{order_id}"), Some(&ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], order_id);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/orders/{order_id}/items"),
            Some(&ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_my_orders_and_admin_listings() {
    let app = setup();
    let id = seed_product(&app, "Widget", 1000, 10).await;
    place_order(&app, &ALICE, &id, 1).await;
    place_order(&app, &BOB, &id, 1).await;

    let (status, body) = send(
        &app,
        request("GET", "/api/orders/my-orders", Some(&ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Listing everything is an admin view.
    let (status, _) = send(&app, request("GET", "/api/orders", Some(&ALICE), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, request("GET", "/api/orders", Some(&ADMIN), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        request("GET", "/api/orders/status/CONFIRMED", Some(&ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        request("GET", "/api/orders/status/REFUNDED", Some(&ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_and_admin_override() {
    let app = setup();
    let id = seed_product(&app, "Widget", 1000, 10).await;
    let (_, order) = place_order(&app, &ALICE, &id, 1).await;
    let order_id = order["id"].as_str().unwrap();

    // A stranger cannot cancel.
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/orders/{order_id}"), Some(&BOB), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner can.
    let (status, _) = send(
        &app,
        request(
            "DELETE",
            &format!("/api/orders/{order_id}"),
            Some(&ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Cancelling again conflicts with the current status.
    let (status, _) = send(
        &app,
        request(
            "DELETE",
            &format!("/api/orders/{order_id}"),
            Some(&ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The admin override ignores the transition table entirely.
    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/api/orders/{order_id}/status?status=SHIPPED"),
            Some(&ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/orders/{order_id}/status?status=SHIPPED"),
            Some(&ADMIN),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SHIPPED");
}

#[tokio::test]
async fn test_invalid_order_id_is_bad_request() {
    let app = setup();
    let (status, _) = send(
        &app,
        request("GET", "/api/orders/not-a-uuid", Some(&ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_and_low_stock_views() {
    let app = setup();
    seed_product(&app, "Blue Widget", 1000, 0).await;
    seed_product(&app, "Red Widget", 1000, 50).await;

    let (status, body) = send(
        &app,
        request("GET", "/api/products/search?name=widget", Some(&ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        request("GET", "/api/products/in-stock", Some(&ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // The restocking report is an admin view.
    let (status, _) = send(
        &app,
        request("GET", "/api/products/low-stock?threshold=5", Some(&ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(
        &app,
        request("GET", "/api/products/low-stock?threshold=5", Some(&ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Blue Widget");
}
