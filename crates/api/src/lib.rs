//! HTTP API server for the catalog and order services.
//!
//! Exposes `/api/products` and `/api/orders` with structured logging
//! (tracing) and Prometheus metrics. The caller identity is resolved once
//! per request from gateway-forwarded headers and threaded into every
//! service call.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use inventory::{InMemoryProductStore, ProductService, ProductStore};
use inventory_client::LocalInventoryClient;
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{InMemoryOrderStore, OrderService, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<PS: ProductStore, OS: OrderStore> {
    pub products: ProductService<PS>,
    pub orders: OrderService<OS>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    state: Arc<AppState<PS, OS>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/products",
            get(routes::products::list::<PS, OS>).post(routes::products::create::<PS, OS>),
        )
        .route("/api/products/search", get(routes::products::search::<PS, OS>))
        .route(
            "/api/products/in-stock",
            get(routes::products::in_stock::<PS, OS>),
        )
        .route(
            "/api/products/low-stock",
            get(routes::products::low_stock::<PS, OS>),
        )
        .route(
            "/api/products/{id}",
            get(routes::products::get::<PS, OS>)
                .put(routes::products::update::<PS, OS>)
                .delete(routes::products::delete::<PS, OS>),
        )
        .route(
            "/api/products/{id}/check-stock",
            get(routes::products::check_stock::<PS, OS>),
        )
        .route(
            "/api/products/{id}/reduce-stock",
            put(routes::products::reduce_stock::<PS, OS>),
        )
        .route(
            "/api/orders",
            post(routes::orders::create::<PS, OS>).get(routes::orders::list_all::<PS, OS>),
        )
        .route(
            "/api/orders/my-orders",
            get(routes::orders::my_orders::<PS, OS>),
        )
        .route(
            "/api/orders/status/{status}",
            get(routes::orders::by_status::<PS, OS>),
        )
        .route(
            "/api/orders/{id}",
            get(routes::orders::get::<PS, OS>).delete(routes::orders::cancel::<PS, OS>),
        )
        .route(
            "/api/orders/{id}/items",
            get(routes::orders::items::<PS, OS>),
        )
        .route(
            "/api/orders/{id}/status",
            put(routes::orders::update_status::<PS, OS>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state backed by in-memory stores and the in-process
/// inventory bridge. Used by local runs and the integration tests.
pub fn create_default_state() -> Arc<AppState<InMemoryProductStore, InMemoryOrderStore>> {
    let products = ProductService::new(InMemoryProductStore::new());
    let inventory = Arc::new(LocalInventoryClient::new(products.clone()));
    let orders = OrderService::new(InMemoryOrderStore::new(), inventory);

    Arc::new(AppState { products, orders })
}
