//! API server entry point.

use std::sync::Arc;
use std::time::Duration;

use api::AppState;
use api::config::Config;
use inventory::{InMemoryProductStore, PostgresProductStore, ProductService, ProductStore};
use inventory_client::{HttpInventoryClient, LocalInventoryClient};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{InMemoryOrderStore, InventoryClient, OrderService, PostgresOrderStore, OrderStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn run<PS, OS>(
    config: Config,
    metrics_handle: PrometheusHandle,
    product_store: PS,
    order_store: OS,
) where
    PS: ProductStore + Clone + 'static,
    OS: OrderStore + 'static,
{
    let products = ProductService::new(product_store);

    // A remote inventory deployment talks HTTP; otherwise the order side
    // bridges onto the in-process engine.
    let inventory: Arc<dyn InventoryClient> = match &config.inventory_url {
        Some(url) => {
            tracing::info!(%url, "using remote inventory service");
            Arc::new(
                HttpInventoryClient::new(
                    url.clone(),
                    Duration::from_millis(config.inventory_timeout_ms),
                )
                .expect("failed to build inventory HTTP client"),
            )
        }
        None => {
            tracing::info!("using in-process inventory engine");
            Arc::new(LocalInventoryClient::new(products.clone()))
        }
    };

    let orders = OrderService::new(order_store, inventory);
    let state = Arc::new(AppState { products, orders });
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick stores and serve
    let config = Config::from_env();
    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");

            let product_store = PostgresProductStore::new(pool.clone());
            product_store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            let order_store = PostgresOrderStore::new(pool);

            run(config, metrics_handle, product_store, order_store).await;
        }
        None => {
            run(
                config,
                metrics_handle,
                InMemoryProductStore::new(),
                InMemoryOrderStore::new(),
            )
            .await;
        }
    }
}
