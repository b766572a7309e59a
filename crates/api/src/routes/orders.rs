//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderId, ProductId, Role};
use inventory::ProductStore;
use orders::{NewOrderLine, Order, OrderLine, OrderStatus, OrderStore};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{Identity, require_role};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub ordered_at: String,
    pub updated_at: String,
    pub items: Vec<OrderLineResponse>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.id.to_string(),
            product_id: line.product_id.to_string(),
            product_name: line.product_name,
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            subtotal_cents: line.subtotal.cents(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            username: order.username,
            status: order.status,
            total_amount_cents: order.total_amount.cents(),
            ordered_at: order.ordered_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            items: order.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

fn to_responses(orders: Vec<Order>) -> Vec<OrderResponse> {
    orders.into_iter().map(OrderResponse::from).collect()
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    OrderStatus::parse(status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown order status: {status}")))
}

// -- Handlers --

/// POST /api/orders — place an order. Client role only.
pub async fn create<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    require_role(&caller, Role::Client)?;

    let items: Vec<NewOrderLine> = request
        .items
        .into_iter()
        .map(|item| NewOrderLine {
            product_id: ProductId::new(item.product_id),
            quantity: item.quantity,
        })
        .collect();

    let order = state.orders.create_order(&caller, items).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/orders/my-orders — the caller's orders. Client role only.
pub async fn my_orders<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    require_role(&caller, Role::Client)?;
    let orders = state.orders.get_my_orders(&caller).await?;
    Ok(Json(to_responses(orders)))
}

/// GET /api/orders — every order. Admin only.
pub async fn list_all<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.get_all_orders(&caller).await?;
    Ok(Json(to_responses(orders)))
}

/// GET /api/orders/status/{status} — orders in one status. Admin only.
pub async fn by_status<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Path(status): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let status = parse_status(&status)?;
    let orders = state.orders.get_orders_by_status(&caller, status).await?;
    Ok(Json(to_responses(orders)))
}

/// GET /api/orders/{id} — one order. Owner or admin.
pub async fn get<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get_order(&caller, order_id).await?;
    Ok(Json(order.into()))
}

/// GET /api/orders/{id}/items — an order's lines. Owner or admin.
pub async fn items<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderLineResponse>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let lines = state.orders.get_order_items(&caller, order_id).await?;
    Ok(Json(
        lines.into_iter().map(OrderLineResponse::from).collect(),
    ))
}

/// PUT /api/orders/{id}/status?status= — administrative override.
pub async fn update_status<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = parse_status(&query.status)?;
    let order = state.orders.update_status(&caller, order_id, status).await?;
    Ok(Json(order.into()))
}

/// DELETE /api/orders/{id} — guarded cancel. Owner or admin.
pub async fn cancel<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.orders.cancel_order(&caller, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
