//! Catalog and stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, ProductId, Role};
use inventory::{NewProduct, Product, ProductStore, ProductUpdate};
use orders::OrderStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{Identity, require_role};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit_price_cents: i64,
    pub stock_quantity: u32,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ThresholdQuery {
    pub threshold: u32,
}

#[derive(Deserialize)]
pub struct QuantityQuery {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unit_price_cents: i64,
    pub stock_quantity: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            unit_price_cents: product.unit_price.cents(),
            stock_quantity: product.stock_quantity,
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

fn to_responses(products: Vec<Product>) -> Vec<ProductResponse> {
    products.into_iter().map(ProductResponse::from).collect()
}

impl ProductRequest {
    fn into_new(self) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            unit_price: Money::from_cents(self.unit_price_cents),
            stock_quantity: self.stock_quantity,
        }
    }

    fn into_update(self) -> ProductUpdate {
        ProductUpdate {
            name: self.name,
            description: self.description,
            unit_price: Money::from_cents(self.unit_price_cents),
            stock_quantity: self.stock_quantity,
        }
    }
}

// -- Handlers --

/// GET /api/products — the whole catalog.
pub async fn list<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(_caller): Identity,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.products.list_products().await?;
    Ok(Json(to_responses(products)))
}

/// GET /api/products/{id} — one product.
pub async fn get<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(_caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.products.get_product(&ProductId::new(id)).await?;
    Ok(Json(product.into()))
}

/// POST /api/products — create a catalog entry. Admin only.
pub async fn create<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Json(request): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    require_role(&caller, Role::Admin)?;
    let product = state.products.create_product(request.into_new()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/products/{id} — replace a catalog entry. Admin only.
pub async fn update<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    require_role(&caller, Role::Admin)?;
    let product = state
        .products
        .update_product(&ProductId::new(id), request.into_update())
        .await?;
    Ok(Json(product.into()))
}

/// DELETE /api/products/{id} — remove a catalog entry. Admin only.
pub async fn delete<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_role(&caller, Role::Admin)?;
    state.products.delete_product(&ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/products/search?name= — case-insensitive name search.
pub async fn search<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(_caller): Identity,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.products.search_products(&query.name).await?;
    Ok(Json(to_responses(products)))
}

/// GET /api/products/in-stock — products with stock available.
pub async fn in_stock<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(_caller): Identity,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.products.in_stock_products().await?;
    Ok(Json(to_responses(products)))
}

/// GET /api/products/low-stock?threshold= — restocking report. Admin only.
pub async fn low_stock<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(caller): Identity,
    Query(query): Query<ThresholdQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    require_role(&caller, Role::Admin)?;
    let products = state.products.low_stock_products(query.threshold).await?;
    Ok(Json(to_responses(products)))
}

/// GET /api/products/{id}/check-stock?quantity= — availability probe.
pub async fn check_stock<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(_caller): Identity,
    Path(id): Path<String>,
    Query(query): Query<QuantityQuery>,
) -> Result<Json<bool>, ApiError> {
    let available = state
        .products
        .check_availability(&ProductId::new(id), query.quantity)
        .await?;
    Ok(Json(available))
}

/// PUT /api/products/{id}/reduce-stock?quantity= — guarded decrement.
pub async fn reduce_stock<PS: ProductStore + 'static, OS: OrderStore + 'static>(
    State(state): State<Arc<AppState<PS, OS>>>,
    Identity(_caller): Identity,
    Path(id): Path<String>,
    Query(query): Query<QuantityQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .products
        .reduce_stock(&ProductId::new(id), query.quantity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
