//! HTTP implementation of the inventory boundary.

use std::time::Duration;

use async_trait::async_trait;
use common::{Caller, Money, ProductId};
use orders::{ClientError, InventoryClient, ProductInfo};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

/// Inventory client that calls the inventory service over HTTP.
///
/// Every call carries the caller's identity headers and bearer token
/// unchanged, applies the configured timeout, and performs no retries;
/// retry policy belongs to the call-site.
#[derive(Clone)]
pub struct HttpInventoryClient {
    http: reqwest::Client,
    base_url: String,
}

/// The subset of the product payload the order side consumes.
#[derive(Debug, Deserialize)]
struct ProductPayload {
    id: String,
    name: String,
    unit_price_cents: i64,
}

/// Error payload shape produced by the inventory service.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    available: Option<u32>,
}

impl HttpInventoryClient {
    /// Creates a client for the inventory service at `base_url` with the
    /// given per-call timeout.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn product_url(&self, product_id: &ProductId) -> String {
        format!("{}/api/products/{}", self.base_url, product_id)
    }

    /// Attaches the caller's identity and token to an outgoing request.
    fn as_caller(&self, caller: &Caller, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("x-user-id", caller.user_id().as_str())
            .header("x-user-name", caller.username())
            .header("x-user-roles", caller.roles_header());
        match caller.token() {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                ClientError::Unavailable(e.to_string())
            } else {
                ClientError::Unexpected(e.to_string())
            }
        })
    }
}

/// Translates a non-success response into the domain error taxonomy.
async fn translate_error(
    product_id: &ProductId,
    requested: Option<u32>,
    response: Response,
) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(product_id = %product_id, %status, body = %body, "inventory call failed");

    if status == StatusCode::NOT_FOUND {
        ClientError::ProductUnavailable(product_id.clone())
    } else if status == StatusCode::BAD_REQUEST {
        let payload: Option<ErrorPayload> = serde_json::from_str(&body).ok();
        let signals_insufficiency = payload
            .as_ref()
            .is_some_and(|p| p.kind == "insufficient-stock")
            || body.contains("Insufficient stock")
            || body.contains("insufficient-stock");
        if signals_insufficiency {
            ClientError::InsufficientStock {
                product_id: product_id.clone(),
                requested: requested.unwrap_or_default(),
                available: payload.and_then(|p| p.available),
            }
        } else {
            let detail = payload.map(|p| p.error).unwrap_or(body);
            ClientError::Unexpected(format!("bad request: {detail}"))
        }
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ClientError::AccessDenied
    } else if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::GATEWAY_TIMEOUT {
        ClientError::Unavailable(format!("inventory service returned {status}"))
    } else {
        ClientError::Unexpected(format!("unexpected status {status}: {body}"))
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn get_product(
        &self,
        caller: &Caller,
        product_id: &ProductId,
    ) -> Result<ProductInfo, ClientError> {
        let request = self.as_caller(caller, self.http.get(self.product_url(product_id)));
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(translate_error(product_id, None, response).await);
        }

        let payload: ProductPayload = response
            .json()
            .await
            .map_err(|e| ClientError::Unexpected(format!("malformed product payload: {e}")))?;

        Ok(ProductInfo {
            id: ProductId::new(payload.id),
            name: payload.name,
            unit_price: Money::from_cents(payload.unit_price_cents),
        })
    }

    async fn check_availability(
        &self,
        caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<bool, ClientError> {
        let url = format!("{}/check-stock", self.product_url(product_id));
        let request = self.as_caller(
            caller,
            self.http.get(url).query(&[("quantity", quantity)]),
        );
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(translate_error(product_id, Some(quantity), response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Unexpected(format!("malformed stock-check payload: {e}")))
    }

    async fn reduce_stock(
        &self,
        caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ClientError> {
        let url = format!("{}/reduce-stock", self.product_url(product_id));
        let request = self.as_caller(
            caller,
            self.http.put(url).query(&[("quantity", quantity)]),
        );
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(translate_error(product_id, Some(quantity), response).await);
        }
        Ok(())
    }
}
