//! Caller extraction from gateway-forwarded identity headers.
//!
//! The gateway terminates and verifies the JWT, then forwards the resolved
//! identity as `x-user-id`, `x-user-name`, and `x-user-roles` alongside the
//! original `Authorization` header. The extractor builds a typed
//! [`Caller`] once per request; handlers thread it into every service
//! call.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::{BearerToken, Caller, Role};

use crate::error::ApiError;

/// Extractor wrapping the resolved caller identity.
pub struct Identity(pub Caller);

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let user_id = header_str(headers, "x-user-id")
            .ok_or_else(|| ApiError::Unauthorized("missing caller identity".to_string()))?;
        let username = header_str(headers, "x-user-name").unwrap_or(user_id);
        let roles: Vec<Role> = header_str(headers, "x-user-roles")
            .map(|value| value.split(',').filter_map(Role::parse).collect())
            .unwrap_or_default();

        let mut caller = Caller::new(user_id, username, roles);
        if let Some(auth) = header_str(headers, "authorization")
            && let Some(token) = auth.strip_prefix("Bearer ")
        {
            caller = caller.with_token(BearerToken::new(token));
        }

        Ok(Identity(caller))
    }
}

/// Rejects callers that lack the role a route demands.
pub fn require_role(caller: &Caller, role: Role) -> Result<(), ApiError> {
    if caller.has_role(role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("{role} role required")))
    }
}
