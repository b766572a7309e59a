//! Caller identity as resolved by the identity provider.
//!
//! The core never inspects tokens or claims itself. The boundary layer
//! resolves a [`Caller`] once per request and threads it explicitly into
//! every service call; there is no ambient security context.

use std::collections::HashSet;

use crate::types::UserId;

/// A named role granted to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Regular storefront user: places and views their own orders.
    Client,
    /// Operator: manages the catalog and any order.
    Admin,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Admin => "ADMIN",
        }
    }

    /// Parses a role from its wire name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim() {
            "CLIENT" => Some(Role::Client),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque bearer token, carried alongside the caller so remote calls made
/// on the caller's behalf can propagate it unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller {
    user_id: UserId,
    username: String,
    roles: HashSet<Role>,
    token: Option<BearerToken>,
}

impl Caller {
    /// Creates a caller with the given identity and role set.
    pub fn new(
        user_id: impl Into<UserId>,
        username: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            roles: roles.into_iter().collect(),
            token: None,
        }
    }

    /// Creates a caller holding only the `CLIENT` role.
    pub fn client(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self::new(user_id, username, [Role::Client])
    }

    /// Creates a caller holding only the `ADMIN` role.
    pub fn admin(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self::new(user_id, username, [Role::Admin])
    }

    /// Attaches the caller's bearer token for downstream propagation.
    pub fn with_token(mut self, token: BearerToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Returns the caller's user id.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the caller's display name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns true if the caller holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns true if the caller holds the `ADMIN` role.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Returns the bearer token, if one was captured at the boundary.
    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// Renders the role set as a comma-separated header value.
    pub fn roles_header(&self) -> String {
        let mut names: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
        names.sort_unstable();
        names.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_roundtrip() {
        assert_eq!(Role::parse("CLIENT"), Some(Role::Client));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse(" ADMIN "), Some(Role::Admin));
        assert_eq!(Role::parse("ROOT"), None);
    }

    #[test]
    fn client_is_not_admin() {
        let caller = Caller::client("u-1", "alice");
        assert!(caller.has_role(Role::Client));
        assert!(!caller.is_admin());
    }

    #[test]
    fn admin_is_admin() {
        let caller = Caller::admin("u-2", "bob");
        assert!(caller.is_admin());
        assert!(!caller.has_role(Role::Client));
    }

    #[test]
    fn roles_header_is_sorted_and_joined() {
        let caller = Caller::new("u-3", "carol", [Role::Admin, Role::Client]);
        assert_eq!(caller.roles_header(), "ADMIN,CLIENT");
    }

    #[test]
    fn token_is_carried() {
        let caller = Caller::client("u-4", "dave").with_token(BearerToken::new("tok"));
        assert_eq!(caller.token().unwrap().as_str(), "tok");
    }
}
