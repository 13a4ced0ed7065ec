//! Caller identity passed to every product API call

use serde::{Deserialize, Serialize};

/// Role of the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Store administrator
    Admin,
    /// Shopper
    Client,
}

/// Bearer token and role of the current user
///
/// Injected at session construction; the session never reads ambient
/// storage for either.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
    role: Role,
}

impl AuthContext {
    /// Context with an explicit token and role
    #[inline]
    #[must_use]
    pub fn new(token: Option<String>, role: Role) -> Self {
        Self { token, role }
    }

    /// Signed-in administrator
    #[inline]
    #[must_use]
    pub fn admin(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()), Role::Admin)
    }

    /// Bearer token, if signed in
    #[inline]
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Role
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this user may create and edit products
    #[inline]
    #[must_use]
    pub fn can_manage_products(&self) -> bool {
        self.role == Role::Admin && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_signed_in_admins_manage_products() {
        assert!(AuthContext::admin("t0k").can_manage_products());
        assert!(!AuthContext::new(None, Role::Admin).can_manage_products());
        assert!(!AuthContext::new(Some(String::new()), Role::Admin).can_manage_products());
        assert!(!AuthContext::new(Some("t0k".into()), Role::Client).can_manage_products());
    }

    #[test]
    fn debug_hides_token() {
        let shown = format!("{:?}", AuthContext::admin("secret"));
        assert!(!shown.contains("secret"));
        assert!(shown.contains("Admin"));
    }
}
