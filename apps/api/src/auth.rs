//! # Caller Identity
//!
//! An upstream authenticator terminates credentials and forwards the caller
//! in trusted headers:
//!
//! ```text
//! X-User-Id:    3f9c…            required on every route but /health
//! X-User-Roles: customer,admin   optional, comma-separated
//! ```
//!
//! Missing identity is 401. Role or ownership violations are 403.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::{ApiError, ApiResult};
use tienda_core::validation::validate_id;
use tienda_core::Order;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLES_HEADER: &str = "x-user-roles";

/// Role that unlocks fulfillment and privileged views.
pub const ADMIN_ROLE: &str = "admin";

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn from_headers(headers: &HeaderMap) -> ApiResult<Self> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing caller identity"))?;

        validate_id("userId", user_id).map_err(|e| ApiError::unauthorized(e.to_string()))?;

        let roles = headers
            .get(ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(|role| role.trim().to_ascii_lowercase())
                    .filter(|role| !role.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Actor {
            user_id: user_id.to_string(),
            roles,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ADMIN_ROLE)
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin role required"))
        }
    }

    /// Owners and admins may see and act on an order.
    pub fn ensure_can_access(&self, order: &Order) -> ApiResult<()> {
        if order.user_id == self.user_id || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Order belongs to another user"))
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Actor::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_missing_identity() {
        let err = Actor::from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let err = Actor::from_headers(&headers(&[(USER_ID_HEADER, "  ")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_roles_parsing() {
        let actor = Actor::from_headers(&headers(&[
            (USER_ID_HEADER, "u-1"),
            (ROLES_HEADER, "customer, Admin ,"),
        ]))
        .unwrap();

        assert_eq!(actor.user_id, "u-1");
        assert_eq!(actor.roles, vec!["customer", "admin"]);
        assert!(actor.is_admin());
    }

    #[test]
    fn test_plain_user_is_not_admin() {
        let actor = Actor::from_headers(&headers(&[(USER_ID_HEADER, "u-1")])).unwrap();
        assert!(!actor.is_admin());
        assert_eq!(actor.require_admin().unwrap_err().code, ErrorCode::Forbidden);
    }
}
