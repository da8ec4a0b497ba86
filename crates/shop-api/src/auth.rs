//! # Request Identity
//!
//! Token issuance and verification live in an external identity
//! service; requests arrive here pre-authenticated, carrying the
//! resolved identity in `X-User-Id` / `X-User-Role` headers. This
//! module parses those headers and gates handlers on permissions.

use crate::handlers::ErrorResponse;
use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode, Json};
use shop_core::{Permission, Role, ShopError};
use uuid::Uuid;

/// The caller's resolved identity. Absent headers mean an anonymous
/// client; malformed headers are rejected.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdentity {
    pub user_id: Option<Uuid>,
    pub role: Role,
}

impl RequestIdentity {
    /// Anonymous guest identity
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: Role::Client,
        }
    }

    /// Check a permission, mapping a miss to `Forbidden`
    pub fn require(&self, permission: Permission) -> Result<(), ShopError> {
        if self.role.allows(permission) {
            Ok(())
        } else {
            Err(ShopError::Forbidden(format!(
                "role {:?} lacks {:?}",
                self.role, permission
            )))
        }
    }
}

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match parts.headers.get("x-user-id") {
            None => None,
            Some(value) => {
                let raw = value.to_str().map_err(|_| bad_header("X-User-Id"))?;
                Some(Uuid::parse_str(raw).map_err(|_| bad_header("X-User-Id"))?)
            }
        };

        let role = match parts.headers.get("x-user-role") {
            None => Role::Client,
            Some(value) => {
                let raw = value.to_str().map_err(|_| bad_header("X-User-Role"))?;
                raw.parse().map_err(|_| bad_header("X-User-Role"))?
            }
        };

        Ok(Self { user_id, role })
    }
}

fn bad_header(name: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(format!("Invalid {} header", name), 400)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity() {
        let identity = RequestIdentity::anonymous();
        assert!(identity.user_id.is_none());
        assert_eq!(identity.role, Role::Client);
    }

    #[test]
    fn test_require_permission() {
        let admin = RequestIdentity {
            user_id: Some(Uuid::new_v4()),
            role: Role::Admin,
        };
        assert!(admin.require(Permission::ReadInbox).is_ok());

        let client = RequestIdentity::anonymous();
        let err = client.require(Permission::ManageStock).unwrap_err();
        assert!(matches!(err, ShopError::Forbidden(_)));
    }
}
