//! Request-scoped caller identity.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user's external id in the `X-User-Id` header.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    /// Fails with Forbidden unless the caller is `user_id`.
    pub fn ensure_is(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.user_id != user_id {
            return Err(AppError::Forbidden(format!(
                "caller {} may not access resources of user {}",
                self.user_id, user_id
            )));
        }
        Ok(())
    }

    fn from_parts(parts: &Parts) -> Result<Option<Self>, AppError> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(None);
        };
        let user_id = value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or_else(|| AppError::Unauthorized("malformed X-User-Id header".to_string()))?;
        Ok(Some(Self { user_id }))
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_parts(parts)?
            .ok_or_else(|| AppError::Unauthorized("missing X-User-Id header".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Identity::from_parts(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_header_parsing() {
        let id = Uuid::new_v4();
        assert_eq!(
            Identity::from_parts(&parts(Some(&id.to_string()))).unwrap(),
            Some(Identity::new(id))
        );
        assert_eq!(Identity::from_parts(&parts(None)).unwrap(), None);
        assert!(matches!(
            Identity::from_parts(&parts(Some("nope"))),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_ensure_is() {
        let id = Uuid::new_v4();
        let identity = Identity::new(id);
        assert!(identity.ensure_is(id).is_ok());
        assert!(matches!(
            identity.ensure_is(Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }
}
