//! Caller identity.
//!
//! Session verification lives in the external auth provider; its edge proxy
//! asserts the verified identity on every forwarded request via the
//! `x-identity-id` / `x-identity-email` headers. Handlers that need a caller
//! take an [`AuthUser`] extractor and get a 401 for free when the headers
//! are absent.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub const IDENTITY_ID_HEADER: &str = "x-identity-id";
pub const IDENTITY_EMAIL_HEADER: &str = "x-identity-email";

/// The authenticated caller, as asserted by the upstream identity proxy.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity_id: String,
    pub email: String,
}

impl AuthUser {
    /// Operator gate: the review workflow is restricted to a single
    /// configured principal.
    pub fn require_operator(&self, operator_id: &str) -> Result<(), AppError> {
        if self.identity_id != operator_id {
            tracing::warn!(
                "Operator endpoint hit by non-operator identity {}",
                self.identity_id
            );
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity_id = header_value(parts, IDENTITY_ID_HEADER)?;
        let email = header_value(parts, IDENTITY_EMAIL_HEADER)?;
        Ok(AuthUser { identity_id, email })
    }
}

fn header_value(parts: &Parts, name: &str) -> Result<String, AppError> {
    let value = parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();
    if value.is_empty() {
        return Err(AppError::Unauthorized);
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_extracts_identity_from_headers() {
        let mut parts = parts_with(&[
            (IDENTITY_ID_HEADER, "user_123"),
            (IDENTITY_EMAIL_HEADER, "a@acme.com"),
        ]);
        let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.identity_id, "user_123");
        assert_eq!(user.email, "a@acme.com");
    }

    #[tokio::test]
    async fn test_missing_headers_is_unauthorized() {
        let mut parts = parts_with(&[]);
        let err = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_blank_email_is_unauthorized() {
        let mut parts = parts_with(&[
            (IDENTITY_ID_HEADER, "user_123"),
            (IDENTITY_EMAIL_HEADER, "  "),
        ]);
        let err = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn test_operator_gate() {
        let user = AuthUser {
            identity_id: "user_op".to_string(),
            email: "op@hireboard.io".to_string(),
        };
        assert!(user.require_operator("user_op").is_ok());
        assert!(matches!(
            user.require_operator("user_other"),
            Err(AppError::Forbidden)
        ));
    }
}
