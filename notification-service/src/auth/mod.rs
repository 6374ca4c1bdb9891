//! Principal resolution at the request boundary.
//!
//! Credentials are checked once, when the [`Principal`] extractor runs. The
//! handler receives a typed value and hands the user id down explicitly; nothing
//! below the handler consults request headers or ambient state.

pub mod token;

pub use token::{AccessTokenClaims, TokenVerifier};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;

pub const USER_ID_HEADER: &str = "X-User-ID";

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUserInfo {
    pub id: String,
    pub email: Option<String>,
}

/// Outcome of authenticating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Authenticated(TokenUserInfo),
    Unauthenticated,
}

impl Principal {
    pub fn user(&self) -> Option<&TokenUserInfo> {
        match self {
            Principal::Authenticated(user) => Some(user),
            Principal::Unauthenticated => None,
        }
    }
}

/// Why a request did not yield an authenticated principal.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credentials supplied")]
    MissingCredentials,

    #[error("authorization header is not a bearer token")]
    MalformedHeader,

    #[error("token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("token subject is empty")]
    EmptySubject,
}

/// Turns request credentials into a [`Principal`].
#[derive(Clone)]
pub struct PrincipalResolver {
    verifier: Arc<TokenVerifier>,
    trust_user_header: bool,
}

impl PrincipalResolver {
    pub fn new(verifier: TokenVerifier, trust_user_header: bool) -> Self {
        Self {
            verifier: Arc::new(verifier),
            trust_user_header,
        }
    }

    pub fn resolve(&self, parts: &Parts) -> Principal {
        match self.authenticate(parts) {
            Ok(user) => Principal::Authenticated(user),
            Err(reason) => {
                tracing::debug!(reason = %reason, "Request carries no valid principal");
                Principal::Unauthenticated
            }
        }
    }

    fn authenticate(&self, parts: &Parts) -> Result<TokenUserInfo, AuthError> {
        if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
            let token = value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or(AuthError::MalformedHeader)?;

            let claims = self.verifier.verify(token)?;
            if claims.sub.trim().is_empty() {
                return Err(AuthError::EmptySubject);
            }

            return Ok(TokenUserInfo {
                id: claims.sub,
                email: Some(claims.email),
            });
        }

        if self.trust_user_header {
            if let Some(user_id) = parts
                .headers
                .get(USER_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
            {
                return Ok(TokenUserInfo {
                    id: user_id.to_string(),
                    email: None,
                });
            }
        }

        Err(AuthError::MissingCredentials)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    PrincipalResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = PrincipalResolver::from_ref(state).resolve(parts);

        if let Principal::Authenticated(user) = &principal {
            tracing::Span::current().record("user_id", user.id.as_str());
        }

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    const SECRET: &str = "unit-test-secret";

    fn resolver(trust_user_header: bool) -> PrincipalResolver {
        PrincipalResolver::new(TokenVerifier::from_secret(SECRET), trust_user_header)
    }

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/notifications/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn bearer(token: &str) -> Parts {
        let value = format!("Bearer {}", token);
        parts(&[("Authorization", value.as_str())])
    }

    #[test]
    fn valid_bearer_token_authenticates() {
        let token = token::issue_hs256(SECRET, "u1", "u1@example.com", 3600);
        let principal = resolver(false).resolve(&bearer(&token));

        assert_eq!(
            principal,
            Principal::Authenticated(TokenUserInfo {
                id: "u1".to_string(),
                email: Some("u1@example.com".to_string()),
            })
        );
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        assert_eq!(resolver(false).resolve(&parts(&[])), Principal::Unauthenticated);
    }

    #[test]
    fn non_bearer_scheme_is_unauthenticated() {
        let principal = resolver(false).resolve(&parts(&[("Authorization", "Basic dTE6cHc=")]));
        assert_eq!(principal, Principal::Unauthenticated);
    }

    #[test]
    fn token_signed_with_other_key_is_unauthenticated() {
        let token = token::issue_hs256("another-secret", "u1", "u1@example.com", 3600);
        let principal = resolver(false).resolve(&bearer(&token));
        assert_eq!(principal, Principal::Unauthenticated);
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let token = token::issue_hs256(SECRET, "u1", "u1@example.com", -3600);
        let principal = resolver(false).resolve(&bearer(&token));
        assert_eq!(principal, Principal::Unauthenticated);
    }

    #[test]
    fn empty_subject_is_unauthenticated() {
        let token = token::issue_hs256(SECRET, "  ", "u1@example.com", 3600);
        let principal = resolver(false).resolve(&bearer(&token));
        assert_eq!(principal, Principal::Unauthenticated);
    }

    #[test]
    fn refresh_token_is_unauthenticated() {
        let token = token::issue_refresh_hs256(SECRET, "u1", 30 * 24 * 3600);
        let principal = resolver(false).resolve(&bearer(&token));
        assert_eq!(principal, Principal::Unauthenticated);
    }

    #[test]
    fn user_header_requires_trust_mode() {
        let request = parts(&[(USER_ID_HEADER, "gateway-user")]);

        assert_eq!(resolver(false).resolve(&request), Principal::Unauthenticated);
        assert_eq!(
            resolver(true).resolve(&request).user().map(|u| u.id.as_str()),
            Some("gateway-user")
        );
    }

    #[test]
    fn invalid_bearer_does_not_fall_back_to_user_header() {
        let request = parts(&[
            ("Authorization", "Bearer not-a-jwt"),
            (USER_ID_HEADER, "gateway-user"),
        ]);
        assert_eq!(resolver(true).resolve(&request), Principal::Unauthenticated);
    }
}
