use crate::config::AuthConfig;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::fs;

/// Claims carried by access tokens from the auth service.
///
/// Refresh tokens are signed with the same key but carry no `email`, so they
/// fail to decode into this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID for revocation
    pub jti: String,
}

/// Verifies access token signatures and expiry. Issuing tokens is the auth
/// service's job.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// RS256 public key takes precedence over an HS256 secret.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        if let Some(path) = &config.jwt_public_key_path {
            let public_key_pem = fs::read_to_string(path).map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Failed to read public key from {}: {}",
                    path,
                    e
                ))
            })?;
            let verifier = Self::from_rsa_pem(public_key_pem.as_bytes())?;
            tracing::info!("Token verifier initialized with RS256 public key");
            return Ok(verifier);
        }

        match &config.jwt_secret {
            Some(secret) => {
                tracing::info!("Token verifier initialized with HS256 shared secret");
                Ok(Self::from_secret(secret.expose_secret()))
            }
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "No JWT verification key configured"
            ))),
        }
    }

    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, AppError> {
        Ok(Self {
            decoding_key: DecodingKey::from_rsa_pem(pem)?,
            validation: Self::validation(Algorithm::RS256),
        })
    }

    pub fn from_secret(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Self::validation(Algorithm::HS256),
        }
    }

    fn validation(algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation
    }

    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }
}

#[cfg(test)]
pub(crate) fn issue_hs256(secret: &str, sub: &str, email: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: sub.to_string(),
        email: email.to_string(),
        exp: now + ttl_secs,
        iat: now,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Signs the claim set the auth service puts in refresh tokens.
#[cfg(test)]
pub(crate) fn issue_refresh_hs256(secret: &str, sub: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = serde_json::json!({
        "sub": sub,
        "jti": uuid::Uuid::new_v4().to_string(),
        "exp": now + ttl_secs,
        "iat": now,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn verifies_token_from_configured_secret() {
        let config = AuthConfig {
            jwt_secret: Some(Secret::new("config-secret".to_string())),
            jwt_public_key_path: None,
            trust_user_header: false,
        };
        let verifier = TokenVerifier::from_config(&config).unwrap();

        let claims = verifier
            .verify(&issue_hs256("config-secret", "u1", "u1@example.com", 60))
            .unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "u1@example.com");
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn refresh_token_does_not_verify_as_access_token() {
        let verifier = TokenVerifier::from_secret("config-secret");
        let token = issue_refresh_hs256("config-secret", "u1", 30 * 24 * 3600);

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::Json(_)
        ));
    }

    #[test]
    fn missing_key_material_is_a_config_error() {
        let config = AuthConfig {
            jwt_secret: None,
            jwt_public_key_path: None,
            trust_user_header: false,
        };
        assert!(matches!(
            TokenVerifier::from_config(&config),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn unreadable_public_key_is_a_config_error() {
        let config = AuthConfig {
            jwt_secret: None,
            jwt_public_key_path: Some("/nonexistent/public.pem".to_string()),
            trust_user_header: false,
        };
        assert!(matches!(
            TokenVerifier::from_config(&config),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_garbage_pem() {
        assert!(matches!(
            TokenVerifier::from_rsa_pem(b"not a pem"),
            Err(AppError::InvalidToken(_))
        ));
    }
}
