//! Optional bearer-token identity. Requests without a token are anonymous;
//! a token that is present must verify when a secret is configured.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

/// HS256 verifier for user tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Hosted auth providers set their own audience; only signature and expiry matter here.
        validation.validate_aud = false;
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, AppError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                debug!("Rejected bearer token: {e}");
                AppError::InvalidToken
            })
    }
}

/// Token from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
    // Auth schemes are case-insensitive (RFC 9110 §11.1).
    match value.trim().split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(Some(token.trim()))
        }
        _ => Err(AppError::Unauthorized),
    }
}

/// Resolves the caller. `None` when the request carries no token or no
/// verifier is configured.
pub fn verify_bearer(
    headers: &HeaderMap,
    verifier: Option<&TokenVerifier>,
) -> Result<Option<Uuid>, AppError> {
    let Some(verifier) = verifier else {
        return Ok(None);
    };
    match bearer_token(headers)? {
        Some(token) => verifier.verify(token).map(Some),
        None => Ok(None),
    }
}

/// Extractor for routes where identity only tags ownership.
#[derive(Debug, Clone, Copy)]
pub struct OptionalUser(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        verify_bearer(&parts.headers, state.auth.as_deref()).map(OptionalUser)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    const SECRET: &str = "test-secret";

    fn token_for(sub: Uuid, secret: &str) -> String {
        let claims = Claims {
            sub,
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_no_header_is_anonymous() {
        let verifier = TokenVerifier::new(SECRET);
        assert_eq!(verify_bearer(&HeaderMap::new(), Some(&verifier)).unwrap(), None);
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let verifier = TokenVerifier::new(SECRET);
        let user = Uuid::new_v4();
        let headers = headers_with(&format!("Bearer {}", token_for(user, SECRET)));
        assert_eq!(verify_bearer(&headers, Some(&verifier)).unwrap(), Some(user));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let verifier = TokenVerifier::new(SECRET);
        let user = Uuid::new_v4();
        for scheme in ["bearer", "BEARER", "BeArEr"] {
            let headers = headers_with(&format!("{scheme} {}", token_for(user, SECRET)));
            assert_eq!(verify_bearer(&headers, Some(&verifier)).unwrap(), Some(user));
        }
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        let headers = headers_with(&format!("Bearer {}", token_for(Uuid::new_v4(), "other")));
        assert!(matches!(
            verify_bearer(&headers, Some(&verifier)),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_header_is_unauthorized() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(matches!(
            verify_bearer(&headers_with("Basic abc"), Some(&verifier)),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_without_verifier_tokens_are_ignored() {
        let headers = headers_with("Bearer whatever");
        assert_eq!(verify_bearer(&headers, None).unwrap(), None);
    }
}
