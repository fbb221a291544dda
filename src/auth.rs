use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::ApiError, repository::RepositoryState};

/// Lifetime of an issued session token.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Claims
///
/// The payload signed into every session token. Only the identity travels in the token;
/// the role is always read back from the user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user's email, the identity the gate resolves against the `users` collection.
    pub email: String,
    /// Issued At (iat).
    pub iat: usize,
    /// Expiration Time (exp). Checked with zero leeway.
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or its signature is invalid")]
    InvalidToken,
    #[error("token has expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// TokenService
///
/// Issues and verifies HS256 session tokens. Built once at startup from the configured
/// secret and shared through `AppState`; cloning is cheap.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::seconds(TOKEN_TTL_SECS))
    }

    /// Same as `new` with a custom token lifetime.
    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            ttl,
        }
    }

    /// issue
    ///
    /// Signs a token for `email` that expires `ttl` after now.
    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            iat: now.timestamp().max(0) as usize,
            exp: (now + self.ttl).timestamp().max(0) as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(TokenError::Signing)
    }

    /// verify
    ///
    /// Decodes and validates a token. Expiry is reported separately from every other
    /// failure so it can be logged, but callers treat both as unauthenticated.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidToken,
            })
    }
}

/// AuthUser
///
/// The authenticated identity of a request, resolved from its bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub email: String,
}

/// Extracts the token from an `Authorization: Bearer <token>` header. A header with a
/// different scheme or an empty token segment is rejected like a missing one.
fn bearer_token(value: &HeaderValue) -> Result<&str, ApiError> {
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(ApiError::Unauthenticated)?;

    if token.is_empty() {
        return Err(ApiError::Unauthenticated);
    }
    Ok(token)
}

/// AuthUser Extractor Implementation
///
/// Usable directly as a handler argument. When `require_auth` already ran for the route,
/// the identity it attached to the request extensions is reused instead of decoding the
/// token a second time.
///
/// Rejection: `ApiError::Unauthenticated` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(ApiError::Unauthenticated)?;
        let token = bearer_token(value)?;

        let claims = TokenService::from_ref(state).verify(token)?;

        Ok(AuthUser {
            email: claims.email,
        })
    }
}

/// require_auth
///
/// First gate stage. Rejects the request unless it carries a valid bearer token, then
/// attaches the decoded `AuthUser` to the request for the stages and handler after it.
pub async fn require_auth(user: AuthUser, mut request: Request, next: Next) -> Response {
    tracing::debug!(email = %user.email, "request authenticated");
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// require_admin
///
/// Second gate stage; must be layered inside `require_auth`. Re-reads the caller's user
/// record on every call (one store read, no caching) so role changes apply to the very
/// next request.
pub async fn require_admin(
    State(repo): State<RepositoryState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Owned copy: the request must not stay borrowed across the store await.
    let Some(email) = request
        .extensions()
        .get::<AuthUser>()
        .map(|user| user.email.clone())
    else {
        tracing::warn!("admin check reached without an authenticated identity");
        return Err(ApiError::Unauthenticated);
    };

    match repo.find_user_by_email(&email).await? {
        Some(record) if record.is_admin() => {}
        _ => {
            tracing::warn!(%email, "admin access denied");
            return Err(ApiError::Forbidden);
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_scheme_and_token() {
        let ok = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&ok).unwrap(), "abc.def.ghi");

        for raw in ["Bearer", "Bearer ", "Bearer    ", "Basic abc", "abc.def.ghi"] {
            let value = HeaderValue::from_static(raw);
            assert!(
                matches!(bearer_token(&value), Err(ApiError::Unauthenticated)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn issued_token_carries_one_hour_expiry() {
        let service = TokenService::new("unit-secret");
        let token = service.issue("a@b.c").unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.email, "a@b.c");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS as usize);
    }
}
