use std::sync::Arc;

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AuthMode, SecurityConfig};
use crate::types::Caller;

/// Claims carried by the managed backend's access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    pub exp: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub is_admin: bool,
}

impl Claims {
    pub fn grants_admin(&self) -> bool {
        self.app_metadata.is_admin || self.role.as_deref() == Some("service_role")
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    MissingSecret,
}

/// Decides who is calling and whether they hold admin rights
pub trait AccessPolicy: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<Caller, AuthError>;

    fn is_caller_admin(&self, headers: &HeaderMap) -> bool {
        self.resolve(headers).map_or(false, |caller| caller.is_admin)
    }
}

pub type SharedAccess = Arc<dyn AccessPolicy>;

/// Fixed answer for every request.
///
/// `always_admin()` is the placeholder used until identity-based
/// authorization is configured; tests use it to act as admin or visitor.
#[derive(Debug, Clone, Copy)]
pub struct StaticAccess {
    is_admin: bool,
}

impl StaticAccess {
    pub fn new(is_admin: bool) -> Self {
        Self { is_admin }
    }

    pub fn always_admin() -> Self {
        Self::new(true)
    }
}

impl AccessPolicy for StaticAccess {
    fn resolve(&self, _headers: &HeaderMap) -> Result<Caller, AuthError> {
        Ok(if self.is_admin {
            Caller::admin()
        } else {
            Caller::anonymous()
        })
    }
}

/// Verifies HS256 bearer tokens signed with the backend's JWT secret.
/// Requests without a token are anonymous; a bad token is rejected.
pub struct JwtAccess {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAccess {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        // Backend tokens carry "authenticated" as audience; not checked here
        validation.validate_aud = false;

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

impl AccessPolicy for JwtAccess {
    fn resolve(&self, headers: &HeaderMap) -> Result<Caller, AuthError> {
        let Some(token) = bearer_token(headers)? else {
            return Ok(Caller::anonymous());
        };
        let claims = self.decode(&token)?;

        Ok(Caller {
            is_admin: claims.grants_admin(),
            user_id: claims.sub.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
            access_token: Some(token),
        })
    }
}

/// Bearer token from the Authorization header; `None` when the header is absent
fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Access policy selected by configuration
pub fn from_config(security: &SecurityConfig) -> Result<SharedAccess, AuthError> {
    match security.auth_mode {
        AuthMode::Stub => {
            tracing::warn!("Authorization stub active: every caller is treated as admin");
            Ok(Arc::new(StaticAccess::always_admin()))
        }
        AuthMode::Jwt => {
            let secret = security.jwt_secret.as_deref().ok_or(AuthError::MissingSecret)?;
            Ok(Arc::new(JwtAccess::new(secret)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "super-secret-jwt-token-for-tests";

    fn token(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn exp() -> i64 {
        (Utc::now() + Duration::hours(1)).timestamp()
    }

    #[test]
    fn stub_always_admin() {
        let access = StaticAccess::always_admin();
        assert!(access.is_caller_admin(&HeaderMap::new()));
        assert!(!StaticAccess::new(false).is_caller_admin(&HeaderMap::new()));
    }

    #[test]
    fn missing_token_is_anonymous() {
        let access = JwtAccess::new(SECRET).unwrap();
        let caller = access.resolve(&HeaderMap::new()).unwrap();
        assert_eq!(caller, Caller::anonymous());
    }

    #[test]
    fn admin_from_app_metadata_or_service_role() {
        let access = JwtAccess::new(SECRET).unwrap();
        let user_id = Uuid::new_v4();

        let admin = token(json!({"sub": user_id, "role": "authenticated", "aud": "authenticated",
            "app_metadata": {"is_admin": true}, "exp": exp()}));
        let caller = access.resolve(&headers(&format!("Bearer {}", admin))).unwrap();
        assert!(caller.is_admin);
        assert_eq!(caller.user_id, Some(user_id));
        assert_eq!(caller.access_token.as_deref(), Some(admin.as_str()));

        let service = token(json!({"role": "service_role", "exp": exp()}));
        assert!(access.is_caller_admin(&headers(&format!("Bearer {}", service))));

        let user = token(json!({"sub": user_id, "role": "authenticated", "exp": exp()}));
        assert!(!access.is_caller_admin(&headers(&format!("Bearer {}", user))));
    }

    #[test]
    fn bad_tokens_are_rejected() {
        let access = JwtAccess::new(SECRET).unwrap();
        assert!(matches!(
            access.resolve(&headers("Bearer not.a.token")),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(access.resolve(&headers("Basic abc")), Err(AuthError::MalformedHeader)));

        let expired = token(json!({"role": "service_role", "exp": (Utc::now() - Duration::hours(2)).timestamp()}));
        assert!(matches!(
            access.resolve(&headers(&format!("Bearer {}", expired))),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(matches!(JwtAccess::new(""), Err(AuthError::MissingSecret)));
    }
}
