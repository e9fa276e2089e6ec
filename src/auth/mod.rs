use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::RequestPartsExt;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{SessionClaims, UserRef};
use crate::state::AppState;

/// Platform session service.
///
/// Identity is resolved upstream: handlers only see the `UserRef` carried by
/// a validated session token, never a credential.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl_seconds: u64,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            session_ttl_seconds: config.session_ttl_seconds,
        }
    }

    /// Mint a session token for a user
    pub fn issue_session(&self, user_id: &str, display: &str, staff: bool) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            display: display.to_string(),
            staff,
            iat: now,
            exp: now + self.session_ttl_seconds as i64,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a session token and return its claims
    pub fn validate_session(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))?;

        Ok(data.claims)
    }
}

/// Extractor for the authenticated requester (Bearer session token)
pub struct CurrentUser(pub UserRef);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let claims = state.auth.validate_session(bearer.token())?;

        Ok(CurrentUser(UserRef {
            id: claims.sub,
            display_name: claims.display,
            is_staff: claims.staff,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_host: "localhost".to_string(),
            server_port: 8080,
            redis_url: "redis://localhost".to_string(),
            signing_secret: "test-signing-secret".to_string(),
            join_token_ttl_seconds: 300,
            session_ttl_seconds: 86400,
            default_world_capacity: 32,
        }
    }

    #[test]
    fn test_issue_and_validate_session() {
        let auth = AuthService::new(&test_config());

        let token = auth
            .issue_session("usr_123", "Alice", false)
            .expect("Should issue session");

        let claims = auth.validate_session(&token).expect("Should validate");

        assert_eq!(claims.sub, "usr_123");
        assert_eq!(claims.display, "Alice");
        assert!(!claims.staff);
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_staff_flag_round_trips() {
        let auth = AuthService::new(&test_config());
        let token = auth.issue_session("usr_admin", "Mod", true).unwrap();
        assert!(auth.validate_session(&token).unwrap().staff);
    }

    #[test]
    fn test_invalid_session_rejected() {
        let auth = AuthService::new(&test_config());
        assert!(auth.validate_session("not-a-token").is_err());
    }
}
