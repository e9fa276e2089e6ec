use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::access::{
    can_join, AccessDecision, AccessError, DenialReason, GroupMembership, PresenceProvider,
    RelationshipProvider,
};
use crate::config::Config;
use crate::location::Location;
use crate::models::{UserRef, World};

/// Wire-format version of the join token. Additive only.
pub const JOIN_TOKEN_VERSION: u32 = 1;

/// Claims embedded in a join token.
///
/// The external real-time transport re-verifies signature and expiry on its
/// own; nothing here assumes a shared live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClaims {
    pub sub: String, // user_id
    pub world: String,
    pub instance: String, // canonical location string
    pub ip: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("token signing failed: {0}")]
pub struct SigningError(pub String);

/// Seam between issuance and the signing key, so issuance logic can be
/// tested without key material.
pub trait JoinSigner: Send + Sync {
    fn sign(&self, claims: &JoinClaims) -> Result<String, SigningError>;
}

/// Signs and verifies join tokens with the process-held key.
///
/// The key is loaded once at startup and never mutated or logged.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: u64,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            ttl_seconds: config.join_token_ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Verify a join token the way the external transport does.
    pub fn verify(&self, token: &str) -> Result<JoinClaims, jsonwebtoken::errors::Error> {
        let data = decode::<JoinClaims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

impl JoinSigner for TokenIssuer {
    fn sign(&self, claims: &JoinClaims) -> Result<String, SigningError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| SigningError(e.to_string()))
    }
}

/// A successfully issued join token
#[derive(Debug, Clone)]
pub struct SignedJoinToken {
    pub token: String,
    pub version: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("access denied")]
    AccessDenied(DenialReason),

    #[error("world record unavailable")]
    WorldUnavailable,

    #[error("token signing failed")]
    SigningFailure(#[from] SigningError),

    #[error("relationship lookup failed: {0}")]
    RelationshipLookupFailed(String),
}

impl From<AccessError> for JoinError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::RelationshipLookupFailed(msg) => JoinError::RelationshipLookupFailed(msg),
        }
    }
}

/// Issue a signed join token for `user` entering the instance at `location`.
///
/// Access is re-validated first; on denial no signing call is made and no
/// token escapes. `exp - iat` equals the issuer's configured TTL.
pub async fn issue_join_token(
    signer: &impl JoinSigner,
    ttl_seconds: u64,
    user: &UserRef,
    world: &World,
    caller_ip: &str,
    location: &Location,
    relationships: &impl RelationshipProvider,
    groups: &impl GroupMembership,
    presence: &impl PresenceProvider,
) -> Result<SignedJoinToken, JoinError> {
    match can_join(location, user, world, relationships, groups, presence).await? {
        AccessDecision::Allowed => {}
        AccessDecision::Denied(reason) => return Err(JoinError::AccessDenied(reason)),
    }

    let now = Utc::now().timestamp();
    let claims = JoinClaims {
        sub: user.id.clone(),
        world: world.world_id.clone(),
        instance: location.encode(),
        ip: caller_ip.to_string(),
        iat: now,
        exp: now + ttl_seconds as i64,
    };

    let token = signer.sign(&claims)?;

    tracing::info!(
        user_id = %user.id,
        world_id = %world.world_id,
        instance = %claims.instance,
        "Join token issued"
    );

    Ok(SignedJoinToken {
        token,
        version: JOIN_TOKEN_VERSION,
    })
}
