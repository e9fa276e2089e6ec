use serde::{Deserialize, Serialize};

/// Authenticated user identity, resolved upstream of the core.
///
/// The core never loads user records itself; the session layer hands it this
/// opaque reference and the relationship lookups do the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub display_name: String,
    pub is_staff: bool,
}

/// Session token claims (platform login, not the join token)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // user_id
    pub display: String,
    #[serde(default)]
    pub staff: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Response after a successful instance join.
///
/// `version` marks the token wire format; new versions are additive only.
#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub token: String,
    pub version: u32,
}
