use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::access::{GroupMembership, LookupError, PresenceProvider, RelationshipProvider};

/// Redis-backed social graph, group membership, and instance occupancy.
///
/// The friend sets, group sets, and occupancy sets are written by the social
/// and presence services; this backend only reads them. Keys:
///   friends:{user_id}              SET of accepted friend user ids
///   group:{group_id}:members       SET of member user ids
///   instance:{location}:occupants  SET of user ids currently connected
#[derive(Clone)]
pub struct SocialRepository {
    pool: Pool,
}

impl SocialRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, LookupError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| LookupError(e.to_string()))?;
        conn.sismember(key, member)
            .await
            .map_err(|e| LookupError(e.to_string()))
    }
}

#[async_trait]
impl RelationshipProvider for SocialRepository {
    async fn are_friends(&self, owner: &str, user: &str) -> Result<bool, LookupError> {
        self.set_contains(&format!("friends:{}", owner), user).await
    }

    async fn friends_of(&self, user: &str) -> Result<Vec<String>, LookupError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| LookupError(e.to_string()))?;
        conn.smembers(format!("friends:{}", user))
            .await
            .map_err(|e| LookupError(e.to_string()))
    }
}

#[async_trait]
impl GroupMembership for SocialRepository {
    async fn is_member(&self, user: &str, group: &str) -> Result<bool, LookupError> {
        self.set_contains(&format!("group:{}:members", group), user)
            .await
    }
}

#[async_trait]
impl PresenceProvider for SocialRepository {
    async fn occupant_count(&self, location: &str) -> Result<usize, LookupError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| LookupError(e.to_string()))?;
        conn.scard(format!("instance:{}:occupants", location))
            .await
            .map_err(|e| LookupError(e.to_string()))
    }
}
