use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::error::{AppError, Result};
use crate::models::World;

const WORLD_INDEX_KEY: &str = "worlds:index";

/// World repository for Redis operations
#[derive(Clone)]
pub struct WorldRepository {
    pool: Pool,
}

impl WorldRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new world record
    pub async fn create_world(&self, world: &World) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let key = format!("world:{}", world.world_id);
        let json = serde_json::to_string(world)?;

        redis::pipe()
            .set(&key, &json)
            .lpush(WORLD_INDEX_KEY, &world.world_id)
            .query_async::<()>(&mut *conn)
            .await?;

        tracing::info!(world_id = %world.world_id, name = %world.name, "World created");
        Ok(())
    }

    /// Get a world by ID. `Ok(None)` means the record does not exist;
    /// `Err` means the store itself could not answer.
    pub async fn get_world(&self, world_id: &str) -> Result<Option<World>> {
        let mut conn = self.pool.get().await?;
        let key = format!("world:{}", world_id);

        let json: Option<String> = conn.get(&key).await?;

        match json {
            Some(data) => {
                let world: World = serde_json::from_str(&data)
                    .map_err(|e| AppError::InternalError(format!("Corrupt world record: {}", e)))?;
                Ok(Some(world))
            }
            None => Ok(None),
        }
    }

    /// List recently created worlds
    pub async fn list_worlds(&self, limit: usize) -> Result<Vec<World>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        let ids: Vec<String> = conn.lrange(WORLD_INDEX_KEY, 0, limit as isize - 1).await?;

        let mut worlds = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(world) = self.get_world(&id).await? {
                worlds.push(world);
            }
        }

        Ok(worlds)
    }

    /// Check Redis connectivity
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.pool.get().await?;
        let pong: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(pong == "PONG")
    }
}
