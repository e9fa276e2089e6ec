use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// World record stored in Redis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub world_id: String,
    pub author_id: String,
    pub name: String,
    pub description: String,
    pub capacity: u32,
    pub release_status: ReleaseStatus,
    pub tags: Vec<String>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl World {
    pub fn new(
        author_id: String,
        name: String,
        description: String,
        capacity: u32,
        release_status: ReleaseStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            world_id: format!("wrld_{}", uuid::Uuid::new_v4()),
            author_id,
            name,
            description,
            capacity,
            release_status,
            tags: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Release status of a world
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Public,
    Private,
    Hidden,
}

/// Request to create a world
#[derive(Debug, Deserialize)]
pub struct CreateWorldRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default = "default_release_status")]
    pub release_status: ReleaseStatus,
}

fn default_release_status() -> ReleaseStatus {
    ReleaseStatus::Private
}

/// World information returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct WorldResponse {
    pub id: String,
    #[serde(rename = "authorId")]
    pub author_id: String,
    pub name: String,
    pub description: String,
    pub capacity: u32,
    #[serde(rename = "releaseStatus")]
    pub release_status: ReleaseStatus,
    pub tags: Vec<String>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<World> for WorldResponse {
    fn from(world: World) -> Self {
        Self {
            id: world.world_id,
            author_id: world.author_id,
            name: world.name,
            description: world.description,
            capacity: world.capacity,
            release_status: world.release_status,
            tags: world.tags,
            version: world.version,
            created_at: world.created_at,
            updated_at: world.updated_at,
        }
    }
}
