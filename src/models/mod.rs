pub mod user;
pub mod world;

pub use user::{JoinResponse, SessionClaims, UserRef};
pub use world::{CreateWorldRequest, ReleaseStatus, World, WorldResponse};
