use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::{CreateWorldRequest, World, WorldResponse};
use crate::state::AppState;

/// World routes
pub fn world_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_worlds).post(create_world))
        .route("/{world_id}", get(get_world))
}

/// POST /api/v1/worlds - Create a new world
async fn create_world(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateWorldRequest>,
) -> Result<Json<WorldResponse>> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("World name is required".to_string()));
    }
    if request.name.len() > 100 {
        return Err(AppError::BadRequest(
            "World name must be at most 100 characters".to_string(),
        ));
    }

    let world = World::new(
        user.id,
        request.name,
        request.description,
        request
            .capacity
            .filter(|c| *c > 0)
            .unwrap_or(state.config.default_world_capacity),
        request.release_status,
    );

    state.worlds.create_world(&world).await?;

    Ok(Json(world.into()))
}

#[derive(serde::Deserialize)]
struct ListWorldsQuery {
    limit: Option<usize>,
}

/// GET /api/v1/worlds - List recent worlds
async fn list_worlds(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListWorldsQuery>,
) -> Result<Json<Vec<WorldResponse>>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let worlds = state.worlds.list_worlds(limit).await?;
    Ok(Json(worlds.into_iter().map(WorldResponse::from).collect()))
}

/// GET /api/v1/worlds/:world_id - Get world information
async fn get_world(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(world_id): Path<String>,
) -> Result<Json<WorldResponse>> {
    let world = state
        .worlds
        .get_world(&world_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("World {} not found", world_id)))?;

    Ok(Json(world.into()))
}
