use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::access::PresenceProvider;
use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::location::{InstanceAccess, Location};
use crate::models::{JoinResponse, World};
use crate::state::AppState;
use crate::token::issue_join_token;

/// Instance routes
pub fn instance_routes() -> Router<AppState> {
    Router::new()
        .route("/{location}", get(get_instance))
        .route("/{location}/join", get(join_instance))
}

/// Caller IP as seen by the platform: trust the proxy header when present,
/// fall back to the socket peer.
fn caller_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string())
}

/// Load the world an instance belongs to. A store failure is surfaced as
/// `WorldUnavailable`, distinct from any access denial.
async fn load_world(state: &AppState, world_id: &str) -> Result<World> {
    state
        .worlds
        .get_world(world_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, world_id = %world_id, "World store lookup failed");
            AppError::WorldUnavailable
        })?
        .ok_or_else(|| AppError::NotFound(format!("World {} not found", world_id)))
}

/// Wire shape of the describe-instance response.
///
/// Non-public instances additionally carry a field named after the instance
/// type (e.g. `"private": "<ownerId>"`); clients key off it, so the dynamic
/// projection of the access variant is kept exactly.
fn instance_response(location: &Location, world: &World, occupants: usize) -> Value {
    let encoded = location.encode();
    let region = location.region.clone().unwrap_or_default();

    let mut resp = json!({
        "id": encoded,
        "location": encoded,
        "instanceId": location.instance_location(),
        "name": location.instance_id,
        "worldId": location.world_id,
        "type": location.access.type_name(),
        "ownerId": location.access.owner_id(),
        "tags": [],
        "active": occupants > 0,
        "full": occupants >= world.capacity as usize,
        "n_users": occupants,
        "capacity": world.capacity,
        "region": region,
        "strict": location.is_strict,
        "canRequestInvite": location.can_request_invite,
    });

    if !matches!(location.access, InstanceAccess::Public) {
        resp.as_object_mut()
            .expect("instance response is an object")
            .insert(
                location.access.type_name().to_string(),
                Value::String(location.access.owner_id().to_string()),
            );
    }

    resp
}

/// GET /api/v1/instances/{location} - Describe an instance
async fn get_instance(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(raw_location): Path<String>,
) -> Result<Json<Value>> {
    let location = Location::parse(&raw_location)?;
    let world = load_world(&state, &location.world_id).await?;

    let occupants = state
        .social
        .occupant_count(&location.encode())
        .await
        .map_err(|e| AppError::RedisError(e.0))?;

    Ok(Json(instance_response(&location, &world, occupants)))
}

/// GET /api/v1/instances/{location}/join - Issue a join token
async fn join_instance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(raw_location): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<JoinResponse>> {
    let location = Location::parse(&raw_location)?;
    let world = load_world(&state, &location.world_id).await?;
    let ip = caller_ip(&headers, &addr);

    let signed = issue_join_token(
        &*state.issuer,
        state.issuer.ttl_seconds(),
        &user,
        &world,
        &ip,
        &location,
        &*state.social,
        &*state.social,
        &*state.social,
    )
    .await?;

    Ok(Json(JoinResponse {
        token: signed.token,
        version: signed.version,
    }))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::ReleaseStatus;

    fn test_world(capacity: u32) -> World {
        World::new(
            "usr_author".to_string(),
            "Test World".to_string(),
            String::new(),
            capacity,
            ReleaseStatus::Public,
        )
    }

    #[test]
    fn test_public_instance_response_has_no_dynamic_key() {
        let location = Location::parse("wrld_abc:12345").unwrap();
        let resp = instance_response(&location, &test_world(16), 0);

        assert_eq!(resp["type"], "public");
        assert_eq!(resp["ownerId"], "");
        assert_eq!(resp["active"], false);
        assert_eq!(resp["full"], false);
        assert!(resp.get("public").is_none());
    }

    #[test]
    fn test_private_instance_response_dynamic_key() {
        let location = Location::parse("wrld_abc:12345~private(usr_1)~strict").unwrap();
        let resp = instance_response(&location, &test_world(16), 3);

        assert_eq!(resp["type"], "private");
        assert_eq!(resp["ownerId"], "usr_1");
        assert_eq!(resp["private"], "usr_1");
        assert_eq!(resp["strict"], true);
        assert_eq!(resp["instanceId"], "12345~private(usr_1)~strict");
        assert_eq!(resp["name"], "12345");
        assert_eq!(resp["n_users"], 3);
        assert_eq!(resp["active"], true);
    }

    #[test]
    fn test_group_instance_response_dynamic_key() {
        let location = Location::parse("wrld_abc:12345~group(grp_9)~region(eu)").unwrap();
        let resp = instance_response(&location, &test_world(2), 2);

        assert_eq!(resp["group"], "grp_9");
        assert_eq!(resp["region"], "eu");
        assert_eq!(resp["full"], true);
    }

    #[test]
    fn test_caller_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let addr: SocketAddr = "192.0.2.1:55000".parse().unwrap();

        assert_eq!(caller_ip(&headers, &addr), "203.0.113.7");
        assert_eq!(caller_ip(&HeaderMap::new(), &addr), "192.0.2.1");
    }
}
