//! C10: HTTP control surface. Every handler expects a validated caller
//! identity already present in the request (`id`, and for link-returning
//! handlers a `jwt` to embed in the publisher link) — authentication itself
//! is out of scope and assumed to have run upstream.

use crate::error::{SfuError, SfuResult};
use crate::id_types::{RoomId, UserId};
use crate::lifecycle;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CallerQuery {
    pub id: String,
    #[serde(default)]
    pub jwt: String,
}

fn start_stream_link(base_link: &str, room_id: &RoomId, jwt: &str) -> String {
    format!("{base_link}/{room_id}?jwt={jwt}&mode=publisher")
}

pub async fn create_room(
    State(state): State<AppState>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    let room_id = RoomId::from(Uuid::new_v4().to_string());
    let creator = UserId::from(caller.id);
    state.registry.create(&room_id, &creator).await;
    Ok(Json(json!({
        "roomID": room_id.to_string(),
        "startStreamLink": start_stream_link(&state.base_link, &room_id, &caller.jwt),
    })))
}

pub async fn add_streamer(
    State(state): State<AppState>,
    Path((room_id, user_id)): Path<(String, String)>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    let room_id = RoomId::from(room_id);
    let target_user = UserId::from(user_id);
    let caller_id = UserId::from(caller.id);

    let room = state
        .registry
        .get(&room_id)
        .ok_or_else(|| SfuError::RoomNotFound(room_id.to_string()))?;
    if room.created_by != caller_id {
        return Err(SfuError::Unauthorized);
    }

    room.get_or_create_streamer(&target_user).await;
    state
        .registry
        .presence()
        .send_livestream_invitation(&target_user, &room_id, &caller_id)
        .await
        .map_err(SfuError::Upstream)?;

    Ok(Json(json!({"success": true})))
}

pub async fn streamer_link(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    let room_id = RoomId::from(room_id);
    let caller_id = UserId::from(caller.id);

    let room = state
        .registry
        .get(&room_id)
        .ok_or_else(|| SfuError::RoomNotFound(room_id.to_string()))?;
    if room.get_streamer(&caller_id).await.is_none() {
        return Err(SfuError::Unauthorized);
    }

    Ok(Json(json!({
        "startStreamLink": start_stream_link(&state.base_link, &room_id, &caller.jwt),
    })))
}

async fn toggle(
    state: &AppState,
    room_id: RoomId,
    caller_id: UserId,
    field: &str,
) -> SfuResult<Json<Value>> {
    let room = state
        .registry
        .get(&room_id)
        .ok_or_else(|| SfuError::RoomNotFound(room_id.to_string()))?;
    let streamer = room
        .get_streamer(&caller_id)
        .await
        .ok_or_else(|| SfuError::StreamerNotFound(caller_id.to_string(), room_id.to_string()))?;

    let key = format!("{field}_enabled");

    if room.is_paused() {
        let mut body = json!({"success": true});
        body[key] = json!(false);
        return Ok(Json(body));
    }

    let new_value = if field == "camera" {
        streamer.toggle_camera().await
    } else {
        streamer.toggle_microphone().await
    };
    crate::signaling::trigger_both(streamer);

    let mut body = json!({"success": true});
    body[key] = json!(new_value);
    Ok(Json(body))
}

pub async fn toggle_camera(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    toggle(&state, RoomId::from(room_id), UserId::from(caller.id), "camera").await
}

pub async fn toggle_microphone(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    toggle(&state, RoomId::from(room_id), UserId::from(caller.id), "microphone").await
}

pub async fn pause_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    let room_id = RoomId::from(room_id);
    let caller_id = UserId::from(caller.id);
    let room = state
        .registry
        .get(&room_id)
        .ok_or_else(|| SfuError::RoomNotFound(room_id.to_string()))?;
    if room.created_by != caller_id {
        return Err(SfuError::Unauthorized);
    }
    lifecycle::pause_room(&state.registry, &room_id).await;
    Ok(Json(json!({"success": true})))
}

pub async fn resume_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    let room_id = RoomId::from(room_id);
    let caller_id = UserId::from(caller.id);
    let room = state
        .registry
        .get(&room_id)
        .ok_or_else(|| SfuError::RoomNotFound(room_id.to_string()))?;
    if room.created_by != caller_id {
        return Err(SfuError::Unauthorized);
    }
    lifecycle::resume_room(&state.registry, &room_id).await;
    Ok(Json(json!({"success": true})))
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    let room_id = RoomId::from(room_id);
    let user_id = UserId::from(caller.id);
    let profile = state
        .user_profiles
        .get_user_by_id(&user_id)
        .await
        .map_err(SfuError::Upstream)?;
    state
        .registry
        .presence()
        .add_watcher(&room_id, &user_id, &profile.username, &profile.avatar)
        .await
        .map_err(SfuError::Upstream)?;
    Ok(Json(json!({"success": true})))
}

pub async fn leave_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(caller): Query<CallerQuery>,
) -> SfuResult<Json<Value>> {
    let room_id = RoomId::from(room_id);
    let user_id = UserId::from(caller.id);
    state
        .registry
        .presence()
        .remove_watcher(&room_id, &user_id)
        .await
        .map_err(SfuError::Upstream)?;
    Ok(Json(json!({"success": true})))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_room))
        .route("/add-streamer/:roomID/:userId", post(add_streamer))
        .route("/streamer-link/:roomID", get(streamer_link))
        .route("/:roomID/camera/toggle", post(toggle_camera))
        .route("/:roomID/microphone/toggle", post(toggle_microphone))
        .route("/:roomID/pause", post(pause_room))
        .route("/:roomID/resume", post(resume_room))
        .route("/join/:roomID", post(join_room))
        .route("/leave/:roomID", post(leave_room))
        .route("/websocket/stream/:roomID", get(crate::ws_handler::stream_handler))
        .route(
            "/websocket/watch/:roomID/:streamerID",
            get(crate::ws_handler::watch_handler),
        )
        .with_state(state)
}
