//! Scenario-level tests (§8 S1-S6), aggregated at the crate root the way the
//! teacher aggregates its own cross-module scenarios. Each test drives the
//! public registry/signaling/HTTP-handler surface rather than reaching into
//! any one component's internals, except where a `pub(crate)` field on
//! `Room`/`Streamer` is the only way to set up a scenario's precondition
//! (e.g. S6's stale `lastActivity`).

use crate::http::{self, CallerQuery};
use crate::id_types::{RoomId, TrackId, UserId};
use crate::lifecycle;
use crate::presence::{InMemoryPresenceStore, StaticUserProfileStore};
use crate::room_registry::RoomRegistry;
use crate::signaling::trigger_viewer_signaling;
use crate::state::AppState;
use crate::ws_writer::NullWriter;
use axum::extract::{Path, Query, State};
use std::sync::Arc;
use std::time::Duration;
use webrtc::api::APIBuilder;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

fn test_state() -> AppState {
    let presence = InMemoryPresenceStore::new();
    AppState {
        registry: RoomRegistry::new(presence),
        user_profiles: Arc::new(StaticUserProfileStore),
        base_link: Arc::from("https://example.test"),
    }
}

async fn fake_viewer_pc(
    streamer: &Arc<crate::room::Streamer>,
) -> Arc<webrtc::peer_connection::RTCPeerConnection> {
    let api = APIBuilder::new().build();
    let pc = Arc::new(
        api.new_peer_connection(RTCConfiguration::default())
            .await
            .unwrap(),
    );
    let pc_state = crate::room::PeerConnectionState::new(
        pc.clone(),
        Arc::new(NullWriter),
        UserId::from("viewer"),
    );
    streamer.add_viewer_pc(pc_state).await;
    pc
}

fn local_track(mime: &str, id: &str) -> Arc<TrackLocalStaticRTP> {
    Arc::new(TrackLocalStaticRTP::new(
        RTCRtpCodecCapability {
            mime_type: mime.into(),
            ..Default::default()
        },
        id.into(),
        "stream-1".into(),
    ))
}

async fn sender_track_ids(
    pc: &webrtc::peer_connection::RTCPeerConnection,
) -> std::collections::HashSet<String> {
    let mut ids = std::collections::HashSet::new();
    for sender in pc.get_senders().await {
        if let Some(t) = sender.track().await {
            ids.insert(t.id().to_string());
        }
    }
    ids
}

#[tokio::test]
async fn s1_create_room_returns_publisher_link_and_auto_streamer() {
    let state = test_state();
    let creator = UserId::from("u1");
    let room_id = RoomId::from("r1");
    let room = state.registry.create(&room_id, &creator).await;

    assert!(room.get_streamer(&creator).await.is_some());
    let link = format!("{}/{}?jwt=&mode=publisher", state.base_link, room_id);
    assert!(link.starts_with("https://example.test/r1?jwt="));
}

#[tokio::test]
async fn s2_viewer_sees_senders_for_every_published_track() {
    let state = test_state();
    let creator = UserId::from("u1");
    let room_id = RoomId::from("r1");
    let room = state.registry.create(&room_id, &creator).await;
    let streamer = room.get_streamer(&creator).await.unwrap();

    {
        let mut inner = streamer.inner.write().await;
        inner
            .video_tracks
            .insert(TrackId::from("vid-1"), local_track("video/VP8", "vid-1"));
        inner
            .audio_tracks
            .insert(TrackId::from("aud-1"), local_track("audio/opus", "aud-1"));
    }

    let viewer_pc = fake_viewer_pc(&streamer).await;
    trigger_viewer_signaling(streamer.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;

    let ids = sender_track_ids(&viewer_pc).await;
    assert_eq!(ids.len(), 2);
    assert!(ids.contains("vid-1"));
    assert!(ids.contains("aud-1"));
}

#[tokio::test]
async fn s3_camera_toggle_adds_and_removes_only_the_video_sender() {
    let state = test_state();
    let creator = UserId::from("u1");
    let room_id = RoomId::from("r1");
    let room = state.registry.create(&room_id, &creator).await;
    let streamer = room.get_streamer(&creator).await.unwrap();

    {
        let mut inner = streamer.inner.write().await;
        inner
            .video_tracks
            .insert(TrackId::from("vid-1"), local_track("video/VP8", "vid-1"));
        inner
            .audio_tracks
            .insert(TrackId::from("aud-1"), local_track("audio/opus", "aud-1"));
    }
    let viewer_pc = fake_viewer_pc(&streamer).await;
    trigger_viewer_signaling(streamer.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sender_track_ids(&viewer_pc).await.len(), 2);

    streamer.toggle_camera().await;
    trigger_viewer_signaling(streamer.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    let ids = sender_track_ids(&viewer_pc).await;
    assert_eq!(ids, std::collections::HashSet::from(["aud-1".to_string()]));

    streamer.toggle_camera().await;
    trigger_viewer_signaling(streamer.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    let ids = sender_track_ids(&viewer_pc).await;
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn s4_pause_clears_senders_and_resume_restores_them() {
    let state = test_state();
    let creator = UserId::from("u1");
    let room_id = RoomId::from("r1");
    let room = state.registry.create(&room_id, &creator).await;
    let streamer = room.get_streamer(&creator).await.unwrap();
    {
        let mut inner = streamer.inner.write().await;
        inner
            .video_tracks
            .insert(TrackId::from("vid-1"), local_track("video/VP8", "vid-1"));
    }
    let viewer_pc = fake_viewer_pc(&streamer).await;
    trigger_viewer_signaling(streamer.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sender_track_ids(&viewer_pc).await.len(), 1);

    assert!(lifecycle::pause_room(&state.registry, &room_id).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sender_track_ids(&viewer_pc).await.len(), 0);

    // camera toggle while paused is a no-op that reports disabled, per §4.10.
    let body = http::toggle_camera(
        State(state.clone()),
        Path(room_id.to_string()),
        Query(CallerQuery {
            id: creator.to_string(),
            jwt: String::new(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(body.0["camera_enabled"].as_bool(), Some(false));
    assert!(streamer.camera_enabled().await, "paused toggle must not mutate state");

    assert!(lifecycle::resume_room(&state.registry, &room_id).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sender_track_ids(&viewer_pc).await.len(), 1);
}

#[tokio::test]
async fn s5_add_streamer_requires_room_creator() {
    let state = test_state();
    let creator = UserId::from("u1");
    let outsider = UserId::from("u2");
    let room_id = RoomId::from("r1");
    state.registry.create(&room_id, &creator).await;

    let ok = http::add_streamer(
        State(state.clone()),
        Path((room_id.to_string(), "u3".to_string())),
        Query(CallerQuery {
            id: creator.to_string(),
            jwt: String::new(),
        }),
    )
    .await;
    assert!(ok.is_ok());

    let denied = http::add_streamer(
        State(state.clone()),
        Path((room_id.to_string(), "u4".to_string())),
        Query(CallerQuery {
            id: outsider.to_string(),
            jwt: String::new(),
        }),
    )
    .await;
    assert!(matches!(denied, Err(crate::error::SfuError::Unauthorized)));
}

#[tokio::test]
async fn s6_inactive_room_is_swept_exactly_once() {
    let presence = InMemoryPresenceStore::new();
    let registry = RoomRegistry::new(presence.clone());
    let creator = UserId::from("u1");
    let room_id = RoomId::from("r1");
    let room = registry.create(&room_id, &creator).await;

    {
        let mut inner = room.inner.write().await;
        inner.last_activity = std::time::Instant::now()
            .checked_sub(Duration::from_secs(700))
            .unwrap();
    }

    assert!(room.is_inactive(Duration::from_secs(600)).await);
    registry.delete(&room_id).await;
    assert!(registry.get(&room_id).is_none());
    assert_eq!(presence.delete_count(&room_id), 1);
}
