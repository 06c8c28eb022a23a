//! C7: WS Message Loop. Owns the publisher and viewer WebSocket upgrade
//! handlers: peer connection construction, the `on_track`/`on_ice_candidate`/
//! connection-state-change callbacks, and the inbound JSON message loop
//! (`candidate`, `answer`).

use crate::id_types::{RoomId, UserId};
use crate::media_setup::MediaSetup;
use crate::message::Message;
use crate::room::PeerConnectionState;
use crate::rtp_forwarder::spawn_rtp_forwarder;
use crate::signaling::{trigger_publisher_signaling, trigger_viewer_signaling};
use crate::state::AppState;
use crate::ws_writer::{write_json, ThreadSafeWriter, WsWriter};
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub id: String,
}

pub async fn stream_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(auth): Query<AuthQuery>,
    State(state): State<AppState>,
) -> Response {
    let room_id = RoomId::from(room_id);
    let user_id = UserId::from(auth.id);
    ws.on_upgrade(move |socket| handle_publisher_socket(socket, state, room_id, user_id))
}

pub async fn watch_handler(
    ws: WebSocketUpgrade,
    Path((room_id, streamer_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    let room_id = RoomId::from(room_id);
    let streamer_id = UserId::from(streamer_id);
    ws.on_upgrade(move |socket| handle_viewer_socket(socket, state, room_id, streamer_id))
}

async fn new_peer_connection() -> Option<Arc<RTCPeerConnection>> {
    let api = MediaSetup::create_webrtc_api();
    match api.new_peer_connection(MediaSetup::get_rtc_config()).await {
        Ok(pc) => {
            let pc = Arc::new(pc);
            if let Err(err) = MediaSetup::add_recvonly_transceivers(&pc).await {
                tracing::warn!(error = %err, "failed to add recvonly transceivers");
                return None;
            }
            Some(pc)
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to create peer connection");
            None
        }
    }
}

fn install_ice_candidate_handler(pc: &Arc<RTCPeerConnection>, writer: Arc<dyn WsWriter>) {
    pc.on_ice_candidate(Box::new(move |candidate| {
        let writer = writer.clone();
        Box::pin(async move {
            let Some(candidate) = candidate else {
                return;
            };
            let Ok(init) = candidate.to_json() else {
                return;
            };
            let Ok(json) = serde_json::to_string(&init) else {
                return;
            };
            if let Err(err) = write_json(writer.as_ref(), &Message::candidate(json)).await {
                tracing::warn!(error = %err, "failed to send ICE candidate to peer");
            }
        })
    }));
}

/// Installs the connection-state-change handler (§4.7): `failed` closes the
/// PC; `closed` prunes the streamer's lists and re-runs the appropriate
/// signaling fan-out, notifying the presence store when a publisher leaves.
fn install_connection_state_handler(
    pc: Arc<RTCPeerConnection>,
    state: AppState,
    room_id: RoomId,
    streamer_id: UserId,
    is_publisher: bool,
) {
    pc.on_peer_connection_state_change(Box::new(move |new_state| {
        let pc = pc.clone();
        let state = state.clone();
        let room_id = room_id.clone();
        let streamer_id = streamer_id.clone();
        Box::pin(async move {
            match new_state {
                RTCPeerConnectionState::Failed => {
                    let _ = pc.close().await;
                }
                RTCPeerConnectionState::Closed => {
                    let Some(room) = state.registry.get(&room_id) else {
                        return;
                    };
                    let Some(streamer) = room.get_streamer(&streamer_id).await else {
                        return;
                    };
                    streamer.prune_closed().await;
                    if is_publisher {
                        if let Err(err) = state
                            .registry
                            .presence()
                            .remove_stream(&room_id, &streamer_id)
                            .await
                        {
                            tracing::warn!(error = %err, "presence store remove_stream failed");
                        }
                        trigger_publisher_signaling(streamer);
                    } else {
                        trigger_viewer_signaling(streamer);
                    }
                }
                _ => {}
            }
        })
    }));
}

async fn handle_publisher_socket(socket: WebSocket, state: AppState, room_id: RoomId, user_id: UserId) {
    let Some(room) = state.registry.get(&room_id) else {
        return;
    };
    let Some(streamer) = room.get_streamer(&user_id).await else {
        return;
    };

    let Some(pc) = new_peer_connection().await else {
        return;
    };

    let (sink, mut stream) = socket.split();
    let writer: Arc<dyn WsWriter> = Arc::new(ThreadSafeWriter::new(sink));
    let pc_state = PeerConnectionState::new(pc.clone(), writer.clone(), user_id.clone());
    streamer.add_publisher_pc(pc_state).await;

    crate::metrics::SFU_ACTIVE_PEERS.inc();
    crate::metrics::SFU_WEBRTC_CONNECTIONS_TOTAL.inc();

    install_ice_candidate_handler(&pc, writer.clone());
    install_connection_state_handler(pc.clone(), state.clone(), room_id.clone(), user_id.clone(), true);

    {
        let streamer_for_track = streamer.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let streamer = streamer_for_track.clone();
            Box::pin(async move {
                spawn_rtp_forwarder(track, streamer);
            })
        }));
    }

    if let Ok(profile) = state.user_profiles.get_user_by_id(&user_id).await {
        if let Err(err) = state
            .registry
            .presence()
            .add_stream(&room_id, &user_id, &profile.username, &profile.avatar)
            .await
        {
            tracing::warn!(error = %err, "presence store add_stream failed");
        }
    }

    trigger_publisher_signaling(streamer);
    run_message_loop(&mut stream, &pc, &room).await;
    crate::metrics::SFU_ACTIVE_PEERS.dec();
}

async fn handle_viewer_socket(socket: WebSocket, state: AppState, room_id: RoomId, streamer_id: UserId) {
    let Some(room) = state.registry.get(&room_id) else {
        return;
    };
    let Some(streamer) = room.get_streamer(&streamer_id).await else {
        return;
    };

    let Some(pc) = new_peer_connection().await else {
        return;
    };

    let (sink, mut stream) = socket.split();
    let writer: Arc<dyn WsWriter> = Arc::new(ThreadSafeWriter::new(sink));
    let pc_state = PeerConnectionState::new(pc.clone(), writer.clone(), streamer_id.clone());
    streamer.add_viewer_pc(pc_state).await;

    crate::metrics::SFU_ACTIVE_PEERS.inc();
    crate::metrics::SFU_WEBRTC_CONNECTIONS_TOTAL.inc();

    install_ice_candidate_handler(&pc, writer.clone());
    install_connection_state_handler(pc.clone(), state.clone(), room_id.clone(), streamer_id.clone(), false);

    trigger_viewer_signaling(streamer.clone());

    run_message_loop(&mut stream, &pc, &room).await;
    crate::metrics::SFU_ACTIVE_PEERS.dec();
}

/// Reads one JSON frame at a time, bumps `room.lastActivity`, and dispatches
/// by `event`. Any read or parse error ends the loop; the caller's
/// connection-state-change handler performs cleanup once the PC notices.
async fn run_message_loop(
    stream: &mut (impl StreamExt<Item = Result<WsMessage, axum::Error>> + Unpin),
    pc: &Arc<RTCPeerConnection>,
    room: &crate::room::Room,
) {
    while let Some(frame) = stream.next().await {
        let Ok(WsMessage::Text(text)) = frame else {
            break;
        };
        room.update_last_activity().await;

        let Ok(msg) = serde_json::from_str::<Message>(&text) else {
            tracing::warn!("received malformed signaling frame");
            continue;
        };

        match msg.event.as_str() {
            "candidate" => {
                let Ok(init) = serde_json::from_str::<RTCIceCandidateInit>(&msg.data) else {
                    tracing::warn!("received malformed ICE candidate");
                    continue;
                };
                if let Err(err) = pc.add_ice_candidate(init).await {
                    tracing::warn!(error = %err, "failed to add ICE candidate");
                }
            }
            "answer" => {
                let Ok(sdp) = serde_json::from_str::<RTCSessionDescription>(&msg.data) else {
                    tracing::warn!("received malformed SDP answer");
                    continue;
                };
                if let Err(err) = pc.set_remote_description(sdp).await {
                    tracing::warn!(error = %err, "failed to set remote description");
                }
            }
            other => {
                tracing::error!(event = %other, "received unknown signaling event");
            }
        }
    }
}
