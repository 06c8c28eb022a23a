//! Data model (§3): `Room`, `Streamer`, `PeerConnectionState`. Operations on
//! these types live in their own component files — `track_manager.rs` (C2),
//! `peer_registry.rs` (C3) — following the teacher's one-file-per-component
//! layout; this module only owns construction and the small accessors every
//! component needs.

use crate::id_types::{RoomId, TrackId, UserId};
use crate::ws_writer::WsWriter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

/// A publisher or subscriber peer connection paired with its thread-safe
/// WebSocket writer (C1). Owned by exactly one `Streamer`'s publisher or
/// viewer list.
pub struct PeerConnectionState {
    pub pc: Arc<RTCPeerConnection>,
    pub writer: Arc<dyn WsWriter>,
    /// The streamer this peer connection belongs to, for viewer PCs this is
    /// the streamer it is watching rather than the viewer's own identity.
    pub user_id: UserId,
}

impl PeerConnectionState {
    pub fn new(pc: Arc<RTCPeerConnection>, writer: Arc<dyn WsWriter>, user_id: UserId) -> Arc<Self> {
        Arc::new(Self { pc, writer, user_id })
    }

    pub async fn is_closed(&self) -> bool {
        use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
        self.pc.connection_state() == RTCPeerConnectionState::Closed
    }
}

pub(crate) struct StreamerInner {
    pub video_tracks: HashMap<TrackId, Arc<TrackLocalStaticRTP>>,
    pub audio_tracks: HashMap<TrackId, Arc<TrackLocalStaticRTP>>,
    pub camera_enabled: bool,
    pub microphone_enabled: bool,
    pub publisher_pcs: Vec<Arc<PeerConnectionState>>,
    pub viewer_pcs: Vec<Arc<PeerConnectionState>>,
}

/// A user whose media is (or will be) forwarded. Belongs to exactly one
/// Room; carries the room's `paused` flag by shared handle rather than a
/// back-pointer to the Room itself, so there is no `Room <-> Streamer`
/// reference cycle (the room-id value on `self.room_id` is enough for the
/// rare paths — e.g. the close handler — that need to address the Room
/// through the registry).
pub struct Streamer {
    pub id: UserId,
    pub room_id: RoomId,
    pub(crate) room_paused: Arc<AtomicBool>,
    pub(crate) inner: RwLock<StreamerInner>,
    /// Held for the duration of a publisher-list reconcile (§4.5); a second
    /// trigger queues behind the first instead of racing it onto the same
    /// peer connections (avoids SDP glare from two concurrent offers).
    pub(crate) publisher_signaling_lock: Arc<tokio::sync::Mutex<()>>,
    pub(crate) viewer_signaling_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Streamer {
    pub fn new(id: UserId, room_id: RoomId, room_paused: Arc<AtomicBool>) -> Arc<Self> {
        Arc::new(Self {
            id,
            room_id,
            room_paused,
            inner: RwLock::new(StreamerInner {
                video_tracks: HashMap::new(),
                audio_tracks: HashMap::new(),
                camera_enabled: true,
                microphone_enabled: true,
                publisher_pcs: Vec::new(),
                viewer_pcs: Vec::new(),
            }),
            publisher_signaling_lock: Arc::new(tokio::sync::Mutex::new(())),
            viewer_signaling_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    fn is_room_paused(&self) -> bool {
        self.room_paused.load(Ordering::SeqCst)
    }
}

pub(crate) struct RoomInner {
    pub streamers: HashMap<UserId, Arc<Streamer>>,
    pub last_activity: Instant,
}

/// Process-wide entry for one room: a set of streamers plus activity
/// bookkeeping for the inactivity sweep, and the shared `paused` flag every
/// member Streamer reads when computing its derived `publishedTracks`.
pub struct Room {
    pub id: RoomId,
    pub created_by: UserId,
    paused: Arc<AtomicBool>,
    pub(crate) inner: RwLock<RoomInner>,
}

impl Room {
    pub fn new(id: RoomId, created_by: UserId) -> Arc<Self> {
        Arc::new(Self {
            id,
            created_by,
            paused: Arc::new(AtomicBool::new(false)),
            inner: RwLock::new(RoomInner {
                streamers: HashMap::new(),
                last_activity: Instant::now(),
            }),
        })
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Only pause/resume (§4.9) call this; it is the single place
    /// `room.paused` is ever written.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub(crate) fn paused_handle(&self) -> Arc<AtomicBool> {
        self.paused.clone()
    }

    pub async fn update_last_activity(&self) {
        self.inner.write().await.last_activity = Instant::now();
    }

    pub async fn is_inactive(&self, dur: Duration) -> bool {
        self.inner.read().await.last_activity.elapsed() > dur
    }

    pub async fn get_streamer(&self, id: &UserId) -> Option<Arc<Streamer>> {
        self.inner.read().await.streamers.get(id).cloned()
    }

    /// Idempotent: returns the existing streamer if present.
    pub async fn get_or_create_streamer(&self, id: &UserId) -> Arc<Streamer> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.streamers.get(id) {
            return existing.clone();
        }
        let streamer = Streamer::new(id.clone(), self.id.clone(), self.paused_handle());
        inner.streamers.insert(id.clone(), streamer.clone());
        streamer
    }

    pub async fn remove_streamer(&self, id: &UserId) -> Option<Arc<Streamer>> {
        self.inner.write().await.streamers.remove(id)
    }

    pub async fn streamers_snapshot(&self) -> Vec<Arc<Streamer>> {
        self.inner.read().await.streamers.values().cloned().collect()
    }

    pub async fn streamer_count(&self) -> usize {
        self.inner.read().await.streamers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_streamer_idempotent() {
        let room = Room::new(RoomId::from("r1"), UserId::from("creator"));
        let s1 = room.get_or_create_streamer(&UserId::from("u1")).await;
        let s2 = room.get_or_create_streamer(&UserId::from("u1")).await;
        assert!(Arc::ptr_eq(&s1, &s2));
        assert_eq!(room.streamer_count().await, 1);
    }

    #[tokio::test]
    async fn test_room_pause_flag_shared_with_streamer() {
        let room = Room::new(RoomId::from("r1"), UserId::from("creator"));
        let streamer = room.get_or_create_streamer(&UserId::from("u1")).await;
        assert!(!streamer.is_room_paused());
        room.set_paused(true);
        assert!(streamer.is_room_paused());
    }

    #[tokio::test]
    async fn test_is_inactive() {
        let room = Room::new(RoomId::from("r1"), UserId::from("creator"));
        assert!(!room.is_inactive(Duration::from_secs(600)).await);
        assert!(room.is_inactive(Duration::from_secs(0)).await);
    }
}
