//! C2: Track Manager. Per-streamer operations on `videoTracks`/
//! `audioTracks`, serialized on the streamer's own lock, plus the derived
//! `publishedTracks` view (§9 design note: membership is computed from
//! enable-flags/kind-maps/paused, never imperatively duplicated, so I2/I3
//! hold structurally rather than by convention).

use crate::id_types::{TrackId, TrackKind};
use crate::room::Streamer;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_remote::TrackRemote;

impl Streamer {
    /// Constructs a new local static RTP track carrying the remote track's
    /// codec, id, and stream-id; inserts it into `videoTracks` or
    /// `audioTracks` by kind. Whether it immediately appears in
    /// `publishedTracks` is entirely a function of the current enable flag
    /// and room-paused state (see `published_tracks`), not something this
    /// method decides.
    pub async fn add_remote_track(&self, remote: &TrackRemote) -> Arc<TrackLocalStaticRTP> {
        let kind = match remote.kind() {
            RTPCodecType::Video => TrackKind::Video,
            _ => TrackKind::Audio,
        };
        let local_track = Arc::new(TrackLocalStaticRTP::new(
            remote.codec().capability,
            remote.id(),
            remote.stream_id(),
        ));
        let track_id = TrackId::from(remote.id());

        let mut inner = self.inner.write().await;
        match kind {
            TrackKind::Video => {
                inner.video_tracks.insert(track_id, local_track.clone());
            }
            TrackKind::Audio => {
                inner.audio_tracks.insert(track_id, local_track.clone());
            }
        }
        local_track
    }

    /// Deletes from both kind maps unconditionally.
    pub async fn remove_track(&self, track_id: &TrackId) {
        let mut inner = self.inner.write().await;
        inner.video_tracks.remove(track_id);
        inner.audio_tracks.remove(track_id);
    }

    /// Flips `cameraEnabled`; returns the new value.
    pub async fn toggle_camera(&self) -> bool {
        let mut inner = self.inner.write().await;
        inner.camera_enabled = !inner.camera_enabled;
        inner.camera_enabled
    }

    /// Flips `microphoneEnabled`; returns the new value.
    pub async fn toggle_microphone(&self) -> bool {
        let mut inner = self.inner.write().await;
        inner.microphone_enabled = !inner.microphone_enabled;
        inner.microphone_enabled
    }

    pub async fn camera_enabled(&self) -> bool {
        self.inner.read().await.camera_enabled
    }

    pub async fn microphone_enabled(&self) -> bool {
        self.inner.read().await.microphone_enabled
    }

    /// The derived `publishedTracks` view: empty whenever the room is
    /// paused (I3), otherwise the union of `videoTracks` (iff
    /// `cameraEnabled`) and `audioTracks` (iff `microphoneEnabled`). This is
    /// `activeTracks()` from §4.2 — a shallow copy, never a live reference,
    /// so callers can snapshot-then-release-lock.
    pub async fn published_tracks(&self) -> HashMap<TrackId, Arc<TrackLocalStaticRTP>> {
        if self.room_paused.load(Ordering::SeqCst) {
            return HashMap::new();
        }
        let inner = self.inner.read().await;
        let mut out = HashMap::new();
        if inner.camera_enabled {
            out.extend(inner.video_tracks.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if inner.microphone_enabled {
            out.extend(inner.audio_tracks.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        out
    }

    pub async fn active_tracks(&self) -> HashMap<TrackId, Arc<TrackLocalStaticRTP>> {
        self.published_tracks().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_types::{RoomId, UserId};
    use crate::room::Room;
    use std::sync::atomic::AtomicBool;
    use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;

    fn test_streamer() -> Arc<Streamer> {
        Streamer::new(
            UserId::from("u1"),
            RoomId::from("r1"),
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[tokio::test]
    async fn test_toggle_camera_round_trip_is_identity() {
        let s = test_streamer();
        assert!(s.camera_enabled().await);
        let after_first = s.toggle_camera().await;
        assert!(!after_first);
        let after_second = s.toggle_camera().await;
        assert!(after_second);
    }

    #[tokio::test]
    async fn test_published_tracks_respects_enable_flags() {
        let s = test_streamer();
        {
            let mut inner = s.inner.write().await;
            inner.video_tracks.insert(
                TrackId::from("vid-1"),
                Arc::new(TrackLocalStaticRTP::new(
                    RTCRtpCodecCapability {
                        mime_type: "video/VP8".into(),
                        ..Default::default()
                    },
                    "vid-1".into(),
                    "stream-1".into(),
                )),
            );
        }
        assert_eq!(s.published_tracks().await.len(), 1);
        s.toggle_camera().await;
        assert_eq!(s.published_tracks().await.len(), 0);
    }

    #[tokio::test]
    async fn test_published_tracks_empty_while_room_paused() {
        let room = Room::new(RoomId::from("r1"), UserId::from("creator"));
        let s = room.get_or_create_streamer(&UserId::from("u1")).await;
        {
            let mut inner = s.inner.write().await;
            inner.audio_tracks.insert(
                TrackId::from("aud-1"),
                Arc::new(TrackLocalStaticRTP::new(
                    RTCRtpCodecCapability {
                        mime_type: "audio/opus".into(),
                        ..Default::default()
                    },
                    "aud-1".into(),
                    "stream-1".into(),
                )),
            );
        }
        assert_eq!(s.published_tracks().await.len(), 1);
        room.set_paused(true);
        assert_eq!(s.published_tracks().await.len(), 0);
        room.set_paused(false);
        assert_eq!(s.published_tracks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_remote_track_round_trip_with_remove() {
        let s = test_streamer();
        // webrtc-rs has no constructor for a standalone TrackRemote outside
        // a live connection; this round-trip instead drives the maps
        // directly to verify R2 (add then remove yields the pre-state).
        let before = s.published_tracks().await.len();
        let track_id = TrackId::from("vid-1");
        {
            let mut inner = s.inner.write().await;
            inner.video_tracks.insert(
                track_id.clone(),
                Arc::new(TrackLocalStaticRTP::new(
                    RTCRtpCodecCapability {
                        mime_type: "video/VP8".into(),
                        ..Default::default()
                    },
                    "vid-1".into(),
                    "stream-1".into(),
                )),
            );
        }
        assert_eq!(s.published_tracks().await.len(), before + 1);
        s.remove_track(&track_id).await;
        assert_eq!(s.published_tracks().await.len(), before);
    }
}
