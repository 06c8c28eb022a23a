//! C3: Peer Registry. Per-streamer lists of publisher and subscriber peer
//! connections: append, prune-closed, cleanup-on-shutdown.

use crate::room::{PeerConnectionState, Streamer};
use std::sync::Arc;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

impl Streamer {
    pub async fn add_publisher_pc(&self, pc: Arc<PeerConnectionState>) {
        self.inner.write().await.publisher_pcs.push(pc);
    }

    pub async fn add_viewer_pc(&self, pc: Arc<PeerConnectionState>) {
        self.inner.write().await.viewer_pcs.push(pc);
    }

    /// Removes PCs whose `connectionState == closed` (I4). Returns whether
    /// anything was actually dropped from each list, so callers know
    /// whether a re-signal is warranted.
    pub async fn prune_closed(&self) -> (bool, bool) {
        let mut inner = self.inner.write().await;
        let before_pub = inner.publisher_pcs.len();
        let before_view = inner.viewer_pcs.len();

        let mut kept_pub = Vec::with_capacity(before_pub);
        for pc in inner.publisher_pcs.drain(..) {
            if pc.pc.connection_state() != RTCPeerConnectionState::Closed {
                kept_pub.push(pc);
            }
        }
        inner.publisher_pcs = kept_pub;

        let mut kept_view = Vec::with_capacity(before_view);
        for pc in inner.viewer_pcs.drain(..) {
            if pc.pc.connection_state() != RTCPeerConnectionState::Closed {
                kept_view.push(pc);
            }
        }
        inner.viewer_pcs = kept_view;

        (
            inner.publisher_pcs.len() != before_pub,
            inner.viewer_pcs.len() != before_view,
        )
    }

    pub async fn publisher_pcs_snapshot(&self) -> Vec<Arc<PeerConnectionState>> {
        self.inner.read().await.publisher_pcs.clone()
    }

    pub async fn viewer_pcs_snapshot(&self) -> Vec<Arc<PeerConnectionState>> {
        self.inner.read().await.viewer_pcs.clone()
    }

    /// Closes every PC and its WS, clears both lists and all track maps.
    pub async fn cleanup(&self) {
        let mut inner = self.inner.write().await;
        for pc in inner.publisher_pcs.drain(..) {
            pc.writer.close().await;
            let _ = pc.pc.close().await;
        }
        for pc in inner.viewer_pcs.drain(..) {
            pc.writer.close().await;
            let _ = pc.pc.close().await;
        }
        inner.video_tracks.clear();
        inner.audio_tracks.clear();
    }
}
