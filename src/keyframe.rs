//! C8: Keyframe Dispatcher. A process-wide ticker fires every 3 seconds and
//! sends one PLI RTCP packet per non-nil receiver across every PC of every
//! room. Also invoked directly for a single reconcile's PC set right after
//! signaling converges (§4.8).

use crate::room::PeerConnectionState;
use crate::room_registry::RoomRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use webrtc::rtcp::payload_feedbacks::picture_loss_indication::PictureLossIndication;

const DISPATCH_INTERVAL: Duration = Duration::from_secs(3);

/// Sends a PLI for every receiver with a non-nil track on `pc`. Best-effort:
/// write failures are swallowed, matching the fire-and-forget ordering
/// guarantee named in §5.
async fn dispatch_keyframes_for_pc(pc_state: &Arc<PeerConnectionState>) {
    for receiver in pc_state.pc.get_receivers().await {
        let Some(track) = receiver.track().await else {
            continue;
        };
        let ssrc = track.ssrc();
        let pli = PictureLossIndication {
            sender_ssrc: 0,
            media_ssrc: ssrc,
        };
        let _ = pc_state
            .pc
            .write_rtcp(&[Box::new(pli)])
            .await;
        crate::metrics::SFU_KEYFRAMES_REQUESTED_TOTAL.inc();
    }
}

pub async fn dispatch_keyframes_for_pcs(pcs: &[Arc<PeerConnectionState>]) {
    for pc_state in pcs {
        dispatch_keyframes_for_pc(pc_state).await;
    }
}

/// Runs the periodic dispatcher until `cancel` fires. Intended to be spawned
/// once at process startup.
pub async fn run_keyframe_dispatcher(registry: Arc<RoomRegistry>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(DISPATCH_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("keyframe dispatcher shutting down");
                return;
            }
            _ = ticker.tick() => {
                for room in registry.rooms_snapshot() {
                    for streamer in room.streamers_snapshot().await {
                        let pubs = streamer.publisher_pcs_snapshot().await;
                        let views = streamer.viewer_pcs_snapshot().await;
                        dispatch_keyframes_for_pcs(&pubs).await;
                        dispatch_keyframes_for_pcs(&views).await;
                    }
                }
            }
        }
    }
}
