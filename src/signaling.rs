//! C5: Signaling Engine. Reconciles a peer connection list against a
//! streamer's published-track snapshot: creates/removes senders, issues a
//! fresh offer, retries on failure up to `MAX_SYNC_ATTEMPTS` rounds, and
//! falls back to a `SYNC_RETRY_DELAY` backstop when a peer connection is
//! stuck in a state (e.g. `have-local-offer`) that rejects a new offer.

use crate::id_types::TrackId;
use crate::keyframe::dispatch_keyframes_for_pcs;
use crate::message::Message;
use crate::room::{PeerConnectionState, Streamer};
use crate::ws_writer::write_json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_local::TrackLocal;

pub const MAX_SYNC_ATTEMPTS: u32 = 25;
pub const SYNC_RETRY_DELAY: Duration = Duration::from_secs(3);

type TrackSnapshot = HashMap<TrackId, Arc<TrackLocalStaticRTP>>;

/// One reconcile round: iterate `pcs` back to front so an in-place removal
/// is safe, drop closed PCs, align each PC's sender set with `tracks`,
/// (re)issue an offer. Returns whether the round was dirty (needs another
/// pass).
async fn attempt_round(pcs: &mut Vec<Arc<PeerConnectionState>>, tracks: &TrackSnapshot) -> bool {
    let mut dirty = false;

    let mut i = pcs.len();
    while i > 0 {
        i -= 1;
        if pcs[i].is_closed().await {
            pcs.remove(i);
            dirty = true;
            continue;
        }

        let pc_state = pcs[i].clone();
        let senders = pc_state.pc.get_senders().await;
        let mut existing_senders = HashMap::new();
        for sender in &senders {
            if let Some(t) = sender.track().await {
                existing_senders.insert(TrackId::from(t.id()), sender.clone());
            }
        }

        for (track_id, sender) in &existing_senders {
            if !tracks.contains_key(track_id) && pc_state.pc.remove_track(sender).await.is_err() {
                dirty = true;
            }
        }

        for (track_id, local_track) in tracks.iter() {
            if !existing_senders.contains_key(track_id) {
                let dyn_track = local_track.clone() as Arc<dyn TrackLocal + Send + Sync>;
                if pc_state.pc.add_track(dyn_track).await.is_err() {
                    dirty = true;
                }
            }
        }

        if create_and_send_offer(&pc_state).await.is_err() {
            dirty = true;
        }
    }

    dirty
}

async fn create_and_send_offer(pc_state: &Arc<PeerConnectionState>) -> anyhow::Result<()> {
    let offer = pc_state.pc.create_offer(None).await?;
    pc_state.pc.set_local_description(offer.clone()).await?;
    let sdp_json = serde_json::to_string(&offer)?;
    write_json(pc_state.writer.as_ref(), &Message::offer(sdp_json)).await?;
    Ok(())
}

/// Runs reconcile rounds until convergence, retrying with the
/// `SYNC_RETRY_DELAY` backstop if 25 rounds pass without settling. Dispatches
/// one keyframe burst for the converged set before returning (§4.8).
async fn run_reconcile(mut pcs: Vec<Arc<PeerConnectionState>>, tracks: TrackSnapshot) {
    loop {
        let mut converged = false;
        for _ in 0..MAX_SYNC_ATTEMPTS {
            if !attempt_round(&mut pcs, &tracks).await {
                converged = true;
                break;
            }
        }
        if converged {
            dispatch_keyframes_for_pcs(&pcs).await;
            return;
        }
        warn!(
            pc_count = pcs.len(),
            "signaling did not converge after {} rounds, backing off", MAX_SYNC_ATTEMPTS
        );
        tokio::time::sleep(SYNC_RETRY_DELAY).await;
    }
}

/// Spawns a fresh task reconciling `streamer`'s publisher-PC list against
/// its own published-track snapshot, serialized behind the streamer's
/// publisher-signaling lock so bursts queue instead of racing.
pub fn trigger_publisher_signaling(streamer: Arc<Streamer>) {
    tokio::spawn(async move {
        let _guard = streamer.publisher_signaling_lock.clone().lock_owned().await;
        let tracks = streamer.published_tracks().await;
        let pcs = streamer.publisher_pcs_snapshot().await;
        run_reconcile(pcs, tracks).await;
    });
}

/// Same as `trigger_publisher_signaling` but over the viewer-PC list.
pub fn trigger_viewer_signaling(streamer: Arc<Streamer>) {
    tokio::spawn(async move {
        let _guard = streamer.viewer_signaling_lock.clone().lock_owned().await;
        let tracks = streamer.published_tracks().await;
        let pcs = streamer.viewer_pcs_snapshot().await;
        run_reconcile(pcs, tracks).await;
    });
}

/// Convenience used by mute/pause/resume handlers, which affect both lists.
pub fn trigger_both(streamer: Arc<Streamer>) {
    trigger_publisher_signaling(streamer.clone());
    trigger_viewer_signaling(streamer);
}
