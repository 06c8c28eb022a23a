//! C6: RTP Forwarder. Reads RTP from a remote (publisher) track, strips
//! header extensions that negotiated SDP may not carry for the forwarded
//! leg, and writes to the paired local track that every viewer PC's sender
//! points at.

use crate::id_types::TrackId;
use crate::room::Streamer;
use crate::signaling::trigger_viewer_signaling;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Spawns the forwarding loop for one newly-received remote track. Registers
/// the track with the Track Manager first (so a viewer joining mid-copy
/// already sees it in the next reconcile), then copies packets until the
/// remote read fails.
pub fn spawn_rtp_forwarder(remote: Arc<TrackRemote>, streamer: Arc<Streamer>) {
    tokio::spawn(async move {
        let local_track = streamer.add_remote_track(&remote).await;
        trigger_viewer_signaling(streamer.clone());

        let track_id = TrackId::from(remote.id());
        let media_label = if remote.kind() == webrtc::rtp_transceiver::rtp_codec::RTPCodecType::Video {
            "video"
        } else {
            "audio"
        };

        loop {
            match remote.read_rtp().await {
                Ok((mut packet, _attrs)) => {
                    // Prevents leaking one-byte header extensions that the
                    // downstream negotiated SDP may not allow.
                    packet.header.extension = false;
                    packet.header.extensions.clear();
                    if let Err(err) = local_track.write_rtp(&packet).await {
                        crate::metrics::SFU_PACKETS_DROPPED_TOTAL
                            .with_label_values(&["write_failed"])
                            .inc();
                        tracing::warn!(track_id = %track_id, error = %err, "failed to forward RTP packet");
                        continue;
                    }
                    crate::metrics::SFU_PACKETS_FORWARDED_TOTAL
                        .with_label_values(&[media_label])
                        .inc();
                }
                Err(_) => break,
            }
        }

        // Do not close the PC here — that is the connection-state-change
        // callback's job (§4.7).
        streamer.remove_track(&track_id).await;
        trigger_viewer_signaling(streamer);
    });
}
