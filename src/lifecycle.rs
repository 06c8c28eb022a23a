//! C9: Room Lifecycle & Mute. Pause/resume flip the room-level `paused` flag
//! only — never a per-streamer enable flag — so resuming restores exactly
//! what was visible before pausing (resolves Q1: non-destructive, derived
//! view, see SPEC_FULL.md §14). An inactivity sweep runs on its own ticker
//! and tears down rooms nobody has touched in a while.

use crate::room_registry::RoomRegistry;
use crate::signaling::trigger_both;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const INACTIVITY_SWEEP_INTERVAL: Duration = Duration::from_secs(300);
const INACTIVITY_THRESHOLD: Duration = Duration::from_secs(600);

/// Pauses every streamer's published view in a room: re-signals both the
/// publisher and viewer PC lists for every streamer, which will now see an
/// empty `publishedTracks` (I3) and renegotiate down to zero senders.
pub async fn pause_room(registry: &RoomRegistry, room_id: &crate::id_types::RoomId) -> bool {
    let Some(room) = registry.get(room_id) else {
        return false;
    };
    room.set_paused(true);
    for streamer in room.streamers_snapshot().await {
        trigger_both(streamer);
    }
    true
}

/// Resumes a paused room: flips the flag back and re-signals, which
/// restores exactly the senders each streamer's enable flags/track maps
/// already describe.
pub async fn resume_room(registry: &RoomRegistry, room_id: &crate::id_types::RoomId) -> bool {
    let Some(room) = registry.get(room_id) else {
        return false;
    };
    room.set_paused(false);
    for streamer in room.streamers_snapshot().await {
        trigger_both(streamer);
    }
    true
}

/// Runs until `cancel` fires, deleting any room that has had no activity
/// (§3's `lastActivity`, bumped by every signaling message and join/leave)
/// for longer than `INACTIVITY_THRESHOLD`.
pub async fn run_inactivity_sweep(registry: Arc<RoomRegistry>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(INACTIVITY_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("inactivity sweep shutting down");
                return;
            }
            _ = ticker.tick() => {
                for room in registry.rooms_snapshot() {
                    if room.is_inactive(INACTIVITY_THRESHOLD).await {
                        tracing::info!(room_id = %room.id, "sweeping inactive room");
                        registry.delete(&room.id).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_types::{RoomId, UserId};
    use crate::presence::InMemoryPresenceStore;

    #[tokio::test]
    async fn test_pause_then_resume_restores_published_tracks() {
        let presence = InMemoryPresenceStore::new();
        let registry = RoomRegistry::new(presence);
        let room_id = RoomId::from("r1");
        let creator = UserId::from("creator");
        let room = registry.create(&room_id, &creator).await;
        let streamer = room.get_or_create_streamer(&creator).await;

        assert!(!room.is_paused());
        assert!(pause_room(&registry, &room_id).await);
        assert!(room.is_paused());
        assert_eq!(streamer.published_tracks().await.len(), 0);

        assert!(resume_room(&registry, &room_id).await);
        assert!(!room.is_paused());
    }

    #[tokio::test]
    async fn test_pause_unknown_room_returns_false() {
        let presence = InMemoryPresenceStore::new();
        let registry = RoomRegistry::new(presence);
        assert!(!pause_room(&registry, &RoomId::from("missing")).await);
    }
}
