//! C4: Room Registry. Process-wide `roomID -> Room` map with concurrent
//! access; create/lookup/remove, backed by a `DashMap` so individual room
//! lookups don't serialize on one coarse lock (the reader-writer lock named
//! in §5 is the per-Room and per-Streamer locks nested underneath this map,
//! not the map itself).

use crate::id_types::{RoomId, UserId};
use crate::presence::PresenceStore;
use crate::room::Room;
use crate::types::RoomMap;
use std::sync::Arc;

pub struct RoomRegistry {
    rooms: RoomMap,
    presence: Arc<dyn PresenceStore>,
}

impl RoomRegistry {
    pub fn new(presence: Arc<dyn PresenceStore>) -> Arc<Self> {
        Arc::new(Self {
            rooms: Arc::new(dashmap::DashMap::new()),
            presence,
        })
    }

    /// Idempotent; also auto-creates a streamer for `created_by` and
    /// notifies the presence store. Returns the room whether it already
    /// existed or was just created (R3).
    pub async fn create(&self, room_id: &RoomId, created_by: &UserId) -> Arc<Room> {
        if let Some(existing) = self.rooms.get(room_id) {
            return existing.clone();
        }
        let room = Room::new(room_id.clone(), created_by.clone());
        room.get_or_create_streamer(created_by).await;
        self.rooms.insert(room_id.clone(), room.clone());
        if let Err(err) = self.presence.create_room(room_id, created_by).await {
            tracing::warn!(room_id = %room_id, error = %err, "presence store create_room failed");
        }
        crate::metrics::SFU_ACTIVE_ROOMS.inc();
        room
    }

    pub fn get(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(room_id).map(|r| r.clone())
    }

    /// Calls cleanup on every streamer, notifies the presence store, removes
    /// from the map.
    pub async fn delete(&self, room_id: &RoomId) {
        let Some((_, room)) = self.rooms.remove(room_id) else {
            return;
        };
        for streamer in room.streamers_snapshot().await {
            streamer.cleanup().await;
        }
        if let Err(err) = self.presence.delete_room(room_id).await {
            tracing::warn!(room_id = %room_id, error = %err, "presence store delete_room failed");
        }
        crate::metrics::SFU_ACTIVE_ROOMS.dec();
    }

    pub fn rooms_snapshot(&self) -> Vec<Arc<Room>> {
        self.rooms.iter().map(|e| e.value().clone()).collect()
    }

    pub fn presence(&self) -> &Arc<dyn PresenceStore> {
        &self.presence
    }
}
