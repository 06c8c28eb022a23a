//! External collaborators the core consumes but does not implement: the
//! presence store (live-database fan-out for UI) and the user-profile
//! lookup. Both are narrow async traits; a real deployment wires a concrete
//! implementation backed by whatever "live database" and user-store it has.

use crate::id_types::{RoomId, UserId};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub avatar: String,
}

/// The presence store tracks, for UI fan-out purposes, which streams and
/// which viewers are present in a room. Every method call here corresponds
/// 1:1 to an operation named in the external-interfaces section; failures
/// are propagated to the HTTP boundary as 500s and otherwise logged.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    async fn create_room(&self, room_id: &RoomId, created_by: &UserId) -> anyhow::Result<()>;
    async fn delete_room(&self, room_id: &RoomId) -> anyhow::Result<()>;
    async fn add_stream(
        &self,
        room_id: &RoomId,
        streamer_id: &UserId,
        username: &str,
        avatar: &str,
    ) -> anyhow::Result<()>;
    async fn remove_stream(&self, room_id: &RoomId, streamer_id: &UserId) -> anyhow::Result<()>;
    async fn add_watcher(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        username: &str,
        avatar: &str,
    ) -> anyhow::Result<()>;
    async fn remove_watcher(&self, room_id: &RoomId, user_id: &UserId) -> anyhow::Result<()>;
    async fn send_livestream_invitation(
        &self,
        to_user_id: &UserId,
        room_id: &RoomId,
        from_user_id: &UserId,
    ) -> anyhow::Result<()>;
}

/// Looks a user up by id for the username/avatar fan-outs the presence
/// store needs and for the HTTP control surface's `add-streamer`/join/leave
/// handlers.
#[async_trait]
pub trait UserProfileStore: Send + Sync {
    async fn get_user_by_id(&self, id: &UserId) -> anyhow::Result<UserProfile>;
}

/// In-memory fake used by tests and by deployments that have not wired a
/// real presence store yet. Records every call it saw so test assertions
/// can inspect the fan-out (e.g. S6 expects exactly one `delete_room`).
#[derive(Default)]
pub struct InMemoryPresenceStore {
    pub created_rooms: DashMap<RoomId, UserId>,
    pub deleted_rooms: DashMap<RoomId, u32>,
    pub streams: DashMap<(RoomId, UserId), ()>,
    pub watchers: DashMap<(RoomId, UserId), ()>,
}

impl InMemoryPresenceStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delete_count(&self, room_id: &RoomId) -> u32 {
        self.deleted_rooms.get(room_id).map(|v| *v).unwrap_or(0)
    }
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn create_room(&self, room_id: &RoomId, created_by: &UserId) -> anyhow::Result<()> {
        self.created_rooms
            .insert(room_id.clone(), created_by.clone());
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> anyhow::Result<()> {
        self.deleted_rooms
            .entry(room_id.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);
        Ok(())
    }

    async fn add_stream(
        &self,
        room_id: &RoomId,
        streamer_id: &UserId,
        _username: &str,
        _avatar: &str,
    ) -> anyhow::Result<()> {
        self.streams
            .insert((room_id.clone(), streamer_id.clone()), ());
        Ok(())
    }

    async fn remove_stream(&self, room_id: &RoomId, streamer_id: &UserId) -> anyhow::Result<()> {
        self.streams.remove(&(room_id.clone(), streamer_id.clone()));
        Ok(())
    }

    async fn add_watcher(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        _username: &str,
        _avatar: &str,
    ) -> anyhow::Result<()> {
        self.watchers.insert((room_id.clone(), user_id.clone()), ());
        Ok(())
    }

    async fn remove_watcher(&self, room_id: &RoomId, user_id: &UserId) -> anyhow::Result<()> {
        self.watchers.remove(&(room_id.clone(), user_id.clone()));
        Ok(())
    }

    async fn send_livestream_invitation(
        &self,
        _to_user_id: &UserId,
        _room_id: &RoomId,
        _from_user_id: &UserId,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Static fake user-profile store: every id maps to a deterministic profile.
/// Good enough for tests; a real deployment backs this with its own user DB.
pub struct StaticUserProfileStore;

#[async_trait]
impl UserProfileStore for StaticUserProfileStore {
    async fn get_user_by_id(&self, id: &UserId) -> anyhow::Result<UserProfile> {
        Ok(UserProfile {
            id: id.clone(),
            username: id.to_string(),
            avatar: String::new(),
        })
    }
}
