use crate::id_types::RoomId;
use crate::room::Room;
use dashmap::DashMap;
use std::sync::Arc;

/// Process-wide mapping `roomID -> Room` (C4), concurrently readable and
/// writable without a single coarse lock around the whole registry.
pub type RoomMap = Arc<DashMap<RoomId, Arc<Room>>>;
