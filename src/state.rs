//! Shared axum application state: the room registry (which itself owns the
//! presence-store handle) plus the user-profile lookup that HTTP and
//! WebSocket handlers both need for display-name/avatar fan-outs.

use crate::presence::UserProfileStore;
use crate::room_registry::RoomRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub user_profiles: Arc<dyn UserProfileStore>,
    /// Base URL used to format publisher start-stream links (`Config::base_link`).
    pub base_link: Arc<str>,
}
