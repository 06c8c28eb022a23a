pub mod config;
pub mod error;
pub mod http;
pub mod id_types;
pub mod keyframe;
pub mod lifecycle;
pub mod logging;
pub mod media_setup;
pub mod message;
pub mod metrics;
pub mod peer_registry;
pub mod presence;
pub mod room;
pub mod room_registry;
pub mod rtp_forwarder;
pub mod signaling;
pub mod state;
pub mod track_manager;
pub mod types;
pub mod ws_handler;
pub mod ws_writer;

pub use media_setup::MediaSetup;
pub use room_registry::RoomRegistry;
pub use state::AppState;

#[cfg(test)]
mod tests;
