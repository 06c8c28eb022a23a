use std::fmt;
use std::sync::Arc;

/// A strongly typed identifier for a Room.
/// Wraps an `Arc<String>` for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(pub Arc<String>);

/// A strongly typed identifier for a streamer (also used as a viewer user-id).
/// Wraps an `Arc<String>` for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(pub Arc<String>);

/// A strongly typed identifier for an RTP track.
/// Wraps an `Arc<String>` for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(pub Arc<String>);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        RoomId(Arc::new(s))
    }
}
impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        RoomId(Arc::new(s.to_string()))
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(Arc::new(s))
    }
}
impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(Arc::new(s.to_string()))
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        TrackId(Arc::new(s))
    }
}
impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        TrackId(Arc::new(s.to_string()))
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The two media kinds a streamer publishes; mirrors the `videoTracks`/
/// `audioTracks` split in the data model rather than reaching for webrtc's
/// own `RTPCodecType` at the registry layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}
