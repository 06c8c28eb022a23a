use serde::{Deserialize, Serialize};

/// The single WebSocket wire frame shape: `data` is itself a JSON string,
/// not a nested object, matching the original signaling protocol exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub event: String,
    pub data: String,
}

impl Message {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    pub fn offer(sdp_json: String) -> Self {
        Self::new("offer", sdp_json)
    }

    pub fn candidate(candidate_json: String) -> Self {
        Self::new("candidate", candidate_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_round_trip() {
        let msg = Message::new("answer", "{}");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event, "answer");
        assert_eq!(back.data, "{}");
    }
}
