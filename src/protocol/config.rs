use crate::{MAX_CONTROL_FRAME_PAYLOAD, MAX_PAYLOAD_LEN};

/// Per-connection protocol limits.
#[derive(Debug, Clone, Copy)]
pub struct WebSocketConfig {
    /// Largest payload a single frame may declare. Frames above this are
    /// rejected before the payload is buffered.
    pub max_payload_len: usize,
    /// Largest payload allowed on a control frame (close, ping, pong).
    pub max_control_frame_payload: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_payload_len: MAX_PAYLOAD_LEN,
            max_control_frame_payload: MAX_CONTROL_FRAME_PAYLOAD,
        }
    }
}
