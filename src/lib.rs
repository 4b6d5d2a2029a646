//! Wave: server-side WebSocket handshake + framing
//!
//! Speaks the server half of RFC 6455 over any `Read + Write` byte
//! stream: derives the `Sec-WebSocket-Accept` token for the upgrade
//! handshake (with its own SHA-1 and Base64 cores) and
//! encodes/decodes base frames. Call [`accept`] on a freshly
//! connected stream to obtain a [`WebSocket`].
#![allow(clippy::result_large_err)]

pub mod base64;
pub mod error;
pub mod handshake;
pub mod protocol;
pub mod sha1;

mod buffer;
mod server;

pub use protocol::{frame::Frame, frame::OpCode, message::Message, websocket::WebSocket};
pub use server::{accept, accept_with_config};

/// Constant for maximum frame payload length
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;
/// Constant for maximum control frame payload size
pub const MAX_CONTROL_FRAME_PAYLOAD: usize = 125;
/// Constant for maximum handshake request size
pub const MAX_HANDSHAKE_BYTES: usize = 65536;

const READ_BUFFER_SIZE: usize = 4096;
type ReadBuffer = buffer::ReadBuffer<READ_BUFFER_SIZE>;
