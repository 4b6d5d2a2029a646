//! Handshake module

pub mod server;

use crate::{base64, sha1};

/// Derives the `Sec-WebSocket-Accept` header value from a `Sec-WebSocket-Key`
/// request header.
///
/// This function can be used to perform a handshake manually before passing a
/// raw stream to [`WebSocket::new`][crate::protocol::websocket::WebSocket::new].
pub fn derive_accept_key(req_key: &[u8]) -> String {
    const WS_GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

    let mut material = Vec::with_capacity(req_key.len() + WS_GUID.len());
    material.extend_from_slice(req_key);
    material.extend_from_slice(WS_GUID);

    base64::encode(&sha1::digest(&material))
}

#[cfg(test)]
mod tests {
    use super::derive_accept_key;

    #[test]
    fn rfc6455_example_key() {
        assert_eq!(
            derive_accept_key(b"dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }
}
