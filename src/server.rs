//! Utilities to accept an incoming WebSocket connection on a server

use std::io::{Read, Write};

use crate::{
    error::{Error, ProtocolError, Result},
    handshake::server::{create_response, try_parse_request, write_response},
    protocol::{config::WebSocketConfig, websocket::WebSocket},
    ReadBuffer, MAX_HANDSHAKE_BYTES,
};

/// Accept the given stream as a WebSocket.
///
/// This function performs a blocking server handshake over the given
/// stream: it reads the client's upgrade request, validates it and writes
/// the `101 Switching Protocols` response. Any `Read + Write` stream is
/// supported; for TLS wrap the stream before passing it here.
pub fn accept<S: Read + Write>(stream: S) -> Result<WebSocket<S>> {
    accept_with_config(stream, None)
}

/// Accept the given stream as a WebSocket.
///
/// Uses the protocol limits provided as an argument. Calling it with
/// `None` behaves like [`accept`].
pub fn accept_with_config<S: Read + Write>(
    mut stream: S,
    config: Option<WebSocketConfig>,
) -> Result<WebSocket<S>> {
    let mut buf = ReadBuffer::new();

    let (request, consumed) = loop {
        if buf.read_from(&mut stream)? == 0 {
            return Err(Error::Protocol(ProtocolError::IncompleteHandshake));
        }
        if buf.len() > MAX_HANDSHAKE_BYTES {
            return Err(Error::AttackAttempt);
        }

        if let Some((size, request)) = try_parse_request(buf.as_slice())? {
            break (request, size);
        }
    };
    buf.consume(consumed);

    let response = create_response(&request)?;
    let mut wire = Vec::new();
    write_response(&mut wire, &response)?;
    stream.write_all(&wire)?;
    stream.flush()?;

    log::debug!(
        "handshake complete, accept token {:?}",
        response.headers().get("Sec-WebSocket-Accept")
    );

    // Bytes past the request terminator are the start of the frame stream.
    Ok(WebSocket::from_handshake(stream, buf.as_slice(), config.unwrap_or_default()))
}
