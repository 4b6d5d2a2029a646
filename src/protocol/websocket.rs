//! WebSocket connection handler
//!
//! Owns the stream and a per-connection receive buffer. Each read is
//! appended to the buffer and a decode is attempted against everything
//! buffered so far; bytes are consumed only once a complete frame is
//! confirmed, so partial frames survive until more data arrives.

use std::io::{Read, Write};

use crate::{
    error::{Error, ProtocolError, Result},
    protocol::{
        config::WebSocketConfig,
        frame::{Frame, OpCode},
        message::Message,
    },
    ReadBuffer,
};

/// WebSocket input-output stream, server side.
///
/// This is THE structure you want to create to be able to speak the
/// WebSocket protocol with a client. It is normally created by
/// [`accept`][crate::accept], which performs the upgrade handshake first.
///
/// Use [`WebSocket::read_message`] and [`WebSocket::send`] to receive and
/// send messages. Each connection must be driven by exactly one handler;
/// the codec itself is stateless per call, so any number of connections
/// can run in parallel threads.
#[derive(Debug)]
pub struct WebSocket<S> {
    stream: S,
    buffer: ReadBuffer,
    config: WebSocketConfig,
    close_sent: bool,
    close_received: bool,
}

impl<S: Read + Write> WebSocket<S> {
    /// Wraps an already-upgraded stream
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, WebSocketConfig::default())
    }

    /// Wraps an already-upgraded stream with explicit limits
    pub fn with_config(stream: S, config: WebSocketConfig) -> Self {
        WebSocket {
            stream,
            buffer: ReadBuffer::new(),
            config,
            close_sent: false,
            close_received: false,
        }
    }

    /// Used by the handshake: frame bytes that arrived in the same read as
    /// the upgrade request are carried over instead of being discarded.
    pub(crate) fn from_handshake(stream: S, tail: &[u8], config: WebSocketConfig) -> Self {
        let mut ws = Self::with_config(stream, config);
        ws.buffer.unread(tail);
        ws
    }

    /// Reads the next frame, blocking until one is complete.
    ///
    /// Client frames must be masked; an unmasked frame is a protocol
    /// violation and the connection should be dropped.
    pub fn read_frame(&mut self) -> Result<Frame> {
        if self.close_received {
            return Err(Error::ConnectionClosed);
        }

        loop {
            if let Some((size, frame)) = Frame::try_parse(self.buffer.as_slice(), self.config.max_payload_len)? {
                self.buffer.consume(size);

                if !frame.masked {
                    return Err(Error::Protocol(ProtocolError::UnmaskedFrameFromClient));
                }

                if frame.opcode.is_control() {
                    if !frame.fin {
                        return Err(Error::Protocol(ProtocolError::FragmentedControlFrame));
                    }
                    if frame.payload.len() > self.config.max_control_frame_payload {
                        return Err(Error::Protocol(ProtocolError::ControlFrameTooBig));
                    }
                }

                log::trace!("received {:?} frame, {} byte payload", frame.opcode, frame.payload.len());
                return Ok(frame);
            }

            if self.buffer.read_from(&mut self.stream)? == 0 {
                return Err(Error::Protocol(ProtocolError::ResetWithoutClosing));
            }
        }
    }

    /// Reads an incoming message from the stream.
    ///
    /// A close frame from the peer is answered with a close frame echoing
    /// its status code before `Message::Close` is returned, completing the
    /// close handshake.
    pub fn read_message(&mut self) -> Result<Message> {
        let frame = self.read_frame()?;

        match frame.opcode {
            OpCode::Text => Ok(Message::Text(String::from_utf8(frame.payload)?)),
            OpCode::Binary => Ok(Message::Binary(frame.payload)),
            OpCode::Ping => Ok(Message::Ping(frame.payload)),
            OpCode::Pong => Ok(Message::Pong(frame.payload)),
            OpCode::Close => {
                self.close_received = true;
                let msg = Message::from_close_payload(frame.payload);

                if !self.close_sent {
                    self.close_sent = true;
                    let reply = Frame::close(msg.clone().into_data());
                    self.write_frame(&reply)?;
                    log::debug!("close handshake completed: {msg}");
                }

                Ok(msg)
            }
            OpCode::Continuation => Err(Error::Protocol(ProtocolError::UnexpectedContinue)),
        }
    }

    /// Writes an outgoing message to the stream, unmasked as all
    /// server-to-client frames are
    pub fn send(&mut self, msg: Message) -> Result<()> {
        if self.close_sent {
            return Err(if self.close_received {
                Error::AlreadyClosed
            } else {
                Error::Protocol(ProtocolError::SendAfterClose)
            });
        }
        if let Message::Close(_) = msg {
            self.close_sent = true;
        }

        let frame = Frame::new(msg.opcode(), true, msg.into_data());
        self.write_frame(&frame)
    }

    /// Writes a single frame verbatim and flushes the stream
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        frame.write(&mut self.stream)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Starts the close handshake with the given status code
    pub fn close(&mut self, code: Option<u16>) -> Result<()> {
        if self.close_sent {
            return Err(Error::AlreadyClosed);
        }
        self.send(Message::Close(code.map(|c| (c, String::new()))))
    }

    /// Returns a mutable reference to the stream
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Returns the inner instance of the stream
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// A duplex stream stub: reads from a scripted input, records writes.
    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl MockStream {
        fn new(input: Vec<u8>) -> Self {
            Self { input: Cursor::new(input), output: Vec::new() }
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unmasked_client_frame_is_rejected() {
        let wire = Frame::new(OpCode::Text, true, b"hi".to_vec()).to_bytes();
        let mut ws = WebSocket::new(MockStream::new(wire));

        assert!(matches!(
            ws.read_frame(),
            Err(Error::Protocol(ProtocolError::UnmaskedFrameFromClient))
        ));
    }

    #[test]
    fn frame_split_across_reads_is_reassembled() {
        let wire = Frame::masked(OpCode::Text, true, [1, 2, 3, 4], b"split".to_vec()).to_bytes();
        let mut ws = WebSocket::new(MockStream::new(wire.clone()));
        // Preload a partial prefix the way a short first read would, leaving
        // the rest to come from the stream.
        ws.buffer.unread(&wire[..3]);
        ws.get_mut().input.set_position(3);

        let msg = ws.read_message().unwrap();
        assert_eq!(msg, Message::Text("split".into()));
    }

    #[test]
    fn close_is_answered_with_close_opcode_8() {
        let mut payload = 1000u16.to_be_bytes().to_vec();
        payload.extend_from_slice(b"done");
        let wire = Frame::masked(OpCode::Close, true, [7, 7, 7, 7], payload).to_bytes();

        let mut ws = WebSocket::new(MockStream::new(wire));
        let msg = ws.read_message().unwrap();
        assert_eq!(msg, Message::Close(Some((1000, "done".into()))));

        // The reply is an unmasked close frame echoing the status code.
        let reply = ws.into_inner().output;
        assert_eq!(reply[0], 0x88);
        assert_eq!(reply[1], 6);
        assert_eq!(&reply[2..4], &1000u16.to_be_bytes());
    }

    #[test]
    fn reads_after_close_handshake_report_closed() {
        let wire = Frame::masked(OpCode::Close, true, [0, 0, 0, 0], Vec::new()).to_bytes();
        let mut ws = WebSocket::new(MockStream::new(wire));

        assert_eq!(ws.read_message().unwrap(), Message::Close(None));
        assert!(matches!(ws.read_message(), Err(Error::ConnectionClosed)));
        assert!(matches!(ws.send(Message::Text("late".into())), Err(Error::AlreadyClosed)));
    }

    #[test]
    fn ping_maps_to_message_with_payload() {
        let wire = Frame::masked(OpCode::Ping, true, [9, 9, 9, 9], b"tick".to_vec()).to_bytes();
        let mut ws = WebSocket::new(MockStream::new(wire));
        assert_eq!(ws.read_message().unwrap(), Message::Ping(b"tick".to_vec()));
    }

    #[test]
    fn eof_mid_frame_is_a_reset() {
        let wire = Frame::masked(OpCode::Text, true, [1, 1, 1, 1], b"lost".to_vec()).to_bytes();
        let mut ws = WebSocket::new(MockStream::new(wire[..wire.len() - 2].to_vec()));

        assert!(matches!(
            ws.read_frame(),
            Err(Error::Protocol(ProtocolError::ResetWithoutClosing))
        ));
    }
}
