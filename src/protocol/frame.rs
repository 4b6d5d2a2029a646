//! WebSocket frame codec
//!
//! Decoding works against whatever bytes the caller has buffered:
//! [`Frame::try_parse`] returns `Ok(None)` while the frame is still
//! incomplete, so a short read is never mistaken for a malformed or
//! truncated frame. Encoding always picks the minimal length variant.

use std::io::{self, Write};

use crate::error::{CapacityError, Error, ProtocolError, Result};

/// WebSocket message opcode as in RFC 6455.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// A continuation frame
    Continuation = 0x0,
    /// A text frame
    Text = 0x1,
    /// A binary frame
    Binary = 0x2,
    /// A close frame
    Close = 0x8,
    /// A ping frame
    Ping = 0x9,
    /// A pong frame
    Pong = 0xA,
}

impl OpCode {
    /// Whether this opcode designates a control frame
    pub fn is_control(self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }
}

impl TryFrom<u8> for OpCode {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> std::result::Result<Self, ProtocolError> {
        match byte {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            b => Err(ProtocolError::ReservedOpCode(b)),
        }
    }
}

/// The WebSocket Frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Indicates if the frame is the last one of a possibly fragmented message
    pub fin: bool,
    /// WebSocket protocol opcode
    pub opcode: OpCode,
    /// Whether the frame arrived (or will be sent) masked
    pub masked: bool,
    /// A frame mask (if any)
    pub masking_key: Option<[u8; 4]>,
    /// The frame data, already unmasked on the decode path
    pub payload: Vec<u8>,
}

impl Frame {
    fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= key[i % 4];
        }
    }

    /// Initializes a new unmasked frame, the form every server-to-client
    /// frame takes
    pub fn new(opcode: OpCode, fin: bool, payload: Vec<u8>) -> Self {
        Frame { fin, opcode, masked: false, masking_key: None, payload }
    }

    /// Initializes a masked frame as a client would send it
    pub fn masked(opcode: OpCode, fin: bool, masking_key: [u8; 4], payload: Vec<u8>) -> Self {
        Frame { fin, opcode, masked: true, masking_key: Some(masking_key), payload }
    }

    /// A final text frame
    pub fn text(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(OpCode::Text, true, payload.into())
    }

    /// A final binary frame
    pub fn binary(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(OpCode::Binary, true, payload.into())
    }

    /// A close frame; `payload` is the status code plus reason, already
    /// encoded, or empty
    pub fn close(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(OpCode::Close, true, payload.into())
    }

    /// A pong frame carrying the ping's payload back
    pub fn pong(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(OpCode::Pong, true, payload.into())
    }

    /// Attempts to decode one frame from the start of `data`.
    ///
    /// Returns `Ok(None)` if `data` does not yet hold a complete frame and
    /// `Ok(Some((size, frame)))` once it does, where `size` is the number of
    /// bytes the frame occupied on the wire. Errors mean the bytes can never
    /// become a valid frame: a reserved opcode, non-zero reserved bits or a
    /// declared payload above `max_payload`.
    pub fn try_parse(data: &[u8], max_payload: usize) -> Result<Option<(usize, Frame)>> {
        if data.len() < 2 {
            return Ok(None);
        }

        let fin = (data[0] & 0x80) != 0;
        if data[0] & 0x70 != 0 {
            // No extension ever gets negotiated, so RSV must stay zero.
            return Err(Error::Protocol(ProtocolError::NonZeroReservedBits));
        }
        let opcode = OpCode::try_from(data[0] & 0x0F)?;

        let masked = (data[1] & 0x80) != 0;
        let mut offset = 2usize;

        let payload_len = match data[1] & 0x7F {
            126 => {
                let Some(extended) = data.get(offset..offset + 2) else {
                    return Ok(None);
                };
                offset += 2;
                u16::from_be_bytes([extended[0], extended[1]]) as u64
            }
            127 => {
                let Some(extended) = data.get(offset..offset + 8) else {
                    return Ok(None);
                };
                offset += 8;
                u64::from_be_bytes([
                    extended[0], extended[1], extended[2], extended[3], extended[4], extended[5],
                    extended[6], extended[7],
                ])
            }
            n => n as u64,
        };

        // Bound memory before touching the payload: the declared length is
        // attacker-controlled.
        if payload_len > max_payload as u64 {
            return Err(Error::Capacity(CapacityError::MessageTooLarge {
                size: payload_len as usize,
                max: max_payload,
            }));
        }
        let payload_len = payload_len as usize;

        let masking_key = if masked {
            let Some(key) = data.get(offset..offset + 4) else {
                return Ok(None);
            };
            offset += 4;
            Some([key[0], key[1], key[2], key[3]])
        } else {
            None
        };

        let total = offset + payload_len;
        if data.len() < total {
            return Ok(None);
        }

        let mut payload = data[offset..total].to_vec();
        if let Some(key) = masking_key {
            Self::apply_mask(&mut payload, key);
        }

        Ok(Some((total, Frame { fin, opcode, masked, masking_key, payload })))
    }

    /// Writes the frame, choosing the minimal length encoding
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut first_byte = self.opcode as u8;
        if self.fin {
            first_byte |= 0x80;
        }
        writer.write_all(&[first_byte])?;

        let mask_bit = if self.masked { 0x80 } else { 0x00 };
        let payload_len = self.payload.len();

        if payload_len < 126 {
            writer.write_all(&[mask_bit | payload_len as u8])?;
        } else if payload_len <= u16::MAX as usize {
            writer.write_all(&[mask_bit | 126])?;
            writer.write_all(&(payload_len as u16).to_be_bytes())?;
        } else {
            writer.write_all(&[mask_bit | 127])?;
            writer.write_all(&(payload_len as u64).to_be_bytes())?;
        }

        if let Some(key) = self.masking_key {
            writer.write_all(&key)?;

            let mut masked_payload = self.payload.clone();
            Self::apply_mask(&mut masked_payload, key);
            writer.write_all(&masked_payload)?;
        } else {
            writer.write_all(&self.payload)?;
        }

        Ok(())
    }

    /// Serializes the frame into a fresh byte vector
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(10 + self.payload.len());
        self.write(&mut out).expect("writing to a Vec cannot fail");
        out
    }
}
