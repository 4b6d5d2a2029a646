//! Base64 encoding core
//!
//! Standard-alphabet encoder (RFC 4648) used for the handshake accept
//! token. Only encoding is needed; the server never decodes the
//! client's key, it is hashed verbatim.

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encodes `input` as padded standard Base64.
pub fn encode(input: &[u8]) -> String {
    let mut out = String::with_capacity((input.len() + 2) / 3 * 4);

    let mut acc: u32 = 0;
    let mut nbits: u32 = 0;

    for &byte in input {
        acc = (acc << 8) | u32::from(byte);
        nbits += 8;

        while nbits >= 6 {
            nbits -= 6;
            out.push(ALPHABET[((acc >> nbits) & 0x3F) as usize] as char);
        }
        acc &= (1 << nbits) - 1;
    }

    // Flush leftover bits, zero-padded to a full 6-bit group.
    if nbits > 0 {
        out.push(ALPHABET[((acc << (6 - nbits)) & 0x3F) as usize] as char);
    }
    while out.len() % 4 != 0 {
        out.push('=');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::encode;
    use base64::{engine::general_purpose::STANDARD, Engine};

    #[test]
    fn rfc4648_vectors() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "Zg==");
        assert_eq!(encode(b"fo"), "Zm8=");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode(b"foob"), "Zm9vYg==");
        assert_eq!(encode(b"fooba"), "Zm9vYmE=");
        assert_eq!(encode(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn matches_reference_engine() {
        for len in 0..64usize {
            let data: Vec<u8> = (0..len).map(|i| (i * 73 % 256) as u8).collect();
            assert_eq!(encode(&data), STANDARD.encode(&data), "length {len}");
        }
    }
}
