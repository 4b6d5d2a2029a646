//! Server handshake: request parsing, validation and the upgrade response

use http::{
    HeaderMap, HeaderName, HeaderValue, Method, Request as HttpRequest, Response as HttpResponse,
    StatusCode, Version,
};
use httparse::{Status, EMPTY_HEADER};
use std::io::Write;

use crate::{
    error::{Error, ProtocolError, Result},
    handshake::derive_accept_key,
};

/// Limit for the number of header lines
pub const MAX_HEADERS: usize = 124;

/// Server Request type
pub type Request = HttpRequest<()>;
/// Server Response type
pub type Response = HttpResponse<()>;

/// Attempts to parse a client upgrade request out of `data`.
///
/// Returns `Ok(None)` while the request is still incomplete and
/// `Ok(Some((size, request)))` once the terminating blank line has been
/// seen, where `size` is the number of bytes the request occupied. Any
/// bytes past `size` belong to the frame stream, not the handshake.
pub fn try_parse_request(data: &[u8]) -> Result<Option<(usize, Request)>> {
    let mut header_buf = [EMPTY_HEADER; MAX_HEADERS];
    let mut raw = httparse::Request::new(&mut header_buf);

    Ok(match raw.parse(data)? {
        Status::Complete(size) => Some((size, from_httparse(raw)?)),
        Status::Partial => None,
    })
}

fn from_httparse(raw: httparse::Request<'_, '_>) -> Result<Request> {
    if raw.method != Some("GET") {
        return Err(Error::Protocol(ProtocolError::InvalidHttpMethod));
    }

    if raw.version != Some(1) {
        return Err(Error::Protocol(ProtocolError::InvalidHttpVersion));
    }

    let mut headers = HeaderMap::new();
    for h in raw.headers.iter() {
        headers.append(
            HeaderName::from_bytes(h.name.as_bytes()).map_err(http::Error::from)?,
            HeaderValue::from_bytes(h.value).map_err(http::Error::from)?,
        );
    }

    let mut req = Request::new(());
    *req.method_mut() = Method::GET;
    *req.version_mut() = Version::HTTP_11;
    *req.headers_mut() = headers;

    Ok(req)
}

/// Creates the `101 Switching Protocols` response for the request.
///
/// Header lookup goes through [`http::HeaderMap`], so field names match
/// case-insensitively regardless of how the client spelled them.
pub fn create_response(req: &Request) -> Result<Response> {
    let headers = req.headers();

    if !headers
        .get("Connection")
        .and_then(|h| h.to_str().ok())
        .map(|v| v.split(|c| c == ',' || c == ' ').any(|s| s.eq_ignore_ascii_case("Upgrade")))
        .unwrap_or(false)
    {
        return Err(Error::Protocol(ProtocolError::MissingConnectionUpgradeHeader));
    }

    if !headers
        .get("Upgrade")
        .and_then(|h| h.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false)
    {
        return Err(Error::Protocol(ProtocolError::MissingUpgradeHeader));
    }

    if !headers
        .get("Sec-WebSocket-Version")
        .map(|h| h == "13")
        .unwrap_or(false)
    {
        return Err(Error::Protocol(ProtocolError::MissingVersionHeader));
    }

    let key = headers
        .get("Sec-WebSocket-Key")
        .ok_or(Error::Protocol(ProtocolError::MissingKeyHeader))?;
    if !is_valid_key(key.as_bytes()) {
        return Err(Error::Protocol(ProtocolError::InvalidKeyHeader));
    }

    let response = Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .version(req.version())
        .header("Upgrade", "websocket")
        .header("Connection", "Upgrade")
        .header("Sec-WebSocket-Accept", derive_accept_key(key.as_bytes()))
        .body(())?;

    Ok(response)
}

/// A valid key is the Base64 form of a 16-byte nonce: exactly 24
/// characters ending in `==`. Deriving an accept token from anything
/// else (an empty value in particular) must never happen.
fn is_valid_key(key: &[u8]) -> bool {
    key.len() == 24
        && key.ends_with(b"==")
        && key[..22]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/')
}

/// Writes `response` to the stream `w` with CRLF line endings.
pub fn write_response<T>(mut w: impl Write, res: &HttpResponse<T>) -> Result<()> {
    writeln!(w, "{:?} {}\r", res.version(), res.status())?;
    for (k, v) in res.headers() {
        writeln!(w, "{}: {}\r", k, v.to_str()?)?;
    }
    writeln!(w, "\r")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &[u8] = b"GET /chat HTTP/1.1\r\n\
        Host: example.com\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13\r\n\r\n";

    #[test]
    fn parses_complete_request() {
        let (size, req) = try_parse_request(REQUEST).unwrap().unwrap();
        assert_eq!(size, REQUEST.len());
        assert_eq!(
            req.headers().get("Sec-WebSocket-Key").unwrap(),
            "dGhlIHNhbXBsZSBub25jZQ=="
        );
    }

    #[test]
    fn partial_request_is_incomplete_at_every_prefix() {
        for cut in 0..REQUEST.len() {
            assert!(
                try_parse_request(&REQUEST[..cut]).unwrap().is_none(),
                "prefix of {cut} bytes parsed as complete"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_not_part_of_the_request() {
        let mut data = REQUEST.to_vec();
        data.extend_from_slice(&[0x81, 0x85]);
        let (size, _) = try_parse_request(&data).unwrap().unwrap();
        assert_eq!(size, REQUEST.len());
    }

    #[test]
    fn response_carries_accept_token() {
        let (_, req) = try_parse_request(REQUEST).unwrap().unwrap();
        let res = create_response(&req).unwrap();

        assert_eq!(res.status(), StatusCode::SWITCHING_PROTOCOLS);
        assert_eq!(
            res.headers().get("Sec-WebSocket-Accept").unwrap(),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );

        let mut wire = Vec::new();
        write_response(&mut wire, &res).unwrap();
        assert_eq!(
            wire,
            b"HTTP/1.1 101 Switching Protocols\r\n\
              Upgrade: websocket\r\n\
              Connection: Upgrade\r\n\
              Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n"
        );
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let lowercase = b"GET / HTTP/1.1\r\n\
            host: example.com\r\n\
            upgrade: websocket\r\n\
            connection: upgrade\r\n\
            sec-websocket-key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
            sec-websocket-version: 13\r\n\r\n";
        let (_, req) = try_parse_request(lowercase).unwrap().unwrap();
        let res = create_response(&req).unwrap();
        assert_eq!(
            res.headers().get("Sec-WebSocket-Accept").unwrap(),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn missing_key_is_fatal() {
        let without_key = b"GET / HTTP/1.1\r\n\
            Upgrade: websocket\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Version: 13\r\n\r\n";
        let (_, req) = try_parse_request(without_key).unwrap().unwrap();
        assert!(matches!(
            create_response(&req),
            Err(Error::Protocol(ProtocolError::MissingKeyHeader))
        ));
    }

    #[test]
    fn empty_or_malformed_key_is_fatal() {
        for key in ["", "too-short", "exactly-24-chars-no-pad!", "dGhlIHNhbXBsZSBub25jZQ=X"] {
            let raw = format!(
                "GET / HTTP/1.1\r\n\
                 Upgrade: websocket\r\n\
                 Connection: Upgrade\r\n\
                 Sec-WebSocket-Key: {key}\r\n\
                 Sec-WebSocket-Version: 13\r\n\r\n"
            );
            let (_, req) = try_parse_request(raw.as_bytes()).unwrap().unwrap();
            assert!(
                matches!(
                    create_response(&req),
                    Err(Error::Protocol(ProtocolError::InvalidKeyHeader))
                ),
                "key {key:?} was accepted"
            );
        }
    }

    #[test]
    fn rejects_non_get_method() {
        let post = b"POST / HTTP/1.1\r\nHost: x\r\n\r\n";
        assert!(matches!(
            try_parse_request(post),
            Err(Error::Protocol(ProtocolError::InvalidHttpMethod))
        ));
    }
}
