//! Decoding of request and response bytes.
//!
//! A read buffer holds exactly one message: everything up to the first blank
//! line is the head, everything after it is the body. A missing blank line is
//! tolerated and treated as a head with no body.

use thiserror::Error;

use crate::http::message::{CONTENT_LENGTH, HttpMessage, Version};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::uri::Uri;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed message: {reason}")]
    Malformed { reason: String },

    #[error("unsupported HTTP version: {token}")]
    UnsupportedVersion { token: String },
}

impl ParseError {
    pub fn malformed<S: ToString>(reason: S) -> Self {
        Self::Malformed { reason: reason.to_string() }
    }

    pub fn unsupported_version<S: ToString>(token: S) -> Self {
        Self::UnsupportedVersion { token: token.to_string() }
    }

    /// Status of the response sent back for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::Malformed { .. } => StatusCode::BadRequest,
            ParseError::UnsupportedVersion { .. } => StatusCode::HttpVersionNotSupported,
        }
    }
}

/// Parses one request from the bytes of a single read.
pub fn parse_request(buf: &[u8]) -> Result<Request, ParseError> {
    let (head, body) = split_message(buf)?;
    let mut lines = head.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some(method_str), Some(target), Some(version_str), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::malformed(format!(
            "invalid request line: {request_line:?}"
        )));
    };

    let method = Method::parse(method_str)
        .ok_or_else(|| ParseError::malformed(format!("unsupported method: {method_str}")))?;
    let version =
        Version::from_token(version_str).ok_or_else(|| ParseError::unsupported_version(version_str))?;
    let uri = Uri::parse(target)
        .ok_or_else(|| ParseError::malformed(format!("invalid request target: {target}")))?;

    let mut request = Request::new(method, uri);
    request.set_version(version);
    parse_headers(lines, &mut request)?;
    attach_body(body, &mut request, false)?;

    Ok(request)
}

/// Parses a response, the counterpart of
/// [`serialize_response`](crate::http::writer::serialize_response).
pub fn parse_response(buf: &[u8]) -> Result<Response, ParseError> {
    let (head, body) = split_message(buf)?;
    let mut lines = head.split("\r\n");

    // Status line: the reason phrase may contain spaces
    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.splitn(3, ' ');
    let (Some(version_str), Some(code_str)) = (parts.next(), parts.next()) else {
        return Err(ParseError::malformed(format!(
            "invalid status line: {status_line:?}"
        )));
    };

    let version =
        Version::from_token(version_str).ok_or_else(|| ParseError::unsupported_version(version_str))?;
    let status = code_str
        .parse::<u16>()
        .ok()
        .and_then(StatusCode::from_u16)
        .ok_or_else(|| ParseError::malformed(format!("unknown status code: {code_str}")))?;

    let mut response = Response::new(status);
    response.set_version(version);
    parse_headers(lines, &mut response)?;
    attach_body(body, &mut response, true)?;

    Ok(response)
}

fn split_message(buf: &[u8]) -> Result<(&str, &[u8]), ParseError> {
    let (head_bytes, body) = match find_headers_end(buf) {
        Some(end) => (&buf[..end], &buf[end + 4..]),
        None => (buf, &buf[buf.len()..]),
    };

    let head = std::str::from_utf8(head_bytes)
        .map_err(|_| ParseError::malformed("message head is not valid UTF-8"))?;
    if head.trim().is_empty() {
        return Err(ParseError::malformed("empty message"));
    }

    Ok((head, body))
}

fn parse_headers<'a, M: HttpMessage>(
    lines: impl Iterator<Item = &'a str>,
    message: &mut M,
) -> Result<(), ParseError> {
    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::malformed(format!("invalid header line: {line:?}")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::malformed("empty header name"));
        }

        message.set_header(key, value.trim());
    }
    Ok(())
}

/// Attaches the bytes after the head as the body.
///
/// Without `Content-Length` a request has no body, so a pipelined request
/// sharing the read is not handed to the first handler. A response without
/// it runs to the end of the buffer.
fn attach_body<M: HttpMessage>(
    body: &[u8],
    message: &mut M,
    close_delimited: bool,
) -> Result<(), ParseError> {
    let declared = message
        .header_ignore_case(CONTENT_LENGTH)
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| ParseError::malformed(format!("invalid Content-Length: {v}")))
        })
        .transpose()?;

    // Only what arrived in this buffer is kept; Content-Length is rewritten
    // to the length actually attached.
    match declared {
        Some(length) => message.set_body(body[..length.min(body.len())].to_vec()),
        None if close_delimited && !body.is_empty() => message.set_body(body.to_vec()),
        None => {}
    }
    Ok(())
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let parsed = parse_request(req).unwrap();

        assert_eq!(parsed.method, Method::GET);
        assert_eq!(parsed.uri.path(), "/");
        assert_eq!(parsed.header("Host"), Some("example.com"));
    }

    #[test]
    fn missing_blank_line_is_a_head_without_body() {
        let parsed = parse_request(b"DELETE /item HTTP/1.0\r\nHost: x").unwrap();

        assert_eq!(parsed.method, Method::DELETE);
        assert_eq!(parsed.version(), Version::Http10);
        assert!(parsed.body().is_empty());
    }
}
