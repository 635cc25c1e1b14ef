//! State shared by requests and responses.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

pub const CONTENT_LENGTH: &str = "Content-Length";

/// HTTP protocol versions, numbered as `major * 10 + minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Version {
    Http09 = 9,
    Http10 = 10,
    #[default]
    Http11 = 11,
    Http20 = 20,
}

impl Version {
    /// Returns `major * 10 + minor`.
    ///
    /// ```
    /// # use shardline::http::message::Version;
    /// assert_eq!(Version::Http11.code(), 11);
    /// assert_eq!(Version::Http09.code(), 9);
    /// ```
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            9 => Some(Version::Http09),
            10 => Some(Version::Http10),
            11 => Some(Version::Http11),
            20 => Some(Version::Http20),
            _ => None,
        }
    }

    /// Parses a `HTTP/<major>.<minor>` token from a request or status line.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "HTTP/0.9" => Some(Version::Http09),
            "HTTP/1.0" => Some(Version::Http10),
            "HTTP/1.1" => Some(Version::Http11),
            "HTTP/2.0" => Some(Version::Http20),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Version::Http09 => "HTTP/0.9",
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
            Version::Http20 => "HTTP/2.0",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version, headers and body of an HTTP message.
///
/// Header names keep the case they were given with and the last write wins.
/// Headers are kept ordered by name so serialization is deterministic.
/// Every body mutation rewrites `Content-Length` to the new body length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    version: Version,
    headers: BTreeMap<String, String>,
    body: Bytes,
}

impl Message {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }
}

/// Accessors common to [`Request`](super::request::Request) and
/// [`Response`](super::response::Response).
pub trait HttpMessage {
    fn message(&self) -> &Message;

    fn message_mut(&mut self) -> &mut Message;

    fn version(&self) -> Version {
        self.message().version
    }

    fn set_version(&mut self, version: Version) {
        self.message_mut().version = version;
    }

    fn header(&self, key: &str) -> Option<&str> {
        self.message().headers.get(key).map(String::as_str)
    }

    /// Looks a header up ignoring the case of its name.
    fn header_ignore_case(&self, key: &str) -> Option<&str> {
        self.message()
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    fn headers(&self) -> &BTreeMap<String, String> {
        &self.message().headers
    }

    fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.message_mut().headers.insert(key.into(), value.into());
    }

    fn remove_header(&mut self, key: &str) -> Option<String> {
        self.message_mut().headers.remove(key)
    }

    fn clear_headers(&mut self) {
        self.message_mut().headers.clear();
    }

    fn body(&self) -> &Bytes {
        &self.message().body
    }

    /// Replaces the body and refreshes `Content-Length` to match, whatever
    /// case the previous header was spelled in.
    fn set_body(&mut self, body: impl Into<Bytes>) {
        let message = self.message_mut();
        message.body = body.into();
        let length = message.body.len().to_string();
        message
            .headers
            .retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_LENGTH));
        message.headers.insert(CONTENT_LENGTH.to_string(), length);
    }

    fn clear_body(&mut self) {
        self.set_body(Bytes::new());
    }

    fn content_length(&self) -> usize {
        self.message().body.len()
    }
}

impl HttpMessage for Message {
    fn message(&self) -> &Message {
        self
    }

    fn message_mut(&mut self) -> &mut Message {
        self
    }
}
