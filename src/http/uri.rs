//! Request targets used as routing keys.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use url::Url;

/// A normalized request path.
///
/// Two `Uri`s compare, order and hash by their normalized path only. The
/// query string and the scheme/host/port of an absolute-form target are kept
/// for handlers to inspect but never take part in routing.
#[derive(Debug, Clone, Default)]
pub struct Uri {
    path: String,
    query: Option<String>,
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
}

/// Lowercases a path so that routing is case-insensitive.
///
/// ```
/// # use shardline::http::uri::normalize;
/// assert_eq!(normalize("/Hello.HTML"), "/hello.html");
/// assert_eq!(normalize(&normalize("/A/b")), normalize("/A/b"));
/// ```
pub fn normalize(path: &str) -> String {
    path.to_ascii_lowercase()
}

impl Uri {
    /// Builds a `Uri` from a bare path, as used at registration time.
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize(path),
            ..Self::default()
        }
    }

    /// Parses a request target from a request line.
    ///
    /// Accepts origin-form (`/path?query`), the asterisk form (`*`) and
    /// absolute-form `http`/`https` URLs. Returns `None` for anything else.
    pub fn parse(target: &str) -> Option<Self> {
        if target.starts_with('/') || target == "*" {
            let without_fragment = target.split('#').next().unwrap_or_default();
            let (path, query) = match without_fragment.split_once('?') {
                Some((path, query)) => (path, Some(query.to_string())),
                None => (without_fragment, None),
            };

            return Some(Self {
                path: normalize(path),
                query,
                ..Self::default()
            });
        }

        let url = Url::parse(target).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        Some(Self {
            path: normalize(url.path()),
            query: url.query().map(str::to_string),
            scheme: Some(url.scheme().to_string()),
            host: url.host_str().map(str::to_string),
            port: url.port_or_known_default(),
        })
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = normalize(path);
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Uri {}

impl PartialOrd for Uri {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uri {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

impl Hash for Uri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl From<&str> for Uri {
    fn from(path: &str) -> Self {
        Uri::new(path)
    }
}

impl From<String> for Uri {
    fn from(path: String) -> Self {
        Uri::new(&path)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => f.write_str(&self.path),
        }
    }
}
