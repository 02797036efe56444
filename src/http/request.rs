use std::collections::HashMap;
use std::fmt;

/// HTTP request methods served by this server.
///
/// Any other method token is recognised by the parser but rejected with
/// `501 Not Implemented`, so it never becomes a `Method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string names a supported method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("POST"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol version of a request, carrying the raw major/minor numbers.
///
/// Ordering compares major first, then minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const HTTP_09: Version = Version::new(0, 9);
    pub const HTTP_10: Version = Version::new(1, 0);
    pub const HTTP_11: Version = Version::new(1, 1);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// HTTP/0.9 (or anything older): no headers are read and responses
    /// carry neither a status line nor headers.
    pub fn is_simple(&self) -> bool {
        *self <= Version::HTTP_09
    }

    /// Whether this version keeps connections alive by default.
    ///
    /// Any major >= 1 with minor >= 1, or any major >= 2.
    ///
    /// ```
    /// # use tinyweb::http::request::Version;
    /// assert!(Version::new(1, 1).is_http11_or_newer());
    /// assert!(Version::new(2, 0).is_http11_or_newer());
    /// assert!(!Version::HTTP_10.is_http11_or_newer());
    /// ```
    pub fn is_http11_or_newer(&self) -> bool {
        (self.major >= 1 && self.minor >= 1) || self.major >= 2
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::HTTP_09
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// Represents a parsed HTTP request from a client.
///
/// Immutable once the parser hands it out. The target is the raw request
/// target; it is only decoded when it is resolved against the document root.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET or HEAD)
    pub method: Method,
    /// The raw request target (e.g., "/index.html")
    pub target: String,
    /// Protocol version from the request line, 0.9 if absent
    pub version: Version,
    /// Request headers, names as received. Always empty for HTTP/0.9.
    pub headers: HashMap<String, String>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    version: Version,
    headers: HashMap<String, String>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            version: Version::HTTP_11,
            headers: HashMap::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            target: self.target.ok_or("target missing")?,
            version: self.version,
            headers: self.headers,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts a header, replacing any earlier header whose name differs only in
/// ASCII case. The spelling of the last occurrence is kept.
pub(crate) fn insert_header(headers: &mut HashMap<String, String>, name: String, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

impl Request {
    /// Retrieves a header value by name, ignoring ASCII case.
    ///
    /// # Arguments
    ///
    /// * `key` - Header name to look up
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// Only HTTP/1.1 and later keep connections alive, and only when the client
    /// did not send `Connection: close`. HTTP/1.0 and 0.9 always close, whatever
    /// their headers say.
    pub fn keep_alive(&self) -> bool {
        keeps_alive(self.version, &self.headers)
    }
}

/// The keep-alive rule, usable before a `Request` exists.
pub(crate) fn keeps_alive(version: Version, headers: &HashMap<String, String>) -> bool {
    version.is_http11_or_newer()
        && !headers.iter().any(|(name, value)| {
            name.eq_ignore_ascii_case("Connection") && value.trim().eq_ignore_ascii_case("close")
        })
}
