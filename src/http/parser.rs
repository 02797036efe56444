use std::collections::HashMap;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time::timeout;

use crate::http::error::{HttpError, ParseError};
use crate::http::request::{insert_header, keeps_alive, Method, Request, Version};

/// Longest request or header line accepted, excluding the line terminator.
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Most header lines accepted in one request.
pub const MAX_HEADERS: usize = 100;

/// The three parts of a request line, borrowed from the line.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub target: &'a str,
    /// `None` for an HTTP/0.9 simple request.
    pub version: Option<Version>,
}

/// Parses `METHOD SP TARGET (SP "HTTP/" DIGIT+ "." DIGIT+)?`.
///
/// The method token is only checked for shape here (uppercase letters);
/// whether it is supported is decided after the headers are read.
pub fn parse_request_line(line: &str) -> Result<RequestLine<'_>, HttpError> {
    let (method, rest) = line.split_once(' ').ok_or(HttpError::BadRequest)?;

    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(HttpError::BadRequest);
    }

    let (target, version) = match rest.split_once(' ') {
        Some((target, version)) => (target, Some(parse_version(version)?)),
        None => (rest, None),
    };

    Ok(RequestLine {
        method,
        target,
        version,
    })
}

/// Parses `NAME ":" OWS VALUE`, returning the name as sent and the value
/// with leading whitespace removed.
pub fn parse_header_line(line: &str) -> Result<(&str, &str), HttpError> {
    let (name, value) = line.split_once(':').ok_or(HttpError::BadRequest)?;

    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(HttpError::BadRequest);
    }

    Ok((name, value.trim_start()))
}

fn parse_version(s: &str) -> Result<Version, HttpError> {
    let numbers = s.strip_prefix("HTTP/").ok_or(HttpError::BadRequest)?;
    let (major, minor) = numbers.split_once('.').ok_or(HttpError::BadRequest)?;
    Ok(Version::new(parse_number(major)?, parse_number(minor)?))
}

fn parse_number(s: &str) -> Result<u32, HttpError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HttpError::BadRequest);
    }
    s.parse().map_err(|_| HttpError::BadRequest)
}

/// Reads one request from `reader`.
///
/// Each line read is bounded by `read_timeout` when one is given. Nothing is
/// consumed beyond the end of the header block, so the next request on a
/// persistent connection stays in the reader.
pub async fn parse_http_request<R>(
    reader: &mut R,
    read_timeout: Option<Duration>,
) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut parser = Parser {
        reader,
        read_timeout,
        version: Version::HTTP_09,
        method: None,
    };
    parser.parse().await
}

struct Parser<'a, R> {
    reader: &'a mut R,
    read_timeout: Option<Duration>,
    // Best knowledge so far, reported with any error.
    version: Version,
    method: Option<Method>,
}

impl<R> Parser<'_, R>
where
    R: AsyncBufRead + Unpin,
{
    async fn parse(&mut self) -> Result<Request, ParseError> {
        let line = self
            .read_line()
            .await?
            .ok_or(ParseError::NoDataFromClient)?;

        let request_line = parse_request_line(&line).map_err(|e| self.reject(e))?;
        self.method = Method::from_str(request_line.method);
        if let Some(version) = request_line.version {
            self.version = version;
        }
        let method_token = request_line.method.to_string();
        let target = request_line.target.to_string();

        let mut headers = HashMap::new();
        if !self.version.is_simple() {
            self.read_headers(&mut headers).await?;
        }

        let method = self.validate(&method_token, &headers)?;

        Ok(Request {
            method,
            target,
            version: self.version,
            headers,
        })
    }

    async fn read_headers(&mut self, headers: &mut HashMap<String, String>) -> Result<(), ParseError> {
        let mut count = 0;
        while let Some(line) = self.read_line().await? {
            if line.is_empty() {
                return Ok(());
            }
            count += 1;
            if count > MAX_HEADERS {
                return Err(self.reject(HttpError::BadRequest));
            }
            let (name, value) = parse_header_line(&line).map_err(|e| self.reject(e))?;
            insert_header(headers, name.to_string(), value.to_string());
        }
        // EOF ends the header block like an empty line would.
        Ok(())
    }

    /// Checks a fully read request. Its framing is sound, so a rejected
    /// request still honours the connection's keep-alive rule, except for a
    /// missing `Host`, which always closes.
    fn validate(&self, method_token: &str, headers: &HashMap<String, String>) -> Result<Method, ParseError> {
        let keep_alive = keeps_alive(self.version, headers);
        let invalid = |error| ParseError::Rejected {
            error,
            version: self.version,
            method: self.method,
            keep_alive,
        };

        let method = Method::from_str(method_token).ok_or_else(|| invalid(HttpError::NotImplemented))?;

        // HTTP/0.9 has no status line to carry a 501, so anything but GET is
        // simply a bad request there.
        if self.version.major == 0 && method != Method::GET {
            return Err(invalid(HttpError::BadRequest));
        }

        if self.version.is_http11_or_newer() && !headers.keys().any(|k| k.eq_ignore_ascii_case("Host")) {
            return Err(self.reject(HttpError::BadRequest));
        }

        Ok(method)
    }

    /// Reads one line without its terminator. `Ok(None)` means EOF before any
    /// byte of the line.
    async fn read_line(&mut self) -> Result<Option<String>, ParseError> {
        let (version, method) = (self.version, self.method);
        let mut buf = Vec::new();

        // Room for the line plus CRLF; anything longer is rejected below.
        let mut limited = (&mut *self.reader).take(MAX_LINE_LEN as u64 + 2);
        let read = limited.read_until(b'\n', &mut buf);

        let result = match self.read_timeout {
            Some(limit) => timeout(limit, read)
                .await
                .map_err(|_| ParseError::Timeout { version, method })?,
            None => read.await,
        };
        let n = result.map_err(|source| ParseError::Io {
            source,
            version,
            method,
        })?;

        if n == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > MAX_LINE_LEN {
            return Err(self.reject(HttpError::BadRequest));
        }

        String::from_utf8(buf)
            .map(Some)
            .map_err(|_| self.reject(HttpError::BadRequest))
    }

    /// A rejection after which the connection is closed.
    fn reject(&self, error: HttpError) -> ParseError {
        ParseError::Rejected {
            error,
            version: self.version,
            method: self.method,
            keep_alive: false,
        }
    }
}
