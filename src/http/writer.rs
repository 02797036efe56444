use std::collections::BTreeMap;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::request::Version;
use crate::http::response::StatusCode;

fn serialize_head(version: Version, status: StatusCode, headers: &BTreeMap<String, String>) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        version,
        status.as_u16(),
        status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// The output side of one exchange.
///
/// Status and headers are collected until the first body byte is written or
/// the output is flushed, at which point they are sent once. For HTTP/0.9 the
/// status line and headers are never sent. Headers go out sorted by name.
///
/// A suppressed body (HEAD) still sends the head, but drops every body byte.
pub struct HttpOutput<'a, W> {
    stream: &'a mut W,
    version: Version,
    status: StatusCode,
    headers: BTreeMap<String, String>,
    header_sent: bool,
    body_enabled: bool,
}

impl<'a, W> HttpOutput<'a, W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(stream: &'a mut W, version: Version) -> Self {
        Self {
            stream,
            version,
            status: StatusCode::Ok,
            headers: BTreeMap::new(),
            header_sent: false,
            body_enabled: true,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        if self.header_sent {
            tracing::warn!(status = status.as_u16(), "status set after the header was sent");
            return;
        }
        self.status = status;
    }

    /// Sets a header, replacing an earlier value for the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.header_sent {
            tracing::warn!(header = %name, "header set after the header was sent");
            return;
        }
        self.headers.insert(name, value.into());
    }

    /// Drops the body from here on. Used to answer HEAD with the GET logic.
    pub fn suppress_body(&mut self) {
        self.body_enabled = false;
    }

    pub fn header_sent(&self) -> bool {
        self.header_sent
    }

    pub async fn write_body(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.send_header().await?;
        if self.body_enabled {
            self.stream.write_all(bytes).await?;
        }
        Ok(())
    }

    /// Streams `reader` to the client as body. Nothing is read when the body
    /// is suppressed.
    pub async fn copy_body<R>(&mut self, reader: &mut R) -> io::Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.send_header().await?;
        if !self.body_enabled {
            return Ok(0);
        }
        tokio::io::copy(reader, &mut *self.stream).await
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.send_header().await?;
        self.stream.flush().await
    }

    async fn send_header(&mut self) -> io::Result<()> {
        if self.header_sent {
            return Ok(());
        }
        self.header_sent = true;
        if self.version.is_simple() {
            return Ok(());
        }
        let head = serialize_head(self.version, self.status, &self.headers);
        self.stream.write_all(&head).await
    }
}
