//! Registered request handlers
//!
//! A handler answers exactly one URI. It never sees the socket: it writes
//! status, headers and body into a `HandlerOutput`, and the session sends the
//! result once the handler returns. A failing handler has therefore written
//! nothing to the client yet.

use std::collections::BTreeMap;
use std::io;

use bytes::{BufMut, Bytes, BytesMut};

use crate::http::response::StatusCode;

/// Something that can produce a response for a registered URI.
///
/// Implemented for every `Fn(&mut HandlerOutput) -> anyhow::Result<()>`, so
/// plain closures can be registered.
pub trait Handler: Send + Sync {
    fn handle(&self, out: &mut HandlerOutput) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&mut HandlerOutput) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, out: &mut HandlerOutput) -> anyhow::Result<()> {
        self(out)
    }
}

/// Buffered response written by a handler.
///
/// Implements `std::io::Write` for the body, so `write!` works.
#[derive(Debug)]
pub struct HandlerOutput {
    status: StatusCode,
    headers: BTreeMap<String, String>,
    body: BytesMut,
}

impl HandlerOutput {
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            headers: BTreeMap::new(),
            body: BytesMut::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, BTreeMap<String, String>, Bytes) {
        (self.status, self.headers, self.body.freeze())
    }
}

impl Default for HandlerOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for HandlerOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
