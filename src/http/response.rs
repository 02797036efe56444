use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::AsyncWrite;

use crate::http::writer::HttpOutput;
use crate::routing::handler::{Handler, HandlerOutput};

/// HTTP status codes used by the server and available to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 204 No Content
    NoContent,
    /// 301 Moved Permanently
    MovedPermanently,
    /// 302 Found
    Found,
    /// 303 See Other
    SeeOther,
    /// 304 Not Modified
    NotModified,
    /// 307 Temporary Redirect
    TemporaryRedirect,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 408 Request Timeout
    RequestTimeout,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 503 Service Unavailable
    ServiceUnavailable,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NoContent => 204,
            StatusCode::MovedPermanently => 301,
            StatusCode::Found => 302,
            StatusCode::SeeOther => 303,
            StatusCode::NotModified => 304,
            StatusCode::TemporaryRedirect => 307,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::RequestTimeout => 408,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotImplemented.reason_phrase(), "Not Implemented");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::Found => "Found",
            StatusCode::SeeOther => "See Other",
            StatusCode::NotModified => "Not Modified",
            StatusCode::TemporaryRedirect => "Temporary Redirect",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    pub fn is_error(&self) -> bool {
        self.as_u16() >= 400
    }
}

/// Where a file response takes its body from.
#[derive(Debug, Clone)]
pub enum FileBody {
    /// A file on disk, streamed when rendered.
    Disk(PathBuf),
    /// A built-in page, used when an error page file is missing.
    Inline(Bytes),
}

/// A static file (or error page) with its status.
#[derive(Debug, Clone)]
pub struct FileResponse {
    pub status: StatusCode,
    pub body: FileBody,
}

impl FileResponse {
    pub fn from_path(path: impl Into<PathBuf>, status: StatusCode) -> Self {
        Self {
            status,
            body: FileBody::Disk(path.into()),
        }
    }

    pub fn inline(body: impl Into<Bytes>, status: StatusCode) -> Self {
        Self {
            status,
            body: FileBody::Inline(body.into()),
        }
    }

    async fn render<W>(&self, out: &mut HttpOutput<'_, W>) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match &self.body {
            FileBody::Disk(path) => {
                let mut file = File::open(path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                let len = file
                    .metadata()
                    .await
                    .with_context(|| format!("Failed to stat {}", path.display()))?
                    .len();
                out.set_header("Content-Length", len.to_string());
                out.copy_body(&mut file).await?;
            }
            FileBody::Inline(bytes) => {
                out.set_header("Content-Length", bytes.len().to_string());
                out.write_body(bytes).await?;
            }
        }
        Ok(())
    }
}

/// A redirect: status plus `Location`, no body.
#[derive(Debug, Clone)]
pub struct RedirectResponse {
    pub status: StatusCode,
    pub location: String,
}

impl RedirectResponse {
    pub fn temporary(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::TemporaryRedirect,
            location: location.into(),
        }
    }

    fn render<W>(&self, out: &mut HttpOutput<'_, W>)
    where
        W: AsyncWrite + Unpin,
    {
        out.set_header("Location", self.location.as_str());
        out.set_header("Content-Length", "0");
    }
}

/// A registered handler that produces the whole response itself.
#[derive(Clone)]
pub struct HandlerResponse {
    handler: Arc<dyn Handler>,
}

impl HandlerResponse {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    async fn render<W>(&self, out: &mut HttpOutput<'_, W>) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buffered = HandlerOutput::new();
        self.handler.handle(&mut buffered).context("Handler failed")?;

        let (status, headers, body) = buffered.into_parts();
        let has_length = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("Content-Length"));

        out.set_status(status);
        for (name, value) in headers {
            out.set_header(name, value);
        }
        if !has_length {
            out.set_header("Content-Length", body.len().to_string());
        }
        out.write_body(&body).await?;
        Ok(())
    }
}

impl std::fmt::Debug for HandlerResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerResponse").finish_non_exhaustive()
    }
}

/// How a response will be produced. Exactly one variant per exchange.
#[derive(Debug, Clone)]
pub enum ResponseModel {
    File(FileResponse),
    Redirect(RedirectResponse),
    Handler(HandlerResponse),
}

impl ResponseModel {
    /// The error page for `status` from `dir`, falling back to a built-in
    /// `<h1>{code} {reason}</h1>` page when `<code>.html` is missing.
    pub fn error_page(status: StatusCode, dir: &Path) -> Self {
        let path = dir.join(format!("{}.html", status.as_u16()));
        // A single stat; the page is opened asynchronously when rendered.
        if path.is_file() {
            return ResponseModel::File(FileResponse::from_path(path, status));
        }
        let body = format!("<h1>{} {}</h1>\n", status.as_u16(), status.reason_phrase());
        ResponseModel::File(FileResponse::inline(body, status))
    }

    /// The status the session announces before rendering. Handlers may
    /// still change it.
    pub fn status(&self) -> StatusCode {
        match self {
            ResponseModel::File(file) => file.status,
            ResponseModel::Redirect(redirect) => redirect.status,
            ResponseModel::Handler(_) => StatusCode::Ok,
        }
    }

    /// Writes status, headers and body through `out`. Does not flush.
    pub async fn render<W>(&self, out: &mut HttpOutput<'_, W>) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        out.set_status(self.status());
        match self {
            ResponseModel::File(file) => file.render(out).await,
            ResponseModel::Redirect(redirect) => {
                redirect.render(out);
                Ok(())
            }
            ResponseModel::Handler(handler) => handler.render(out).await,
        }
    }
}
