use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use crate::http::error::{is_disconnect, ParseError};
use crate::http::parser::parse_http_request;
use crate::http::request::{Method, Request, Version};
use crate::http::response::{ResponseModel, StatusCode};
use crate::http::writer::HttpOutput;
use crate::routing::{router, RouteConfig};

/// One connection's request/response loop.
///
/// A session owns both halves of the connection and reads a shared,
/// read-only `RouteConfig`. Requests are answered strictly in order: each one
/// is parsed, routed and fully written before the next read.
pub struct Session<R, W> {
    reader: BufReader<R>,
    writer: W,
    routes: Arc<RouteConfig>,
    read_timeout: Option<Duration>,
    state: SessionState,
}

pub enum SessionState {
    AwaitRequest,
    Route(Request),
    Respond(Exchange),
    Closed,
}

/// What happens to the connection after the current response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    KeepAlive,
    /// Close; HTTP/1.1+ clients are told with `Connection: close`.
    Close,
    /// Close and send `Connection: close` whatever the version.
    ForceClose,
}

impl Continuation {
    fn announces_close(self, version: Version) -> bool {
        match self {
            Continuation::KeepAlive => false,
            Continuation::Close => version.is_http11_or_newer(),
            Continuation::ForceClose => true,
        }
    }
}

/// A response ready to be written, with what is needed to write it.
pub struct Exchange {
    pub version: Version,
    /// `None` when the request failed before its method was recognised.
    pub method: Option<Method>,
    pub response: ResponseModel,
    pub continuation: Continuation,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, routes: Arc<RouteConfig>, read_timeout: Option<Duration>) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            routes,
            read_timeout,
            state: SessionState::AwaitRequest,
        }
    }

    /// Serves requests until the connection is closed by either side.
    ///
    /// Returns an error only for output failures that could not be answered,
    /// such as a write error after the response head was already sent.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, SessionState::Closed) {
                SessionState::AwaitRequest => self.read_request().await,
                SessionState::Route(request) => self.route(request),
                SessionState::Respond(exchange) => self.respond(exchange).await?,
                SessionState::Closed => break,
            };
        }

        Ok(())
    }

    async fn read_request(&mut self) -> SessionState {
        match parse_http_request(&mut self.reader, self.read_timeout).await {
            Ok(request) => {
                tracing::debug!(
                    method = %request.method,
                    target = %request.target,
                    version = %request.version,
                    "Request received"
                );
                SessionState::Route(request)
            }
            Err(ParseError::NoDataFromClient) => {
                tracing::trace!("Client closed connection");
                SessionState::Closed
            }
            Err(ParseError::Rejected {
                error,
                version,
                method,
                keep_alive,
            }) => {
                tracing::debug!(error = %error, version = %version, keep_alive, "Request rejected");
                let continuation = if keep_alive {
                    Continuation::KeepAlive
                } else {
                    Continuation::Close
                };
                self.error_exchange(error.status(), version, method, continuation)
            }
            Err(ParseError::Timeout { version, method }) => {
                tracing::debug!(version = %version, "Timed out waiting for request");
                self.error_exchange(StatusCode::RequestTimeout, version, method, Continuation::ForceClose)
            }
            Err(ParseError::Io { source, version, method }) => {
                if is_disconnect(&source) {
                    tracing::debug!(error = %source, "Client disconnected");
                    return SessionState::Closed;
                }
                tracing::warn!(error = %source, "Failed to read request");
                self.error_exchange(StatusCode::InternalServerError, version, method, Continuation::Close)
            }
        }
    }

    fn route(&self, request: Request) -> SessionState {
        let continuation = if request.keep_alive() {
            Continuation::KeepAlive
        } else {
            Continuation::Close
        };

        let response = match router::route(&request, &self.routes) {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(
                    method = %request.method,
                    target = %request.target,
                    error = %error,
                    "Routing failed"
                );
                self.routes.error_response(error.status())
            }
        };

        SessionState::Respond(Exchange {
            version: request.version,
            method: Some(request.method),
            response,
            continuation,
        })
    }

    async fn respond(&mut self, exchange: Exchange) -> anyhow::Result<SessionState> {
        let Exchange {
            version,
            method,
            response,
            mut continuation,
        } = exchange;

        let mut out = HttpOutput::new(&mut self.writer, version);
        if continuation.announces_close(version) {
            out.set_header("Connection", "close");
        }
        if suppresses_body(method, version) {
            out.suppress_body();
        }

        if let Err(err) = response.render(&mut out).await {
            if chain_is_disconnect(&err) {
                tracing::debug!(error = %err, "Client disconnected while responding");
                return Ok(SessionState::Closed);
            }
            if out.header_sent() {
                return Err(err.context("Response aborted after its head was sent"));
            }

            tracing::warn!(error = %err, "Failed to render response, answering 500");
            continuation = Continuation::Close;
            if version.is_http11_or_newer() {
                out.set_header("Connection", "close");
            }
            let fallback = self.routes.error_response(StatusCode::InternalServerError);
            if let Err(err) = fallback.render(&mut out).await {
                if chain_is_disconnect(&err) {
                    return Ok(SessionState::Closed);
                }
                return Err(err);
            }
        }

        match out.flush().await {
            Ok(()) => {}
            Err(err) if is_disconnect(&err) => return Ok(SessionState::Closed),
            Err(err) => return Err(err.into()),
        }

        let status = out.status();
        let keep_alive = continuation == Continuation::KeepAlive;
        if status.is_error() {
            tracing::info!(status = status.as_u16(), version = %version, keep_alive, "Error response sent");
        } else {
            tracing::debug!(status = status.as_u16(), version = %version, keep_alive, "Response sent");
        }

        Ok(match continuation {
            Continuation::KeepAlive => SessionState::AwaitRequest,
            Continuation::Close | Continuation::ForceClose => SessionState::Closed,
        })
    }

    fn error_exchange(
        &self,
        status: StatusCode,
        version: Version,
        method: Option<Method>,
        continuation: Continuation,
    ) -> SessionState {
        SessionState::Respond(Exchange {
            version,
            method,
            response: self.routes.error_response(status),
            continuation,
        })
    }
}

/// HEAD gets the GET response without its body, except at HTTP/0.9 where
/// there is no header to stand in for it.
fn suppresses_body(method: Option<Method>, version: Version) -> bool {
    method == Some(Method::HEAD) && !version.is_simple()
}

fn chain_is_disconnect(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
        .any(is_disconnect)
}
