//! HTTP protocol implementation.
//!
//! This module implements HTTP/0.9, HTTP/1.0 and HTTP/1.1 request handling with
//! support for keep-alive connections.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection session implementing the request-response state machine
//! - **`parser`**: Reads and validates one request (request line, then headers) from a buffered stream
//! - **`request`**: HTTP request representation, methods and protocol versions
//! - **`response`**: Status codes and the response model (file, redirect, handler)
//! - **`writer`**: The output side of an exchange: status line, headers and body
//! - **`error`**: Protocol error taxonomy
//!
//! # Session State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌──────────────────┐
//!        │   AwaitRequest   │ ← Read and parse the next request
//!        └──────┬───────────┘
//!               │ Request parsed (or rejected → error page)
//!               ▼           peer closed without data → Closed
//!        ┌──────────────────┐
//!        │      Route       │ ← Redirect, handler or static file
//!        └──────┬───────────┘
//!               │ Response model chosen
//!               ▼
//!        ┌──────────────────┐
//!        │     Respond      │ ← Render and flush
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ HTTP/1.1 without "Connection: close" → AwaitRequest
//!               └─ otherwise → Closed
//! ```
//!
//! HTTP/0.9 responses carry only the body. HEAD requests above HTTP/0.9 get the
//! same status and headers as the matching GET, without the body.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tinyweb::http::connection::Session;
//! use tinyweb::routing::RouteConfig;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let routes = Arc::new(RouteConfig::builder("htdocs").build()?);
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let routes = Arc::clone(&routes);
//!         tokio::spawn(async move {
//!             let (reader, writer) = socket.into_split();
//!             let mut session = Session::new(reader, writer, routes, None);
//!             if let Err(e) = session.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod error;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
