//! tinyweb - a small static web server
//!
//! Core library: HTTP/0.9-1.1 protocol engine, routing and the connection
//! acceptor.

pub mod config;
pub mod http;
pub mod routing;
pub mod server;
