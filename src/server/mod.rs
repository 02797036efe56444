//! Connection acceptor
//!
//! Binds the listening socket and hands every accepted connection to its own
//! `Session` task.

pub mod listener;
