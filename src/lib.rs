//! SIMP-HTTP - a small HTTP/1.1 file and form server
//!
//! Core library: message framing, handlers and the connection loop.

pub mod access_log;
pub mod config;
pub mod handler;
pub mod http;
pub mod server;
