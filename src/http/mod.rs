//! HTTP protocol implementation.
//!
//! This module implements HTTP/1.1 framing over persistent connections.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection request-response state machine
//! - **`parser`**: Parses the request line and header fields from byte buffers
//! - **`body`**: Completes Content-Length delimited bodies from the socket
//! - **`request`**: HTTP request representation and method classification
//! - **`response`**: Status table, ordered headers and the response builder
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//! - **`date`**: `Date` / `Last-Modified` header values
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received          (empty read → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Dispatch by method
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               └─ Reading (same connection)
//! ```
//!
//! Malformed framing moves straight to `Closed`.

pub mod body;
pub mod connection;
pub mod date;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
