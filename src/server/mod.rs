//! TCP front end: binds the configured address and spawns one task per
//! accepted connection.

pub mod listener;

pub use listener::Listener;
