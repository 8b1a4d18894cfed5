//! Access logging.
//!
//! One record per handled request. The sink is an explicit handle built at
//! start-up and shared by every connection, so tests can swap in their own.

use std::fmt;
use std::net::SocketAddr;

use crate::http::response::StatusCode;

/// One handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    pub client: SocketAddr,
    pub method: String,
    pub path: String,
    pub status: StatusCode,
    pub user_agent: String,
}

impl fmt::Display for AccessEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - \"{}\" \"{}\" {} {}",
            self.client,
            self.method,
            self.path,
            self.status.as_u16(),
            self.user_agent
        )
    }
}

pub trait AccessLog: Send + Sync {
    fn record(&self, entry: &AccessEntry);
}

/// Emits each entry as an `info` event under this module's target, so a
/// `RUST_LOG` of `simp_http=info` keeps the access lines. The installed
/// subscriber decides where they end up (console and `access.log` in the
/// binary).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn record(&self, entry: &AccessEntry) {
        tracing::info!("{}", entry);
    }
}
