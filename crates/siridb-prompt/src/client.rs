//! Database client seam.
//!
//! The console only talks to [`DatabaseClient`]. [`TcpClient`] is the
//! production adapter; tests substitute scripted fakes.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

mod tcp;

pub use tcp::{Credentials, TcpClient, TcpConnector};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected")]
    NotConnected,
    #[error("query timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("connection lost")]
    ConnectionLost,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The server answered with an error message.
    #[error("{0}")]
    Rejected(String),
}

pub trait DatabaseClient: Send + Sync {
    /// Starts connecting. Failures are reported on the client's log stream.
    fn connect(&self);
    fn close(&self);
    fn is_connected(&self) -> bool;
    /// True when a query can be sent right now.
    fn is_available(&self) -> bool;
    fn query(&self, text: &str, timeout: Duration) -> Result<Value, ClientError>;
    fn insert(&self, data: &Value, timeout: Duration) -> Result<Value, ClientError>;
}

/// Builds a client once the password is known.
pub trait Connector: Send {
    fn open(&mut self, password: &str) -> Arc<dyn DatabaseClient>;
}
