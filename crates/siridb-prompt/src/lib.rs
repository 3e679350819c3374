//! Interactive full-screen prompt for SiriDB.
//!
//! The [`console::Console`] owns the log view, the output view, the prompt
//! editor and command history. It talks to the database through the
//! [`client::DatabaseClient`] seam and offers completions from the
//! `siridb-grammar` statement grammar.

#![allow(missing_docs)]

pub mod client;
pub mod clipboard;
pub mod completion;
pub mod config;
pub mod console;
pub mod editor;
pub mod format;
pub mod history;
pub mod logging;
pub mod output;
pub mod query;
pub mod scroll;
pub mod server;

#[cfg(test)]
mod testing;

pub use client::{ClientError, Connector, DatabaseClient, TcpClient, TcpConnector};
pub use console::{Collaborators, Console, ConsoleEvent, ConsoleSettings, ExitStatus, View};
pub use history::{History, HistoryError};
pub use output::OutputMode;
pub use server::{parse_servers, Server};
