//! Server address list parsing.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::config::ConfigError;

pub const DEFAULT_PORT: u16 = 9000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub host: SmolStr,
    pub port: u16,
}

impl Server {
    pub fn new(host: impl Into<SmolStr>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Server {
    type Err = ConfigError;

    /// Accepts `host`, `host:port`, `[v6]` and `[v6]:port`.
    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &'static str| ConfigError::InvalidServer {
            entry: entry.to_string(),
            reason,
        };
        let entry_trimmed = entry.trim();
        if entry_trimmed.is_empty() {
            return Err(invalid("empty address"));
        }
        let (host, port) = if let Some(bracketed) = entry_trimmed.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("missing closing bracket"))?;
            match tail {
                "" => (host, None),
                _ => (
                    host,
                    Some(
                        tail.strip_prefix(':')
                            .ok_or_else(|| invalid("unexpected text after address"))?,
                    ),
                ),
            }
        } else {
            match entry_trimmed.split_once(':') {
                Some((_, port)) if port.contains(':') => {
                    return Err(invalid("IPv6 addresses must be bracketed"))
                }
                Some((host, port)) => (host, Some(port)),
                None => (entry_trimmed, None),
            }
        };
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|port| *port > 0)
                .ok_or_else(|| invalid("port must be a number between 1 and 65535"))?,
            None => DEFAULT_PORT,
        };
        Ok(Server::new(host, port))
    }
}

/// Parses a comma separated server list.
pub fn parse_servers(text: &str) -> Result<Vec<Server>, ConfigError> {
    text.split(',').map(str::parse).collect()
}
