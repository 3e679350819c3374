use std::path::PathBuf;

use clap::Parser;
use siridb_prompt::config::Overrides;
use smol_str::SmolStr;

/// Exit code: normal quit.
pub const EXIT_OK: i32 = 0;
/// Exit code: bad arguments, aborted password entry or a fatal terminal error.
pub const EXIT_FAILURE: i32 = 1;

/// Tool for communicating with a SiriDB database.
#[derive(Parser, Debug)]
#[command(name = "siridb-prompt", disable_version_flag = true)]
pub struct Cli {
    /// Database name.
    #[arg(short = 'd', long = "dbname", required_unless_present = "version")]
    pub dbname: Option<String>,

    /// Server(s) to connect to. Multiple servers are separated by commas,
    /// for example: server1,server2:9000,[::1]:9000
    #[arg(short = 's', long = "servers", required_unless_present = "version")]
    pub servers: Option<String>,

    /// Database user.
    #[arg(short = 'u', long = "user", required_unless_present = "version")]
    pub user: Option<String>,

    /// Password; asked for interactively when missing.
    #[arg(short = 'p', long = "password")]
    pub password: Option<String>,

    /// Number of commands kept in history; 0 disables history [default: 1000]
    #[arg(long = "history", value_name = "N")]
    pub history: Option<u16>,

    /// Query timeout in seconds [default: 60]
    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub timeout: Option<u16>,

    /// Show raw JSON output instead of formatted results.
    #[arg(long = "json")]
    pub json: bool,

    /// Print the version and exit.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Configuration file [default: ~/.siridb-prompt/config.toml]
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write diagnostics to this file.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter for --log-file, e.g. debug or siridb_prompt=trace [default: info]
    #[arg(long = "log-level", value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            history: self.history,
            timeout_secs: self.timeout,
            json: self.json,
            log_file: self.log_file.clone(),
            log_level: self.log_level.as_deref().map(SmolStr::new),
        }
    }
}
