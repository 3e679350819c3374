//! `siridb-prompt` binary entry point.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use siridb_grammar::SiriGrammar;
use siridb_prompt::clipboard::SystemClipboard;
use siridb_prompt::completion::FsDirLister;
use siridb_prompt::config::{self, FileConfig};
use siridb_prompt::console::{forward_logs, spawn_input_reader};
use siridb_prompt::{
    logging, parse_servers, Collaborators, Console, ConsoleSettings, ExitStatus, History,
    OutputMode, TcpConnector,
};

mod cli;

use cli::{Cli, EXIT_FAILURE, EXIT_OK};

const STARTUP_POLL: Duration = Duration::from_secs(1);

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit(EXIT_OK),
                _ => exit(EXIT_FAILURE),
            };
        }
    };
    if cli.version {
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        return exit(EXIT_OK);
    }
    match run(cli) {
        Ok(status) => exit(status.code()),
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit(EXIT_FAILURE)
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run(cli: Cli) -> anyhow::Result<ExitStatus> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => match config::default_config_path() {
            Some(path) => FileConfig::load_optional(path)?.unwrap_or_default(),
            None => FileConfig::default(),
        },
    };
    let settings = file.merge(cli.overrides());
    logging::init(settings.log_file.as_deref(), &settings.log_level)?;

    let dbname = cli.dbname.clone().context("missing --dbname")?;
    let user = cli.user.clone().context("missing --user")?;
    let servers_arg = cli.servers.clone().context("missing --servers")?;

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let (log_tx, log_rx) = crossbeam_channel::unbounded();
    forward_logs(log_rx, event_tx.clone()).context("start log forwarder")?;

    let servers = parse_servers(&servers_arg);
    let connector = TcpConnector::new(
        servers.as_ref().cloned().unwrap_or_default(),
        user.clone(),
        dbname.clone(),
        log_tx,
    );
    let history = History::new(
        usize::from(settings.history),
        config::history_path(&user, &dbname),
    );
    let console_settings = ConsoleSettings {
        user,
        dbname,
        timeout: Duration::from_secs(u64::from(settings.timeout_secs)),
        output_mode: if settings.json {
            OutputMode::Json
        } else {
            OutputMode::Pretty
        },
        startup_poll: STARTUP_POLL,
    };
    let collaborators = Collaborators {
        grammar: Arc::new(SiriGrammar::new()),
        connector: Box::new(connector),
        clipboard: Box::new(SystemClipboard),
        dir_lister: Arc::new(FsDirLister),
    };
    let mut console = Console::new(console_settings, collaborators, history, event_tx.clone());
    if let Err(err) = &servers {
        console.log(format!("error reading servers: {err}"));
    }
    console.load_history();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = (|| {
        spawn_input_reader(event_tx).context("start input reader")?;
        console.start(cli.password.as_deref());
        console.run(&mut terminal, &event_rx)
    })();
    let saved = console.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    if let Err(err) = saved {
        eprintln!("Warning: {err}");
    }
    result
}
