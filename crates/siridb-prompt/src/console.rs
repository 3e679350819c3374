//! Full-screen console: owns every view and runs the event loop.
//!
//! Background threads never touch console state. They push
//! [`ConsoleEvent`]s into one queue and the foreground loop applies them,
//! draining whatever is queued before it redraws.

#![allow(missing_docs)]

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use ratatui::backend::Backend;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame, Terminal,
};
use siridb_grammar::Grammar;
use tracing::{debug, info, warn};

use crate::client::{Connector, DatabaseClient};
use crate::clipboard::{Clipboard, ClipboardError};
use crate::completion::{CompletionEngine, DirLister};
use crate::editor::Editor;
use crate::format::TimePrecision;
use crate::history::{History, HistoryError};
use crate::output::{OutputMode, OutputView};
use crate::query;
use crate::scroll::{display_width, LineStyle, ScrollBuffer, ScrollLine};

mod input;
mod render;
mod startup;

const COLOR_GREEN: Color = Color::Rgb(46, 204, 113);
const COLOR_RED: Color = Color::Rgb(231, 76, 60);
const COLOR_INFO: Color = Color::Rgb(142, 142, 147);
const COLOR_TEAL: Color = Color::Rgb(0, 168, 150);
const COLOR_HEADER_BG: Color = Color::White;
const COLOR_HEADER_FG: Color = Color::Black;
const COLOR_POPUP_BG: Color = Color::Rgb(48, 48, 48);

const PROMPT: &str = ">>> ";
const PASSWORD_PROMPT: &str = "Password: ";
const MAX_POPUP_ROWS: usize = 8;
const MAX_LOG_LINES: usize = 10_000;

/// Everything the foreground loop reacts to.
#[derive(Debug)]
pub enum ConsoleEvent {
    Input(Event),
    /// A message for the log view, usually from the client.
    Log(String),
    /// The client reached a server for the first time.
    Connected,
    TimePrecision(TimePrecision),
    /// The terminal event source failed.
    Fatal(io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Log,
    Output,
}

#[derive(Debug)]
enum InputMode {
    Password(Editor),
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Quit,
    /// Password entry was cancelled.
    Aborted,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Quit => 0,
            Self::Aborted => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleSettings {
    pub user: String,
    pub dbname: String,
    pub timeout: Duration,
    pub output_mode: OutputMode,
    /// How often the startup task checks for a connection.
    pub startup_poll: Duration,
}

/// Collaborators injected into the console.
pub struct Collaborators {
    pub grammar: Arc<dyn Grammar>,
    pub connector: Box<dyn Connector>,
    pub clipboard: Box<dyn Clipboard>,
    pub dir_lister: Arc<dyn DirLister>,
}

pub struct Console {
    settings: ConsoleSettings,
    view: View,
    mode: InputMode,
    prompt: Editor,
    log: ScrollBuffer,
    output: OutputView,
    history: History,
    grammar: Arc<dyn Grammar>,
    connector: Box<dyn Connector>,
    clipboard: Box<dyn Clipboard>,
    client: Option<Arc<dyn DatabaseClient>>,
    events: Sender<ConsoleEvent>,
}

impl Console {
    pub fn new(
        settings: ConsoleSettings,
        collaborators: Collaborators,
        history: History,
        events: Sender<ConsoleEvent>,
    ) -> Self {
        let Collaborators {
            grammar,
            connector,
            clipboard,
            dir_lister,
        } = collaborators;
        let engine = CompletionEngine::with_defaults(grammar.clone(), dir_lister);
        let output = OutputView::new(settings.output_mode);
        Self {
            settings,
            view: View::Log,
            mode: InputMode::Normal,
            prompt: Editor::new().with_completer(Arc::new(engine)),
            log: ScrollBuffer::new(80, 24).with_max_lines(MAX_LOG_LINES),
            output,
            history,
            grammar,
            connector,
            clipboard,
            client: None,
            events,
        }
    }

    /// Appends a timestamped line to the log view.
    pub fn log(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(target: "siridb_prompt::console", "{message}");
        let stamp = chrono::Local::now().format("%H:%M:%S");
        let style = if message.starts_with("error") || message.starts_with("cannot") {
            LineStyle::Error
        } else {
            LineStyle::Plain
        };
        self.log.append(&format!("{stamp} {message}"), style);
    }

    pub fn load_history(&mut self) {
        if let Err(err) = self.history.load() {
            warn!(error = %err, "history not loaded");
            self.log(err.to_string());
        }
    }

    /// Opens the session right away, or asks for the password first.
    pub fn start(&mut self, password: Option<&str>) {
        match password.filter(|password| !password.is_empty()) {
            Some(password) => self.open_session(password),
            None => self.mode = InputMode::Password(Editor::hidden()),
        }
    }

    fn open_session(&mut self, password: &str) {
        let client = self.connector.open(password);
        client.connect();
        startup::spawn(
            client.clone(),
            self.events.clone(),
            self.settings.startup_poll,
        );
        self.view = if client.is_available() {
            View::Output
        } else {
            View::Log
        };
        self.client = Some(client);
        self.mode = InputMode::Normal;
    }

    /// Runs until the user quits. The caller restores the terminal.
    pub fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &Receiver<ConsoleEvent>,
    ) -> anyhow::Result<ExitStatus> {
        self.draw(terminal)?;
        loop {
            let event = events.recv().context("console event queue closed")?;
            if let Some(status) = self.handle_event(event)? {
                return Ok(status);
            }
            while let Ok(event) = events.try_recv() {
                if let Some(status) = self.handle_event(event)? {
                    return Ok(status);
                }
            }
            self.draw(terminal)?;
        }
    }

    /// Applies one event; `Some` ends the loop.
    pub fn handle_event(&mut self, event: ConsoleEvent) -> anyhow::Result<Option<ExitStatus>> {
        match event {
            ConsoleEvent::Input(event) => Ok(input::handle_input(self, event)),
            ConsoleEvent::Log(message) => {
                self.log(message);
                Ok(None)
            }
            ConsoleEvent::Connected => {
                if self.view == View::Log {
                    self.view = View::Output;
                }
                Ok(None)
            }
            ConsoleEvent::TimePrecision(precision) => {
                self.output.set_time_precision(precision);
                self.log(format!("finished reading time precision: '{precision}'"));
                Ok(None)
            }
            ConsoleEvent::Fatal(err) => {
                Err(anyhow::Error::new(err).context("terminal input failed"))
            }
        }
    }

    pub fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let area = terminal.size()?;
        self.resize(area);
        terminal.draw(|frame| render::render_console(frame, self))?;
        Ok(())
    }

    fn resize(&mut self, area: Rect) {
        let width = usize::from(area.width);
        self.log
            .set_viewport(width, usize::from(area.height.saturating_sub(1)));
        self.output
            .buffer_mut()
            .set_viewport(width, usize::from(area.height.saturating_sub(2)));
    }

    /// Saves history and closes the client.
    pub fn shutdown(&mut self) -> Result<(), HistoryError> {
        if let Some(client) = self.client.take() {
            client.close();
        }
        self.history.save()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_password_mode(&self) -> bool {
        matches!(self.mode, InputMode::Password(_))
    }

    pub fn prompt(&self) -> &Editor {
        &self.prompt
    }

    pub fn log_buffer(&self) -> &ScrollBuffer {
        &self.log
    }

    pub fn output(&self) -> &OutputView {
        &self.output
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn is_connected(&self) -> bool {
        self.client
            .as_ref()
            .is_some_and(|client| client.is_connected())
    }
}

/// Reads terminal events on a dedicated thread until the queue closes.
pub fn spawn_input_reader(events: Sender<ConsoleEvent>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("siridb-input".into())
        .spawn(move || loop {
            let event = match event::read() {
                Ok(event) => ConsoleEvent::Input(event),
                Err(err) => {
                    let _ = events.send(ConsoleEvent::Fatal(err));
                    return;
                }
            };
            if events.send(event).is_err() {
                return;
            }
        })
}

/// Forwards client log messages into the console queue.
pub fn forward_logs(
    messages: Receiver<String>,
    events: Sender<ConsoleEvent>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("siridb-log".into())
        .spawn(move || {
            for message in messages {
                if events.send(ConsoleEvent::Log(message)).is_err() {
                    return;
                }
            }
        })
}
