//! Output view: every submitted query rendered in the current mode.

use crate::format::{format_result, TimePrecision};
use crate::query::{timeout_message, Query, QueryOutcome};
use crate::scroll::{LineStyle, ScrollBuffer, ScrollLine};

const PROMPT: &str = ">>> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Pretty,
    Json,
}

impl OutputMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Pretty => Self::Json,
            Self::Json => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputView {
    queries: Vec<Query>,
    mode: OutputMode,
    precision: Option<TimePrecision>,
    buffer: ScrollBuffer,
}

impl OutputView {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            queries: Vec::new(),
            mode,
            precision: None,
            buffer: ScrollBuffer::new(80, 24),
        }
    }

    pub fn append(&mut self, query: Query) {
        for line in render_query(&query, self.mode, self.precision) {
            self.buffer.append_line(line);
        }
        self.queries.push(query);
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Switches mode and re-renders every stored query.
    pub fn set_mode(&mut self, mode: OutputMode) {
        if self.mode != mode {
            self.mode = mode;
            self.rerender();
        }
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    pub fn set_time_precision(&mut self, precision: TimePrecision) {
        if self.precision != Some(precision) {
            self.precision = Some(precision);
            self.rerender();
        }
    }

    pub fn time_precision(&self) -> Option<TimePrecision> {
        self.precision
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn last_query(&self) -> Option<&Query> {
        self.queries.last()
    }

    pub fn buffer(&self) -> &ScrollBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ScrollBuffer {
        &mut self.buffer
    }

    fn rerender(&mut self) {
        self.buffer.clear();
        for query in &self.queries {
            for line in render_query(query, self.mode, self.precision) {
                self.buffer.append_line(line);
            }
        }
    }
}

/// Echo line, outcome lines, then a blank separator.
pub fn render_query(
    query: &Query,
    mode: OutputMode,
    precision: Option<TimePrecision>,
) -> Vec<ScrollLine> {
    let mut lines = vec![ScrollLine::new(
        format!("{PROMPT}{}", query.raw()),
        LineStyle::Prompt,
    )];
    match (query.outcome(), mode) {
        (Some(QueryOutcome::Succeeded(value)), OutputMode::Pretty) => lines.extend(
            format_result(value, precision)
                .into_iter()
                .map(ScrollLine::plain),
        ),
        (Some(QueryOutcome::Succeeded(_)), OutputMode::Json) => {
            lines.push(ScrollLine::plain(query.to_json()));
        }
        (Some(QueryOutcome::Failed(message)), OutputMode::Pretty) => {
            lines.push(ScrollLine::new(format!("error: {message}"), LineStyle::Error));
        }
        (Some(QueryOutcome::TimedOut(after)), OutputMode::Pretty) => {
            lines.push(ScrollLine::new(
                format!("error: {}", timeout_message(*after)),
                LineStyle::Error,
            ));
        }
        (Some(_), OutputMode::Json) => {
            lines.push(ScrollLine::new(query.to_json(), LineStyle::Error));
        }
        (None, _) => lines.push(ScrollLine::new("(no result)", LineStyle::Muted)),
    }
    lines.push(ScrollLine::plain(""));
    lines
}
