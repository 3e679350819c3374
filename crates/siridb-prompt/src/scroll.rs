//! Width-wrapped scrollback buffer shared by the log and output views.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TAB: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Plain,
    /// Echo of a submitted command.
    Prompt,
    Error,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollLine {
    pub text: String,
    pub style: LineStyle,
}

impl ScrollLine {
    pub fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, LineStyle::Plain)
    }
}

/// Append-only line buffer with a clamped viewport.
///
/// Source lines are kept so the buffer can be re-wrapped when the terminal
/// width changes. `offset` counts wrapped rows and always stays within
/// `0..=rows - height`. With a line limit the oldest source lines are
/// dropped first.
#[derive(Debug, Clone)]
pub struct ScrollBuffer {
    source: Vec<ScrollLine>,
    rows: Vec<ScrollLine>,
    width: usize,
    height: usize,
    offset: usize,
    autoscroll: bool,
    max_lines: Option<usize>,
}

impl ScrollBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            source: Vec::new(),
            rows: Vec::new(),
            width: width.max(1),
            height,
            offset: 0,
            autoscroll: true,
            max_lines: None,
        }
    }

    /// Keeps at most `max_lines` source lines.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines.max(1));
        self
    }

    /// Appends text, one source line per `\n`.
    pub fn append(&mut self, text: &str, style: LineStyle) {
        for line in text.split('\n') {
            let line = ScrollLine::new(line.trim_end_matches('\r').replace('\t', TAB), style);
            self.rows.extend(wrap(&line, self.width));
            self.source.push(line);
        }
        self.trim();
        if self.autoscroll {
            self.offset = self.max_offset();
        }
    }

    pub fn append_line(&mut self, line: ScrollLine) {
        self.append(&line.text, line.style);
    }

    pub fn clear(&mut self) {
        self.source.clear();
        self.rows.clear();
        self.offset = 0;
        self.autoscroll = true;
    }

    /// Adapts the buffer to a new viewport, re-wrapping when the width changed.
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        let width = width.max(1);
        if width != self.width {
            self.width = width;
            self.rows = self
                .source
                .iter()
                .flat_map(|line| wrap(line, width))
                .collect();
        }
        self.height = height;
        let max = self.max_offset();
        if self.autoscroll || self.offset >= max {
            self.offset = max;
            self.autoscroll = true;
        }
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-(self.height as isize));
    }

    pub fn page_down(&mut self) {
        self.scroll_by(self.height as isize);
    }

    pub fn up(&mut self) {
        self.scroll_by(-1);
    }

    pub fn down(&mut self) {
        self.scroll_by(1);
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.max_offset();
        let target = self.offset as isize + delta;
        self.offset = target.clamp(0, max as isize) as usize;
        self.autoscroll = self.offset == max;
    }

    fn trim(&mut self) {
        let Some(max_lines) = self.max_lines else {
            return;
        };
        let excess = self.source.len().saturating_sub(max_lines);
        if excess == 0 {
            return;
        }
        let dropped_rows: usize = self
            .source
            .drain(..excess)
            .map(|line| wrap(&line, self.width).len())
            .sum();
        self.rows.drain(..dropped_rows.min(self.rows.len()));
        self.offset = self.offset.saturating_sub(dropped_rows).min(self.max_offset());
    }

    fn max_offset(&self) -> usize {
        self.rows.len().saturating_sub(self.height)
    }

    /// Rows currently inside the viewport; fewer than `height` when the buffer is short.
    pub fn visible(&self) -> &[ScrollLine] {
        let end = (self.offset + self.height).min(self.rows.len());
        &self.rows[self.offset..end]
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_autoscroll(&self) -> bool {
        self.autoscroll
    }

    /// Number of wrapped rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn lines(&self) -> &[ScrollLine] {
        &self.source
    }
}

/// Display width of `text` in terminal columns.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Splits a line into rows no wider than `width` columns.
///
/// A glyph wider than the whole row still gets a row of its own.
fn wrap(line: &ScrollLine, width: usize) -> Vec<ScrollLine> {
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for ch in line.text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            rows.push(ScrollLine::new(std::mem::take(&mut current), line.style));
            used = 0;
        }
        current.push(ch);
        used += w;
    }
    rows.push(ScrollLine::new(current, line.style));
    rows
}
