//! Backtracking matcher over statement templates.

use thiserror::Error;

use crate::element::{Element, Token};
use crate::statements::statements;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },
}

/// Outcome of parsing one (possibly partial) statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pos: usize,
    valid: bool,
    expecting: Vec<Token>,
}

impl ParseResult {
    /// Byte offset where matching stopped. Text after it is the unparsed remainder.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// True when at least one statement matched the whole input.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Tokens that would extend the statement at [`ParseResult::pos`].
    #[must_use]
    pub fn expecting(&self) -> &[Token] {
        &self.expecting
    }
}

/// Parses command text and reports what would follow it.
pub trait Grammar: Send + Sync {
    fn parse(&self, text: &str) -> Result<ParseResult, GrammarError>;
}

#[derive(Debug, Clone)]
pub struct SiriGrammar {
    statements: Vec<Element>,
}

impl Default for SiriGrammar {
    fn default() -> Self {
        Self {
            statements: statements(),
        }
    }
}

impl SiriGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statements(statements: Vec<Element>) -> Self {
        Self { statements }
    }
}

impl Grammar for SiriGrammar {
    fn parse(&self, text: &str) -> Result<ParseResult, GrammarError> {
        let mut walker = Walker::new(text);
        let mut valid = false;
        let mut matched_end = 0;
        for statement in &self.statements {
            for end in walker.walk(statement, 0)? {
                matched_end = matched_end.max(end);
                if walker.skip_ws(end) == text.len() {
                    valid = true;
                }
            }
        }
        let pos = walker.furthest.max(matched_end);
        let expecting = if walker.furthest == pos {
            walker.expecting
        } else {
            Vec::new()
        };
        Ok(ParseResult {
            pos,
            valid,
            expecting,
        })
    }
}

struct Walker<'a> {
    text: &'a str,
    furthest: usize,
    expecting: Vec<Token>,
}

impl<'a> Walker<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            furthest: 0,
            expecting: Vec::new(),
        }
    }

    fn skip_ws(&self, at: usize) -> usize {
        let tail = &self.text[at..];
        at + (tail.len() - tail.trim_start().len())
    }

    fn expect(&mut self, pos: usize, token: Token) {
        if pos > self.furthest {
            self.furthest = pos;
            self.expecting.clear();
        }
        if pos == self.furthest && !self.expecting.contains(&token) {
            self.expecting.push(token);
        }
    }

    /// Returns every end position reachable by matching `element` from `at`.
    fn walk(&mut self, element: &Element, at: usize) -> Result<Vec<usize>, GrammarError> {
        let text = self.text;
        match element {
            Element::Keyword(word) => {
                let p = self.skip_ws(at);
                let len = word_len(&text[p..]);
                if len > 0 && text[p..p + len].eq_ignore_ascii_case(word) {
                    Ok(vec![p + len])
                } else {
                    self.expect(p, Token::Keyword(*word));
                    Ok(Vec::new())
                }
            }
            Element::Punct(literal) => {
                let p = self.skip_ws(at);
                if text[p..].starts_with(*literal) {
                    Ok(vec![p + literal.len()])
                } else {
                    self.expect(p, Token::Punct(*literal));
                    Ok(Vec::new())
                }
            }
            Element::Sequence(items) => {
                let mut positions = vec![at];
                for item in items {
                    let mut next = Vec::new();
                    for pos in positions {
                        for end in self.walk(item, pos)? {
                            if !next.contains(&end) {
                                next.push(end);
                            }
                        }
                    }
                    if next.is_empty() {
                        return Ok(next);
                    }
                    positions = next;
                }
                Ok(positions)
            }
            Element::Choice(items) => {
                let mut ends = Vec::new();
                for item in items {
                    for end in self.walk(item, at)? {
                        if !ends.contains(&end) {
                            ends.push(end);
                        }
                    }
                }
                Ok(ends)
            }
            Element::Optional(item) => {
                let mut ends = self.walk(item, at)?;
                if !ends.contains(&at) {
                    ends.push(at);
                }
                Ok(ends)
            }
            Element::Name => {
                let p = self.skip_ws(at);
                let tail = &text[p..];
                match tail.chars().next() {
                    Some(quote @ ('\'' | '"')) => match quoted_len(tail, quote) {
                        Some(len) => Ok(vec![p + len]),
                        None => Err(GrammarError::UnterminatedString { pos: p }),
                    },
                    _ => self.token(p, bare_len(tail), Token::Name),
                }
            }
            Element::Number => {
                let p = self.skip_ws(at);
                let len = number_len(&text[p..]);
                self.token(p, len, Token::Number)
            }
            Element::Rest => {
                let p = self.skip_ws(at);
                let len = text.len() - p;
                self.token(p, len, Token::Rest)
            }
        }
    }

    fn token(&mut self, p: usize, len: usize, token: Token) -> Result<Vec<usize>, GrammarError> {
        if len == 0 {
            self.expect(p, token);
            Ok(Vec::new())
        } else {
            Ok(vec![p + len])
        }
    }
}

fn word_len(text: &str) -> usize {
    text.chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum()
}

fn bare_len(text: &str) -> usize {
    text.chars()
        .take_while(|c| !c.is_whitespace() && !matches!(c, ',' | '(' | ')'))
        .map(char::len_utf8)
        .sum()
}

/// Length of a quoted string including both quotes; a doubled quote is an escape.
fn quoted_len(text: &str, quote: char) -> Option<usize> {
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((idx, c)) = chars.next() {
        if c != quote {
            continue;
        }
        if chars.peek().map(|(_, next)| *next) == Some(quote) {
            chars.next();
            continue;
        }
        return Some(idx + c.len_utf8());
    }
    None
}

fn number_len(text: &str) -> usize {
    let sign = usize::from(text.starts_with('-'));
    let digits = text[sign..]
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    if digits == 0 {
        return 0;
    }
    let unit = text[sign + digits..]
        .chars()
        .take_while(|c| matches!(c, 's' | 'm' | 'h' | 'd' | 'w'))
        .count();
    sign + digits + unit
}
