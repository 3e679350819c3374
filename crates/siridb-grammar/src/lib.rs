//! Keyword grammar for SiriDB style statements.
//!
//! The parser does not build a syntax tree. It reports how far the input
//! matched any statement template and which tokens would be accepted at that
//! position, which is what an interactive prompt needs for completion.

#![allow(missing_docs)]

mod element;
mod parser;
mod statements;

pub use element::{choice, keywords, kw, opt, punct, seq, Element, Token};
pub use parser::{Grammar, GrammarError, ParseResult, SiriGrammar};
