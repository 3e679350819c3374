//! Completion candidates for the prompt line.
//!
//! The engine parses the text before the cursor once and hands the result to
//! an ordered chain of providers. Each provider sees the same context and
//! contributes zero or more candidates; the chain order is the order shown in
//! the popup.

use std::io;
use std::path::Path;
use std::sync::Arc;

use siridb_grammar::{Grammar, GrammarError, Token};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
}

/// A replacement for the last `start_pos` characters before the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub display: String,
    pub start_pos: usize,
}

impl Completion {
    pub fn new(text: impl Into<String>, display: impl Into<String>, start_pos: usize) -> Self {
        Self {
            text: text.into(),
            display: display.into(),
            start_pos,
        }
    }
}

/// Produces candidates for the text left of the cursor.
pub trait Completer: Send + Sync {
    fn complete(&self, text: &str) -> Result<Vec<Completion>, CompletionError>;
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionContext<'a> {
    /// Text before the cursor.
    pub line: &'a str,
    /// Unparsed remainder, starting at the parser position.
    pub rest: &'a str,
    pub expecting: &'a [Token],
}

pub trait CompletionProvider: Send + Sync {
    fn complete(&self, ctx: &CompletionContext<'_>) -> Vec<Completion>;
}

/// Directory listing seam for path completion.
pub trait DirLister: Send + Sync {
    fn list(&self, path: &Path) -> io::Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirLister;

impl DirLister for FsDirLister {
    fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = std::fs::read_dir(path)?
            .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }
}

/// Offers `exit` for any trimmed line that is a strict prefix of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCompletion;

impl CompletionProvider for ExitCompletion {
    fn complete(&self, ctx: &CompletionContext<'_>) -> Vec<Completion> {
        let trimmed = ctx.line.trim();
        if !trimmed.is_empty() && trimmed.len() < "exit".len() && "exit".starts_with(trimmed) {
            vec![Completion::new("exit", "exit", replaced_len(ctx.line))]
        } else {
            Vec::new()
        }
    }
}

/// Characters a command-word candidate replaces: the line minus leading
/// whitespace, trailing whitespace included.
fn replaced_len(line: &str) -> usize {
    line.trim_start().chars().count()
}

/// Completes the `import` keyword and the entries of the directory after it.
///
/// `import` is a console command, not a statement, so this provider parses
/// the line itself: the path is consumed whole and entries only replace the
/// whitespace after it.
pub struct ImportCompletion {
    lister: Arc<dyn DirLister>,
}

impl ImportCompletion {
    pub fn new(lister: Arc<dyn DirLister>) -> Self {
        Self { lister }
    }
}

impl CompletionProvider for ImportCompletion {
    fn complete(&self, ctx: &CompletionContext<'_>) -> Vec<Completion> {
        let trimmed = ctx.line.trim_start();
        let fragment = trimmed
            .strip_prefix("import")
            .filter(|rest| rest.starts_with(char::is_whitespace));
        let Some(fragment) = fragment else {
            let word = ctx.line.trim();
            if !word.is_empty() && "import".starts_with(word) {
                return vec![Completion::new("import ", "import", replaced_len(ctx.line))];
            }
            return Vec::new();
        };

        let path = fragment.trim();
        let (dir, start_pos) = if path.is_empty() {
            (".", 0)
        } else {
            let trailing = fragment.chars().rev().take_while(|c| c.is_whitespace()).count();
            (path, trailing)
        };
        match self.lister.list(Path::new(dir)) {
            Ok(names) => {
                names
                    .into_iter()
                    .map(|name| Completion::new(format!("{name} "), name, start_pos))
                    .collect()
            }
            Err(err) => {
                debug!(dir, error = %err, "path completion skipped");
                Vec::new()
            }
        }
    }
}

/// Offers grammar keywords accepted at the parser position.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCompletion;

impl CompletionProvider for KeywordCompletion {
    fn complete(&self, ctx: &CompletionContext<'_>) -> Vec<Completion> {
        let start_pos = ctx.rest.chars().count();
        let after_space = ctx.rest.is_empty() && ctx.line.ends_with(' ');
        ctx.expecting
            .iter()
            .filter_map(Token::keyword)
            .filter(|word| {
                ctx.line.is_empty()
                    || after_space
                    || (!ctx.rest.is_empty() && word.starts_with(ctx.rest))
            })
            .map(|word| Completion::new(format!("{word} "), word, start_pos))
            .collect()
    }
}

pub struct CompletionEngine {
    grammar: Arc<dyn Grammar>,
    providers: Vec<Box<dyn CompletionProvider>>,
}

impl CompletionEngine {
    /// Engine with no providers.
    pub fn new(grammar: Arc<dyn Grammar>) -> Self {
        Self {
            grammar,
            providers: Vec::new(),
        }
    }

    /// Exit, import and keyword providers, in that order.
    pub fn with_defaults(grammar: Arc<dyn Grammar>, lister: Arc<dyn DirLister>) -> Self {
        Self::new(grammar)
            .with_provider(ExitCompletion)
            .with_provider(ImportCompletion::new(lister))
            .with_provider(KeywordCompletion)
    }

    pub fn with_provider(mut self, provider: impl CompletionProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl Completer for CompletionEngine {
    fn complete(&self, text: &str) -> Result<Vec<Completion>, CompletionError> {
        let parsed = self.grammar.parse(text)?;
        let rest = text.get(parsed.pos()..).unwrap_or("");
        let ctx = CompletionContext {
            line: text,
            rest,
            expecting: parsed.expecting(),
        };
        Ok(self
            .providers
            .iter()
            .flat_map(|provider| provider.complete(&ctx))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siridb_grammar::SiriGrammar;
    use std::path::PathBuf;

    struct FixedLister {
        names: Vec<&'static str>,
    }

    impl DirLister for FixedLister {
        fn list(&self, path: &Path) -> io::Result<Vec<String>> {
            if path == Path::new("/missing") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
            }
            Ok(self.names.iter().map(|name| name.to_string()).collect())
        }
    }

    fn engine() -> CompletionEngine {
        CompletionEngine::with_defaults(
            Arc::new(SiriGrammar::new()),
            Arc::new(FixedLister {
                names: vec!["data.json", "more"],
            }),
        )
    }

    fn texts(candidates: &[Completion]) -> Vec<&str> {
        candidates.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn exit_prefix_offers_exit_anchored_at_the_prefix() {
        let candidates = engine().complete("exi").expect("complete");
        assert_eq!(candidates, vec![Completion::new("exit", "exit", 3)]);
    }

    #[test]
    fn exit_prefix_with_surrounding_whitespace_replaces_the_typed_word() {
        let candidates = engine().complete("exi ").expect("complete");
        assert_eq!(candidates, vec![Completion::new("exit", "exit", 4)]);
        let candidates = engine().complete("  ex").expect("complete");
        assert_eq!(candidates, vec![Completion::new("exit", "exit", 2)]);
    }

    #[test]
    fn exact_exit_offers_nothing() {
        let candidates = engine().complete("exit").expect("complete");
        assert!(candidates.is_empty());
    }

    #[test]
    fn empty_line_offers_every_statement_keyword() {
        let candidates = engine().complete("").expect("complete");
        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0], Completion::new("select ", "select", 0));
        assert!(candidates.iter().all(|c| c.start_pos == 0));
    }

    #[test]
    fn partial_keyword_is_filtered_by_prefix() {
        let candidates = engine().complete("list se").expect("complete");
        assert_eq!(texts(&candidates), vec!["series ", "servers "]);
        assert!(candidates.iter().all(|c| c.start_pos == 2));
    }

    #[test]
    fn keyword_after_space_lists_all_followers() {
        let candidates = engine().complete("grant read to ").expect("complete");
        assert_eq!(texts(&candidates), vec!["user ", "group "]);
    }

    #[test]
    fn import_prefix_offers_the_bare_keyword() {
        let candidates = engine().complete("imp").expect("complete");
        assert_eq!(candidates, vec![Completion::new("import ", "import", 3)]);
    }

    #[test]
    fn candidates_keep_discovery_order_without_collapsing() {
        struct Twice;
        impl CompletionProvider for Twice {
            fn complete(&self, _ctx: &CompletionContext<'_>) -> Vec<Completion> {
                vec![Completion::new("exit", "exit", 3)]
            }
        }
        let engine = engine().with_provider(Twice);
        let candidates = engine.complete("exi").expect("complete");
        assert_eq!(
            candidates,
            vec![
                Completion::new("exit", "exit", 3),
                Completion::new("exit", "exit", 3)
            ]
        );
    }

    #[test]
    fn import_entries_extend_the_path() {
        let candidates = engine().complete("import ").expect("complete");
        assert_eq!(texts(&candidates), vec!["data.json ", "more "]);
        assert!(candidates.iter().all(|c| c.start_pos == 0));

        let candidates = engine().complete("import /tmp/").expect("complete");
        assert_eq!(texts(&candidates), vec!["data.json ", "more "]);
        assert!(candidates.iter().all(|c| c.start_pos == 0));

        let candidates = engine().complete("import /tmp/ ").expect("complete");
        assert!(candidates.iter().all(|c| c.start_pos == 1));
    }

    #[test]
    fn unreadable_directory_yields_nothing() {
        let candidates = engine().complete("import /missing").expect("complete");
        assert!(candidates.is_empty());
    }

    #[test]
    fn grammar_failure_is_reported() {
        let err = engine()
            .complete("create user 'x")
            .expect_err("unterminated string");
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn fs_lister_sorts_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.json"), "{}").expect("write");
        std::fs::write(dir.path().join("a.json"), "{}").expect("write");
        let names = FsDirLister.list(dir.path()).expect("list");
        assert_eq!(names, vec!["a.json", "b.json"]);
        assert!(FsDirLister
            .list(&PathBuf::from("/definitely/not/here"))
            .is_err());
    }
}
