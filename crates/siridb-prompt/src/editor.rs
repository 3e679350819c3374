//! Single-line editor backing both the command prompt and password entry.

use std::sync::Arc;

use crate::completion::{Completer, Completion};

const MASK: char = '*';

/// Editable line with a cursor and an optional completion hook.
///
/// Every mutation refreshes the candidate list from the text left of the
/// cursor. A completer failure empties the list and leaves a diagnostic for
/// the owner to collect with [`Editor::take_diagnostic`].
#[derive(Clone, Default)]
pub struct Editor {
    text: Vec<char>,
    cursor: usize,
    hidden: bool,
    completions: Vec<Completion>,
    selected: Option<usize>,
    completer: Option<Arc<dyn Completer>>,
    diagnostic: Option<String>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("text", &self.display_text())
            .field("cursor", &self.cursor)
            .field("hidden", &self.hidden)
            .field("completions", &self.completions.len())
            .field("selected", &self.selected)
            .finish()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor whose content is masked when displayed.
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::default()
        }
    }

    pub fn with_completer(mut self, completer: Arc<dyn Completer>) -> Self {
        self.completer = Some(completer);
        self
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn text_before_cursor(&self) -> String {
        self.text[..self.cursor].iter().collect()
    }

    /// Characters as they should appear on screen.
    pub fn display_chars(&self) -> Vec<char> {
        if self.hidden {
            vec![MASK; self.text.len()]
        } else {
            self.text.clone()
        }
    }

    pub fn display_text(&self) -> String {
        self.display_chars().into_iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += 1;
        self.changed();
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.text.remove(self.cursor);
        }
        self.changed();
    }

    pub fn delete_at_cursor(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
        self.changed();
    }

    pub fn delete_all(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.changed();
    }

    /// Moves the cursor by `delta` characters, clamped to the line.
    pub fn move_cursor(&mut self, delta: isize) {
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, self.text.len() as isize) as usize;
        self.changed();
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
        self.changed();
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
        self.changed();
    }

    /// Replaces the whole line and puts the cursor at its end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.cursor = self.text.len();
        self.changed();
    }

    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    pub fn has_completions(&self) -> bool {
        !self.completions.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select_next(&mut self) {
        let len = self.completions.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(idx) => (idx + 1) % len,
            None => 0,
        });
    }

    pub fn select_prev(&mut self) {
        let len = self.completions.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => len - 1,
            Some(idx) => idx - 1,
        });
    }

    pub fn clear_completions(&mut self) {
        self.completions.clear();
        self.selected = None;
    }

    /// Applies the selected candidate, or the first one when none is selected.
    ///
    /// Returns false when there is nothing to apply.
    pub fn accept_completion(&mut self) -> bool {
        let idx = self.selected.unwrap_or(0);
        let Some(candidate) = self.completions.get(idx).cloned() else {
            return false;
        };
        let start = self.cursor.saturating_sub(candidate.start_pos);
        let replacement: Vec<char> = candidate.text.chars().collect();
        let inserted = replacement.len();
        self.text.splice(start..self.cursor, replacement);
        self.cursor = start + inserted;
        self.changed();
        true
    }

    pub fn take_diagnostic(&mut self) -> Option<String> {
        self.diagnostic.take()
    }

    fn changed(&mut self) {
        self.selected = None;
        let Some(completer) = &self.completer else {
            return;
        };
        match completer.complete(&self.text_before_cursor()) {
            Ok(candidates) => self.completions = candidates,
            Err(err) => {
                self.completions.clear();
                self.diagnostic = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use parking_lot::Mutex;

    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    impl Completer for Recording {
        fn complete(&self, text: &str) -> Result<Vec<Completion>, CompletionError> {
            self.seen.lock().push(text.to_string());
            if text.ends_with('!') {
                return Err(CompletionError::Grammar(
                    siridb_grammar::GrammarError::UnterminatedString { pos: 0 },
                ));
            }
            if text == "exi" {
                return Ok(vec![Completion::new("exit", "exit", 3)]);
            }
            Ok(vec![
                Completion::new("alpha ", "alpha", 0),
                Completion::new("beta ", "beta", 0),
            ])
        }
    }

    fn editor_with(completer: Arc<Recording>) -> Editor {
        Editor::new().with_completer(completer)
    }

    fn recording() -> Arc<Recording> {
        Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
        })
    }

    fn type_text(editor: &mut Editor, text: &str) {
        for ch in text.chars() {
            editor.insert(ch);
        }
    }

    #[test]
    fn cursor_stays_within_text_bounds() {
        let mut editor = Editor::new();
        type_text(&mut editor, "héllo");
        editor.move_cursor(-100);
        assert_eq!(editor.cursor(), 0);
        editor.delete_before_cursor();
        assert_eq!(editor.text(), "héllo");
        editor.move_cursor(100);
        assert_eq!(editor.cursor(), 5);
        editor.delete_at_cursor();
        assert_eq!(editor.text(), "héllo");
        editor.move_cursor(-2);
        editor.delete_before_cursor();
        assert_eq!(editor.text(), "hélo");
        assert_eq!(editor.cursor(), 2);
        editor.delete_at_cursor();
        assert_eq!(editor.text(), "héo");
        editor.delete_all();
        assert_eq!(editor.cursor(), 0);
        assert!(editor.is_empty());
    }

    #[test]
    fn every_mutation_completes_text_before_cursor() {
        let completer = recording();
        let mut editor = editor_with(completer.clone());
        type_text(&mut editor, "ab");
        editor.move_home();
        editor.move_end();
        editor.move_cursor(-1);
        assert_eq!(
            completer.seen.lock().clone(),
            vec!["a", "ab", "", "ab", "a"]
        );
    }

    #[test]
    fn accept_replaces_prefix_with_selected_candidate() {
        let mut editor = editor_with(recording());
        type_text(&mut editor, "exi");
        assert_eq!(editor.completions().len(), 1);
        assert!(editor.accept_completion());
        assert_eq!(editor.text(), "exit");
        assert_eq!(editor.cursor(), 4);
    }

    #[test]
    fn accept_after_trailing_space_replaces_the_whole_word() {
        let engine = crate::completion::CompletionEngine::with_defaults(
            Arc::new(siridb_grammar::SiriGrammar::new()),
            Arc::new(crate::testing::EmptyLister),
        );
        let mut editor = Editor::new().with_completer(Arc::new(engine));
        type_text(&mut editor, "exi ");
        assert_eq!(editor.completions(), &[Completion::new("exit", "exit", 4)]);
        assert!(editor.accept_completion());
        assert_eq!(editor.text(), "exit");

        editor.delete_all();
        type_text(&mut editor, "  imp ");
        assert!(editor.accept_completion());
        assert_eq!(editor.text(), "  import ");
    }

    #[test]
    fn accept_without_candidates_is_a_noop() {
        let mut editor = Editor::new();
        type_text(&mut editor, "abc");
        assert!(!editor.accept_completion());
        assert_eq!(editor.text(), "abc");
    }

    #[test]
    fn selection_wraps_in_both_directions() {
        let mut editor = editor_with(recording());
        type_text(&mut editor, "x ");
        editor.select_prev();
        assert_eq!(editor.selected(), Some(1));
        editor.select_next();
        assert_eq!(editor.selected(), Some(0));
        editor.select_next();
        editor.select_next();
        assert_eq!(editor.selected(), Some(0));
        assert!(editor.accept_completion());
        assert_eq!(editor.text(), "x alpha ");
    }

    #[test]
    fn completer_error_clears_candidates_and_leaves_diagnostic() {
        let mut editor = editor_with(recording());
        type_text(&mut editor, "a");
        assert!(editor.has_completions());
        editor.insert('!');
        assert!(!editor.has_completions());
        assert!(editor
            .take_diagnostic()
            .is_some_and(|msg| msg.contains("unterminated")));
        assert!(editor.take_diagnostic().is_none());
    }

    #[test]
    fn hidden_editor_masks_every_character() {
        let mut editor = Editor::hidden();
        type_text(&mut editor, "s3cr3t");
        assert_eq!(editor.display_text(), "******");
        assert_eq!(editor.text(), "s3cr3t");
        assert!(!format!("{editor:?}").contains("s3cr3t"));
    }

    #[test]
    fn set_text_moves_cursor_to_end() {
        let mut editor = Editor::new();
        editor.set_text("list series");
        assert_eq!(editor.cursor(), 11);
        assert_eq!(editor.text_before_cursor(), "list series");
    }
}
