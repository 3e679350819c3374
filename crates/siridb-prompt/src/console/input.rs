use super::*;

pub(super) fn handle_input(console: &mut Console, event: Event) -> Option<ExitStatus> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(console, key),
        Event::Mouse(mouse) if !console.is_password_mode() => {
            let buffer = match console.view {
                View::Log => &mut console.log,
                View::Output => console.output.buffer_mut(),
            };
            match mouse.kind {
                MouseEventKind::ScrollUp => buffer.up(),
                MouseEventKind::ScrollDown => buffer.down(),
                _ => {}
            }
            None
        }
        Event::Paste(text) => {
            let editor = match &mut console.mode {
                InputMode::Password(editor) => editor,
                InputMode::Normal => &mut console.prompt,
            };
            for ch in text.chars().filter(|ch| !ch.is_control()) {
                editor.insert(ch);
            }
            collect_diagnostic(console);
            None
        }
        _ => None,
    }
}

fn handle_key(console: &mut Console, key: KeyEvent) -> Option<ExitStatus> {
    if console.is_password_mode() {
        return handle_password_key(console, key);
    }
    if is_ctrl(key, 'q') {
        return Some(ExitStatus::Quit);
    }
    match console.view {
        View::Log => {
            handle_log_key(console, key);
            None
        }
        View::Output => handle_output_key(console, key),
    }
}

fn handle_password_key(console: &mut Console, key: KeyEvent) -> Option<ExitStatus> {
    if is_ctrl(key, 'c') || is_ctrl(key, 'q') {
        return Some(ExitStatus::Aborted);
    }
    let InputMode::Password(editor) = &mut console.mode else {
        return None;
    };
    if key.code == KeyCode::Enter {
        let password = editor.text();
        console.open_session(&password);
    } else {
        edit_line(editor, key);
    }
    None
}

fn handle_log_key(console: &mut Console, key: KeyEvent) {
    if is_ctrl(key, 'l') || key.code == KeyCode::Esc {
        console.view = View::Output;
        return;
    }
    match key.code {
        KeyCode::Up => console.log.up(),
        KeyCode::Down => console.log.down(),
        KeyCode::PageUp => console.log.page_up(),
        KeyCode::PageDown => console.log.page_down(),
        _ => {}
    }
}

fn handle_output_key(console: &mut Console, key: KeyEvent) -> Option<ExitStatus> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('l') => console.view = View::Log,
            KeyCode::Char('y') => copy_last_result(console),
            KeyCode::Char('r') => console.output.toggle_mode(),
            _ => {
                edit_line(&mut console.prompt, key);
                collect_diagnostic(console);
            }
        }
        return None;
    }
    match key.code {
        KeyCode::Enter => {
            console.prompt.clear_completions();
            return submit(console);
        }
        KeyCode::Esc => console.prompt.clear_completions(),
        KeyCode::PageUp => console.output.buffer_mut().page_up(),
        KeyCode::PageDown => console.output.buffer_mut().page_down(),
        KeyCode::Up if console.prompt.has_completions() => console.prompt.select_prev(),
        KeyCode::Down if console.prompt.has_completions() => console.prompt.select_next(),
        KeyCode::Up => {
            let entry = console.history.prev();
            recall(console, &entry);
        }
        KeyCode::Down => {
            let entry = console.history.next();
            recall(console, &entry);
        }
        KeyCode::Tab => {
            console.prompt.accept_completion();
            collect_diagnostic(console);
        }
        _ => {
            edit_line(&mut console.prompt, key);
            collect_diagnostic(console);
        }
    }
    None
}

fn recall(console: &mut Console, entry: &str) {
    console.prompt.set_text(entry);
    console.prompt.clear_completions();
    collect_diagnostic(console);
}

/// Shared line editing keys. Returns false for keys it does not handle.
fn edit_line(editor: &mut Editor, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u') if ctrl => editor.delete_all(),
        KeyCode::Char('a') if ctrl => editor.move_home(),
        KeyCode::Char('e') if ctrl => editor.move_end(),
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => return false,
        KeyCode::Char(ch) => editor.insert(ch),
        KeyCode::Backspace => editor.delete_before_cursor(),
        KeyCode::Delete => editor.delete_at_cursor(),
        KeyCode::Left => editor.move_cursor(-1),
        KeyCode::Right => editor.move_cursor(1),
        KeyCode::Home => editor.move_home(),
        KeyCode::End => editor.move_end(),
        _ => return false,
    }
    true
}

fn submit(console: &mut Console) -> Option<ExitStatus> {
    let line = console.prompt.text();
    if query::is_exit(&line) {
        return Some(ExitStatus::Quit);
    }
    let command = line.trim();
    if command.is_empty() {
        return None;
    }
    console.history.insert(command);
    let Some(client) = console.client.clone() else {
        console.log("cannot send command: not connected");
        return None;
    };
    debug!(command, "submitting command");
    let query = query::run(
        command,
        console.grammar.as_ref(),
        client.as_ref(),
        console.settings.timeout,
    );
    debug!(phase = ?query.phase(), elapsed = ?query.elapsed(), "command finished");
    console.output.append(query);
    console.prompt.delete_all();
    console.prompt.clear_completions();
    collect_diagnostic(console);
    None
}

fn copy_last_result(console: &mut Console) {
    let copied = match console.output.last_query() {
        Some(query) => {
            let text = query.to_json();
            console.clipboard.write_all(&text)
        }
        None => Err(ClipboardError::Empty),
    };
    match copied {
        Ok(()) => console.log("copied last result to clipboard"),
        Err(err) => console.log(format!("cannot copy to clipboard: {err}")),
    }
}

/// Moves a completion failure from the prompt into the log view.
fn collect_diagnostic(console: &mut Console) {
    if let Some(message) = console.prompt.take_diagnostic() {
        console.log(format!("error while completing: {message}"));
    }
}

fn is_ctrl(key: KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}
