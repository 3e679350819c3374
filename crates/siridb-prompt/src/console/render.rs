use super::*;

use unicode_width::UnicodeWidthChar;

const LOG_TITLE: &str = " Log (ESC / CTRL+L close log, CTRL+Q quit)";
const OUTPUT_TITLE: &str = " Output (CTRL+L view log, CTRL+Y copy, CTRL+R raw json, CTRL+Q quit)";

pub(super) fn render_console(frame: &mut Frame<'_>, console: &Console) {
    let area = frame.size();
    if area.width == 0 || area.height == 0 {
        return;
    }
    if let InputMode::Password(editor) = &console.mode {
        render_editor(frame, Rect { height: 1, ..area }, PASSWORD_PROMPT, editor);
        return;
    }

    render_header(frame, Rect { height: 1, ..area }, console);
    match console.view {
        View::Log => {
            let body = Rect {
                y: area.y + 1,
                height: area.height.saturating_sub(1),
                ..area
            };
            render_rows(frame, body, console.log.visible());
        }
        View::Output => {
            let body = Rect {
                y: area.y + 1,
                height: area.height.saturating_sub(2),
                ..area
            };
            render_rows(frame, body, console.output.buffer().visible());
            if area.height >= 2 {
                let prompt_area = Rect {
                    y: area.y + area.height - 1,
                    height: 1,
                    ..area
                };
                render_editor(frame, prompt_area, PROMPT, &console.prompt);
                render_completions(frame, prompt_area, &console.prompt);
            }
        }
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, console: &Console) {
    let title = match console.view {
        View::Log => LOG_TITLE,
        View::Output => OUTPUT_TITLE,
    };
    let account = format!(
        " <{}@{}> status: ",
        console.settings.user, console.settings.dbname
    );
    let (status, color) = if console.is_connected() {
        ("OK ", COLOR_GREEN)
    } else {
        ("NO CONNECTION ", COLOR_RED)
    };
    let used = display_width(title) + display_width(&account) + display_width(status);
    let fill = usize::from(area.width).saturating_sub(used);
    let base = Style::default().fg(COLOR_HEADER_FG).bg(COLOR_HEADER_BG);
    let line = Line::from(vec![
        Span::styled(title, base.add_modifier(Modifier::BOLD)),
        Span::styled(" ".repeat(fill), base),
        Span::styled(account, base),
        Span::styled(status, base.fg(color).add_modifier(Modifier::BOLD)),
    ]);
    frame.render_widget(Paragraph::new(line).style(base), area);
}

fn render_rows(frame: &mut Frame<'_>, area: Rect, rows: &[ScrollLine]) {
    let lines: Vec<Line> = rows
        .iter()
        .map(|row| Line::from(Span::styled(row.text.clone(), row_style(row.style))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn row_style(style: LineStyle) -> Style {
    match style {
        LineStyle::Plain => Style::default(),
        LineStyle::Prompt => Style::default().fg(COLOR_TEAL).add_modifier(Modifier::BOLD),
        LineStyle::Error => Style::default().fg(COLOR_RED),
        LineStyle::Muted => Style::default().fg(COLOR_INFO),
    }
}

fn render_editor(frame: &mut Frame<'_>, area: Rect, label: &str, editor: &Editor) {
    let label_width = display_width(label);
    let avail = usize::from(area.width).saturating_sub(label_width);
    let (visible, cursor_x) = window(&editor.display_chars(), editor.cursor(), avail);
    let line = Line::from(vec![
        Span::styled(
            label.to_string(),
            Style::default().fg(COLOR_TEAL).add_modifier(Modifier::BOLD),
        ),
        Span::raw(visible),
    ]);
    frame.render_widget(Paragraph::new(line), area);
    let x = (label_width + cursor_x).min(usize::from(area.width.saturating_sub(1)));
    frame.set_cursor(area.x + x as u16, area.y);
}

/// Slice of the line that keeps the cursor on screen, and the cursor column in it.
fn window(chars: &[char], cursor: usize, avail: usize) -> (String, usize) {
    let width = |ch: &char| ch.width().unwrap_or(0);
    let mut start = 0;
    while start < cursor && chars[start..cursor].iter().map(width).sum::<usize>() >= avail.max(1) {
        start += 1;
    }
    let mut visible = String::new();
    let mut used = 0;
    for ch in &chars[start..] {
        let w = width(ch);
        if used + w > avail {
            break;
        }
        visible.push(*ch);
        used += w;
    }
    let cursor_x = chars[start..cursor].iter().map(width).sum();
    (visible, cursor_x)
}

/// Candidate popup right above the prompt, aligned with the replaced text.
fn render_completions(frame: &mut Frame<'_>, prompt_area: Rect, editor: &Editor) {
    let candidates = editor.completions();
    let space = usize::from(prompt_area.y);
    if candidates.is_empty() || space == 0 {
        return;
    }
    let rows = candidates.len().min(MAX_POPUP_ROWS).min(space);
    let first = match editor.selected() {
        Some(idx) if idx >= rows => idx + 1 - rows,
        _ => 0,
    };
    let inner = candidates
        .iter()
        .map(|candidate| display_width(&candidate.display))
        .max()
        .unwrap_or(0);
    let width = (inner + 2).min(usize::from(prompt_area.width));

    let before = editor.text_before_cursor();
    let keep = before.chars().count().saturating_sub(candidates[0].start_pos);
    let anchor: String = before.chars().take(keep).collect();
    let x = (display_width(PROMPT) + display_width(&anchor))
        .min(usize::from(prompt_area.width).saturating_sub(width));

    let popup = Rect {
        x: prompt_area.x + x as u16,
        y: prompt_area.y - rows as u16,
        width: width as u16,
        height: rows as u16,
    };
    let lines: Vec<Line> = candidates
        .iter()
        .enumerate()
        .skip(first)
        .take(rows)
        .map(|(idx, candidate)| {
            let style = if editor.selected() == Some(idx) {
                Style::default()
                    .fg(COLOR_HEADER_FG)
                    .bg(COLOR_TEAL)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White).bg(COLOR_POPUP_BG)
            };
            Line::from(Span::styled(format!(" {:<inner$} ", candidate.display), style))
        })
        .collect();
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines), popup);
}
