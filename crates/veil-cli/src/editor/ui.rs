//! Editor rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use veil_core::{Scheduler, SystemClipboard};

use super::Editor;

const HELP: &str =
    " ^T show/hide  ^O copy  ^X copy+close  ^L clear  ^S save  ^Z undo  ^R redo  ^Q quit";

/// Rows left for text once the status and help lines are drawn.
pub fn text_height(total: u16) -> usize {
    total.saturating_sub(2).max(1) as usize
}

pub fn draw<C, S>(f: &mut Frame, editor: &Editor<'_, C, S>)
where
    C: SystemClipboard,
    S: Scheduler,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Text
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help
        ])
        .split(f.area());

    let text_area = chunks[0];
    let buffer = editor.buffer();
    let first = editor.scroll();
    let lines: Vec<Line> = (first..first + text_area.height as usize)
        .map_while(|i| buffer.rendered_line(i))
        .map(Line::from)
        .collect();
    f.render_widget(Paragraph::new(lines), text_area);

    f.render_widget(Paragraph::new(status_line(editor)), chunks[1]);
    f.render_widget(
        Paragraph::new(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
        chunks[2],
    );

    let (line, col) = buffer.cursor_position();
    if line >= first {
        let y = text_area.y + (line - first) as u16;
        let x = text_area.x + (col as u16).min(text_area.width.saturating_sub(1));
        if y < text_area.y + text_area.height {
            f.set_cursor_position(Position::new(x, y));
        }
    }
}

fn status_line<C, S>(editor: &Editor<'_, C, S>) -> Line<'static>
where
    C: SystemClipboard,
    S: Scheduler,
{
    let bar = Style::default().add_modifier(Modifier::REVERSED);
    let buffer = editor.buffer();

    let mut spans = vec![Span::styled(
        format!(
            " {}{} ",
            editor.id(),
            if buffer.is_modified() { " [+]" } else { "" }
        ),
        bar.add_modifier(Modifier::BOLD),
    )];

    let mask_style = if editor.mask().is_hidden() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    };
    spans.push(Span::styled(format!(" {} ", buffer.status()), mask_style));

    if let Some(secs) = editor.countdown() {
        spans.push(Span::styled(
            format!(" clipboard clears in {}s ", secs),
            Style::default().fg(Color::Cyan),
        ));
    }
    if let Some(message) = editor.message() {
        spans.push(Span::raw(format!(" {}", message)));
    }
    Line::from(spans)
}
