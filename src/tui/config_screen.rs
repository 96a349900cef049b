use crate::tui::app::{App, ConfigField, FieldKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const LABEL_WIDTH: usize = 16;

pub fn render(f: &mut Frame, app: &App) {
    let [title, form, status, help] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(12),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .margin(1)
    .areas(f.area());

    let heading = Line::from(vec![
        Span::styled(" NeoWs Export ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(" · Configuration", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(heading).block(framed(Color::Cyan)), title);

    render_form(f, form, app);
    render_status(f, status, app);

    let help_text = if app.editing {
        " Type to edit │ Enter: Confirm │ Esc: Done "
    } else {
        " ↑↓: Navigate │ Enter: Edit/Toggle/Start │ F5: Start │ q: Quit "
    };
    let line = Line::from(Span::styled(help_text, Style::default().fg(Color::DarkGray)));
    f.render_widget(Paragraph::new(line).block(framed(Color::DarkGray)), help);
}

fn framed(color: Color) -> Block<'static> {
    Block::default().borders(Borders::ALL).border_style(Style::default().fg(color))
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let block = framed(Color::DarkGray).title(" Settings ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    // One line per field, a blank line, then the start button.
    let mut lines: Vec<Line> = app
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let selected = app.selected == i;
            let cursor = (selected && app.editing).then_some(app.edit_cursor);
            field_line(field, selected, cursor)
        })
        .collect();
    lines.push(Line::default());
    lines.push(start_button(app.is_on_start_button()));

    let padded = Layout::vertical([Constraint::Min(0)]).margin(1).split(inner)[0];
    f.render_widget(Paragraph::new(lines), padded);
}

fn field_line(field: &ConfigField, selected: bool, cursor: Option<usize>) -> Line<'static> {
    let label_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let value_style = match (field.kind, cursor) {
        (FieldKind::Text, Some(_)) => Style::default().fg(Color::White).bg(Color::DarkGray),
        (FieldKind::Toggle, _) if field.is_on() => Style::default().fg(Color::Green),
        (FieldKind::Toggle, _) => Style::default().fg(Color::Red),
        (FieldKind::Text, None) if selected => Style::default().fg(Color::White),
        (FieldKind::Text, None) => Style::default().fg(Color::Gray),
    };

    Line::from(vec![
        Span::styled(format!("{:>width$} │ ", field.label, width = LABEL_WIDTH), label_style),
        Span::styled(field.display(cursor), value_style),
        Span::styled(format!("  {}", field.hint), Style::default().fg(Color::DarkGray)),
    ])
}

fn start_button(selected: bool) -> Line<'static> {
    let (arrow, style) = if selected {
        ("▶ ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        ("  ", Style::default().fg(Color::DarkGray))
    };
    Line::from(vec![
        Span::raw(" ".repeat(LABEL_WIDTH + 1)),
        Span::styled(format!("{}[ Fetch & Export ]", arrow), style),
    ])
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let line = match &app.validation_error {
        Some(err) => Line::from(Span::styled(format!(" ⚠ {}", err), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            " Feed requests cover at most 7 days. Cached ranges are never refetched.",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line).block(framed(Color::DarkGray)), area);
}
