use crate::cache::FeedOrigin;
use crate::tui::app::{fmt_bytes, App, Phase, RunState};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};

const PREVIEW_HEADERS: [&str; 5] = ["ID", "Name", "Min diam (km)", "Abs mag", "Vel (km/s)"];

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(8),  // APOD + feed
            Constraint::Length(3),  // Image download
            Constraint::Length(9),  // Table preview
            Constraint::Min(5),     // Logs
            Constraint::Length(3),  // Controls
        ])
        .split(area);

    render_header(f, chunks[0], app);
    render_panels(f, chunks[1], app);
    render_download(f, chunks[2], app);
    render_table(f, chunks[3], app);
    render_logs(f, chunks[4], app);
    render_controls(f, chunks[5], app);
}

fn bordered(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let state_span = match (&app.run_state, app.failures) {
        (RunState::Running, _) => Span::styled(" RUNNING ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        (RunState::Finished, 0) => Span::styled(" FINISHED ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        (RunState::Finished, n) => Span::styled(
            format!(" FINISHED ({} failures) ", n),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        (RunState::Idle, _) => Span::styled(" IDLE ", Style::default().fg(Color::DarkGray)),
    };

    let phase = match app.phase {
        Phase::Apod => "picture of the day",
        Phase::Feed => "near-earth objects",
        Phase::Export => "export",
        Phase::Done => "done",
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" NeoWs Export ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        state_span,
        Span::styled(format!(" {} · {}", app.range_label, phase), Style::default().fg(Color::White)),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

fn render_panels(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let apod_lines = match &app.apod {
        Some(apod) => vec![
            Line::from(Span::styled(apod.title.clone(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(apod.date.clone(), Style::default().fg(Color::DarkGray))),
            Line::from(apod.explanation.clone()),
        ],
        None => vec![Line::from(Span::styled("No picture of the day", Style::default().fg(Color::DarkGray)))],
    };
    f.render_widget(
        Paragraph::new(apod_lines).wrap(Wrap { trim: true }).block(bordered(" Picture of the Day ".into())),
        cols[0],
    );

    let origin = match app.feed_origin {
        Some(FeedOrigin::Cache) => "cache",
        Some(FeedOrigin::Network) => "network",
        None => "-",
    };
    let path_or_dash = |p: &Option<std::path::PathBuf>| {
        p.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "-".into())
    };
    let feed_lines = vec![
        Line::from(format!(" Source:     {}", origin)),
        Line::from(format!(" Cache file: {}", path_or_dash(&app.feed_path))),
        Line::from(format!(" Dates:      {}", app.dates)),
        Line::from(format!(" Objects:    {}", app.records)),
        Line::from(format!(" Output:     {}", path_or_dash(&app.exported))),
        Line::from(Span::styled(
            format!(" Failures:   {}", app.failures),
            Style::default().fg(if app.failures > 0 { Color::Red } else { Color::Gray }),
        )),
    ];
    f.render_widget(Paragraph::new(feed_lines).block(bordered(" Asteroid Feed ".into())), cols[1]);
}

fn render_download(f: &mut Frame, area: Rect, app: &App) {
    let block = bordered(" Image ".into());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let ratio = if app.dl_total > 0 {
        (app.dl_read as f64 / app.dl_total as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let label = match &app.image_path {
        Some(path) => format!("Saved: {} ({})", path.display(), fmt_bytes(app.dl_read)),
        None if app.dl_total > 0 => format!("Download: {} / {}", fmt_bytes(app.dl_read), fmt_bytes(app.dl_total)),
        None => app
            .apod
            .as_ref()
            .and_then(|a| a.image_url.clone())
            .unwrap_or_else(|| "No image".into()),
    };
    let gauge = Gauge::default()
        .label(label)
        .ratio(ratio)
        .gauge_style(Style::default().fg(Color::Green));
    f.render_widget(gauge, inner);
}

fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let (title, rows): (String, Vec<Row>) = match &app.table {
        Some(summary) => (
            format!(" Table ({} rows, non-null {:?}) ", summary.rows, summary.non_null),
            summary.preview.iter().map(|cells| Row::new(cells.clone())).collect(),
        ),
        None => (" Table ".to_string(), Vec::new()),
    };

    let widths = [
        Constraint::Length(10),
        Constraint::Min(20),
        Constraint::Length(14),
        Constraint::Length(8),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(PREVIEW_HEADERS)
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .block(bordered(title));
    f.render_widget(table, area);
}

fn render_logs(f: &mut Frame, area: Rect, app: &App) {
    let block = bordered(format!(" Logs ({}) ", app.logs.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let visible_height = inner.height as usize;
    let total = app.logs.len();
    let start = app.log_scroll.min(total.saturating_sub(visible_height));

    let log_lines: Vec<Line> = app.logs
        .iter()
        .skip(start)
        .take(visible_height)
        .map(|msg| {
            let style = if msg.starts_with("ERROR") {
                Style::default().fg(Color::Red)
            } else if msg.starts_with("Exported") || msg.starts_with("===") {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(format!("  {}", msg), style))
        })
        .collect();

    f.render_widget(Paragraph::new(log_lines).wrap(Wrap { trim: false }), inner);
}

fn render_controls(f: &mut Frame, area: Rect, app: &App) {
    let controls = match app.run_state {
        RunState::Running => " Working... ",
        RunState::Finished | RunState::Idle => " [B] Back to settings  [Q] Quit  [↑↓] Scroll logs ",
    };
    let para = Paragraph::new(Line::from(Span::styled(controls, Style::default().fg(Color::DarkGray))))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(para, area);
}
