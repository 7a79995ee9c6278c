mod home;
mod issue_detail;
mod repository;

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::route::Route;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match &app.route {
        Route::Home => home::render(frame, app, chunks[1]),
        Route::Repository { .. } => repository::render(frame, app, chunks[1]),
        Route::IssueDetail { .. } => issue_detail::render(frame, app, chunks[1]),
        Route::NotFound(path) => render_not_found(frame, path, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.route {
        Route::Home => "issuedash - Search".to_string(),
        Route::Repository { owner, repo } => format!("issuedash - {}/{}", owner, repo),
        Route::IssueDetail {
            owner,
            repo,
            number,
        } => format!("issuedash - {}/{}#{}", owner, repo, number),
        Route::NotFound(_) => "issuedash - Not found".to_string(),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  [{}]", app.forge_name()),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.store.snapshot();
    let status = if let Some(error) = snapshot.error_message() {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if snapshot.loading() {
        Line::from(vec![Span::styled(
            format!("{} Loading...", SPINNER[app.spinner % SPINNER.len()]),
            Style::default().fg(Color::Yellow),
        )])
    } else if let Some(notice) = &app.notice {
        Line::from(vec![Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Green),
        )])
    } else {
        let help = match &app.route {
            Route::Home if app.home.focus.is_text() => {
                "Tab: next field | Enter: submit | Esc: quit"
            }
            Route::Home => "j/k/g/G: nav | Enter: open | o: browser | y: copy url | Tab: fields | q: quit",
            Route::Repository { .. } if !app.repo_view.revealed => {
                "Enter/i: show issues | r: refresh | o: browser | y: copy url | q: back"
            }
            Route::Repository { .. } => {
                "j/k: nav | Enter: open | 1/2/3/f: filter | h/l: page | r: refresh | q: back"
            }
            Route::IssueDetail { .. } => {
                "j/k/g/G: scroll | r: refresh | o: browser | y: copy url | q: back"
            }
            Route::NotFound(_) => "q: back",
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

fn render_not_found(frame: &mut Frame, path: &str, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            format!("Nothing lives at {}", path),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press q to go back",
            Style::default().fg(Color::Gray),
        )),
    ];
    let page = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Page not found "),
    );
    frame.render_widget(page, area);
}

pub(crate) fn format_age(dt: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(dt);

    if duration.num_days() > 365 {
        format!("{}y", duration.num_days() / 365)
    } else if duration.num_days() > 0 {
        format!("{}d", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m", duration.num_minutes())
    } else {
        "now".to_string()
    }
}

/// Shorten to at most `max` characters, marking the cut with "...".
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
