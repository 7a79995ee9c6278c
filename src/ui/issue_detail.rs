use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::route::Route;
use crate::store::FetchKind;
use crate::types::{Issue, IssueState};

use super::format_age;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Route::IssueDetail {
        owner,
        repo,
        number,
    } = &app.route
    else {
        return;
    };
    let number = *number;
    let snapshot = app.store.snapshot();

    if let Some(failure) = snapshot.failure_of(FetchKind::Issue) {
        let lines = vec![
            Line::from(Span::styled(
                failure.message(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "(press q to return to the issue list)",
                Style::default().fg(Color::Gray),
            )),
        ];
        let error = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Issue #{} ", number)),
        );
        frame.render_widget(error, area);
        return;
    }

    // A previously viewed issue stays in the store until the new one arrives.
    let Some(issue) = snapshot.issue_for(owner, repo, number) else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Issue #{} ", number));
        let empty = Paragraph::new("Loading issue...")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    render_header(frame, issue, chunks[0]);
    render_body(frame, app, issue, chunks[1]);
}

fn render_header(frame: &mut Frame, issue: &Issue, area: Rect) {
    let state_color = match issue.state {
        IssueState::Open => Color::Green,
        IssueState::Closed => Color::Red,
    };

    let mut labels: Vec<Span> = vec![Span::styled("Labels: ", Style::default().fg(Color::Gray))];
    if issue.labels.is_empty() {
        labels.push(Span::styled("none", Style::default().fg(Color::DarkGray)));
    }
    for label in &issue.labels {
        let style = match label.rgb() {
            Some((r, g, b)) => Style::default().fg(Color::Rgb(r, g, b)),
            None => Style::default().fg(Color::Magenta),
        };
        labels.push(Span::styled(format!("[{}] ", label.name), style));
    }

    let kind = if issue.is_pull_request() {
        "pull request"
    } else {
        "issue"
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("#{} ", issue.number),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                issue.title.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(
                issue.state.to_string(),
                Style::default()
                    .fg(state_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("@{}", issue.user.login),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(format!(
                " opened this {} {} ago",
                kind,
                format_age(issue.created_at)
            )),
            Span::raw(" | "),
            Span::raw(format!("{} comments", issue.comments)),
        ]),
        Line::from(vec![
            Span::styled("Created: ", Style::default().fg(Color::Gray)),
            Span::raw(issue.created_at.format("%Y-%m-%d %H:%M").to_string()),
            Span::raw(" | "),
            Span::styled("Updated: ", Style::default().fg(Color::Gray)),
            Span::raw(issue.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        ]),
        Line::from(labels),
    ];

    let header =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Details "));

    frame.render_widget(header, area);
}

fn render_body(frame: &mut Frame, app: &App, issue: &Issue, area: Rect) {
    let body_text = match issue.body.as_deref() {
        Some(body) if !body.trim().is_empty() => body,
        _ => "No description provided.",
    };

    let lines: Vec<Line> = body_text
        .lines()
        .map(|l| Line::from(l.replace('\t', "    ")))
        .collect();

    let inner_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(inner_height);
    let scroll_offset = app.detail.scroll_offset.min(max_scroll);

    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(scroll_offset)
        .take(inner_height)
        .collect();

    frame.render_widget(Clear, area);

    let body = Paragraph::new(Text::from(visible_lines))
        .block(Block::default().borders(Borders::ALL).title(" Description "))
        .wrap(Wrap { trim: false });

    frame.render_widget(body, area);
}
