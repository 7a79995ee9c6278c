use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::store::FetchKind;
use crate::types::{Issue, IssueFilter, IssueState, Label};

use super::{format_age, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    render_summary(frame, app, chunks[0]);

    if app.repo_view.revealed {
        render_issues(frame, app, chunks[1]);
    } else {
        let hint = Paragraph::new("Press Enter or i to show issues")
            .block(Block::default().borders(Borders::ALL).title(" Issues "))
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(hint, chunks[1]);
    }
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.store.snapshot();
    let Some((owner, name)) = app.route.repo() else {
        return;
    };
    let fallback = format!("{}/{}", owner, name);

    let block = |name: &str| {
        Block::default().borders(Borders::ALL).title(Span::styled(
            format!(" {} ", name),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
    };

    let Some(repo) = snapshot.repository_for(owner, name) else {
        let text = if snapshot.is_loading(FetchKind::Repository) {
            "Loading repository..."
        } else {
            "Repository unavailable"
        };
        let empty = Paragraph::new(text)
            .block(block(&fallback))
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    let lines = vec![
        Line::from(Span::raw(
            repo.description
                .as_deref()
                .unwrap_or("No description provided."),
        )),
        Line::from(vec![
            Span::styled(
                format!("★ {} stars", repo.stars),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("{} forks", repo.forks),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("{} open issues", repo.open_issues),
                Style::default().fg(Color::Green),
            ),
        ]),
    ];

    let summary = Paragraph::new(lines)
        .block(block(&repo.full_name))
        .wrap(Wrap { trim: true });
    frame.render_widget(summary, area);
}

fn render_issues(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_filter_tabs(frame, app, chunks[0]);
    render_issue_list(frame, app, chunks[1]);
    render_pager(frame, app, chunks[2]);
}

fn render_filter_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = Tabs::new(vec!["[1] All", "[2] Open", "[3] Closed"])
        .block(Block::default().borders(Borders::ALL).title(" Filter "))
        .select(match app.repo_view.list.filter {
            IssueFilter::All => 0,
            IssueFilter::Open => 1,
            IssueFilter::Closed => 2,
        })
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn state_color(state: IssueState) -> Color {
    match state {
        IssueState::Open => Color::Green,
        IssueState::Closed => Color::Red,
    }
}

fn label_span(label: &Label) -> Span<'static> {
    let style = match label.rgb() {
        Some((r, g, b)) => {
            // Dark text on light labels, light text on dark ones.
            let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            let fg = if luma > 140.0 { Color::Black } else { Color::White };
            Style::default().bg(Color::Rgb(r, g, b)).fg(fg)
        }
        None => Style::default().fg(Color::Magenta),
    };
    Span::styled(format!(" {} ", label.name), style)
}

fn issue_line(issue: &Issue, selected: bool, flex: usize) -> Line<'static> {
    let title_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(
            format!("#{:<6}", issue.number),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{:<6}", issue.state.to_string()),
            Style::default().fg(state_color(issue.state)),
        ),
        Span::raw(" "),
    ];
    if issue.is_pull_request() {
        spans.push(Span::styled("PR ", Style::default().fg(Color::Magenta)));
    }
    spans.push(Span::styled(truncate(&issue.title, flex), title_style));
    for label in &issue.labels {
        spans.push(Span::raw(" "));
        spans.push(label_span(label));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("@{}", issue.user.login),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        format_age(issue.created_at),
        Style::default().fg(Color::DarkGray),
    ));
    if issue.comments > 0 {
        spans.push(Span::styled(
            format!("  {} comments", issue.comments),
            Style::default().fg(Color::DarkGray),
        ));
    }

    Line::from(spans)
}

fn render_issue_list(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.store.snapshot();
    let Some((owner, name)) = app.route.repo() else {
        return;
    };
    let issues = snapshot.issues_for(owner, name);
    let list_state = &app.repo_view.list;

    let block = Block::default().borders(Borders::ALL).title(format!(
        " {} issues - Page {} ",
        list_state.filter,
        list_state.page
    ));

    if issues.is_empty() {
        let (text, color) = if snapshot.is_loading(FetchKind::Issues) {
            ("Loading issues...", Color::Gray)
        } else if let Some(failure) = snapshot.failure_of(FetchKind::Issues) {
            (failure.message(), Color::Red)
        } else {
            ("No issues match this filter", Color::Gray)
        };
        let empty = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(color));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 40; // #num(7) + state(7) + spacing + @author + age
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = issues
        .iter()
        .enumerate()
        .map(|(i, issue)| ListItem::new(issue_line(issue, i == list_state.selected, flex)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(list_state.selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_pager(frame: &mut Frame, app: &App, area: Rect) {
    let list = &app.repo_view.list;
    let prev_style = if list.has_prev() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    };

    let pager = Paragraph::new(Line::from(vec![
        Span::styled("◀ prev (h)", prev_style),
        Span::raw("   "),
        Span::styled(
            format!("Page {}", list.page),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("next (l) ▶", Style::default().fg(Color::Cyan)),
    ]));
    frame.render_widget(pager, area);
}
