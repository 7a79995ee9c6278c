use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::store::FetchKind;
use crate::views::HomeField;

use super::truncate;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let direct = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    render_input(frame, app, HomeField::Owner, " Owner ", &app.home.owner, direct[0]);
    render_input(frame, app, HomeField::Repo, " Repository ", &app.home.repo, direct[1]);
    render_input(
        frame,
        app,
        HomeField::Query,
        " Search repositories ",
        &app.home.query,
        chunks[1],
    );
    render_results(frame, app, chunks[2]);
}

fn border_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_input(
    frame: &mut Frame,
    app: &App,
    field: HomeField,
    title: &str,
    value: &str,
    area: Rect,
) {
    let is_active = app.home.focus == field;
    let mut spans = vec![Span::raw(value)];
    if is_active {
        spans.push(Span::styled(
            "_",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style(is_active)),
    );
    frame.render_widget(input, area);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.store.snapshot();
    let is_active = app.home.focus == HomeField::Results;

    let title_style = if is_active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} results ", snapshot.total_results),
            title_style,
        ))
        .border_style(border_style(is_active));

    if snapshot.search_results.is_empty() {
        let hint = if snapshot.is_loading(FetchKind::Search) {
            "Searching..."
        } else if !snapshot.searched {
            "Type a keyword above and press Enter to search"
        } else if snapshot.total_results == 0 {
            "No repositories found"
        } else {
            "No repositories on this page"
        };
        let empty = Paragraph::new(hint)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let name_width = 35;
    let fixed = name_width + 12; // name + stars column + spacing
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = snapshot
        .search_results
        .iter()
        .enumerate()
        .map(|(i, repo)| {
            let is_selected = is_active && i == app.home.result_index;
            let name_style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };

            let description = repo.description.as_deref().unwrap_or("");
            let line = Line::from(vec![
                Span::styled(
                    format!("{:<name_width$}", truncate(&repo.full_name, name_width)),
                    name_style,
                ),
                Span::raw(" "),
                Span::styled(
                    format!("★ {:<8}", repo.stars),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(" "),
                Span::styled(truncate(description, flex), Style::default().fg(Color::Gray)),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if is_active {
        state.select(Some(app.home.result_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}
