//! Per-screen interaction state. Nothing here talks to the network: each
//! handler returns what should happen next (a route, a query) and the app
//! decides how to fetch it.

use crate::route::Route;
use crate::types::{IssueFilter, IssueQuery, Page, DEFAULT_PER_PAGE};

/// Issues shown per page in the issue list.
pub const ISSUES_PER_PAGE: u32 = 10;

/// Focusable parts of the landing screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomeField {
    #[default]
    Owner,
    Repo,
    Query,
    Results,
}

impl HomeField {
    pub fn next(self) -> Self {
        match self {
            HomeField::Owner => HomeField::Repo,
            HomeField::Repo => HomeField::Query,
            HomeField::Query => HomeField::Results,
            HomeField::Results => HomeField::Owner,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            HomeField::Owner => HomeField::Results,
            HomeField::Repo => HomeField::Owner,
            HomeField::Query => HomeField::Repo,
            HomeField::Results => HomeField::Query,
        }
    }

    pub fn is_text(self) -> bool {
        !matches!(self, HomeField::Results)
    }
}

/// What submitting the focused part of the landing screen asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeSubmit {
    Navigate(Route),
    Search { query: String, page: Page },
}

/// Landing screen: direct repository access and keyword search.
#[derive(Debug, Clone, Default)]
pub struct HomeView {
    pub owner: String,
    pub repo: String,
    pub query: String,
    pub focus: HomeField,
    pub result_index: usize,
}

impl HomeView {
    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            HomeField::Owner => Some(&mut self.owner),
            HomeField::Repo => Some(&mut self.repo),
            HomeField::Query => Some(&mut self.query),
            HomeField::Results => None,
        }
    }

    pub fn input(&mut self, c: char) {
        if let Some(field) = self.focused_input() {
            field.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.focused_input() {
            field.pop();
        }
    }

    /// Direct access: both fields must be non-empty, nothing else is checked.
    pub fn submit_direct(&self) -> Option<Route> {
        if self.owner.is_empty() || self.repo.is_empty() {
            return None;
        }
        Some(Route::repository(self.owner.as_str(), self.repo.as_str()))
    }

    /// Keyword search: an all-whitespace query is not submitted. The query
    /// itself is passed on verbatim.
    pub fn submit_search(&mut self) -> Option<HomeSubmit> {
        if self.query.trim().is_empty() {
            return None;
        }
        self.result_index = 0;
        Some(HomeSubmit::Search {
            query: self.query.clone(),
            page: Page::new(1, DEFAULT_PER_PAGE),
        })
    }

    pub fn submit(&mut self) -> Option<HomeSubmit> {
        match self.focus {
            HomeField::Owner | HomeField::Repo => self.submit_direct().map(HomeSubmit::Navigate),
            HomeField::Query => self.submit_search(),
            HomeField::Results => None,
        }
    }
}

/// Issue list pagination and filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueListView {
    pub page: u32,
    pub filter: IssueFilter,
    pub selected: usize,
}

impl Default for IssueListView {
    fn default() -> Self {
        Self {
            page: 1,
            filter: IssueFilter::All,
            selected: 0,
        }
    }
}

impl IssueListView {
    pub fn per_page(&self) -> u32 {
        ISSUES_PER_PAGE
    }

    pub fn query(&self) -> IssueQuery {
        IssueQuery {
            page: Page::new(self.page, ISSUES_PER_PAGE),
            state: self.filter,
        }
    }

    /// Apply a (page, filter) change. Returns the query to fetch only when
    /// the pair actually changed.
    fn change(&mut self, page: u32, filter: IssueFilter) -> Option<IssueQuery> {
        if page == self.page && filter == self.filter {
            return None;
        }
        self.page = page;
        self.filter = filter;
        self.selected = 0;
        Some(self.query())
    }

    /// Changing the filter always goes back to the first page.
    pub fn set_filter(&mut self, filter: IssueFilter) -> Option<IssueQuery> {
        self.change(1, filter)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn prev_page(&mut self) -> Option<IssueQuery> {
        if !self.has_prev() {
            return None;
        }
        self.change(self.page - 1, self.filter)
    }

    /// Always available: the list endpoint does not report a last page.
    pub fn next_page(&mut self) -> Option<IssueQuery> {
        self.change(self.page.saturating_add(1), self.filter)
    }
}

/// Repository screen: metadata up front, issues only once revealed.
#[derive(Debug, Clone, Default)]
pub struct RepositoryView {
    key: Option<(String, String)>,
    pub revealed: bool,
    pub list: IssueListView,
}

impl RepositoryView {
    /// Prepare for showing `owner/repo`. State is kept when returning to the
    /// same repository and reset for a different one.
    pub fn mount(&mut self, owner: &str, repo: &str) {
        let same = self
            .key
            .as_ref()
            .is_some_and(|(o, r)| o == owner && r == repo);
        if !same {
            *self = RepositoryView {
                key: Some((owner.to_string(), repo.to_string())),
                ..RepositoryView::default()
            };
        }
    }

    /// Reveal the issue list. Returns the first query, or `None` if the list
    /// is already showing.
    pub fn reveal(&mut self) -> Option<IssueQuery> {
        if self.revealed {
            return None;
        }
        self.revealed = true;
        Some(self.list.query())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetailView {
    pub scroll_offset: usize,
}
