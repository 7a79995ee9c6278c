use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::error::Result;
use crate::event::Event;
use crate::forge::Forge;
use crate::route::Route;
use crate::store::{FetchFailure, FetchKind, RepoKey, RequestToken, Store};
use crate::types::{IssueFilter, IssueQuery, Page};
use crate::views::{DetailView, HomeField, HomeSubmit, HomeView, RepositoryView};

pub struct App {
    pub route: Route,
    history: Vec<Route>,
    pub store: Store,
    pub home: HomeView,
    pub repo_view: RepositoryView,
    pub detail: DetailView,
    pub notice: Option<String>,
    pub spinner: usize,
    pub should_quit: bool,
    forge: Arc<dyn Forge>,
    action_tx: mpsc::UnboundedSender<Action>,
    tasks: HashMap<FetchKind, CancellationToken>,
}

impl App {
    pub fn new(forge: Arc<dyn Forge>, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            route: Route::Home,
            history: Vec::new(),
            store: Store::new(),
            home: HomeView::default(),
            repo_view: RepositoryView::default(),
            detail: DetailView::default(),
            notice: None,
            spinner: 0,
            should_quit: false,
            forge,
            action_tx,
            tasks: HashMap::new(),
        }
    }

    pub fn forge_name(&self) -> &str {
        self.forge.name()
    }

    /// Show the first route without recording history.
    pub fn start(&mut self, route: Route) {
        self.route = route;
        self.mount();
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Render | Event::Resize => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match &self.route {
            Route::Home if self.home.focus.is_text() => match key.code {
                KeyCode::Esc => Action::Quit,
                KeyCode::Tab | KeyCode::Down => Action::NextField,
                KeyCode::BackTab | KeyCode::Up => Action::PrevField,
                KeyCode::Enter => Action::Select,
                KeyCode::Backspace => Action::Backspace,
                KeyCode::Char(c) => Action::Input(c),
                _ => Action::None,
            },
            Route::Home => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                KeyCode::Tab => Action::NextField,
                KeyCode::BackTab => Action::PrevField,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
                KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
                KeyCode::Enter => Action::Select,
                KeyCode::Char('o') => Action::OpenInBrowser,
                KeyCode::Char('y') => Action::YankUrl,
                _ => Action::None,
            },
            Route::Repository { .. } => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Back,
                KeyCode::Char('i') => Action::RevealIssues,
                KeyCode::Enter if !self.repo_view.revealed => Action::RevealIssues,
                KeyCode::Enter => Action::Select,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
                KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
                KeyCode::Char('1') => Action::SetFilter(IssueFilter::All),
                KeyCode::Char('2') => Action::SetFilter(IssueFilter::Open),
                KeyCode::Char('3') => Action::SetFilter(IssueFilter::Closed),
                KeyCode::Char('f') => Action::CycleFilter,
                KeyCode::Char('h') | KeyCode::Left => Action::PrevPage,
                KeyCode::Char('l') | KeyCode::Right => Action::NextPage,
                KeyCode::Char('r') => Action::Refresh,
                KeyCode::Char('o') => Action::OpenInBrowser,
                KeyCode::Char('y') => Action::YankUrl,
                _ => Action::None,
            },
            Route::IssueDetail { .. } => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Back,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
                KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
                KeyCode::Char('r') => Action::Refresh,
                KeyCode::Char('o') => Action::OpenInBrowser,
                KeyCode::Char('y') => Action::YankUrl,
                _ => Action::None,
            },
            Route::NotFound(_) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Action::Back,
                _ => Action::None,
            },
        }
    }

    pub fn update(&mut self, action: Action) {
        if !matches!(
            action,
            Action::Tick
                | Action::None
                | Action::RepositoryLoaded(..)
                | Action::IssuesLoaded(..)
                | Action::IssueLoaded(..)
                | Action::SearchLoaded(..)
        ) {
            self.notice = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => self.back(),
            Action::Navigate(route) => self.navigate(route),

            Action::ScrollUp => match self.route {
                Route::Home => {
                    self.home.result_index = self.home.result_index.saturating_sub(1);
                }
                Route::Repository { .. } => {
                    let list = &mut self.repo_view.list;
                    list.selected = list.selected.saturating_sub(1);
                }
                Route::IssueDetail { .. } => {
                    self.detail.scroll_offset = self.detail.scroll_offset.saturating_sub(1);
                }
                Route::NotFound(_) => {}
            },
            Action::ScrollDown => match self.route {
                Route::Home => {
                    let len = self.store.snapshot().search_results.len();
                    if self.home.result_index + 1 < len {
                        self.home.result_index += 1;
                    }
                }
                Route::Repository { .. } => {
                    let len = self.listed_issues();
                    let list = &mut self.repo_view.list;
                    if list.selected + 1 < len {
                        list.selected += 1;
                    }
                }
                Route::IssueDetail { .. } => {
                    self.detail.scroll_offset += 1;
                }
                Route::NotFound(_) => {}
            },
            Action::GoToTop => match self.route {
                Route::Home => self.home.result_index = 0,
                Route::Repository { .. } => self.repo_view.list.selected = 0,
                Route::IssueDetail { .. } => self.detail.scroll_offset = 0,
                Route::NotFound(_) => {}
            },
            Action::GoToBottom => {
                let snapshot = self.store.snapshot();
                match self.route {
                    Route::Home => {
                        self.home.result_index = snapshot.search_results.len().saturating_sub(1);
                    }
                    Route::Repository { .. } => {
                        self.repo_view.list.selected = self.listed_issues().saturating_sub(1);
                    }
                    Route::IssueDetail { .. } => {
                        self.detail.scroll_offset = self.shown_issue_lines();
                    }
                    Route::NotFound(_) => {}
                }
            }
            Action::Select => self.select(),

            Action::NextField => self.home.focus = self.home.focus.next(),
            Action::PrevField => self.home.focus = self.home.focus.prev(),
            Action::Input(c) => self.home.input(c),
            Action::Backspace => self.home.backspace(),

            Action::RevealIssues => {
                if let Some(query) = self.repo_view.reveal() {
                    self.load_issues(query);
                }
            }
            Action::SetFilter(filter) => {
                if self.repo_view.revealed {
                    if let Some(query) = self.repo_view.list.set_filter(filter) {
                        self.load_issues(query);
                    }
                }
            }
            Action::CycleFilter => {
                let next = self.repo_view.list.filter.next();
                self.update(Action::SetFilter(next));
            }
            Action::PrevPage => {
                if self.repo_view.revealed {
                    if let Some(query) = self.repo_view.list.prev_page() {
                        self.load_issues(query);
                    }
                }
            }
            Action::NextPage => {
                if self.repo_view.revealed {
                    if let Some(query) = self.repo_view.list.next_page() {
                        self.load_issues(query);
                    }
                }
            }

            Action::RepositoryLoaded(result, token) => {
                if self.store.settle_repository(token, result) {
                    self.tasks.remove(&token.kind);
                }
            }
            Action::IssuesLoaded(result, token) => {
                if self.store.settle_issues(token, result) {
                    self.tasks.remove(&token.kind);
                    let len = self.listed_issues();
                    let list = &mut self.repo_view.list;
                    list.selected = list.selected.min(len.saturating_sub(1));
                }
            }
            Action::IssueLoaded(result, token) => {
                if self.store.settle_issue(token, result.map(|issue| *issue)) {
                    self.tasks.remove(&token.kind);
                }
            }
            Action::SearchLoaded(result, token) => {
                if self.store.settle_search(token, result) {
                    self.tasks.remove(&token.kind);
                    self.home.result_index = 0;
                }
            }

            Action::Refresh => self.mount(),
            Action::OpenInBrowser => match self.current_url() {
                Some(url) => match open::that(&url) {
                    Ok(()) => self.notice = Some(format!("Opened {}", url)),
                    Err(e) => {
                        tracing::warn!(%url, error = %e, "failed to open browser");
                        self.notice = Some(format!("Could not open browser: {}", e));
                    }
                },
                None => self.notice = Some("Nothing to open here".to_string()),
            },
            Action::YankUrl => match self.current_url() {
                Some(url) => {
                    let copied = arboard::Clipboard::new()
                        .and_then(|mut clipboard| clipboard.set_text(url.clone()));
                    match copied {
                        Ok(()) => self.notice = Some(format!("Copied {}", url)),
                        Err(e) => {
                            tracing::warn!(error = %e, "clipboard unavailable");
                            self.notice = Some(format!("Could not copy: {}", e));
                        }
                    }
                }
                None => self.notice = Some("Nothing to copy here".to_string()),
            },
            Action::Tick => {
                self.spinner = self.spinner.wrapping_add(1);
            }
            Action::None => {}
        }
    }

    fn select(&mut self) {
        match &self.route {
            Route::Home => {
                if self.home.focus == HomeField::Results {
                    let target = self
                        .store
                        .snapshot()
                        .search_results
                        .get(self.home.result_index)
                        .and_then(|r| r.owner_and_name().map(|(o, n)| Route::repository(o, n)));
                    if let Some(route) = target {
                        self.navigate(route);
                    }
                    return;
                }
                match self.home.submit() {
                    Some(HomeSubmit::Navigate(route)) => self.navigate(route),
                    Some(HomeSubmit::Search { query, page }) => {
                        self.load_search(query, page);
                        self.home.focus = HomeField::Results;
                    }
                    None => {}
                }
            }
            Route::Repository { owner, repo } => {
                let number = self
                    .store
                    .snapshot()
                    .issues_for(owner, repo)
                    .get(self.repo_view.list.selected)
                    .map(|issue| issue.number);
                if let Some(number) = number {
                    let route = Route::issue(owner.as_str(), repo.as_str(), number);
                    self.navigate(route);
                }
            }
            Route::IssueDetail { .. } | Route::NotFound(_) => {}
        }
    }

    /// Rows on the current issue page of the repository being shown.
    fn listed_issues(&self) -> usize {
        match &self.route {
            Route::Repository { owner, repo } => {
                self.store.snapshot().issues_for(owner, repo).len()
            }
            _ => 0,
        }
    }

    fn shown_issue_lines(&self) -> usize {
        let Route::IssueDetail {
            owner,
            repo,
            number,
        } = &self.route
        else {
            return 0;
        };
        self.store
            .snapshot()
            .issue_for(owner, repo, *number)
            .and_then(|issue| issue.body.as_deref())
            .map(|body| body.lines().count())
            .unwrap_or(0)
    }

    pub fn navigate(&mut self, route: Route) {
        if route == self.route {
            return;
        }
        tracing::info!(from = %self.route, to = %route, "navigate");
        let previous = std::mem::replace(&mut self.route, route);
        self.history.push(previous);
        self.cancel_all();
        self.mount();
    }

    fn back(&mut self) {
        let previous = match self.history.pop() {
            Some(route) => route,
            None => match self.route {
                Route::Home => {
                    self.should_quit = true;
                    return;
                }
                Route::IssueDetail {
                    ref owner,
                    ref repo,
                    ..
                } => Route::repository(owner.as_str(), repo.as_str()),
                _ => Route::Home,
            },
        };
        tracing::info!(from = %self.route, to = %previous, "back");
        self.route = previous;
        self.cancel_all();
        self.mount();
    }

    /// Run the fetches a freshly shown route needs.
    fn mount(&mut self) {
        match self.route.clone() {
            Route::Home | Route::NotFound(_) => {}
            Route::Repository { owner, repo } => {
                self.repo_view.mount(&owner, &repo);
                self.load_repository(owner, repo);
                if self.repo_view.revealed {
                    let query = self.repo_view.list.query();
                    self.load_issues(query);
                }
            }
            Route::IssueDetail {
                owner,
                repo,
                number,
            } => {
                self.detail = DetailView::default();
                self.load_issue(owner, repo, number);
            }
        }
    }

    /// Stop every in-flight fetch so a view that is no longer shown cannot
    /// write into the store.
    fn cancel_all(&mut self) {
        for (kind, cancel) in self.tasks.drain() {
            cancel.cancel();
            self.store.abandon(kind);
        }
    }

    pub fn current_url(&self) -> Option<String> {
        match &self.route {
            Route::Home if self.home.focus == HomeField::Results => {
                let snapshot = self.store.snapshot();
                let repo = snapshot.search_results.get(self.home.result_index)?;
                repo.html_url.clone().or_else(|| {
                    let (owner, name) = repo.owner_and_name()?;
                    Some(self.forge.repository_url(owner, name))
                })
            }
            Route::Repository { owner, repo } => Some(self.forge.repository_url(owner, repo)),
            Route::IssueDetail {
                owner,
                repo,
                number,
            } => Some(self.forge.issue_url(owner, repo, *number)),
            Route::Home | Route::NotFound(_) => None,
        }
    }

    fn spawn_fetch<T, F>(
        &mut self,
        kind: FetchKind,
        scope: Option<RepoKey>,
        fetch: F,
        into_action: fn(std::result::Result<T, FetchFailure>, RequestToken) -> Action,
    ) where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        if let Some(previous) = self.tasks.remove(&kind) {
            previous.cancel();
        }
        let token = match scope {
            Some(key) => self.store.begin_for(kind, key),
            None => self.store.begin(kind),
        };
        let cancel = CancellationToken::new();
        self.tasks.insert(kind, cancel.clone());

        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(?kind, "fetch cancelled");
                }
                result = fetch => {
                    tx.send(into_action(kind.outcome(result), token)).ok();
                }
            }
        });
    }

    fn load_repository(&mut self, owner: String, repo: String) {
        let forge = Arc::clone(&self.forge);
        let scope = RepoKey::new(owner.as_str(), repo.as_str());
        self.spawn_fetch(
            FetchKind::Repository,
            Some(scope),
            async move { forge.get_repository(&owner, &repo).await },
            Action::RepositoryLoaded,
        );
    }

    fn load_issues(&mut self, query: IssueQuery) {
        let Some((owner, repo)) = self.route.repo() else {
            return;
        };
        let scope = RepoKey::new(owner, repo);
        let (owner, repo) = (scope.owner.clone(), scope.repo.clone());
        let forge = Arc::clone(&self.forge);
        self.spawn_fetch(
            FetchKind::Issues,
            Some(scope),
            async move { forge.list_issues(&owner, &repo, &query).await },
            Action::IssuesLoaded,
        );
    }

    fn load_issue(&mut self, owner: String, repo: String, number: u64) {
        let forge = Arc::clone(&self.forge);
        let scope = RepoKey::new(owner.as_str(), repo.as_str());
        self.spawn_fetch(
            FetchKind::Issue,
            Some(scope),
            async move { forge.get_issue(&owner, &repo, number).await.map(Box::new) },
            Action::IssueLoaded,
        );
    }

    fn load_search(&mut self, query: String, page: Page) {
        let forge = Arc::clone(&self.forge);
        self.spawn_fetch(
            FetchKind::Search,
            None,
            async move { forge.search_repositories(&query, page).await },
            Action::SearchLoaded,
        );
    }
}
