//! Shared application state.
//!
//! The store owns one immutable [`Snapshot`] at a time. Every fetch action
//! goes through the same cycle: [`Store::begin`] marks it in flight and hands
//! out a [`RequestToken`]; the matching `settle_*` call applies the outcome,
//! but only if no newer request of the same kind was started in between.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::DashError;
use crate::forge::Forge;
use crate::types::{Issue, IssueQuery, Page, Repository, SearchResults};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchKind {
    Repository,
    Issues,
    Issue,
    Search,
}

impl FetchKind {
    pub const ALL: [FetchKind; 4] = [
        FetchKind::Repository,
        FetchKind::Issues,
        FetchKind::Issue,
        FetchKind::Search,
    ];

    /// Tag a client result with this action, turning errors into failures.
    pub fn outcome<T>(self, result: crate::error::Result<T>) -> Result<T, FetchFailure> {
        result.map_err(|e| FetchFailure::new(self, &e))
    }

    /// The one message users see when this action fails, whatever the cause.
    pub fn failure_message(&self) -> &'static str {
        match self {
            FetchKind::Repository => "Failed to load repository information",
            FetchKind::Issues => "Failed to load issue list",
            FetchKind::Issue => "Failed to load issue details",
            FetchKind::Search => "Failed to search repositories",
        }
    }
}

/// A failed fetch, tagged with the action and the underlying cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub action: FetchKind,
    pub status: Option<u16>,
    pub cause: String,
}

impl FetchFailure {
    pub fn new(action: FetchKind, err: &DashError) -> Self {
        Self {
            action,
            status: err.status(),
            cause: err.to_string(),
        }
    }

    pub fn message(&self) -> &'static str {
        self.action.failure_message()
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub kind: FetchKind,
    id: u64,
}

/// The repository a fetched slot belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoKey {
    pub owner: String,
    pub repo: String,
}

impl RepoKey {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn is(key: &Option<RepoKey>, owner: &str, repo: &str) -> bool {
        key.as_ref()
            .is_some_and(|k| k.owner == owner && k.repo == repo)
    }
}

/// Read-only view of the store at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub repository: Option<Repository>,
    pub issues: Vec<Issue>,
    pub current_issue: Option<Issue>,
    pub search_results: Vec<Repository>,
    pub total_results: u64,
    /// Set once a search has settled successfully.
    pub searched: bool,
    pub error: Option<FetchFailure>,
    // Which repository each repository-scoped slot was fetched for
    repository_key: Option<RepoKey>,
    issues_key: Option<RepoKey>,
    current_issue_key: Option<RepoKey>,
    in_flight: BTreeSet<FetchKind>,
}

impl Snapshot {
    pub fn loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn is_loading(&self, kind: FetchKind) -> bool {
        self.in_flight.contains(&kind)
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error.as_ref().map(FetchFailure::message)
    }

    /// The failure of `kind`, if it is the one currently reported.
    pub fn failure_of(&self, kind: FetchKind) -> Option<&FetchFailure> {
        self.error.as_ref().filter(|e| e.action == kind)
    }

    /// Repository metadata, only if it was fetched for `owner/repo`.
    pub fn repository_for(&self, owner: &str, repo: &str) -> Option<&Repository> {
        self.repository
            .as_ref()
            .filter(|_| RepoKey::is(&self.repository_key, owner, repo))
    }

    /// The issue page, or nothing if it belongs to another repository.
    pub fn issues_for(&self, owner: &str, repo: &str) -> &[Issue] {
        if RepoKey::is(&self.issues_key, owner, repo) {
            &self.issues
        } else {
            &[]
        }
    }

    pub fn issue_for(&self, owner: &str, repo: &str, number: u64) -> Option<&Issue> {
        self.current_issue
            .as_ref()
            .filter(|i| i.number == number && RepoKey::is(&self.current_issue_key, owner, repo))
    }
}

#[derive(Debug, Default)]
pub struct Store {
    snapshot: Arc<Snapshot>,
    latest: HashMap<FetchKind, u64>,
    scopes: HashMap<FetchKind, RepoKey>,
    next_id: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    fn update(&mut self, f: impl FnOnce(&mut Snapshot)) {
        let mut next = (*self.snapshot).clone();
        f(&mut next);
        self.snapshot = Arc::new(next);
    }

    /// Start a fetch: mark it in flight, clear the shared error, and
    /// supersede any earlier request of the same kind.
    pub fn begin(&mut self, kind: FetchKind) -> RequestToken {
        self.next_id += 1;
        let token = RequestToken {
            kind,
            id: self.next_id,
        };
        self.latest.insert(kind, token.id);
        self.scopes.remove(&kind);
        self.update(|s| {
            s.in_flight.insert(kind);
            s.error = None;
        });
        tracing::debug!(?kind, id = token.id, "fetch started");
        token
    }

    /// Like [`Store::begin`], for a fetch on behalf of one repository. A
    /// successful result is tagged with `key`.
    pub fn begin_for(&mut self, kind: FetchKind, key: RepoKey) -> RequestToken {
        let token = self.begin(kind);
        self.scopes.insert(kind, key);
        token
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.get(&token.kind) == Some(&token.id)
    }

    /// Forget an in-flight request; its result will be discarded.
    pub fn abandon(&mut self, kind: FetchKind) {
        self.scopes.remove(&kind);
        if self.latest.remove(&kind).is_some() {
            tracing::debug!(?kind, "fetch abandoned");
            self.update(|s| {
                s.in_flight.remove(&kind);
            });
        }
    }

    fn settle<T>(
        &mut self,
        token: RequestToken,
        result: Result<T, FetchFailure>,
        apply: impl FnOnce(&mut Snapshot, T, Option<RepoKey>),
    ) -> bool {
        if !self.is_current(token) {
            tracing::debug!(kind = ?token.kind, id = token.id, "discarding stale response");
            return false;
        }
        self.latest.remove(&token.kind);
        let scope = self.scopes.remove(&token.kind);

        self.update(|s| {
            s.in_flight.remove(&token.kind);
            match result {
                Ok(value) => {
                    apply(s, value, scope);
                    s.error = None;
                }
                Err(failure) => {
                    tracing::error!(
                        action = ?failure.action,
                        status = ?failure.status,
                        cause = %failure.cause,
                        "fetch failed"
                    );
                    s.error = Some(failure);
                }
            }
        });
        true
    }

    pub fn settle_repository(
        &mut self,
        token: RequestToken,
        result: Result<Repository, FetchFailure>,
    ) -> bool {
        self.settle(token, result, |s, repo, key| {
            s.repository = Some(repo);
            s.repository_key = key;
        })
    }

    pub fn settle_issues(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Issue>, FetchFailure>,
    ) -> bool {
        self.settle(token, result, |s, issues, key| {
            s.issues = issues;
            s.issues_key = key;
        })
    }

    pub fn settle_issue(&mut self, token: RequestToken, result: Result<Issue, FetchFailure>) -> bool {
        self.settle(token, result, |s, issue, key| {
            s.current_issue = Some(issue);
            s.current_issue_key = key;
        })
    }

    pub fn settle_search(
        &mut self,
        token: RequestToken,
        result: Result<SearchResults, FetchFailure>,
    ) -> bool {
        self.settle(token, result, |s, results, _| {
            s.search_results = results.items;
            s.total_results = results.total_count;
            s.searched = true;
        })
    }

    // The async helpers below run the whole begin/fetch/settle cycle inline.
    // The app runs the same cycle with the fetch spawned onto its own task.

    pub async fn fetch_repository(&mut self, forge: &dyn Forge, owner: &str, repo: &str) {
        let kind = FetchKind::Repository;
        let token = self.begin_for(kind, RepoKey::new(owner, repo));
        let result = kind.outcome(forge.get_repository(owner, repo).await);
        self.settle_repository(token, result);
    }

    pub async fn fetch_issues(
        &mut self,
        forge: &dyn Forge,
        owner: &str,
        repo: &str,
        query: IssueQuery,
    ) {
        let kind = FetchKind::Issues;
        let token = self.begin_for(kind, RepoKey::new(owner, repo));
        let result = kind.outcome(forge.list_issues(owner, repo, &query).await);
        self.settle_issues(token, result);
    }

    pub async fn fetch_issue(&mut self, forge: &dyn Forge, owner: &str, repo: &str, number: u64) {
        let kind = FetchKind::Issue;
        let token = self.begin_for(kind, RepoKey::new(owner, repo));
        let result = kind.outcome(forge.get_issue(owner, repo, number).await);
        self.settle_issue(token, result);
    }

    pub async fn search_repos(&mut self, forge: &dyn Forge, query: &str, page: Page) {
        let kind = FetchKind::Search;
        let token = self.begin(kind);
        let result = kind.outcome(forge.search_repositories(query, page).await);
        self.settle_search(token, result);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::{IssueFilter, IssueState, User};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Repository(String, String),
        Issues(String, String, IssueQuery),
        Issue(String, String, u64),
        Search(String, Page),
    }

    /// Forge double that records calls and answers from canned data.
    #[derive(Debug, Default)]
    pub struct FakeForge {
        pub calls: Mutex<Vec<Call>>,
        pub repository: Option<Repository>,
        pub issues: Vec<Issue>,
        pub search: SearchResults,
        pub fail_with: Option<u16>,
    }

    impl FakeForge {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with {
                Some(status) => Err(DashError::Status {
                    status,
                    message: "Not Found".to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl Forge for FakeForge {
        fn name(&self) -> &str {
            "Fake"
        }

        fn repository_url(&self, owner: &str, repo: &str) -> String {
            format!("https://example.test/{}/{}", owner, repo)
        }

        fn issue_url(&self, owner: &str, repo: &str, number: u64) -> String {
            format!("https://example.test/{}/{}/issues/{}", owner, repo, number)
        }

        async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
            self.record(Call::Repository(owner.into(), repo.into()))?;
            Ok(self.repository.clone().unwrap_or_else(|| repository(owner, repo)))
        }

        async fn list_issues(&self, owner: &str, repo: &str, query: &IssueQuery) -> Result<Vec<Issue>> {
            self.record(Call::Issues(owner.into(), repo.into(), *query))?;
            Ok(self.issues.clone())
        }

        async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
            self.record(Call::Issue(owner.into(), repo.into(), number))?;
            Ok(issue(number, IssueState::Open))
        }

        async fn search_repositories(&self, query: &str, page: Page) -> Result<SearchResults> {
            self.record(Call::Search(query.into(), page))?;
            Ok(self.search.clone())
        }
    }

    pub fn repository(owner: &str, name: &str) -> Repository {
        Repository {
            id: 1,
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            description: Some("A test repository".to_string()),
            stars: 42,
            forks: 7,
            open_issues: 3,
            html_url: None,
        }
    }

    pub fn issue(number: u64, state: IssueState) -> Issue {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Issue {
            id: number + 1000,
            number,
            title: format!("Issue number {}", number),
            state,
            created_at: ts,
            updated_at: ts,
            body: Some("Body text".to_string()),
            user: User {
                login: "octocat".to_string(),
                avatar_url: None,
            },
            comments: 0,
            labels: vec![],
            html_url: None,
            pull_request: None,
        }
    }

    fn failure(kind: FetchKind) -> FetchFailure {
        FetchFailure {
            action: kind,
            status: Some(500),
            cause: "HTTP 500: boom".to_string(),
        }
    }

    #[test]
    fn begin_sets_loading_and_clears_error() {
        let mut store = Store::new();
        let token = store.begin(FetchKind::Repository);
        store.settle_repository(token, Err(failure(FetchKind::Repository)));
        assert!(store.snapshot().error.is_some());

        store.begin(FetchKind::Issues);
        let snap = store.snapshot();
        assert!(snap.loading());
        assert!(snap.is_loading(FetchKind::Issues));
        assert!(!snap.is_loading(FetchKind::Repository));
        assert!(snap.error.is_none());
    }

    #[test]
    fn success_replaces_slot_and_clears_error() {
        let mut store = Store::new();
        let token = store.begin(FetchKind::Repository);
        assert!(store.settle_repository(token, Ok(repository("octocat", "Hello-World"))));

        let snap = store.snapshot();
        assert_eq!(snap.repository, Some(repository("octocat", "Hello-World")));
        assert!(snap.error.is_none());
        assert!(!snap.loading());
    }

    #[test]
    fn failure_keeps_stale_data_and_sets_fixed_message() {
        let mut store = Store::new();
        let token = store.begin(FetchKind::Issue);
        store.settle_issue(token, Ok(issue(5, IssueState::Open)));

        let token = store.begin(FetchKind::Issue);
        store.settle_issue(token, Err(failure(FetchKind::Issue)));

        let snap = store.snapshot();
        assert_eq!(snap.current_issue.as_ref().map(|i| i.number), Some(5));
        assert_eq!(snap.error_message(), Some("Failed to load issue details"));
        assert!(!snap.loading());
    }

    #[test]
    fn each_action_has_its_own_message() {
        let messages: Vec<&str> = FetchKind::ALL.iter().map(|k| k.failure_message()).collect();
        assert_eq!(
            messages,
            vec![
                "Failed to load repository information",
                "Failed to load issue list",
                "Failed to load issue details",
                "Failed to search repositories",
            ]
        );
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut store = Store::new();
        let first = store.begin(FetchKind::Issues);
        let second = store.begin(FetchKind::Issues);

        assert!(store.settle_issues(second, Ok(vec![issue(2, IssueState::Open)])));
        assert!(!store.settle_issues(first, Ok(vec![issue(1, IssueState::Closed)])));

        let numbers: Vec<u64> = store.snapshot().issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![2]);
    }

    #[test]
    fn older_response_arriving_first_does_not_end_loading() {
        let mut store = Store::new();
        let first = store.begin(FetchKind::Issues);
        let second = store.begin(FetchKind::Issues);

        assert!(!store.settle_issues(first, Err(failure(FetchKind::Issues))));
        let snap = store.snapshot();
        assert!(snap.is_loading(FetchKind::Issues));
        assert!(snap.error.is_none());

        store.settle_issues(second, Ok(vec![]));
        assert!(!store.snapshot().loading());
    }

    #[test]
    fn kinds_do_not_supersede_each_other() {
        let mut store = Store::new();
        let repo = store.begin(FetchKind::Repository);
        let issues = store.begin(FetchKind::Issues);

        assert!(store.settle_issues(issues, Ok(vec![issue(1, IssueState::Open)])));
        assert!(store.snapshot().is_loading(FetchKind::Repository));
        assert!(store.settle_repository(repo, Ok(repository("a", "b"))));
        assert!(!store.snapshot().loading());
    }

    #[test]
    fn abandoned_request_cannot_write() {
        let mut store = Store::new();
        let token = store.begin(FetchKind::Issue);
        store.abandon(FetchKind::Issue);
        assert!(!store.snapshot().loading());

        assert!(!store.settle_issue(token, Ok(issue(9, IssueState::Open))));
        assert!(store.snapshot().current_issue.is_none());
    }

    #[test]
    fn snapshots_are_immutable() {
        let mut store = Store::new();
        let before = store.snapshot();
        let token = store.begin(FetchKind::Search);
        store.settle_search(
            token,
            Ok(SearchResults {
                total_count: 3,
                items: vec![repository("a", "b")],
            }),
        );
        assert!(before.search_results.is_empty());
        assert_eq!(store.snapshot().search_results.len(), 1);
    }

    #[tokio::test]
    async fn fetch_repository_sets_decoded_payload() {
        let forge = FakeForge {
            repository: Some(repository("octocat", "Hello-World")),
            ..Default::default()
        };
        let mut store = Store::new();
        store.fetch_repository(&forge, "octocat", "Hello-World").await;

        let snap = store.snapshot();
        assert_eq!(snap.repository, Some(repository("octocat", "Hello-World")));
        assert!(snap.error.is_none());
        assert_eq!(
            forge.calls(),
            vec![Call::Repository("octocat".into(), "Hello-World".into())]
        );
    }

    #[tokio::test]
    async fn fetch_issues_keeps_response_order() {
        let forge = FakeForge {
            issues: vec![
                issue(3, IssueState::Open),
                issue(2, IssueState::Open),
                issue(1, IssueState::Open),
            ],
            ..Default::default()
        };
        let query = IssueQuery {
            page: Page::new(1, 10),
            state: IssueFilter::Open,
        };
        let mut store = Store::new();
        store.fetch_issues(&forge, "octocat", "Hello-World", query).await;

        let numbers: Vec<u64> = store.snapshot().issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
        assert_eq!(
            forge.calls(),
            vec![Call::Issues("octocat".into(), "Hello-World".into(), query)]
        );
    }

    #[tokio::test]
    async fn fetch_issue_failure_leaves_current_issue() {
        let forge = FakeForge {
            fail_with: Some(404),
            ..Default::default()
        };
        let mut store = Store::new();
        store.fetch_issue(&forge, "octocat", "Hello-World", 1).await;

        let snap = store.snapshot();
        assert!(snap.current_issue.is_none());
        let err = snap.error.clone().unwrap();
        assert_eq!(err.action, FetchKind::Issue);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.to_string(), "Failed to load issue details");
    }

    #[tokio::test]
    async fn search_total_differs_from_item_count() {
        let forge = FakeForge {
            search: SearchResults {
                total_count: 57,
                items: vec![repository("a", "tetris"), repository("b", "tetris")],
            },
            ..Default::default()
        };
        let mut store = Store::new();
        store.search_repos(&forge, "tetris", Page::default()).await;

        let snap = store.snapshot();
        assert_eq!(snap.search_results.len(), 2);
        assert_eq!(snap.total_results, 57);
        assert_eq!(forge.calls(), vec![Call::Search("tetris".into(), Page::new(1, 30))]);
    }

    #[test]
    fn slots_remember_their_repository() {
        let mut store = Store::new();
        let token = store.begin_for(FetchKind::Issues, RepoKey::new("alice", "a"));
        store.settle_issues(token, Ok(vec![issue(77, IssueState::Open)]));
        let token = store.begin_for(FetchKind::Issue, RepoKey::new("alice", "a"));
        store.settle_issue(token, Ok(issue(5, IssueState::Open)));

        let snap = store.snapshot();
        assert_eq!(snap.issues_for("alice", "a").len(), 1);
        assert!(snap.issues_for("bob", "b").is_empty());
        assert!(snap.issue_for("alice", "a", 5).is_some());
        assert!(snap.issue_for("bob", "b", 5).is_none());
        assert!(snap.issue_for("alice", "a", 6).is_none());
    }

    #[test]
    fn new_repository_fetch_hides_old_rows_until_it_lands() {
        let mut store = Store::new();
        let token = store.begin_for(FetchKind::Issues, RepoKey::new("alice", "a"));
        store.settle_issues(token, Ok(vec![issue(77, IssueState::Open)]));

        let token = store.begin_for(FetchKind::Issues, RepoKey::new("bob", "b"));
        assert!(store.snapshot().issues_for("bob", "b").is_empty());

        store.settle_issues(token, Ok(vec![issue(3, IssueState::Open)]));
        let snap = store.snapshot();
        assert_eq!(snap.issues_for("bob", "b")[0].number, 3);
        assert!(snap.issues_for("alice", "a").is_empty());
    }

    #[test]
    fn failed_fetch_keeps_the_old_key() {
        let mut store = Store::new();
        let token = store.begin_for(FetchKind::Repository, RepoKey::new("alice", "a"));
        store.settle_repository(token, Ok(repository("alice", "a")));
        let token = store.begin_for(FetchKind::Repository, RepoKey::new("bob", "b"));
        store.settle_repository(token, Err(failure(FetchKind::Repository)));

        let snap = store.snapshot();
        assert!(snap.repository_for("alice", "a").is_some());
        assert!(snap.repository_for("bob", "b").is_none());
        assert!(snap.failure_of(FetchKind::Repository).is_some());
        assert!(snap.failure_of(FetchKind::Issues).is_none());
    }

    #[test]
    fn unscoped_results_belong_to_no_repository() {
        let mut store = Store::new();
        let token = store.begin(FetchKind::Issues);
        store.settle_issues(token, Ok(vec![issue(1, IssueState::Open)]));
        assert!(store.snapshot().issues_for("octocat", "Hello-World").is_empty());
    }

    #[test]
    fn outcome_tags_errors_with_the_action() {
        let ok: Result<u32> = Ok(1);
        assert_eq!(FetchKind::Search.outcome(ok), Ok(1));

        let err: Result<u32> = Err(DashError::Network("refused".into()));
        let failure = FetchKind::Issues.outcome(err).unwrap_err();
        assert_eq!(failure.action, FetchKind::Issues);
        assert_eq!(failure.status, None);
        assert_eq!(failure.message(), "Failed to load issue list");
    }

    #[tokio::test]
    async fn fetch_helpers_scope_results() {
        let forge = FakeForge::default();
        let mut store = Store::new();
        store.fetch_repository(&forge, "octocat", "Hello-World").await;
        store.fetch_issue(&forge, "octocat", "Hello-World", 4).await;

        let snap = store.snapshot();
        assert!(snap.repository_for("octocat", "Hello-World").is_some());
        assert!(snap.issue_for("octocat", "Hello-World", 4).is_some());
    }

    #[tokio::test]
    async fn empty_search_is_still_a_search() {
        let forge = FakeForge::default();
        let mut store = Store::new();
        assert!(!store.snapshot().searched);

        store.search_repos(&forge, "zzzz", Page::default()).await;
        let snap = store.snapshot();
        assert!(snap.searched);
        assert_eq!(snap.total_results, 0);
    }
}
