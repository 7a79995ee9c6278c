use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Issue, IssueQuery, Page, Repository, SearchResults};

/// Read-only access to a code-hosting service's repositories and issues.
#[async_trait]
pub trait Forge: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn repository_url(&self, owner: &str, repo: &str) -> String;
    fn issue_url(&self, owner: &str, repo: &str, number: u64) -> String;

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository>;

    /// One page of issues, newest first. No total count is available.
    async fn list_issues(&self, owner: &str, repo: &str, query: &IssueQuery)
        -> Result<Vec<Issue>>;

    /// `number` is the repository-scoped issue number, not the global id.
    async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue>;

    /// `query` uses the service's own search syntax and is sent verbatim.
    async fn search_repositories(&self, query: &str, page: Page) -> Result<SearchResults>;
}
