use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use urlencoding::encode;

use crate::config::ApiConfig;
use crate::error::{DashError, Result};
use crate::forge::Forge;
use crate::types::{Issue, IssueQuery, Page, Repository, SearchResults};

/// Unauthenticated client for the GitHub REST API.
pub struct GitHub {
    client: Client,
    base_url: String,
    web_url: String,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GitHub {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DashError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            web_url: config.web_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.api_url(path);
        tracing::debug!(%url, ?params, "GET");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DashError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(DashError::Status {
                status: status.as_u16(),
                message: api_message(&text),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| DashError::Decode(e.to_string()))
    }
}

/// GitHub error bodies look like `{"message": "Not Found", ...}`.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn repo_path(owner: &str, repo: &str) -> String {
    format!("/repos/{}/{}", encode(owner), encode(repo))
}

#[async_trait]
impl Forge for GitHub {
    fn name(&self) -> &str {
        "GitHub"
    }

    fn repository_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/{}/{}", self.web_url, encode(owner), encode(repo))
    }

    fn issue_url(&self, owner: &str, repo: &str, number: u64) -> String {
        format!(
            "{}/{}/{}/issues/{}",
            self.web_url,
            encode(owner),
            encode(repo),
            number
        )
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.get_json(&repo_path(owner, repo), &[]).await
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        query: &IssueQuery,
    ) -> Result<Vec<Issue>> {
        let path = format!("{}/issues", repo_path(owner, repo));
        let params = [
            ("page", query.page.number.to_string()),
            ("per_page", query.page.per_page.to_string()),
            ("state", query.state.as_api_str().to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];
        self.get_json(&path, &params).await
    }

    async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
        let path = format!("{}/issues/{}", repo_path(owner, repo), number);
        self.get_json(&path, &[]).await
    }

    async fn search_repositories(&self, query: &str, page: Page) -> Result<SearchResults> {
        let params = [
            ("q", query.to_string()),
            ("page", page.number.to_string()),
            ("per_page", page.per_page.to_string()),
        ];
        self.get_json("/search/repositories", &params).await
    }
}
