use std::fmt;

/// Client-side navigation target, addressed by the same paths as the web
/// dashboard: `/`, `/issues/{owner}/{repo}`, `/issues/{owner}/{repo}/{number}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Repository {
        owner: String,
        repo: String,
    },
    IssueDetail {
        owner: String,
        repo: String,
        number: u64,
    },
    NotFound(String),
}

impl Route {
    pub fn repository(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Route::Repository {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn issue(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Route::IssueDetail {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// Parse a route path. Anything unrecognized maps to `NotFound`.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path
            .trim_end_matches('/')
            .split('/')
            .skip_while(|s| s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["issues", owner, repo] if !owner.is_empty() && !repo.is_empty() => {
                Route::repository(*owner, *repo)
            }
            ["issues", owner, repo, number] if !owner.is_empty() && !repo.is_empty() => {
                match number.parse::<u64>() {
                    Ok(n) => Route::issue(*owner, *repo, n),
                    Err(_) => Route::NotFound(path.to_string()),
                }
            }
            _ => Route::NotFound(path.to_string()),
        }
    }

    /// Parse a command-line target: a route path, `owner/repo`, or
    /// `owner/repo#number`.
    pub fn from_target(target: &str) -> Self {
        let target = target.trim();
        if target.starts_with('/') {
            return Route::parse(target);
        }

        let (slug, number) = match target.split_once('#') {
            Some((slug, n)) => match n.parse::<u64>() {
                Ok(n) => (slug, Some(n)),
                Err(_) => return Route::NotFound(target.to_string()),
            },
            None => (target, None),
        };

        match slug.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                match number {
                    Some(n) => Route::issue(owner, repo, n),
                    None => Route::repository(owner, repo),
                }
            }
            _ => Route::NotFound(target.to_string()),
        }
    }

    /// The repository this route belongs to, if any.
    pub fn repo(&self) -> Option<(&str, &str)> {
        match self {
            Route::Repository { owner, repo } | Route::IssueDetail { owner, repo, .. } => {
                Some((owner, repo))
            }
            Route::Home | Route::NotFound(_) => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Repository { owner, repo } => write!(f, "/issues/{}/{}", owner, repo),
            Route::IssueDetail {
                owner,
                repo,
                number,
            } => write!(f, "/issues/{}/{}/{}", owner, repo, number),
            Route::NotFound(path) => write!(f, "{}", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(
            Route::parse("/issues/octocat/Hello-World"),
            Route::repository("octocat", "Hello-World")
        );
        assert_eq!(
            Route::parse("/issues/octocat/Hello-World/1347/"),
            Route::issue("octocat", "Hello-World", 1347)
        );
    }

    #[test]
    fn parse_unknown_routes_as_not_found() {
        assert_eq!(Route::parse("/pulls/a/b"), Route::NotFound("/pulls/a/b".into()));
        assert_eq!(Route::parse("/issues/a"), Route::NotFound("/issues/a".into()));
        assert_eq!(
            Route::parse("/issues/a/b/latest"),
            Route::NotFound("/issues/a/b/latest".into())
        );
        assert!(matches!(Route::parse("/issues/a/b/1/2"), Route::NotFound(_)));
    }

    #[test]
    fn display_round_trips_paths() {
        for path in ["/", "/issues/rust-lang/rust", "/issues/rust-lang/rust/42"] {
            assert_eq!(Route::parse(path).to_string(), path);
        }
    }

    #[test]
    fn targets_accept_slugs() {
        assert_eq!(
            Route::from_target("tokio-rs/tokio"),
            Route::repository("tokio-rs", "tokio")
        );
        assert_eq!(
            Route::from_target("tokio-rs/tokio#7"),
            Route::issue("tokio-rs", "tokio", 7)
        );
        assert_eq!(
            Route::from_target("/issues/tokio-rs/tokio/7"),
            Route::issue("tokio-rs", "tokio", 7)
        );
        assert!(matches!(Route::from_target("tokio"), Route::NotFound(_)));
        assert!(matches!(Route::from_target("a/b#x"), Route::NotFound(_)));
        assert!(matches!(Route::from_target("a/b/c"), Route::NotFound(_)));
    }

    #[test]
    fn repo_of_route() {
        assert_eq!(Route::issue("a", "b", 1).repo(), Some(("a", "b")));
        assert_eq!(Route::Home.repo(), None);
    }
}
