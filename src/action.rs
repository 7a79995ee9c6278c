use crate::route::Route;
use crate::store::{FetchFailure, RequestToken};
use crate::types::{Issue, IssueFilter, Repository, SearchResults};

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    GoToTop,
    GoToBottom,
    Select,

    // Landing screen form
    NextField,
    PrevField,
    Input(char),
    Backspace,

    Navigate(Route),

    // Issue list
    RevealIssues,
    SetFilter(IssueFilter),
    CycleFilter,
    PrevPage,
    NextPage,

    // Fetch results, tagged with the request that produced them
    RepositoryLoaded(Result<Repository, FetchFailure>, RequestToken),
    IssuesLoaded(Result<Vec<Issue>, FetchFailure>, RequestToken),
    IssueLoaded(Result<Box<Issue>, FetchFailure>, RequestToken),
    SearchLoaded(Result<SearchResults, FetchFailure>, RequestToken),

    Refresh,
    OpenInBrowser,
    YankUrl,
    Tick,

    None,
}
