//! Bulk closing of issues matched by a search query.

use forge_api::{Issue, IssueTracker, RepoRef};
use tracing::{debug, info};

use crate::domain::Result;
use crate::obs::emit_issue_closed;

/// Results requested per search page (the API maximum).
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Collect every search hit for `query`, oldest first.
///
/// Pages are requested while the API flags the results as incomplete. An
/// empty page also ends the walk.
pub async fn search_all<T>(tracker: &T, query: &str) -> Result<Vec<Issue>>
where
    T: IssueTracker + ?Sized,
{
    let mut issues = Vec::new();
    let mut page = 1;
    loop {
        let result = tracker.search_issues(query, page, SEARCH_PAGE_SIZE).await?;
        debug!(
            page,
            hits = result.items.len(),
            incomplete = result.incomplete_results,
            "Search page received"
        );
        let exhausted = result.items.is_empty();
        issues.extend(result.items);
        if !result.incomplete_results || exhausted {
            break;
        }
        page += 1;
    }
    Ok(issues)
}

/// Close every issue in `repo` matching `query`, commenting first when
/// `comment` is given.
///
/// Returns the numbers of the matched issues. In dry-run mode nothing is
/// changed and each match is only logged.
pub async fn close_by_query<T>(
    tracker: &T,
    repo: &RepoRef,
    query: &str,
    comment: Option<&str>,
    dry_run: bool,
) -> Result<Vec<u64>>
where
    T: IssueTracker + ?Sized,
{
    let full_query = format!("repo:{} {}", repo, query);
    let issues = search_all(tracker, &full_query).await?;
    info!(query = %full_query, matches = issues.len(), "Issue search finished");

    let mut numbers = Vec::with_capacity(issues.len());
    for issue in issues {
        if dry_run {
            info!("Would close issue #{}", issue.number);
        } else {
            if let Some(body) = comment {
                tracker.create_comment(repo, issue.number, body).await?;
            }
            tracker.close_issue(repo, issue.number).await?;
            emit_issue_closed(issue.number, comment.is_some());
        }
        numbers.push(issue.number);
    }
    Ok(numbers)
}
