//! Issue and pull request access for the policy bots.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::RepoRef;
use crate::Result;

/// The fields of a pull request the PR policy looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    /// Description text; GitHub reports a missing body as empty
    pub body: String,
    /// Source branch name
    pub head_ref: String,
    /// Target branch name
    pub base_ref: String,
    pub labels: Vec<String>,
}

/// The fields of an issue the issue policy looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: String,
    /// Login of the issue author
    pub author: String,
    pub labels: Vec<String>,
}

/// One page of an issue search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<Issue>,
    /// The search timed out server-side; more pages may follow
    pub incomplete_results: bool,
}

/// Read, label, search and close issues and pull requests.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest>;

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue>;

    /// Replace all labels on an issue or pull request.
    async fn set_labels(&self, repo: &RepoRef, number: u64, labels: &[String]) -> Result<()>;

    /// Add labels, keeping the existing ones.
    async fn add_labels(&self, repo: &RepoRef, number: u64, labels: &[String]) -> Result<()>;

    async fn create_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()>;

    /// Search issues and pull requests, oldest created first. `page` starts
    /// at 1.
    async fn search_issues(&self, query: &str, page: u32, per_page: u32) -> Result<SearchPage>;

    async fn close_issue(&self, repo: &RepoRef, number: u64) -> Result<()>;
}

/// Organization membership lookups.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// Whether `user` is a public member of `org`. Lookup failures count as
    /// "not a member".
    async fn is_public_org_member(&self, org: &str, user: &str) -> bool;
}
