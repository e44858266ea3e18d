//! In-memory fakes for the forge traits (testing only)
//!
//! `MemoryForge` implements every trait in this crate and records the
//! mutations it receives, so callers can assert on what a bot would have
//! done without any network access.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::{AssetStore, Release, ReleaseCatalog, ReleaseSource, RepoRef};
use crate::contents::ContentStore;
use crate::error::FeedError;
use crate::issues::{Issue, IssueTracker, MembershipDirectory, PullRequest, SearchPage};
use crate::Result;

/// A label mutation recorded by `MemoryForge`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    Set { number: u64, labels: Vec<String> },
    Add { number: u64, labels: Vec<String> },
}

/// A comment recorded by `MemoryForge`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedComment {
    pub number: u64,
    pub body: String,
}

#[derive(Debug, Default)]
struct ForgeState {
    releases: Vec<Release>,
    assets: HashMap<String, serde_json::Value>,
    raw_assets: HashMap<String, Vec<u8>>,
    files: HashMap<String, String>,
    search_pages: Vec<SearchPage>,
    failing_assets: HashSet<String>,
    pull_requests: HashMap<u64, PullRequest>,
    issues: HashMap<u64, Issue>,
    org_members: HashSet<(String, String)>,
    asset_fetches: Vec<String>,
    label_changes: Vec<LabelChange>,
    comments: Vec<RecordedComment>,
    searches: Vec<(String, u32)>,
    closed: Vec<u64>,
}

/// In-memory forge backed by plain collections.
#[derive(Debug, Default)]
pub struct MemoryForge {
    state: Mutex<ForgeState>,
}

impl MemoryForge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Releases returned by `list_releases`, in the given order.
    pub fn with_releases(self, releases: Vec<Release>) -> Self {
        self.state.lock().unwrap().releases = releases;
        self
    }

    pub fn with_asset(self, url: &str, json: serde_json::Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .assets
            .insert(url.to_string(), json);
        self
    }

    /// Bytes served by `fetch_bytes(url)`.
    pub fn with_raw_asset(self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.state
            .lock()
            .unwrap()
            .raw_assets
            .insert(url.to_string(), bytes.into());
        self
    }

    /// Repository file served by `fetch_file`, for any repository.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), content.to_string());
        self
    }

    /// Pages returned by `search_issues`, first page first. Later pages
    /// are empty.
    pub fn with_search_pages(self, pages: Vec<SearchPage>) -> Self {
        self.state.lock().unwrap().search_pages = pages;
        self
    }

    /// Make `fetch_json(url)` and `fetch_bytes(url)` fail with a transport error.
    pub fn with_failing_asset(self, url: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_assets
            .insert(url.to_string());
        self
    }

    pub fn with_pull_request(self, pr: PullRequest) -> Self {
        self.state.lock().unwrap().pull_requests.insert(pr.number, pr);
        self
    }

    pub fn with_issue(self, issue: Issue) -> Self {
        self.state.lock().unwrap().issues.insert(issue.number, issue);
        self
    }

    pub fn with_org_member(self, org: &str, user: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .org_members
            .insert((org.to_string(), user.to_string()));
        self
    }

    /// URLs passed to `fetch_json`, in call order.
    pub fn asset_fetches(&self) -> Vec<String> {
        self.state.lock().unwrap().asset_fetches.clone()
    }

    pub fn label_changes(&self) -> Vec<LabelChange> {
        self.state.lock().unwrap().label_changes.clone()
    }

    pub fn comments(&self) -> Vec<RecordedComment> {
        self.state.lock().unwrap().comments.clone()
    }

    /// `(query, page)` pairs passed to `search_issues`.
    pub fn searches(&self) -> Vec<(String, u32)> {
        self.state.lock().unwrap().searches.clone()
    }

    /// Issue numbers passed to `close_issue`, in call order.
    pub fn closed(&self) -> Vec<u64> {
        self.state.lock().unwrap().closed.clone()
    }
}

#[async_trait]
impl ReleaseSource for MemoryForge {
    async fn list_releases(&self, _repo: &RepoRef) -> Result<ReleaseCatalog> {
        let releases = self.state.lock().unwrap().releases.clone();
        ReleaseCatalog::newest_first(releases)
    }
}

#[async_trait]
impl AssetStore for MemoryForge {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        let mut state = self.state.lock().unwrap();
        state.asset_fetches.push(url.to_string());
        if state.failing_assets.contains(url) {
            return Err(FeedError::Http(format!("connection refused: {}", url)));
        }
        state
            .assets
            .get(url)
            .cloned()
            .ok_or_else(|| FeedError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.asset_fetches.push(url.to_string());
        if state.failing_assets.contains(url) {
            return Err(FeedError::Http(format!("connection refused: {}", url)));
        }
        if let Some(bytes) = state.raw_assets.get(url) {
            return Ok(bytes.clone());
        }
        match state.assets.get(url) {
            Some(json) => Ok(serde_json::to_vec(json)?),
            None => Err(FeedError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[async_trait]
impl IssueTracker for MemoryForge {
    async fn get_pull_request(&self, _repo: &RepoRef, number: u64) -> Result<PullRequest> {
        let state = self.state.lock().unwrap();
        state
            .pull_requests
            .get(&number)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(format!("pull request #{}", number)))
    }

    async fn get_issue(&self, _repo: &RepoRef, number: u64) -> Result<Issue> {
        let state = self.state.lock().unwrap();
        state
            .issues
            .get(&number)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(format!("issue #{}", number)))
    }

    async fn set_labels(&self, _repo: &RepoRef, number: u64, labels: &[String]) -> Result<()> {
        self.state.lock().unwrap().label_changes.push(LabelChange::Set {
            number,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    async fn add_labels(&self, _repo: &RepoRef, number: u64, labels: &[String]) -> Result<()> {
        self.state.lock().unwrap().label_changes.push(LabelChange::Add {
            number,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    async fn create_comment(&self, _repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        self.state.lock().unwrap().comments.push(RecordedComment {
            number,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn search_issues(&self, query: &str, page: u32, _per_page: u32) -> Result<SearchPage> {
        let mut state = self.state.lock().unwrap();
        state.searches.push((query.to_string(), page));
        let index = page.saturating_sub(1) as usize;
        Ok(state.search_pages.get(index).cloned().unwrap_or_default())
    }

    async fn close_issue(&self, _repo: &RepoRef, number: u64) -> Result<()> {
        self.state.lock().unwrap().closed.push(number);
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryForge {
    async fn fetch_file(&self, _repo: &RepoRef, path: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(format!("file {}", path)))
    }
}

#[async_trait]
impl MembershipDirectory for MemoryForge {
    async fn is_public_org_member(&self, org: &str, user: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .org_members
            .contains(&(org.to_string(), user.to_string()))
    }
}
