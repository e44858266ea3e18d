//! GitHub client
//!
//! Releases come from the GraphQL API (first 100, newest created first, with
//! the first asset carrying the configured descriptor name). Issues, pull
//! requests, labels, comments, issue search, repository files and org
//! membership use the REST API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::catalog::{AssetStore, Release, ReleaseCatalog, ReleaseSource, RepoRef};
use crate::config::GitHubConfig;
use crate::contents::{decode_content, ContentStore};
use crate::error::FeedError;
use crate::issues::{Issue, IssueTracker, MembershipDirectory, PullRequest, SearchPage};
use crate::Result;

const RELEASES_QUERY: &str = r#"query($owner: String!, $name: String!, $asset: String!) {
  repository(owner: $owner, name: $name) {
    releases(first: 100, orderBy: {field: CREATED_AT, direction: DESC}) {
      nodes {
        name
        description
        createdAt
        isPrerelease
        tag {
          name
        }
        releaseAssets(first: 1, name: $asset) {
          nodes {
            downloadUrl
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    releases: Connection<ReleaseNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseNode {
    name: Option<String>,
    description: Option<String>,
    created_at: Option<DateTime<Utc>>,
    is_prerelease: bool,
    tag: Option<TagNode>,
    release_assets: Connection<AssetNode>,
}

#[derive(Debug, Deserialize)]
struct TagNode {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetNode {
    download_url: String,
}

impl From<ReleaseNode> for Release {
    fn from(node: ReleaseNode) -> Self {
        Release {
            name: node.name.unwrap_or_default(),
            description: node.description.unwrap_or_default(),
            tag_name: node.tag.map(|t| t.name).unwrap_or_default(),
            is_prerelease: node.is_prerelease,
            asset_url: node
                .release_assets
                .nodes
                .into_iter()
                .next()
                .map(|a| a.download_url),
            created_at: node.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LabelJson {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RefJson {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct UserJson {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestJson {
    number: u64,
    body: Option<String>,
    head: RefJson,
    base: RefJson,
    #[serde(default)]
    labels: Vec<LabelJson>,
}

#[derive(Debug, Deserialize)]
struct IssueJson {
    number: u64,
    title: String,
    body: Option<String>,
    user: UserJson,
    #[serde(default)]
    labels: Vec<LabelJson>,
}

impl From<IssueJson> for Issue {
    fn from(issue: IssueJson) -> Self {
        Issue {
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            author: issue.user.login,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchJson {
    #[serde(default)]
    incomplete_results: bool,
    items: Vec<IssueJson>,
}

#[derive(Debug, Deserialize)]
struct ContentJson {
    content: String,
    #[serde(default)]
    encoding: String,
}

/// GitHub client implementing every forge trait
pub struct GitHubClient {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(GitHubClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GitHubConfig::from_env())
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn api(&self, method: Method, path: &str) -> (String, RequestBuilder) {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);
        let mut request = self
            .http_client
            .request(method, &url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        (url, request)
    }

    async fn send(url: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn labels_request(
        &self,
        method: Method,
        repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<()> {
        let (url, request) = self.api(
            method,
            &format!("/repos/{}/{}/issues/{}/labels", repo.owner, repo.name, number),
        );
        Self::send(&url, request.json(&json!({ "labels": labels }))).await?;
        Ok(())
    }
}

#[async_trait]
impl ReleaseSource for GitHubClient {
    async fn list_releases(&self, repo: &RepoRef) -> Result<ReleaseCatalog> {
        info!("Fetching releases of {}", repo);

        let body = json!({
            "query": RELEASES_QUERY,
            "variables": {
                "owner": repo.owner,
                "name": repo.name,
                "asset": self.config.asset_name,
            },
        });
        let mut request = self.http_client.post(&self.config.graphql_url).json(&body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = Self::send(&self.config.graphql_url, request).await?;
        let payload: GraphQlResponse<RepositoryData> = response.json().await?;

        if let Some(errors) = payload.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(FeedError::GraphQl(messages.join("; ")));
        }

        let repository = payload
            .data
            .and_then(|d| d.repository)
            .ok_or_else(|| FeedError::RepositoryNotFound(repo.to_string()))?;

        let releases: Vec<Release> = repository
            .releases
            .nodes
            .into_iter()
            .map(Release::from)
            .collect();
        debug!("Received {} releases", releases.len());

        ReleaseCatalog::newest_first(releases)
    }
}

#[async_trait]
impl AssetStore for GitHubClient {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        debug!("Downloading asset {}", url);
        let response = Self::send(url, self.http_client.get(url)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Downloading {}", url);
        let response = Self::send(url, self.http_client.get(url)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest> {
        let (url, request) = self.api(
            Method::GET,
            &format!("/repos/{}/{}/pulls/{}", repo.owner, repo.name, number),
        );
        let pr: PullRequestJson = Self::send(&url, request).await?.json().await?;

        Ok(PullRequest {
            number: pr.number,
            body: pr.body.unwrap_or_default(),
            head_ref: pr.head.ref_name,
            base_ref: pr.base.ref_name,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
        })
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue> {
        let (url, request) = self.api(
            Method::GET,
            &format!("/repos/{}/{}/issues/{}", repo.owner, repo.name, number),
        );
        let issue: IssueJson = Self::send(&url, request).await?.json().await?;
        Ok(Issue::from(issue))
    }

    async fn set_labels(&self, repo: &RepoRef, number: u64, labels: &[String]) -> Result<()> {
        self.labels_request(Method::PUT, repo, number, labels).await
    }

    async fn add_labels(&self, repo: &RepoRef, number: u64, labels: &[String]) -> Result<()> {
        self.labels_request(Method::POST, repo, number, labels).await
    }

    async fn create_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        let (url, request) = self.api(
            Method::POST,
            &format!("/repos/{}/{}/issues/{}/comments", repo.owner, repo.name, number),
        );
        Self::send(&url, request.json(&json!({ "body": body }))).await?;
        Ok(())
    }

    async fn search_issues(&self, query: &str, page: u32, per_page: u32) -> Result<SearchPage> {
        let (url, request) = self.api(Method::GET, "/search/issues");
        let request = request.query(&[
            ("q", query.to_string()),
            ("sort", "created".to_string()),
            ("order", "asc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ]);
        let result: SearchJson = Self::send(&url, request).await?.json().await?;
        debug!("Search page {} returned {} items", page, result.items.len());

        Ok(SearchPage {
            items: result.items.into_iter().map(Issue::from).collect(),
            incomplete_results: result.incomplete_results,
        })
    }

    async fn close_issue(&self, repo: &RepoRef, number: u64) -> Result<()> {
        let (url, request) = self.api(
            Method::PATCH,
            &format!("/repos/{}/{}/issues/{}", repo.owner, repo.name, number),
        );
        Self::send(&url, request.json(&json!({ "state": "closed" }))).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for GitHubClient {
    async fn fetch_file(&self, repo: &RepoRef, path: &str) -> Result<String> {
        let (url, request) = self.api(
            Method::GET,
            &format!(
                "/repos/{}/{}/contents/{}",
                repo.owner,
                repo.name,
                path.trim_start_matches('/')
            ),
        );
        let file: ContentJson = Self::send(&url, request).await?.json().await?;
        decode_content(&file.content, &file.encoding)
    }
}

#[async_trait]
impl MembershipDirectory for GitHubClient {
    async fn is_public_org_member(&self, org: &str, user: &str) -> bool {
        let (_, request) = self.api(
            Method::GET,
            &format!("/orgs/{}/public_members/{}", org, user),
        );
        match request.send().await {
            Ok(response) => response.status() == StatusCode::NO_CONTENT,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_node_conversion_fills_defaults() {
        let node: ReleaseNode = serde_json::from_value(json!({
            "name": null,
            "description": null,
            "createdAt": "2024-05-01T10:00:00Z",
            "isPrerelease": true,
            "tag": null,
            "releaseAssets": { "nodes": [] }
        }))
        .unwrap();

        let release = Release::from(node);
        assert_eq!(release.name, "");
        assert_eq!(release.description, "");
        assert_eq!(release.tag_name, "");
        assert!(release.is_prerelease);
        assert!(!release.has_asset());
        assert!(release.created_at.is_some());
    }

    #[test]
    fn test_release_node_takes_first_asset() {
        let node: ReleaseNode = serde_json::from_value(json!({
            "name": "v1",
            "description": "notes",
            "createdAt": null,
            "isPrerelease": false,
            "tag": { "name": "v1" },
            "releaseAssets": { "nodes": [
                { "downloadUrl": "https://example.com/a.json" },
                { "downloadUrl": "https://example.com/b.json" }
            ] }
        }))
        .unwrap();

        let release = Release::from(node);
        assert_eq!(release.asset_url.as_deref(), Some("https://example.com/a.json"));
    }

    #[test]
    fn test_client_from_env_builds() {
        assert!(GitHubClient::from_env().is_ok());
    }
}
