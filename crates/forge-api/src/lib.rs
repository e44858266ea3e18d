//! Forge-API: Release Catalog and Issue Tracker Access for repobot
//!
//! This crate is the I/O boundary of the bots. Everything that talks to the
//! hosting forge sits behind an async trait so the bots can be exercised
//! against in-memory fakes.
//!
//! ## Key Components
//!
//! - `ReleaseSource` / `ReleaseCatalog`: release history, newest first
//! - `AssetStore`: descriptor asset and package index downloads
//! - `IssueTracker` / `MembershipDirectory`: labels, comments, search,
//!   closing, org lookups
//! - `ContentStore`: policy files read from the repository
//! - `GitHubClient`: GitHub implementation of all of the above

pub mod catalog;
pub mod config;
pub mod contents;
mod error;
pub mod fakes;
pub mod github;
pub mod issues;
pub mod packages;

pub use catalog::{AssetStore, Release, ReleaseCatalog, ReleaseSource, RepoRef};
pub use config::{GitHubConfig, DEFAULT_ASSET_NAME};
pub use contents::ContentStore;
pub use error::FeedError;
pub use github::GitHubClient;
pub use issues::{Issue, IssueTracker, MembershipDirectory, PullRequest, SearchPage};
pub use packages::fetch_package_index;

/// Result type for forge-api operations
pub type Result<T> = std::result::Result<T, FeedError>;
