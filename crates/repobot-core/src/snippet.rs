//! Single-release descriptor snippets.
//!
//! Unlike the aggregated document, a snippet is the descriptor of exactly
//! one release (the newest that passes the filter) copied verbatim.

use std::path::Path;

use forge_api::{AssetStore, Release, ReleaseCatalog, ReleaseSource, RepoRef};
use regex::Regex;
use tracing::{error, info};

use crate::domain::Result;
use crate::obs::{emit_descriptor_fetched, emit_release_skipped};
use crate::reporting::write_pretty_json;
use crate::selection::{compile_optional, matches_non_empty};

/// Which releases may provide the snippet.
#[derive(Debug, Clone, Default)]
pub struct SnippetFilter {
    pub include_prereleases: bool,
    /// Non-empty names and descriptions must match
    pub match_pattern: Option<Regex>,
    /// A matching name or description excludes the release
    pub ignore_pattern: Option<Regex>,
}

impl SnippetFilter {
    /// Compile optional patterns; empty strings count as absent.
    pub fn new(
        include_prereleases: bool,
        match_pattern: Option<&str>,
        ignore_pattern: Option<&str>,
    ) -> Result<Self> {
        Ok(SnippetFilter {
            include_prereleases,
            match_pattern: compile_optional(match_pattern)?,
            ignore_pattern: compile_optional(ignore_pattern)?,
        })
    }

    /// Reason `release` is rejected, or `None` if it qualifies.
    fn rejection(&self, release: &Release) -> Option<&'static str> {
        if !self.include_prereleases && release.is_prerelease {
            return Some("prerelease");
        }
        if let Some(re) = &self.match_pattern {
            let misses = |text: &str| !text.is_empty() && !re.is_match(text);
            if misses(&release.name) || misses(&release.description) {
                return Some("match pattern");
            }
        }
        if let Some(re) = &self.ignore_pattern {
            if matches_non_empty(re, &release.name) || matches_non_empty(re, &release.description)
            {
                return Some("ignore pattern");
            }
        }
        if !release.has_asset() {
            return Some("no descriptor asset");
        }
        None
    }
}

/// The newest release in `catalog` accepted by `filter`.
pub fn find_latest_matching<'a>(
    catalog: &'a ReleaseCatalog,
    filter: &SnippetFilter,
) -> Option<&'a Release> {
    catalog.iter().find(|release| match filter.rejection(release) {
        Some(reason) => {
            emit_release_skipped(&release.tag_name, reason);
            false
        }
        None => true,
    })
}

/// Find the newest matching release and copy its descriptor to `output`.
///
/// Returns the chosen release, or `None` (and writes nothing) when no
/// release qualifies.
pub async fn fetch_snippet<C>(
    client: &C,
    repo: &RepoRef,
    filter: &SnippetFilter,
    output: &Path,
) -> Result<Option<Release>>
where
    C: ReleaseSource + AssetStore + ?Sized,
{
    let catalog = client.list_releases(repo).await?;
    let Some(release) = find_latest_matching(&catalog, filter) else {
        error!("No matching release found");
        return Ok(None);
    };
    let Some(url) = release.asset_url.as_deref() else {
        return Ok(None);
    };

    info!("Found release {}", release.tag_name);
    let descriptor = client.fetch_json(url).await?;
    emit_descriptor_fetched(&release.tag_name, url);

    write_pretty_json(output, &descriptor)?;
    info!(
        "Wrote descriptor of {} to {}",
        release.tag_name,
        output.display()
    );
    Ok(Some(release.clone()))
}
