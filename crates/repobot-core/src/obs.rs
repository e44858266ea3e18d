//! Structured observability hooks for bot runs.
//!
//! This module provides:
//! - Job-scoped tracing spans via `JobSpan` RAII guard
//! - Emission functions for selection, aggregation, policy and cleanup events
//!
//! Events are emitted at `info!` level unless noted (filter via `REPOBOT_LOG`).

use tracing::info;

/// RAII guard that enters a job-scoped tracing span for the duration of a bot run.
///
/// # Example
///
/// ```ignore
/// let _span = JobSpan::enter("imager-json", "octo/images");
/// // every event below carries job = "imager-json", repo = "octo/images"
/// ```
pub struct JobSpan {
    _span: tracing::span::EnteredSpan,
}

impl JobSpan {
    /// Create and enter a span tagged with the job name and repository.
    pub fn enter(job: &str, repo: &str) -> Self {
        let span = tracing::info_span!("repobot.job", job = %job, repo = %repo);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a release was skipped before selection (debug level).
pub fn emit_release_skipped(tag: &str, reason: &str) {
    tracing::debug!(event = "release.skipped", tag = %tag, reason = %reason);
}

/// Emit event: the stable slot was filled.
pub fn emit_stable_selected(tag: &str, version_key: &str) {
    info!(event = "release.stable_selected", tag = %tag, version_key = %version_key);
}

/// Emit event: the prerelease slot was filled.
pub fn emit_prerelease_selected(tag: &str, version_key: &str) {
    info!(event = "release.prerelease_selected", tag = %tag, version_key = %version_key);
}

/// Emit event: a descriptor asset was downloaded.
pub fn emit_descriptor_fetched(tag: &str, url: &str) {
    info!(event = "descriptor.fetched", tag = %tag, url = %url);
}

/// Emit event: an output document was written.
pub fn emit_document_written(path: &str, entries: usize) {
    info!(event = "document.written", path = %path, entries = entries);
}

/// Emit event: a policy was evaluated against an issue or pull request.
pub fn emit_policy_evaluated(kind: &str, number: u64, verdict: &str, problems: usize) {
    info!(
        event = "policy.evaluated",
        kind = %kind,
        number = number,
        verdict = %verdict,
        problems = problems,
    );
}

/// Emit event: an issue matched by a search query was closed.
pub fn emit_issue_closed(number: u64, commented: bool) {
    info!(event = "issue.closed", number = number, commented = commented);
}

/// Emit event: the newest version of an APT package was found.
pub fn emit_package_version(package: &str, version: &str, candidates: usize) {
    info!(
        event = "package.version_found",
        package = %package,
        version = %version,
        candidates = candidates,
    );
}
