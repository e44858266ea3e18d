//! repobot core library
//!
//! Release selection and descriptor aggregation for OS image catalogs, plus
//! the issue and pull request policy checks, bulk issue closing and APT
//! version lookups used by the repository bots.

pub mod aggregate;
pub mod apt;
pub mod cleanup;
pub mod domain;
pub mod obs;
pub mod policy;
pub mod reporting;
pub mod selection;
pub mod snippet;
pub mod tag_version;
pub mod telemetry;
pub mod version;

pub use domain::{AggregatedDocument, ArtifactDescriptor, BotError, Result, INIT_FORMAT_FIELD};

pub use version::normalize_version;

pub use tag_version::{extract_version_key, VersionKey};

pub use selection::{select_releases, Selection, SelectionPatterns, SelectionState, SlotFill};

pub use aggregate::{aggregate, build_imager_document, DescriptorOverrides};

pub use snippet::{fetch_snippet, find_latest_matching, SnippetFilter};

pub use policy::{
    apply_actions, evaluate_issue, evaluate_pr, run_issue_validation, run_pr_validation,
    IssuePolicyConfig, LabelOverrides, PolicyActions, PolicyOutcome, PrPolicyConfig, Verdict,
};

pub use cleanup::{close_by_query, search_all, SEARCH_PAGE_SIZE};

pub use apt::{compare_versions, highest_version, latest_package_version, package_versions};

pub use reporting::{to_pretty_json, write_document, write_pretty_json};

pub use obs::{
    emit_descriptor_fetched, emit_document_written, emit_issue_closed, emit_package_version,
    emit_policy_evaluated, emit_prerelease_selected, emit_release_skipped, emit_stable_selected,
    JobSpan,
};

pub use telemetry::init_tracing;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
