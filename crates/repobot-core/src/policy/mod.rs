//! Issue and pull request policy checks.
//!
//! Evaluation is pure: a policy looks at an issue or PR plus its YAML config
//! and returns a [`PolicyOutcome`] describing the labels and comment the bot
//! wants to apply. [`apply_actions`] then performs them through an
//! [`IssueTracker`], or only logs them in dry-run mode.

pub mod issue;
pub mod pr;

use forge_api::{IssueTracker, RepoRef};
use serde::Serialize;
use tracing::info;

use crate::domain::Result;

pub use issue::{evaluate_issue, run_issue_validation, IssuePolicyConfig};
pub use pr::{evaluate_pr, run_pr_validation, LabelOverrides, PrPolicyConfig};

/// Overall result of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The item opted out of validation
    Ignored,
    Passed,
    Failed,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ignored => "ignored",
            Verdict::Passed => "passed",
            Verdict::Failed => "failed",
        }
    }
}

/// Mutations a policy wants applied, in application order: add labels,
/// comment, replace labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyActions {
    pub add_labels: Vec<String>,
    pub comment: Option<String>,
    pub set_labels: Option<Vec<String>>,
}

impl PolicyActions {
    pub fn is_empty(&self) -> bool {
        self.add_labels.is_empty() && self.comment.is_none() && self.set_labels.is_none()
    }
}

/// Verdict, problems found and the resulting actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyOutcome {
    pub verdict: Verdict,
    pub problems: Vec<String>,
    pub actions: PolicyActions,
}

impl PolicyOutcome {
    pub fn ignored() -> Self {
        PolicyOutcome {
            verdict: Verdict::Ignored,
            problems: Vec::new(),
            actions: PolicyActions::default(),
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict != Verdict::Failed
    }
}

/// Drop `remove` and append `add` (if missing). Returns the new label list
/// only when it differs from `current`.
pub(crate) fn relabel(
    current: &[String],
    remove: Option<&str>,
    add: Option<&str>,
) -> Option<Vec<String>> {
    let mut labels = current.to_vec();
    let mut changed = false;

    if let Some(remove) = remove {
        if labels.iter().any(|l| l == remove) {
            labels.retain(|l| l != remove);
            changed = true;
        }
    }
    if let Some(add) = add {
        if !labels.iter().any(|l| l == add) {
            labels.push(add.to_string());
            changed = true;
        }
    }

    changed.then_some(labels)
}

/// Apply `actions` to issue or PR `number`. In dry-run mode the actions are
/// only logged.
pub async fn apply_actions<T>(
    tracker: &T,
    repo: &RepoRef,
    number: u64,
    actions: &PolicyActions,
    dry_run: bool,
) -> Result<()>
where
    T: IssueTracker + ?Sized,
{
    if dry_run {
        if !actions.add_labels.is_empty() {
            info!("Would add labels {:?} to #{}", actions.add_labels, number);
        }
        if actions.comment.is_some() {
            info!("Would comment on #{}", number);
        }
        if let Some(labels) = &actions.set_labels {
            info!("Would set labels of #{} to {:?}", number, labels);
        }
        return Ok(());
    }

    if !actions.add_labels.is_empty() {
        tracker.add_labels(repo, number, &actions.add_labels).await?;
    }
    if let Some(comment) = &actions.comment {
        tracker.create_comment(repo, number, comment).await?;
    }
    if let Some(labels) = &actions.set_labels {
        tracker.set_labels(repo, number, labels).await?;
    }
    Ok(())
}
