//! Issue policy: required key phrase with ignore rules.

use forge_api::{ContentStore, Issue, IssueTracker, MembershipDirectory, RepoRef};
use serde::Deserialize;
use tracing::debug;

use super::{apply_actions, relabel, PolicyActions, PolicyOutcome, Verdict};
use crate::domain::Result;
use crate::obs::emit_policy_evaluated;

/// Placeholder in `validation_comment` replaced by the author's login.
pub const AUTHOR_PLACEHOLDER: &str = "@@AUTHOR@@";

/// Issue policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssuePolicyConfig {
    pub problem_label: Option<String>,
    pub approve_label: Option<String>,
    /// Text every valid issue body must contain
    pub keyphrase: Option<String>,
    pub validation_comment: Option<String>,
    pub ignored_labels: Option<Vec<String>>,
    /// Substrings of the title that exempt an issue
    pub ignored_titles: Option<Vec<String>>,
    /// Logins, or `@org` for public members of an organization
    pub ignored_authors: Option<Vec<String>>,
}

impl IssuePolicyConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the policy file at `path` from the repository itself.
    pub async fn fetch<S>(store: &S, repo: &RepoRef, path: &str) -> Result<Self>
    where
        S: ContentStore + ?Sized,
    {
        let text = store.fetch_file(repo, path).await?;
        Self::from_yaml(&text)
    }
}

fn lowercased(list: &Option<Vec<String>>) -> Vec<String> {
    list.iter().flatten().map(|s| s.to_lowercase()).collect()
}

/// Whether `user` matches an `ignored_authors` entry.
async fn matches_user<M>(directory: &M, user: &str, check: &str) -> bool
where
    M: MembershipDirectory + ?Sized,
{
    match check.strip_prefix('@') {
        // Team membership is not resolved.
        Some(team) if team.contains('/') => false,
        Some(org) => {
            debug!("Checking membership of {} in org {}", user, org);
            directory.is_public_org_member(org, user).await
        }
        None => user == check,
    }
}

async fn is_ignored<M>(
    directory: &M,
    issue: &Issue,
    labels: &[String],
    config: &IssuePolicyConfig,
) -> bool
where
    M: MembershipDirectory + ?Sized,
{
    let title = issue.title.to_lowercase();
    let author = issue.author.to_lowercase();

    let ignored_labels = lowercased(&config.ignored_labels);
    if ignored_labels.iter().any(|l| labels.contains(l)) {
        debug!("Issue is ignored due to labels");
        return true;
    }

    if lowercased(&config.ignored_titles)
        .iter()
        .any(|t| title.contains(t.as_str()))
    {
        debug!("Issue is ignored due to title '{}'", title);
        return true;
    }

    for check in lowercased(&config.ignored_authors) {
        if matches_user(directory, &author, &check).await {
            debug!("Issue is ignored due to author '{}' vs {}", author, check);
            return true;
        }
    }
    false
}

/// Evaluate `issue` against `config`.
pub async fn evaluate_issue<M>(
    issue: &Issue,
    config: &IssuePolicyConfig,
    directory: &M,
) -> PolicyOutcome
where
    M: MembershipDirectory + ?Sized,
{
    let labels: Vec<String> = issue.labels.iter().map(|l| l.to_lowercase()).collect();
    if is_ignored(directory, issue, &labels, config).await {
        return PolicyOutcome::ignored();
    }

    let valid = config
        .keyphrase
        .as_deref()
        .filter(|p| !p.is_empty())
        .map_or(true, |phrase| issue.body.contains(phrase));

    let problem_label = config.problem_label.as_deref().filter(|l| !l.is_empty());
    let approve_label = config.approve_label.as_deref().filter(|l| !l.is_empty());

    if valid {
        return PolicyOutcome {
            verdict: Verdict::Passed,
            problems: Vec::new(),
            actions: PolicyActions {
                set_labels: relabel(&labels, problem_label, approve_label),
                ..PolicyActions::default()
            },
        };
    }

    let mut actions = PolicyActions::default();
    if let Some(problem) = problem_label {
        if !labels.iter().any(|l| l == problem) {
            actions.add_labels.push(problem.to_string());
            actions.comment = config
                .validation_comment
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(|c| c.replacen(AUTHOR_PLACEHOLDER, &issue.author, 1));
        }
    }

    PolicyOutcome {
        verdict: Verdict::Failed,
        problems: vec!["issue body is missing the required key phrase".to_string()],
        actions,
    }
}

/// Fetch issue `number`, evaluate it and apply the outcome.
pub async fn run_issue_validation<C>(
    client: &C,
    repo: &RepoRef,
    number: u64,
    config: &IssuePolicyConfig,
    dry_run: bool,
) -> Result<PolicyOutcome>
where
    C: IssueTracker + MembershipDirectory + ?Sized,
{
    let issue = client.get_issue(repo, number).await?;
    let outcome = evaluate_issue(&issue, config, client).await;
    emit_policy_evaluated(
        "issue",
        number,
        outcome.verdict.as_str(),
        outcome.problems.len(),
    );

    if outcome.verdict != Verdict::Ignored {
        apply_actions(client, repo, number, &outcome.actions, dry_run).await?;
    }
    Ok(outcome)
}
