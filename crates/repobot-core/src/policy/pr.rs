//! Pull request policy: description and branch rules.

use forge_api::{ContentStore, IssueTracker, PullRequest, RepoRef};
use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{apply_actions, relabel, PolicyActions, PolicyOutcome, Verdict};
use crate::domain::Result;
use crate::obs::emit_policy_evaluated;

const COMMENT_HEADER: &str = "**Automatic PR Validation failed**\n\n\
    There were one or more problems detected with this PR:\n\n";

const COMMENT_FOOTER: &str = "\n\nPlease take a look at the Contribution Guidelines of this \
    repository and make sure that the PR follows them. Thank you!\n\n\
    *I'm just a bot 🤖 that does automatic checks, a human will intervene if I've made a mistake.*";

/// Branch rule changes that apply while a label is present on the PR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelOverrides {
    pub allowed_targets: Option<Vec<String>>,
    pub forbidden_targets: Option<Vec<String>>,
    pub forbidden_sources: Option<Vec<String>>,
    pub additional_allowed_targets: Option<Vec<String>>,
    pub additional_forbidden_targets: Option<Vec<String>>,
    pub additional_forbidden_sources: Option<Vec<String>>,
}

/// PR policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrPolicyConfig {
    pub problem_label: Option<String>,
    pub approve_label: Option<String>,
    /// PRs carrying this label are not validated
    pub ignore_label: Option<String>,
    pub allowed_targets: Option<Vec<String>>,
    pub forbidden_targets: Option<Vec<String>>,
    pub forbidden_sources: Option<Vec<String>>,
    /// Per-label overrides, in file order
    #[serde(default, deserialize_with = "ordered_overrides")]
    pub labels: Vec<(String, LabelOverrides)>,
}

fn ordered_overrides<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<(String, LabelOverrides)>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(mapping) = Option::<serde_yaml::Mapping>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    let mut overrides = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let label = key
            .as_str()
            .ok_or_else(|| D::Error::custom("label names must be strings"))?
            .to_string();
        let rules = if value.is_null() {
            LabelOverrides::default()
        } else {
            serde_yaml::from_value(value).map_err(D::Error::custom)?
        };
        overrides.push((label, rules));
    }
    Ok(overrides)
}

impl PrPolicyConfig {
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

/// Branch lists in force for one PR after label overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchRules {
    pub allowed_targets: Vec<String>,
    pub forbidden_targets: Vec<String>,
    pub forbidden_sources: Vec<String>,
}

impl BranchRules {
    /// Start from the config defaults and apply the overrides of every
    /// configured label present in `labels`.
    pub fn resolve(config: &PrPolicyConfig, labels: &[String]) -> Self {
        let mut rules = BranchRules {
            allowed_targets: config.allowed_targets.clone().unwrap_or_default(),
            forbidden_targets: config.forbidden_targets.clone().unwrap_or_default(),
            forbidden_sources: config.forbidden_sources.clone().unwrap_or_default(),
        };

        for (label, o) in &config.labels {
            if !labels.contains(label) {
                continue;
            }
            debug!("Applying branch overrides of label {}", label);
            if let Some(list) = &o.allowed_targets {
                rules.allowed_targets = list.clone();
            }
            if let Some(list) = &o.forbidden_targets {
                rules.forbidden_targets = list.clone();
            }
            if let Some(list) = &o.forbidden_sources {
                rules.forbidden_sources = list.clone();
            }
            if let Some(list) = &o.additional_allowed_targets {
                rules.allowed_targets.extend(list.iter().cloned());
            }
            if let Some(list) = &o.additional_forbidden_targets {
                rules.forbidden_targets.extend(list.iter().cloned());
            }
            if let Some(list) = &o.additional_forbidden_sources {
                rules.forbidden_sources.extend(list.iter().cloned());
            }
        }
        rules
    }

    /// Problems with `pr` under these rules.
    pub fn check(&self, pr: &PullRequest) -> Vec<String> {
        let source = &pr.head_ref;
        let target = &pr.base_ref;
        let mut problems = Vec::new();

        if pr.body.trim().is_empty() {
            warn!("PR has an empty description");
            problems.push(
                "The PR has an empty description. Please explain what the PR does, \
                 how you've tested your changes, etc."
                    .to_string(),
            );
        }

        if self.forbidden_sources.contains(source) {
            warn!("PR's source branch is among the forbidden source branches");
            problems.push(format!(
                "The PR's source branch `{}` is among the forbidden source branches: {}. \
                 Please always create PRs from a custom branch in your repository to avoid \
                 accidental commits making it into your PR.",
                source,
                self.forbidden_sources.join(", ")
            ));
        }

        if !self.allowed_targets.is_empty() && !self.allowed_targets.contains(target) {
            warn!("PR's target branch is not among the allowed target branches");
            problems.push(format!(
                "The PR's target branch `{}` is not among the allowed target branches: {}. \
                 Please only create PRs against these.",
                target,
                self.allowed_targets.join(", ")
            ));
        } else if !self.forbidden_targets.is_empty() && self.forbidden_targets.contains(target) {
            warn!("PR's target branch is among the forbidden target branches");
            problems.push(format!(
                "The PR's target branch `{}` is among the forbidden target branches: {}. \
                 Please only create PRs against others than that.",
                target,
                self.forbidden_targets.join(", ")
            ));
        }

        problems
    }
}

fn render_comment(problems: &[String]) -> String {
    let mut comment = String::from(COMMENT_HEADER);
    for problem in problems {
        comment.push_str("  * ");
        comment.push_str(problem);
        comment.push('\n');
    }
    comment.push_str(COMMENT_FOOTER);
    comment
}

/// Evaluate `pr` against `config`.
pub fn evaluate_pr(pr: &PullRequest, config: &PrPolicyConfig) -> PolicyOutcome {
    debug!("PR source is {}, target is {}", pr.head_ref, pr.base_ref);

    if let Some(ignore) = &config.ignore_label {
        if pr.labels.contains(ignore) {
            debug!("PR has ignore label {}, ignoring it", ignore);
            return PolicyOutcome::ignored();
        }
    }

    let rules = BranchRules::resolve(config, &pr.labels);
    let problems = rules.check(pr);
    let problem_label = config.problem_label.as_deref();
    let approve_label = config.approve_label.as_deref();

    if problems.is_empty() {
        PolicyOutcome {
            verdict: Verdict::Passed,
            problems,
            actions: PolicyActions {
                set_labels: relabel(&pr.labels, problem_label, approve_label),
                ..PolicyActions::default()
            },
        }
    } else {
        PolicyOutcome {
            verdict: Verdict::Failed,
            actions: PolicyActions {
                comment: Some(render_comment(&problems)),
                set_labels: relabel(&pr.labels, approve_label, problem_label),
                ..PolicyActions::default()
            },
            problems,
        }
    }
}

/// Fetch PR `number`, evaluate it and apply the outcome.
pub async fn run_pr_validation<T>(
    tracker: &T,
    repo: &RepoRef,
    number: u64,
    config: &PrPolicyConfig,
    dry_run: bool,
) -> Result<PolicyOutcome>
where
    T: IssueTracker + ?Sized,
{
    let pr = tracker.get_pull_request(repo, number).await?;
    let outcome = evaluate_pr(&pr, config);
    emit_policy_evaluated(
        "pull_request",
        number,
        outcome.verdict.as_str(),
        outcome.problems.len(),
    );

    if outcome.verdict != Verdict::Ignored {
        apply_actions(tracker, repo, number, &outcome.actions, dry_run).await?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(body: &str, head: &str, base: &str, labels: &[&str]) -> PullRequest {
        PullRequest {
            number: 1,
            body: body.to_string(),
            head_ref: head.to_string(),
            base_ref: base.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    const CONFIG: &str = r#"
problem_label: needs-work
approve_label: approved
ignore_label: skip-validation
allowed_targets: [develop]
forbidden_sources: [main, develop]
labels:
  hotfix:
    allowed_targets: [main]
  backport:
    additional_allowed_targets: [release-1.x]
"#;

    #[test]
    fn test_config_parses_label_order() {
        let config = PrPolicyConfig::from_yaml(CONFIG).unwrap();
        let names: Vec<&str> = config.labels.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(names, vec!["hotfix", "backport"]);
        assert_eq!(config.forbidden_targets, None);
    }

    #[test]
    fn test_label_overrides_replace_then_extend() {
        let config = PrPolicyConfig::from_yaml(CONFIG).unwrap();
        let labels = vec!["backport".to_string(), "hotfix".to_string()];

        let rules = BranchRules::resolve(&config, &labels);
        assert_eq!(rules.allowed_targets, vec!["main", "release-1.x"]);
    }

    #[test]
    fn test_valid_pr_gets_approved() {
        let config = PrPolicyConfig::from_yaml(CONFIG).unwrap();
        let pr = pr("Adds a thing", "feature", "develop", &["needs-work"]);
        let outcome = evaluate_pr(&pr, &config);

        assert_eq!(outcome.verdict, Verdict::Passed);
        assert_eq!(outcome.actions.set_labels, Some(vec!["approved".to_string()]));
        assert!(outcome.actions.comment.is_none());
    }

    #[test]
    fn test_problems_are_collected() {
        let config = PrPolicyConfig::from_yaml(CONFIG).unwrap();
        let outcome = evaluate_pr(&pr("  \n", "main", "main", &["approved"]), &config);

        assert_eq!(outcome.verdict, Verdict::Failed);
        assert_eq!(outcome.problems.len(), 3);
        assert_eq!(outcome.actions.set_labels, Some(vec!["needs-work".to_string()]));
        let comment = outcome.actions.comment.unwrap();
        assert!(comment.starts_with("**Automatic PR Validation failed**"));
        assert!(comment.contains("  * The PR has an empty description"));
        assert!(comment.contains("`main` is among the forbidden source branches: main, develop"));
    }

    #[test]
    fn test_forbidden_target_only_checked_without_allowed_list() {
        let config = PrPolicyConfig::from_yaml("forbidden_targets: [stable]").unwrap();
        let outcome = evaluate_pr(&pr("body", "feature", "stable", &[]), &config);

        assert_eq!(outcome.verdict, Verdict::Failed);
        assert!(outcome.problems[0].contains("forbidden target branches: stable"));
        // No labels configured, nothing to relabel.
        assert!(outcome.actions.set_labels.is_none());
    }

    #[test]
    fn test_ignore_label_short_circuits() {
        let config = PrPolicyConfig::from_yaml(CONFIG).unwrap();
        let outcome = evaluate_pr(&pr("", "main", "main", &["skip-validation"]), &config);
        assert_eq!(outcome.verdict, Verdict::Ignored);
        assert!(outcome.actions.is_empty());
    }
}
