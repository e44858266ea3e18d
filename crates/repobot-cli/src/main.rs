//! repobot - repository automation bots
//!
//! ## Commands
//!
//! - `imager-json`: aggregate the stable and prerelease image descriptors
//! - `imager-snippet`: copy the descriptor of the newest matching release
//! - `validate-pr`: check a pull request against a YAML policy
//! - `validate-issue`: check an issue against a YAML policy
//! - `close-by-query`: close every issue matched by a search query
//! - `latest-apt-version`: print the newest version of a package in an APT index
//!
//! Policy files are read from the repository being validated.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forge_api::{
    AssetStore, ContentStore, GitHubClient, GitHubConfig, IssueTracker, MembershipDirectory,
    ReleaseSource, RepoRef, DEFAULT_ASSET_NAME,
};
use repobot_core::{
    build_imager_document, close_by_query, fetch_snippet, latest_package_version,
    run_issue_validation, run_pr_validation, write_document, DescriptorOverrides,
    IssuePolicyConfig, JobSpan, PolicyOutcome, PrPolicyConfig, SelectionPatterns, SnippetFilter,
    Verdict,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "repobot")]
#[command(version = repobot_core::VERSION)]
#[command(about = "Release metadata and policy bots for hosted repositories", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// API token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the aggregated imager document from the latest releases
    ImagerJson {
        /// Repository owner
        #[arg(long)]
        owner: String,

        /// Repository name
        #[arg(long)]
        repo: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Display name for the stable entry
        #[arg(long)]
        name_stable: Option<String>,

        /// Display name for the prerelease entry
        #[arg(long)]
        name_prerelease: Option<String>,

        /// Skip releases whose name or description match
        #[arg(long)]
        ignore_regex: Option<String>,

        /// Pattern whose named groups extract version keys from tags
        #[arg(long)]
        version_regex: Option<String>,

        /// Value for `init_format` in every entry
        #[arg(long)]
        init_format: Option<String>,

        /// Release asset holding the descriptor
        #[arg(long, default_value = DEFAULT_ASSET_NAME)]
        asset_name: String,
    },

    /// Copy the descriptor of the newest matching release
    ImagerSnippet {
        /// Repository owner
        #[arg(long)]
        owner: String,

        /// Repository name
        #[arg(long)]
        repo: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Consider prereleases too
        #[arg(long)]
        include_prereleases: bool,

        /// Non-empty names and descriptions must match
        #[arg(long)]
        match_regex: Option<String>,

        /// Skip releases whose name or description match
        #[arg(long)]
        ignore_regex: Option<String>,

        /// Release asset holding the descriptor
        #[arg(long, default_value = DEFAULT_ASSET_NAME)]
        asset_name: String,
    },

    /// Validate a pull request; exits non-zero when it fails
    ValidatePr {
        /// Repository as owner/name
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repository: RepoRef,

        /// Pull request number
        #[arg(short, long)]
        number: u64,

        /// Policy file (YAML), as a path inside the repository
        #[arg(short, long)]
        config: String,

        /// Log the actions instead of applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate an issue
    ValidateIssue {
        /// Repository as owner/name
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repository: RepoRef,

        /// Issue number
        #[arg(short, long)]
        number: u64,

        /// Policy file (YAML), as a path inside the repository
        #[arg(short, long)]
        config: String,

        /// Log the actions instead of applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Close every issue or pull request matched by a search query
    CloseByQuery {
        /// Repository as owner/name
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repository: RepoRef,

        /// Search qualifiers; the repository qualifier is added automatically
        #[arg(short, long)]
        query: String,

        /// Comment posted before closing
        #[arg(long)]
        comment: Option<String>,

        /// Log the matches instead of closing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the newest version of a package listed in an APT index
    LatestAptVersion {
        /// Package name
        #[arg(short, long)]
        package: String,

        /// URL of a Packages index, gunzipped when it ends in .gz
        #[arg(short, long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    repobot_core::init_tracing(cli.json, level);

    let token = non_empty(cli.token);

    match cli.command {
        Commands::ImagerJson {
            owner,
            repo,
            output,
            name_stable,
            name_prerelease,
            ignore_regex,
            version_regex,
            init_format,
            asset_name,
        } => {
            let client = github_client(token.as_deref(), &asset_name)?;
            let patterns = SelectionPatterns::new(
                non_empty(ignore_regex).as_deref(),
                non_empty(version_regex).as_deref(),
            )
            .context("Invalid selection pattern")?;
            let overrides = DescriptorOverrides {
                name_stable: non_empty(name_stable),
                name_prerelease: non_empty(name_prerelease),
                init_format: non_empty(init_format),
            };
            cmd_imager_json(
                &client,
                &RepoRef::new(&owner, &repo),
                &patterns,
                &overrides,
                &output,
            )
            .await
        }
        Commands::ImagerSnippet {
            owner,
            repo,
            output,
            include_prereleases,
            match_regex,
            ignore_regex,
            asset_name,
        } => {
            let client = github_client(token.as_deref(), &asset_name)?;
            let filter = SnippetFilter::new(
                include_prereleases,
                non_empty(match_regex).as_deref(),
                non_empty(ignore_regex).as_deref(),
            )
            .context("Invalid snippet pattern")?;
            cmd_imager_snippet(&client, &RepoRef::new(&owner, &repo), &filter, &output).await
        }
        Commands::ValidatePr {
            repository,
            number,
            config,
            dry_run,
        } => {
            let client = github_client(token.as_deref(), DEFAULT_ASSET_NAME)?;
            let outcome =
                cmd_validate_pr(&client, &repository, number, &config, dry_run).await?;
            report_outcome(&outcome, cli.json)?;
            if !outcome.passed() {
                anyhow::bail!("PR #{} failed validation", number);
            }
            Ok(())
        }
        Commands::ValidateIssue {
            repository,
            number,
            config,
            dry_run,
        } => {
            let client = github_client(token.as_deref(), DEFAULT_ASSET_NAME)?;
            let outcome =
                cmd_validate_issue(&client, &repository, number, &config, dry_run).await?;
            report_outcome(&outcome, cli.json)
        }
        Commands::CloseByQuery {
            repository,
            query,
            comment,
            dry_run,
        } => {
            let client = github_client(token.as_deref(), DEFAULT_ASSET_NAME)?;
            let closed = cmd_close_by_query(
                &client,
                &repository,
                &query,
                non_empty(comment).as_deref(),
                dry_run,
            )
            .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&closed)?);
            }
            Ok(())
        }
        Commands::LatestAptVersion { package, url } => {
            let client = github_client(None, DEFAULT_ASSET_NAME)?;
            let version = cmd_latest_apt_version(&client, &package, &url).await?;
            println!("{}", version);
            Ok(())
        }
    }
}

/// Treat empty strings from workflow inputs as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn github_client(token: Option<&str>, asset_name: &str) -> Result<GitHubClient> {
    let mut config = GitHubConfig::from_env().with_asset_name(asset_name);
    if let Some(token) = token {
        config = config.with_token(token);
    }
    GitHubClient::new(config).context("Failed to build GitHub client")
}

/// Select releases, aggregate their descriptors and write the document.
async fn cmd_imager_json<C>(
    client: &C,
    repo: &RepoRef,
    patterns: &SelectionPatterns,
    overrides: &DescriptorOverrides,
    output: &Path,
) -> Result<()>
where
    C: ReleaseSource + AssetStore + ?Sized,
{
    let _span = JobSpan::enter("imager-json", &repo.to_string());

    let document = build_imager_document(client, repo, patterns, overrides)
        .await
        .with_context(|| format!("Failed to build imager document for {}", repo))?;

    let Some(document) = document else {
        warn!("No stable release with a descriptor in {}, nothing written", repo);
        return Ok(());
    };

    write_document(output, &document)
        .with_context(|| format!("Failed to write {:?}", output))?;
    println!(
        "Wrote {} entries for {} to {}",
        document.os_list.len(),
        repo,
        output.display()
    );
    Ok(())
}

async fn cmd_imager_snippet<C>(
    client: &C,
    repo: &RepoRef,
    filter: &SnippetFilter,
    output: &Path,
) -> Result<()>
where
    C: ReleaseSource + AssetStore + ?Sized,
{
    let _span = JobSpan::enter("imager-snippet", &repo.to_string());

    let release = fetch_snippet(client, repo, filter, output)
        .await
        .with_context(|| format!("Failed to fetch snippet for {}", repo))?;

    if let Some(release) = release {
        println!("Wrote descriptor of {} to {}", release.tag_name, output.display());
    }
    Ok(())
}

async fn cmd_validate_pr<C>(
    client: &C,
    repo: &RepoRef,
    number: u64,
    config_path: &str,
    dry_run: bool,
) -> Result<PolicyOutcome>
where
    C: IssueTracker + ContentStore + ?Sized,
{
    let _span = JobSpan::enter("validate-pr", &repo.to_string());

    let config = PrPolicyConfig::fetch(client, repo, config_path)
        .await
        .with_context(|| format!("Failed to load PR policy {} from {}", config_path, repo))?;
    info!("Validating PR #{}", number);

    run_pr_validation(client, repo, number, &config, dry_run)
        .await
        .with_context(|| format!("Failed to validate PR #{}", number))
}

async fn cmd_validate_issue<C>(
    client: &C,
    repo: &RepoRef,
    number: u64,
    config_path: &str,
    dry_run: bool,
) -> Result<PolicyOutcome>
where
    C: IssueTracker + MembershipDirectory + ContentStore + ?Sized,
{
    let _span = JobSpan::enter("validate-issue", &repo.to_string());

    let config = IssuePolicyConfig::fetch(client, repo, config_path)
        .await
        .with_context(|| format!("Failed to load issue policy {} from {}", config_path, repo))?;
    info!("Validating issue #{}", number);

    run_issue_validation(client, repo, number, &config, dry_run)
        .await
        .with_context(|| format!("Failed to validate issue #{}", number))
}

async fn cmd_close_by_query<C>(
    client: &C,
    repo: &RepoRef,
    query: &str,
    comment: Option<&str>,
    dry_run: bool,
) -> Result<Vec<u64>>
where
    C: IssueTracker + ?Sized,
{
    let _span = JobSpan::enter("close-by-query", &repo.to_string());

    let numbers = close_by_query(client, repo, query, comment, dry_run)
        .await
        .with_context(|| format!("Failed to close issues matching '{}'", query))?;
    info!("{} issue(s) matched in {}", numbers.len(), repo);
    Ok(numbers)
}

async fn cmd_latest_apt_version<C>(client: &C, package: &str, url: &str) -> Result<String>
where
    C: AssetStore + ?Sized,
{
    let _span = JobSpan::enter("latest-apt-version", url);

    latest_package_version(client, url, package)
        .await
        .with_context(|| format!("Failed to read package index {}", url))?
        .with_context(|| format!("Could not find package {} in {}", package, url))
}

fn report_outcome(outcome: &PolicyOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome.verdict {
        Verdict::Ignored => println!("Ignored"),
        Verdict::Passed => println!("Passed"),
        Verdict::Failed => {
            println!("Failed with {} problem(s):", outcome.problems.len());
            for problem in &outcome.problems {
                println!("  * {}", problem);
            }
        }
    }
    Ok(())
}
