#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context};
use clap::Parser;
use gradeflow_core::config::Settings;
use gradeflow_core::context::RunContext;
use gradeflow_core::output::format::safe_output_escape;
use gradeflow_core::output::{OutputWriter, StepReport};
use gradeflow_core::steps::{issue, labeled, outcome, release, review, ReleaseInput, StepContext};
use gradeflow_core::GitHubApiClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gradeflow",
    version,
    about = "Release checks, grade requests and code reviews for course project repositories"
)]
struct Cli {
    /// Course settings file (YAML)
    #[arg(long, global = true, env = "GRADEFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// GitHub token for API access
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub REST API base URL
    #[arg(
        long,
        global = true,
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Parse the release tag into version numbers
    ReleaseParse,
    /// Check the patch number against existing releases
    ReleasePatch(ReleaseArgs),
    /// Check the minor number against completed code reviews
    ReleaseMinor(ReleaseArgs),
    /// Derive request capabilities and write the results artifact
    ReleaseResults(ResultsArgs),
    /// Parse the request issue title and body
    IssueParse,
    /// Verify the request against the release results and issue history
    IssueVerify(VerifyArgs),
    /// Comment that the request is being processed
    IssueComment,
    /// Create the code review pull request
    IssuePull(ReleaseArgs),
    /// Protect the code review branch
    IssueProtect(ReleaseArgs),
    /// Find or create the project milestone
    IssueMilestone(MilestoneArgs),
    /// Report a successful request
    IssueSuccess(OutcomeArgs),
    /// Report a failed request and close the issue
    IssueFailure(OutcomeArgs),
    /// Find the release workflow run for the requested release
    IssueAction(ReleaseArgs),
    /// Undo label and assignee edits by non-staff users
    LabeledVerify,
    /// Label a reviewed pull request and comment the next steps
    ReviewUpdate(CommentArgs),
}

#[derive(clap::Args)]
struct ReleaseArgs {
    /// Release tag (v1.2.3)
    #[arg(long, env = "RELEASE_TAG")]
    release_tag: String,

    /// Project number; must agree with the tag when given
    #[arg(long, env = "VERSION_MAJOR")]
    version_major: Option<String>,

    /// Code review number; must agree with the tag when given
    #[arg(long, env = "VERSION_MINOR")]
    version_minor: Option<String>,

    /// Patch number; must agree with the tag when given
    #[arg(long, env = "VERSION_PATCH")]
    version_patch: Option<String>,
}

#[derive(clap::Args)]
struct ResultsArgs {
    #[command(flatten)]
    release: ReleaseArgs,

    /// Upstream job results (toJSON(needs))
    #[arg(long, env = "RESULTS")]
    results: Option<String>,

    /// Directory the results artifact is written to
    #[arg(long, env = "GRADEFLOW_ARTIFACT_DIR", default_value = ".")]
    artifact_dir: PathBuf,
}

#[derive(clap::Args)]
struct VerifyArgs {
    #[command(flatten)]
    release: ReleaseArgs,

    /// Request type (grade_tests, grade_review, grade_design, request_review)
    #[arg(long, env = "REQUEST_TYPE")]
    request_type: String,

    /// Release results artifact contents
    #[arg(long, env = "RESULTS_JSON")]
    results_json: Option<String>,
}

#[derive(clap::Args)]
struct MilestoneArgs {
    /// Milestone title (Project 1)
    #[arg(long, env = "MILESTONE_NAME")]
    milestone_name: String,
}

#[derive(clap::Args)]
struct CommentArgs {
    /// Comment to update instead of creating a new one
    #[arg(long, env = "COMMENT_ID")]
    comment_id: Option<String>,
}

#[derive(clap::Args)]
struct OutcomeArgs {
    #[command(flatten)]
    comment: CommentArgs,

    /// Upstream step results (toJSON(steps))
    #[arg(long, env = "RESULTS")]
    results: String,
}

/// Filter empty string from Option (env vars may produce "" for empty values)
fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl CommentArgs {
    fn comment_id(&self) -> anyhow::Result<Option<u64>> {
        clean_opt(&self.comment_id)
            .map(|id| id.parse().with_context(|| format!("invalid COMMENT_ID: {id}")))
            .transpose()
    }
}

impl ReleaseArgs {
    /// Parse the tag and cross-check the separately passed numbers
    fn resolve(&self) -> anyhow::Result<ReleaseInput> {
        let input = ReleaseInput::parse(self.release_tag.trim())?;
        let version = input.version;

        let checks = [
            ("VERSION_MAJOR", &self.version_major, u32::from(version.major)),
            ("VERSION_MINOR", &self.version_minor, version.minor),
            ("VERSION_PATCH", &self.version_patch, version.patch),
        ];
        for (name, given, expected) in checks {
            if let Some(raw) = clean_opt(given) {
                let value: u32 = raw
                    .parse()
                    .with_context(|| format!("invalid {name}: {raw}"))?;
                if value != expected {
                    bail!("{name}={value} does not match release tag {}", input.tag);
                }
            }
        }

        Ok(input)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GRADEFLOW_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(report) if report.is_failed() => 1,
        Ok(_) => 0,
        Err(e) => {
            eprintln!("::error::{}", safe_output_escape(&format!("{e:#}")));
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<StepReport> {
    let settings = Settings::load_or_default(cli.config.as_deref()).context("loading settings")?;
    let run = RunContext::from_env().context("reading runner context")?;
    let token = clean_opt(&cli.token).map(String::from);
    let api = GitHubApiClient::new(cli.api_url, run.repository.clone(), token);
    tracing::debug!(?api, event = %run.event_name, "starting step");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    rt.block_on(dispatch(&cli.command, StepContext::new(&api, &run, &settings)))
}

async fn dispatch(
    command: &Commands,
    cx: StepContext<'_, GitHubApiClient>,
) -> anyhow::Result<StepReport> {
    let report = match command {
        Commands::ReleaseParse => {
            let (report, pending) = release::release_parse(cx).await;
            OutputWriter::emit(&report)?;
            if let Some(pending) = pending {
                if let Err(e) = pending.await {
                    tracing::debug!(error = %e, "release body task did not finish");
                }
            }
            return Ok(report);
        }
        Commands::ReleasePatch(args) => release::release_patch(cx, &args.resolve()?).await,
        Commands::ReleaseMinor(args) => release::release_minor(cx, &args.resolve()?).await,
        Commands::ReleaseResults(args) => release::release_results(
            cx.settings,
            &args.release.resolve()?,
            clean_opt(&args.results),
            &args.artifact_dir,
        ),
        Commands::IssueParse => issue::issue_parse(cx),
        Commands::IssueVerify(args) => {
            issue::issue_verify(
                cx,
                args.request_type.trim(),
                &args.release.resolve()?,
                clean_opt(&args.results_json),
            )
            .await
        }
        Commands::IssueComment => issue::issue_comment(cx).await,
        Commands::IssuePull(args) => issue::issue_pull(cx, &args.resolve()?).await,
        Commands::IssueProtect(args) => issue::issue_protect(cx, &args.resolve()?).await,
        Commands::IssueMilestone(args) => {
            issue::issue_milestone(cx, args.milestone_name.trim()).await
        }
        Commands::IssueSuccess(args) => {
            outcome::issue_success(
                cx,
                &args.results,
                args.comment.comment_id()?,
                chrono::Utc::now(),
            )
            .await
        }
        Commands::IssueFailure(args) => {
            outcome::issue_failure(cx, &args.results, args.comment.comment_id()?).await
        }
        Commands::IssueAction(args) => issue::issue_action(cx, &args.resolve()?.tag).await,
        Commands::LabeledVerify => labeled::labeled_verify(cx).await,
        Commands::ReviewUpdate(args) => review::review_update(cx, args.comment_id()?).await,
    };

    OutputWriter::emit(&report)?;
    Ok(report)
}
