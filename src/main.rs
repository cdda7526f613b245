mod config;
mod github;
mod report;
mod stats;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

use config::Config;
use github::{FixedDelay, GithubClient, PrState};
use stats::summary::SummaryOptions;

/// team-pulse: CLI tool that pulls pull-request and commit activity from the
/// GitHub API for every repository owned by a team and aggregates it into
/// one summary record per developer.
#[derive(Parser, Debug)]
#[command(name = "team-pulse", version, about)]
struct Cli {
    /// Optional output file path for the JSON result (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the repositories owned by the configured team
    Repos,

    /// Per-user pull request stats for one repository
    Prs {
        /// Repository name within the configured organization
        #[arg(long)]
        repository: String,

        /// Pull request state filter
        #[arg(long, value_enum, default_value_t = PrState::All)]
        state: PrState,

        /// Page size (one page is fetched per request)
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Per-user weekly contributor stats for one repository
    Contributors {
        /// Repository name within the configured organization
        #[arg(long)]
        repository: String,
    },

    /// Cross-repository per-developer summary
    Summary {
        /// Analyze a previously captured summary JSON file instead of
        /// fetching from GitHub (no token needed)
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Render a colored leaderboard instead of JSON
        #[arg(long)]
        table: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // The offline path needs neither credentials nor network.
    if let Command::Summary {
        from_file: Some(path),
        table,
    } = &cli.command
    {
        info!(path = %path.display(), "loading captured summary");
        let summary = report::load_summary(path)?;
        if *table {
            report::print_leaderboard(&summary);
        } else {
            report::output(&summary, cli.output.as_deref())?;
        }
        return Ok(());
    }

    info!("loading configuration");
    let config = Config::load()?;
    let settings = config.resolve()?;
    let client = GithubClient::new(&settings);
    let backoff = FixedDelay::new(config.fetch.stats_retries, config.fetch.stats_retry_delay());

    match cli.command {
        Command::Repos => {
            let _span = info_span!("repos").entered();
            let repos = client.team_repositories().await?;
            info!(repos = repos.len(), "fetched team repositories");
            report::output(&repos, cli.output.as_deref())?;
        }
        Command::Prs {
            repository,
            state,
            per_page,
        } => {
            let _span = info_span!("prs", repo = %repository, %state).entered();
            let per_page = per_page.unwrap_or(config.fetch.per_page);
            let prs = client.pull_requests(&repository, state, per_page).await?;
            let user_stats = stats::classify_pull_requests(&prs, chrono::Utc::now());
            info!(prs = prs.len(), users = user_stats.len(), "classified pull requests");
            report::output(&user_stats, cli.output.as_deref())?;
        }
        Command::Contributors { repository } => {
            let _span = info_span!("contributors", repo = %repository).entered();
            let contributors = client.contributor_stats(&repository, &backoff).await?;
            info!(users = contributors.len(), "fetched contributor stats");
            report::output(&contributors, cli.output.as_deref())?;
        }
        Command::Summary { table, .. } => {
            let _span = info_span!("summary").entered();
            let options = SummaryOptions {
                per_page: config.fetch.per_page,
                max_concurrency: config.fetch.max_concurrency,
                on_malformed: config.fetch.on_malformed,
            };
            let summary = stats::build_summary(&client, &backoff, &options).await?;
            if table {
                report::print_leaderboard(&summary);
            } else {
                report::output(&summary, cli.output.as_deref())?;
            }
        }
    }

    Ok(())
}
