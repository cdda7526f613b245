//! The aggregation engine: fan out contributor and PR fetches across every
//! team repository, fold the per-repository results through the merge
//! algebra, and join PR data with commit data into one record per user.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use indexmap::{IndexMap, IndexSet};
use tracing::{info, instrument, warn};

use crate::config::MalformedPolicy;
use crate::github::{Backoff, GithubClient, GithubError, PrState, Repository};
use crate::stats::classify::classify_pull_requests;
use crate::stats::merge::{merge_contributor_stats, merge_pr_stats, week_totals};
use crate::stats::types::{
    ClosedPrSummary, CommitSummary, MergedUserSummary, OpenPrSummary, UserContributorStats,
    UserPrStats,
};

#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub per_page: u32,
    pub max_concurrency: usize,
    pub on_malformed: MalformedPolicy,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        SummaryOptions {
            per_page: 100,
            max_concurrency: 8,
            on_malformed: MalformedPolicy::Skip,
        }
    }
}

/// Everything one repository contributes to the summary.
struct RepoActivity {
    contributors: Vec<UserContributorStats>,
    open: Vec<UserPrStats>,
    closed: Vec<UserPrStats>,
}

/// Build the cross-repository per-user summary.
///
/// Repositories are fetched concurrently, capped at `max_concurrency` in
/// flight; within one repository the contributor poll and the two PR fetches
/// run concurrently. The open-PR durations across the whole run are measured
/// against a single timestamp taken here, so one summary is internally
/// consistent no matter how long the fan-out takes.
#[instrument(skip_all)]
pub async fn build_summary(
    client: &GithubClient,
    backoff: &dyn Backoff,
    options: &SummaryOptions,
) -> Result<Vec<MergedUserSummary>, GithubError> {
    let repos = client.team_repositories().await?;
    info!(repos = repos.len(), "aggregating activity across team repositories");
    let now = Utc::now();

    let activities: Vec<RepoActivity> =
        stream::iter(repos.iter().map(|repo| repo_activity(client, backoff, options, repo, now)))
            .buffered(options.max_concurrency.max(1))
            .try_collect()
            .await?;

    let mut contributors = IndexMap::new();
    let mut open = IndexMap::new();
    let mut closed = IndexMap::new();
    for activity in activities {
        contributors = merge_contributor_stats(contributors, activity.contributors);
        open = merge_pr_stats(open, activity.open);
        closed = merge_pr_stats(closed, activity.closed);
    }

    let summary = join_user_records(contributors, open, closed);
    info!(users = summary.len(), "summary assembled");
    Ok(summary)
}

async fn repo_activity(
    client: &GithubClient,
    backoff: &dyn Backoff,
    options: &SummaryOptions,
    repo: &Repository,
    now: DateTime<Utc>,
) -> Result<RepoActivity, GithubError> {
    let (contributors, open, closed) = tokio::join!(
        client.contributor_stats(&repo.name, backoff),
        client.pull_requests(&repo.name, PrState::Open, options.per_page),
        client.pull_requests(&repo.name, PrState::Closed, options.per_page),
    );

    Ok(RepoActivity {
        contributors: apply_policy(contributors, options.on_malformed, &repo.name, "contributors")?,
        open: apply_policy(
            open.map(|prs| classify_pull_requests(&prs, now)),
            options.on_malformed,
            &repo.name,
            "open PRs",
        )?,
        closed: apply_policy(
            closed.map(|prs| classify_pull_requests(&prs, now)),
            options.on_malformed,
            &repo.name,
            "closed PRs",
        )?,
    })
}

/// Malformed bodies follow the configured policy; every other failure
/// (upstream status, transport, stats retry budget) always propagates.
fn apply_policy<T>(
    result: Result<Vec<T>, GithubError>,
    policy: MalformedPolicy,
    repo: &str,
    kind: &str,
) -> Result<Vec<T>, GithubError> {
    match result {
        Err(GithubError::MalformedResponse(detail)) if policy == MalformedPolicy::Skip => {
            warn!(repo, kind, %detail, "skipping malformed repository response");
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Join merged contributor and PR maps into the final records. The user set
/// is the discovery-ordered union of all three maps; absent sections are
/// zero-filled, and commit totals are recomputed from the merged weeks so
/// `weeks` and `totals` can never disagree.
fn join_user_records(
    contributors: IndexMap<String, UserContributorStats>,
    open: IndexMap<String, UserPrStats>,
    closed: IndexMap<String, UserPrStats>,
) -> Vec<MergedUserSummary> {
    let mut users: IndexSet<&String> = IndexSet::new();
    users.extend(contributors.keys());
    users.extend(open.keys());
    users.extend(closed.keys());

    users
        .into_iter()
        .map(|user| {
            let closed_prs = closed
                .get(user)
                .map(|s| ClosedPrSummary {
                    total_merged_prs: s.total_merged_prs,
                    total_closed_not_merged_prs: s.total_closed_not_merged_prs,
                    average_time_to_merge: s.average_time_to_merge,
                    average_time_to_close_not_merged: s.average_time_to_close_not_merged,
                })
                .unwrap_or_default();
            let open_prs = open
                .get(user)
                .map(|s| OpenPrSummary {
                    total_open_prs: s.total_open_prs,
                    average_open_pr_duration: s.average_pr_open_duration,
                })
                .unwrap_or_default();
            let weeks = contributors
                .get(user)
                .map(|s| s.weeks.clone())
                .unwrap_or_default();
            let totals = week_totals(&weeks);
            MergedUserSummary {
                user: user.clone(),
                closed_prs,
                open_prs,
                commits: CommitSummary { weeks, totals },
            }
        })
        .collect()
}
