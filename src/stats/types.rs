use serde::{Deserialize, Serialize};

use crate::github::types::RawContributorStats;

/// Per-repository, per-user pull request statistics. Durations are in
/// milliseconds; an average is 0 whenever its bucket count is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPrStats {
    pub login: String,
    #[serde(rename = "totalPRs")]
    pub total_prs: u64,
    #[serde(rename = "totalMergedPRs")]
    pub total_merged_prs: u64,
    #[serde(rename = "totalClosedNotMergedPRs")]
    pub total_closed_not_merged_prs: u64,
    #[serde(rename = "totalOpenPRs")]
    pub total_open_prs: u64,
    #[serde(rename = "averageTimeToMerge")]
    pub average_time_to_merge: f64,
    #[serde(rename = "averageTimeToCloseNotMerged")]
    pub average_time_to_close_not_merged: f64,
    #[serde(rename = "averagePROpenDuration")]
    pub average_pr_open_duration: f64,
}

/// One week of commit activity. `week_epoch_seconds` is the Unix timestamp
/// of the ISO week start and the join key across repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorWeekStat {
    pub week_epoch_seconds: i64,
    pub additions: i64,
    pub deletions: i64,
    pub commits: i64,
}

/// Per-repository, per-user weekly commit series, weeks ordered by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContributorStats {
    pub login: String,
    pub total_commits: i64,
    pub weeks: Vec<ContributorWeekStat>,
}

impl UserContributorStats {
    /// Convert a raw stats entry, dropping rows GitHub attributes to a
    /// deleted account. Weeks are sorted by epoch on the way in.
    pub fn from_raw(raw: RawContributorStats) -> Option<Self> {
        let author = raw.author?;
        let mut weeks: Vec<ContributorWeekStat> = raw
            .weeks
            .into_iter()
            .map(|w| ContributorWeekStat {
                week_epoch_seconds: w.w,
                additions: w.a,
                deletions: w.d,
                commits: w.c,
            })
            .collect();
        weeks.sort_by_key(|w| w.week_epoch_seconds);
        Some(UserContributorStats {
            login: author.login,
            total_commits: raw.total,
            weeks,
        })
    }
}

/// Closed-PR section of the merged summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClosedPrSummary {
    #[serde(rename = "totalMergedPRs")]
    pub total_merged_prs: u64,
    #[serde(rename = "totalClosedNotMergedPRs")]
    pub total_closed_not_merged_prs: u64,
    #[serde(rename = "averageTimeToMerge")]
    pub average_time_to_merge: f64,
    #[serde(rename = "averageTimeToCloseNotMerged")]
    pub average_time_to_close_not_merged: f64,
}

/// Open-PR section of the merged summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenPrSummary {
    #[serde(rename = "totalOpenPRs")]
    pub total_open_prs: u64,
    #[serde(rename = "averageOpenPRDuration")]
    pub average_open_pr_duration: f64,
}

/// Component-wise totals over a user's merged weekly rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitTotals {
    pub additions: i64,
    pub deletions: i64,
    pub commits: i64,
}

/// Commit section of the merged summary. `totals` is recomputed from
/// `weeks` so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub weeks: Vec<ContributorWeekStat>,
    pub totals: CommitTotals,
}

/// Final output unit: one record per distinct user observed anywhere in the
/// team's PR or contributor data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedUserSummary {
    pub user: String,
    #[serde(rename = "closedPRs")]
    pub closed_prs: ClosedPrSummary,
    #[serde(rename = "openPRs")]
    pub open_prs: OpenPrSummary,
    pub commits: CommitSummary,
}
