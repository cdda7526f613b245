//! Cross-repository merge algebra. Contributor merges are exact integer
//! sums keyed by (user, week epoch); PR merges sum the counters and
//! re-weight the duration averages by the counts they were computed over.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::stats::types::{CommitTotals, ContributorWeekStat, UserContributorStats, UserPrStats};

/// Combine already-computed averages by re-weighting each with the sample
/// count it was derived from. Zero total weight yields 0 so merging two
/// empty categories never divides by zero.
pub fn weighted_average(pairs: &[(f64, u64)]) -> f64 {
    let total_weight: u64 = pairs.iter().map(|(_, w)| w).sum();
    if total_weight == 0 {
        return 0.0;
    }
    let weighted_sum: f64 = pairs.iter().map(|(v, w)| v * *w as f64).sum();
    weighted_sum / total_weight as f64
}

/// Fold one repository's per-user PR stats into the running cross-repository
/// map. Counters sum; each average is re-weighted against the running
/// total's accumulated count before that count is advanced.
pub fn merge_pr_stats(
    mut acc: IndexMap<String, UserPrStats>,
    next: Vec<UserPrStats>,
) -> IndexMap<String, UserPrStats> {
    for stat in next {
        match acc.entry(stat.login.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(stat);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.average_time_to_merge = weighted_average(&[
                    (existing.average_time_to_merge, existing.total_merged_prs),
                    (stat.average_time_to_merge, stat.total_merged_prs),
                ]);
                existing.average_time_to_close_not_merged = weighted_average(&[
                    (
                        existing.average_time_to_close_not_merged,
                        existing.total_closed_not_merged_prs,
                    ),
                    (
                        stat.average_time_to_close_not_merged,
                        stat.total_closed_not_merged_prs,
                    ),
                ]);
                existing.average_pr_open_duration = weighted_average(&[
                    (existing.average_pr_open_duration, existing.total_open_prs),
                    (stat.average_pr_open_duration, stat.total_open_prs),
                ]);
                existing.total_prs += stat.total_prs;
                existing.total_merged_prs += stat.total_merged_prs;
                existing.total_closed_not_merged_prs += stat.total_closed_not_merged_prs;
                existing.total_open_prs += stat.total_open_prs;
            }
        }
    }
    acc
}

/// Fold one repository's contributor series into the running map. Week rows
/// for the same user merge by exact epoch with component-wise sums, and the
/// merged sequence is kept ordered by time, so the fold is commutative up to
/// user discovery order.
pub fn merge_contributor_stats(
    mut acc: IndexMap<String, UserContributorStats>,
    next: Vec<UserContributorStats>,
) -> IndexMap<String, UserContributorStats> {
    for stat in next {
        match acc.entry(stat.login.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(stat);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.total_commits += stat.total_commits;
                for week in stat.weeks {
                    match existing
                        .weeks
                        .iter_mut()
                        .find(|w| w.week_epoch_seconds == week.week_epoch_seconds)
                    {
                        Some(row) => {
                            row.additions += week.additions;
                            row.deletions += week.deletions;
                            row.commits += week.commits;
                        }
                        None => existing.weeks.push(week),
                    }
                }
                existing.weeks.sort_by_key(|w| w.week_epoch_seconds);
            }
        }
    }
    acc
}

/// Component-wise totals over a merged week sequence.
pub fn week_totals(weeks: &[ContributorWeekStat]) -> CommitTotals {
    weeks.iter().fold(CommitTotals::default(), |acc, week| {
        CommitTotals {
            additions: acc.additions + week.additions,
            deletions: acc.deletions + week.deletions,
            commits: acc.commits + week.commits,
        }
    })
}
