//! Pull request classification: fold one page of raw PRs into per-user
//! lifecycle counters and duration sums, then finalize into averages.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::github::types::RawPullRequest;
use crate::stats::types::UserPrStats;

/// Running per-user totals while scanning one repository's PR page.
/// Created lazily on first encounter; every field is non-decreasing during
/// the scan. Duration sums stay raw here so averages are derived exactly
/// once, in `finalize`.
#[derive(Debug, Default, Clone)]
pub struct PrAccumulator {
    pub total_prs: u64,
    pub total_merged_prs: u64,
    pub total_closed_not_merged_prs: u64,
    pub total_open_prs: u64,
    merged_duration_ms: i64,
    closed_duration_ms: i64,
    open_duration_ms: i64,
}

impl PrAccumulator {
    fn finalize(&self, login: &str) -> UserPrStats {
        UserPrStats {
            login: login.to_string(),
            total_prs: self.total_prs,
            total_merged_prs: self.total_merged_prs,
            total_closed_not_merged_prs: self.total_closed_not_merged_prs,
            total_open_prs: self.total_open_prs,
            average_time_to_merge: average(self.merged_duration_ms, self.total_merged_prs),
            average_time_to_close_not_merged: average(
                self.closed_duration_ms,
                self.total_closed_not_merged_prs,
            ),
            average_pr_open_duration: average(self.open_duration_ms, self.total_open_prs),
        }
    }
}

fn average(duration_sum_ms: i64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        duration_sum_ms as f64 / count as f64
    }
}

/// Fold one pull request into the user-keyed accumulator map.
///
/// Bucket rules: merged iff a merge timestamp is present, closed-not-merged
/// iff only a close timestamp is present, open otherwise. `now` is the
/// snapshot fixed once per pipeline run; open durations are measured against
/// it so one run is internally consistent.
pub fn accumulate(
    mut users: IndexMap<String, PrAccumulator>,
    pr: &RawPullRequest,
    now: DateTime<Utc>,
) -> IndexMap<String, PrAccumulator> {
    let Some(author) = &pr.user else {
        tracing::debug!("skipping pull request with no author");
        return users;
    };

    let entry = users.entry(author.login.clone()).or_default();
    entry.total_prs += 1;

    if let Some(merged_at) = pr.merged_at {
        entry.total_merged_prs += 1;
        entry.merged_duration_ms += millis_between(pr.created_at, merged_at);
    } else if let Some(closed_at) = pr.closed_at {
        entry.total_closed_not_merged_prs += 1;
        entry.closed_duration_ms += millis_between(pr.created_at, closed_at);
    } else {
        entry.total_open_prs += 1;
        entry.open_duration_ms += millis_between(pr.created_at, now);
    }

    users
}

/// Classify one repository's PR page into per-user stats, in the order
/// users were first encountered.
pub fn classify_pull_requests(prs: &[RawPullRequest], now: DateTime<Utc>) -> Vec<UserPrStats> {
    let users = prs
        .iter()
        .fold(IndexMap::new(), |acc, pr| accumulate(acc, pr, now));
    users
        .iter()
        .map(|(login, acc)| acc.finalize(login))
        .collect()
}

// Clock skew can put a close timestamp before creation; clamp so averages
// stay non-negative.
fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::RawAuthor;

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn pr(login: &str, created: i64, closed: Option<i64>, merged: Option<i64>) -> RawPullRequest {
        RawPullRequest {
            user: Some(RawAuthor {
                login: login.to_string(),
            }),
            created_at: ts(created),
            closed_at: closed.map(ts),
            merged_at: merged.map(ts),
        }
    }

    #[test]
    fn test_three_bucket_example() {
        // One merged after 1h, one closed unmerged after 2h, one still open.
        let now = ts(10_000_000);
        let prs = vec![
            pr("alice", 0, Some(3_600_000), Some(3_600_000)),
            pr("alice", 0, Some(7_200_000), None),
            pr("alice", 0, None, None),
        ];
        let stats = classify_pull_requests(&prs, now);
        assert_eq!(stats.len(), 1);
        let alice = &stats[0];
        assert_eq!(alice.total_prs, 3);
        assert_eq!(alice.total_merged_prs, 1);
        assert_eq!(alice.average_time_to_merge, 3_600_000.0);
        assert_eq!(alice.total_closed_not_merged_prs, 1);
        assert_eq!(alice.average_time_to_close_not_merged, 7_200_000.0);
        assert_eq!(alice.total_open_prs, 1);
        assert!(alice.average_pr_open_duration > 0.0);
        assert_eq!(alice.average_pr_open_duration, 10_000_000.0);
    }

    #[test]
    fn test_bucket_counts_partition_total() {
        let now = ts(50_000_000);
        let prs = vec![
            pr("alice", 0, Some(1000), Some(1000)),
            pr("alice", 0, Some(2000), None),
            pr("bob", 0, None, None),
            pr("bob", 100, Some(5000), Some(4000)),
            pr("carol", 0, Some(9000), None),
        ];
        for user in classify_pull_requests(&prs, now) {
            assert_eq!(
                user.total_merged_prs + user.total_closed_not_merged_prs + user.total_open_prs,
                user.total_prs,
                "bucket counts must partition totalPRs for {}",
                user.login
            );
        }
    }

    #[test]
    fn test_users_in_encounter_order() {
        let now = ts(1_000_000);
        let prs = vec![
            pr("carol", 0, None, None),
            pr("alice", 0, None, None),
            pr("carol", 0, None, None),
            pr("bob", 0, None, None),
        ];
        let logins: Vec<String> = classify_pull_requests(&prs, now)
            .into_iter()
            .map(|u| u.login)
            .collect();
        assert_eq!(logins, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn test_merged_wins_over_closed() {
        // GitHub sets both timestamps on a merged PR; it must count only as
        // merged.
        let now = ts(1_000_000);
        let stats = classify_pull_requests(&[pr("alice", 0, Some(500), Some(400))], now);
        assert_eq!(stats[0].total_merged_prs, 1);
        assert_eq!(stats[0].total_closed_not_merged_prs, 0);
        assert_eq!(stats[0].average_time_to_merge, 400.0);
        assert_eq!(stats[0].average_time_to_close_not_merged, 0.0);
    }

    #[test]
    fn test_averages_over_multiple_prs() {
        let now = ts(1_000_000);
        let prs = vec![
            pr("alice", 0, Some(1000), Some(1000)),
            pr("alice", 0, Some(3000), Some(3000)),
        ];
        let stats = classify_pull_requests(&prs, now);
        assert_eq!(stats[0].average_time_to_merge, 2000.0);
    }

    #[test]
    fn test_zero_counts_yield_zero_averages() {
        let now = ts(1_000_000);
        let stats = classify_pull_requests(&[pr("alice", 0, None, None)], now);
        assert_eq!(stats[0].average_time_to_merge, 0.0);
        assert_eq!(stats[0].average_time_to_close_not_merged, 0.0);
    }

    #[test]
    fn test_skew_clamps_to_zero() {
        let now = ts(1_000_000);
        let stats = classify_pull_requests(&[pr("alice", 5000, Some(4000), Some(4000))], now);
        assert_eq!(stats[0].average_time_to_merge, 0.0);
    }

    #[test]
    fn test_authorless_pr_is_skipped() {
        let now = ts(1_000_000);
        let orphan = RawPullRequest {
            user: None,
            created_at: ts(0),
            closed_at: None,
            merged_at: None,
        };
        assert!(classify_pull_requests(&[orphan], now).is_empty());
    }

    #[test]
    fn test_empty_page() {
        assert!(classify_pull_requests(&[], ts(0)).is_empty());
    }
}
