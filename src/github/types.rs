use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository belonging to the configured team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub url: String,
}

/// Raw repository object as returned by the GitHub teams API.
/// Only the fields the pipeline needs are deserialized.
#[derive(Debug, Deserialize)]
pub struct RawRepository {
    pub name: String,
    pub html_url: String,
}

impl From<RawRepository> for Repository {
    fn from(raw: RawRepository) -> Self {
        Repository {
            name: raw.name,
            url: raw.html_url,
        }
    }
}

/// The author object attached to pull requests and contributor stats.
/// GitHub reports `null` for deleted ("ghost") accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthor {
    pub login: String,
}

/// Raw pull request as returned by `GET /repos/{org}/{repo}/pulls`.
///
/// `merged_at` implies `closed_at`: merged PRs are a subset of closed ones.
/// A PR with neither timestamp is open.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPullRequest {
    pub user: Option<RawAuthor>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// One row of the contributor-stats response: weekly counts keyed by the
/// Unix timestamp of the week start.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWeekStat {
    /// Week start, epoch seconds
    pub w: i64,
    /// Additions
    #[serde(default)]
    pub a: i64,
    /// Deletions
    #[serde(default)]
    pub d: i64,
    /// Commits
    #[serde(default)]
    pub c: i64,
}

/// Raw entry of `GET /repos/{org}/{repo}/stats/contributors`, one per author.
#[derive(Debug, Clone, Deserialize)]
pub struct RawContributorStats {
    pub total: i64,
    pub weeks: Vec<RawWeekStat>,
    pub author: Option<RawAuthor>,
}

/// Pull request state filter accepted by the GitHub pulls endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PrState {
    Open,
    Closed,
    All,
}

impl PrState {
    pub fn as_str(self) -> &'static str {
        match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
            PrState::All => "all",
        }
    }
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_raw_pull_request() {
        let json = r#"{
            "user": { "login": "alice" },
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": null,
            "merged_at": null,
            "title": "ignored extra field"
        }"#;
        let pr: RawPullRequest = serde_json::from_str(json).unwrap();
        assert_eq!(pr.user.unwrap().login, "alice");
        assert!(pr.closed_at.is_none());
        assert!(pr.merged_at.is_none());
    }

    #[test]
    fn test_deserialize_ghost_author() {
        let json = r#"{
            "user": null,
            "created_at": "2024-01-01T00:00:00Z"
        }"#;
        let pr: RawPullRequest = serde_json::from_str(json).unwrap();
        assert!(pr.user.is_none());
    }

    #[test]
    fn test_deserialize_contributor_stats() {
        let json = r#"{
            "total": 12,
            "weeks": [{ "w": 1000000, "a": 10, "d": 2, "c": 1 }],
            "author": { "login": "bob" }
        }"#;
        let stats: RawContributorStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total, 12);
        assert_eq!(stats.weeks[0].w, 1_000_000);
        assert_eq!(stats.author.unwrap().login, "bob");
    }

    #[test]
    fn test_pr_state_as_str() {
        assert_eq!(PrState::Open.as_str(), "open");
        assert_eq!(PrState::Closed.as_str(), "closed");
        assert_eq!(PrState::All.as_str(), "all");
    }
}
