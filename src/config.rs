use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Required identifier or credential absent. Surfaced before any network
    /// call; an incomplete configuration must never look like an empty team.
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),
}

/// Top-level configuration loaded from .team-pulse.toml.
///
/// Every field is optional or defaulted so the tool runs with zero config
/// plus the GITHUB_TOKEN / GITHUB_ORGANIZATION / GITHUB_TEAM_SLUG env vars.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub credential and team identifiers
    #[serde(default)]
    pub github: GithubConfig,

    /// Fetch and aggregation tuning
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// Organization login. Falls back to GITHUB_ORGANIZATION.
    pub organization: Option<String>,
    /// Team slug within the organization. Falls back to GITHUB_TEAM_SLUG.
    pub team_slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Page size for the pull request endpoint, one page per repo-state pair.
    pub per_page: u32,
    /// Cap on concurrently in-flight repository fetches.
    pub max_concurrency: usize,
    /// Poll attempts for contributor stats before giving up.
    pub stats_retries: u32,
    /// Delay between contributor-stats polls, milliseconds.
    pub stats_retry_delay_ms: u64,
    /// What to do when one repository returns a malformed response during
    /// summary aggregation.
    pub on_malformed: MalformedPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            per_page: 100,
            max_concurrency: 8,
            stats_retries: 5,
            stats_retry_delay_ms: 2000,
            on_malformed: MalformedPolicy::Skip,
        }
    }
}

impl FetchConfig {
    pub fn stats_retry_delay(&self) -> Duration {
        Duration::from_millis(self.stats_retry_delay_ms)
    }
}

/// Policy for a repository whose response body is not the expected array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log a warning and drop that repository's contribution.
    #[default]
    Skip,
    /// Abort the whole summary.
    Fail,
}

/// Fully-resolved GitHub settings, constructed once at startup and passed by
/// reference into the client. Aggregation code never reads ambient env state.
#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub token: String,
    pub organization: String,
    pub team_slug: String,
}

impl Config {
    /// Load configuration from .team-pulse.toml in the current directory.
    /// Returns default config if the file doesn't exist, then layers env
    /// vars over whatever the file left unset.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".team-pulse.toml");
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        env_fallback(&mut config.github.token, "GITHUB_TOKEN");
        env_fallback(&mut config.github.organization, "GITHUB_ORGANIZATION");
        env_fallback(&mut config.github.team_slug, "GITHUB_TEAM_SLUG");

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the credential and identifiers, failing with the first
    /// missing one.
    pub fn resolve(&self) -> Result<GithubSettings, ConfigError> {
        Ok(GithubSettings {
            token: self
                .github
                .token
                .clone()
                .ok_or(ConfigError::Missing("github.token (or GITHUB_TOKEN)"))?,
            organization: self.github.organization.clone().ok_or(ConfigError::Missing(
                "github.organization (or GITHUB_ORGANIZATION)",
            ))?,
            team_slug: self
                .github
                .team_slug
                .clone()
                .ok_or(ConfigError::Missing("github.team_slug (or GITHUB_TEAM_SLUG)"))?,
        })
    }
}

fn env_fallback(slot: &mut Option<String>, var: &str) {
    if slot.is_none() {
        if let Ok(value) = std::env::var(var) {
            *slot = Some(value);
        }
    }
}
