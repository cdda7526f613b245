pub mod backoff;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use backoff::{Backoff, FixedDelay};
pub use types::{PrState, RawPullRequest, Repository};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::GithubSettings;
use crate::stats::types::UserContributorStats;
use types::{RawContributorStats, RawRepository};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "team-pulse";

#[derive(Debug, Error)]
pub enum GithubError {
    /// Non-2xx, non-202 response from the GitHub API.
    #[error("GitHub API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The contributor-stats endpoint kept answering 202 until the retry
    /// budget ran out. The data may be available on a later run.
    #[error("contributor stats still not available after {attempts} attempts")]
    StatsNotReady { attempts: u32 },

    /// Response body was not the expected JSON array.
    #[error("malformed GitHub response: {0}")]
    MalformedResponse(String),

    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A raw upstream response, before any status handling.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport over which API calls are issued. The production implementation
/// is reqwest; tests script responses through a mock.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET for `path_and_query` (relative to the API base) and
    /// return the status and body without interpreting either.
    async fn get(&self, path_and_query: &str) -> Result<ApiResponse, GithubError>;
}

/// Credentialed reqwest transport shared by all concurrent fetches.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(token: String) -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
            base_url: API_BASE.to_string(),
            token,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path_and_query: &str) -> Result<ApiResponse, GithubError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

/// Client for the three GitHub endpoints the pipeline consumes.
pub struct GithubClient {
    transport: Arc<dyn Transport>,
    organization: String,
    team_slug: String,
}

impl GithubClient {
    pub fn new(settings: &GithubSettings) -> Self {
        GithubClient {
            transport: Arc::new(HttpTransport::new(settings.token.clone())),
            organization: settings.organization.clone(),
            team_slug: settings.team_slug.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_transport(transport: Arc<dyn Transport>, organization: &str, team_slug: &str) -> Self {
        GithubClient {
            transport,
            organization: organization.to_string(),
            team_slug: team_slug.to_string(),
        }
    }

    /// List the repositories owned by the configured team, in upstream order.
    #[instrument(skip(self), fields(org = %self.organization, team = %self.team_slug))]
    pub async fn team_repositories(&self) -> Result<Vec<Repository>, GithubError> {
        let path = format!("/orgs/{}/teams/{}/repos", self.organization, self.team_slug);
        let raw: Vec<RawRepository> = self.get_array(&path).await?;
        debug!(repos = raw.len(), "listed team repositories");
        Ok(raw.into_iter().map(Repository::from).collect())
    }

    /// Fetch one page of pull requests for `repository`.
    #[instrument(skip(self), fields(repo = %repository, state = %state))]
    pub async fn pull_requests(
        &self,
        repository: &str,
        state: PrState,
        per_page: u32,
    ) -> Result<Vec<RawPullRequest>, GithubError> {
        let path = format!(
            "/repos/{}/{}/pulls?state={}&per_page={}",
            self.organization, repository, state, per_page
        );
        let prs: Vec<RawPullRequest> = self.get_array(&path).await?;
        debug!(prs = prs.len(), "fetched pull requests");
        Ok(prs)
    }

    /// Fetch the weekly contributor series for `repository`, polling through
    /// 202 responses until the stats are ready or the backoff budget runs
    /// out. A non-202 failure aborts immediately without retrying.
    #[instrument(skip(self, backoff), fields(repo = %repository))]
    pub async fn contributor_stats(
        &self,
        repository: &str,
        backoff: &dyn Backoff,
    ) -> Result<Vec<UserContributorStats>, GithubError> {
        let path = format!("/repos/{}/{}/stats/contributors", self.organization, repository);
        let attempts = backoff.max_attempts();
        for attempt in 0..attempts {
            let response = self.transport.get(&path).await?;
            if response.status == 202 {
                // Stats are computed asynchronously upstream; 202 means
                // "still crunching", not an error.
                backoff.wait(attempt).await;
                continue;
            }
            if !response.is_success() {
                return Err(GithubError::Upstream {
                    status: response.status,
                    body: response.body,
                });
            }
            let raw: Vec<RawContributorStats> = parse_array(&response.body)?;
            debug!(entries = raw.len(), attempt, "contributor stats ready");
            return Ok(raw
                .into_iter()
                .filter_map(UserContributorStats::from_raw)
                .collect());
        }
        Err(GithubError::StatsNotReady { attempts })
    }

    async fn get_array<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GithubError> {
        let response = self.transport.get(path).await?;
        if !response.is_success() {
            return Err(GithubError::Upstream {
                status: response.status,
                body: response.body,
            });
        }
        parse_array(&response.body)
    }
}

/// Parse a body that must be a JSON array. Anything else fails fast as
/// `MalformedResponse` rather than proceeding into classification.
fn parse_array<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, GithubError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| GithubError::MalformedResponse(e.to_string()))?;
    if !value.is_array() {
        return Err(GithubError::MalformedResponse(format!(
            "expected a JSON array, got: {}",
            truncated(body)
        )));
    }
    serde_json::from_value(value).map_err(|e| GithubError::MalformedResponse(e.to_string()))
}

fn truncated(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}
