//! GitHub-backed [`IssueSource`] over the REST v3 API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Issue, IssueSource, RepoInfo, SourceError};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("voteboard/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GitHubIssueSource {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubIssueSource {
    pub fn new() -> Self {
        Self::with_base(DEFAULT_API_BASE)
    }

    /// Point the source at a different API root (test servers).
    pub fn with_base(api_base: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    fn get(&self, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(format!("{}{path}", self.api_base))
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }
}

impl Default for GitHubIssueSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    full_name: String,
    #[serde(default)]
    open_issues_count: i64,
}

#[async_trait]
impl IssueSource for GitHubIssueSource {
    async fn list_open_issues(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<Vec<Issue>, SourceError> {
        let response = self
            .get(&format!("/repos/{owner}/{repo}/issues"), token)
            .query(&[("state", "open"), ("per_page", "100")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    async fn check_repo(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<RepoInfo, SourceError> {
        let response = self
            .get(&format!("/repos/{owner}/{repo}"), token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let repo: RepoResponse = response.json().await?;
        Ok(RepoInfo {
            full_name: repo.full_name,
            open_issues: repo.open_issues_count,
        })
    }
}
