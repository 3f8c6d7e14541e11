//! Reconciliation of external issues into local features.
//!
//! Sync is keyed by (project, issue number) and idempotent: a second
//! pass over an unchanged issue list creates nothing new. It writes
//! through [`Database::update_synced_feature`] and therefore can never
//! touch vote rows or `vote_count`.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::db::Database;
use crate::models::{CreateFeatureInput, FeatureStatus, Project};

pub mod github;

pub use github::GitHubIssueSource;

/// An issue as reported by the external source. Field names follow
/// the GitHub REST payload so the reqwest source can deserialize
/// responses directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub user: Option<IssueAuthor>,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAuthor {
    pub login: String,
}

/// Result of a repository existence check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub open_issues: i64,
}

/// Where issues come from. Implemented by [`GitHubIssueSource`] in
/// production and by in-memory fakes in tests.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn list_open_issues(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<Vec<Issue>, SourceError>;

    /// Existence/accessibility check, separate from listing.
    async fn check_repo(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<RepoInfo, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("issue source returned status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync not configured: project has no repository coordinates")]
    NotConfigured,

    #[error("fetching issues failed: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Db(#[from] crate::error::Error),
}

/// Per-pass counters. Every processed issue lands in exactly one of
/// `created`/`updated`; skipped pull requests are in neither.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncReport {
    pub synced: usize,
    pub created: usize,
    pub updated: usize,
}

const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Pull the project's open issues and reconcile them into features.
///
/// Each create/update commits independently, so a failure mid-list
/// keeps everything already written; the project's last-sync stamp is
/// only set after a complete pass. Failures are logged here and
/// returned as values, never panicked across the boundary.
pub async fn sync_project(
    db: &Database,
    source: &dyn IssueSource,
    project: &Project,
) -> Result<SyncReport, SyncError> {
    let (Some(owner), Some(repo)) = (&project.github_owner, &project.github_repo) else {
        return Err(SyncError::NotConfigured);
    };

    let issues = match source
        .list_open_issues(owner, repo, project.github_token.as_deref())
        .await
    {
        Ok(issues) => issues,
        Err(e) => {
            error!(project = %project.slug, error = %e, "issue sync failed");
            return Err(e.into());
        }
    };

    let mut report = SyncReport::default();
    let now = Utc::now();

    for issue in &issues {
        if issue.pull_request.is_some() {
            continue;
        }

        match db.get_feature_by_issue(project.id, issue.number)? {
            Some(feature) => {
                db.update_synced_feature(
                    feature.id,
                    &issue.title,
                    &format_issue_description(issue),
                    &issue.html_url,
                    now,
                )?;
                report.updated += 1;
            }
            None => {
                db.create_feature(
                    project.id,
                    CreateFeatureInput {
                        title: issue.title.clone(),
                        description: Some(format_issue_description(issue)),
                        status: Some(status_from_labels(issue)),
                        github_issue_number: Some(issue.number),
                        github_issue_url: Some(issue.html_url.clone()),
                        github_synced_at: Some(now),
                        meta: None,
                    },
                )?;
                report.created += 1;
            }
        }
        report.synced += 1;
    }

    db.touch_project_sync(project.id, now)?;

    info!(
        project = %project.slug,
        synced = report.synced,
        created = report.created,
        updated = report.updated,
        "issue sync completed"
    );

    Ok(report)
}

/// Issue body capped at 5000 characters (4997 plus an ellipsis when
/// longer), followed by a metadata block with the issue number,
/// labels, and submitter.
fn format_issue_description(issue: &Issue) -> String {
    let body = issue.body.as_deref().unwrap_or("");
    let mut description = if body.chars().count() > MAX_DESCRIPTION_CHARS {
        let mut truncated: String = body.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
        truncated.push_str("...");
        truncated
    } else {
        body.to_string()
    };

    description.push_str("\n\n---\n");
    description.push_str(&format!("**GitHub Issue #{}**\n", issue.number));

    if !issue.labels.is_empty() {
        let labels = issue
            .labels
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        description.push_str(&format!("Labels: {labels}\n"));
    }

    if let Some(author) = &issue.user {
        description.push_str(&format!("Created by: @{}\n", author.login));
    }

    description
}

/// Derive the initial status from issue labels, case-insensitive,
/// most-advanced state first.
fn status_from_labels(issue: &Issue) -> FeatureStatus {
    let labels: Vec<String> = issue
        .labels
        .iter()
        .map(|l| l.name.to_lowercase())
        .collect();
    let has = |name: &str| labels.iter().any(|l| l == name);

    if has("in progress") || has("in-progress") {
        FeatureStatus::InProgress
    } else if has("planned") {
        FeatureStatus::Planned
    } else if has("accepted") || has("approved") {
        FeatureStatus::Accepted
    } else {
        FeatureStatus::Submitted
    }
}
