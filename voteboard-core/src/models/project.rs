use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    // Access token for private repos, kept out of API responses.
    #[serde(skip_serializing, default)]
    pub github_token: Option<String>,
    pub github_last_sync: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_token: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Fields left as `None` are kept unchanged. The slug is immutable
/// after creation and deliberately absent here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_token: Option<String>,
}
