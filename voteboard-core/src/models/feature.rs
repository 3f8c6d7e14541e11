use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub status: FeatureStatus,
    pub vote_count: i64,
    pub github_issue_number: Option<i64>,
    pub github_issue_url: Option<String>,
    pub github_synced_at: Option<DateTime<Utc>>,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Submitted,
    Accepted,
    Planned,
    InProgress,
    Done,
    Rejected,
}

impl FeatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(Self::Submitted),
            "accepted" => Some(Self::Accepted),
            "planned" => Some(Self::Planned),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFeatureInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<FeatureStatus>,
    pub github_issue_number: Option<i64>,
    pub github_issue_url: Option<String>,
    pub github_synced_at: Option<DateTime<Utc>>,
    pub meta: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFeatureInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<FeatureStatus>,
    pub meta: Option<serde_json::Value>,
}

/// Sort modes for feature listings. Unknown sort keys fall back to
/// `Top`, matching the public API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSort {
    Newest,
    Oldest,
    Top,
    Random,
}

impl FeatureSort {
    pub fn from_key(key: &str) -> Self {
        match key {
            "newest" => Self::Newest,
            "oldest" => Self::Oldest,
            "random" => Self::Random,
            _ => Self::Top,
        }
    }
}

impl Default for FeatureSort {
    fn default() -> Self {
        Self::Top
    }
}

/// Listing parameters for a project's features.
#[derive(Debug, Clone)]
pub struct FeatureQuery {
    /// Empty means no status restriction.
    pub statuses: Vec<FeatureStatus>,
    pub sort: FeatureSort,
    pub limit: u32,
    pub offset: u32,
}

impl Default for FeatureQuery {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            sort: FeatureSort::default(),
            limit: 20,
            offset: 0,
        }
    }
}
