use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One anonymous client's vote on a feature. (feature_id, client_id)
/// is unique at the storage layer; the ledger relies on that
/// constraint for deduplication rather than a check-then-act lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub feature_id: Uuid,
    pub client_id: String,
    pub created_at: DateTime<Utc>,
}
