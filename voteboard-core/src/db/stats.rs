//! Read-only aggregates backing the admin stats endpoint.

use rusqlite::params;
use serde::Serialize;
use uuid::Uuid;

use super::{parse_id, Database};
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopFeature {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub project: String,
    pub vote_count: i64,
    pub status: String,
}

impl Database {
    /// (total, active) project counts.
    pub fn project_counts(&self) -> Result<(i64, i64)> {
        let counts = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM projects",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }

    pub fn count_features(&self) -> Result<i64> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM features", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn feature_counts_by_status(&self) -> Result<Vec<StatusCount>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM features GROUP BY status")?;
        let counts = stmt
            .query_map([], |row| {
                Ok(StatusCount {
                    status: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }

    /// The most-voted features across all projects.
    pub fn top_features(&self, limit: u32) -> Result<Vec<TopFeature>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT f.id, f.title, f.slug, p.name, f.vote_count, f.status \
             FROM features f JOIN projects p ON p.id = f.project_id \
             ORDER BY f.vote_count DESC, f.created_at DESC LIMIT ?1",
        )?;
        let features = stmt
            .query_map(params![limit], |row| {
                let id: String = row.get(0)?;
                Ok(TopFeature {
                    id: parse_id(0, &id)?,
                    title: row.get(1)?,
                    slug: row.get(2)?,
                    project: row.get(3)?,
                    vote_count: row.get(4)?,
                    status: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(features)
    }
}
