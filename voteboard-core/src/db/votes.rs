//! The vote ledger: at most one vote per (feature, client), with a
//! denormalized `vote_count` kept in step via storage-level deltas.
//!
//! Deduplication rides on the UNIQUE (feature_id, client_id)
//! constraint. The insert uses `ON CONFLICT DO NOTHING` and only
//! increments the counter when a row actually landed, so two
//! concurrent identical votes produce exactly one row and one
//! increment. There is no check-then-act window.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::{parse_id, parse_ts, ts, Database};
use crate::error::Result;
use crate::models::Vote;

impl Database {
    /// Record a vote. Idempotent: if this client already voted on the
    /// feature, the existing vote is returned and the count is left
    /// alone.
    pub fn add_vote(&self, feature_id: Uuid, client_id: &str) -> Result<Vote> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let inserted = tx.execute(
            "INSERT INTO votes (id, feature_id, client_id, created_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (feature_id, client_id) DO NOTHING",
            params![id.to_string(), feature_id.to_string(), client_id, ts(&now)],
        )?;

        if inserted == 1 {
            tx.execute(
                "UPDATE features SET vote_count = vote_count + 1, updated_at = ?2 \
                 WHERE id = ?1",
                params![feature_id.to_string(), ts(&now)],
            )?;
            tx.commit()?;
            return Ok(Vote {
                id,
                feature_id,
                client_id: client_id.to_string(),
                created_at: now,
            });
        }

        // Conflict: this client already voted. Hand back the row that
        // won.
        let vote = tx.query_row(
            "SELECT id, feature_id, client_id, created_at FROM votes \
             WHERE feature_id = ?1 AND client_id = ?2",
            params![feature_id.to_string(), client_id],
            |row| {
                let id: String = row.get(0)?;
                let feature_id: String = row.get(1)?;
                let created_at: String = row.get(3)?;
                Ok(Vote {
                    id: parse_id(0, &id)?,
                    feature_id: parse_id(1, &feature_id)?,
                    client_id: row.get(2)?,
                    created_at: parse_ts(3, &created_at)?,
                })
            },
        )?;
        tx.commit()?;
        Ok(vote)
    }

    /// Withdraw a vote. Returns `false` without side effects when no
    /// matching vote exists. The decrement is clamped at zero as
    /// invariant repair; a negative count should never happen in
    /// normal operation.
    pub fn remove_vote(&self, feature_id: Uuid, client_id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let deleted = tx.execute(
            "DELETE FROM votes WHERE feature_id = ?1 AND client_id = ?2",
            params![feature_id.to_string(), client_id],
        )?;
        if deleted == 0 {
            return Ok(false);
        }

        tx.execute(
            "UPDATE features SET vote_count = MAX(vote_count - 1, 0), updated_at = ?2 \
             WHERE id = ?1",
            params![feature_id.to_string(), ts(&Utc::now())],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Whether this client has a live vote on the feature.
    pub fn has_vote(&self, feature_id: Uuid, client_id: &str) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM votes WHERE feature_id = ?1 AND client_id = ?2",
            params![feature_id.to_string(), client_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn count_votes(&self) -> Result<i64> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM votes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Recompute `vote_count` from the vote rows for every feature
    /// that has drifted. Returns how many features were corrected.
    pub fn repair_vote_counts(&self) -> Result<usize> {
        let repaired = self.conn().execute(
            "UPDATE features SET vote_count = \
                 (SELECT COUNT(*) FROM votes WHERE votes.feature_id = features.id) \
             WHERE vote_count != \
                 (SELECT COUNT(*) FROM votes WHERE votes.feature_id = features.id)",
            [],
        )?;
        Ok(repaired)
    }
}
