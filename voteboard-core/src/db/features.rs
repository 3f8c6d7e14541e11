use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{parse_id, parse_ts, ts, Database};
use crate::error::Result;
use crate::models::{
    CreateFeatureInput, Feature, FeatureQuery, FeatureSort, FeatureStatus, UpdateFeatureInput,
};
use crate::slug::slugify;

pub(crate) const FEATURE_COLUMNS: &str =
    "id, project_id, title, slug, description, status, vote_count, github_issue_number, \
     github_issue_url, github_synced_at, meta, created_at, updated_at";

pub(crate) fn feature_from_row(row: &Row<'_>) -> rusqlite::Result<Feature> {
    let id: String = row.get(0)?;
    let project_id: String = row.get(1)?;
    let status: String = row.get(5)?;
    let synced_at: Option<String> = row.get(9)?;
    let meta: Option<String> = row.get(10)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(Feature {
        id: parse_id(0, &id)?,
        project_id: parse_id(1, &project_id)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        description: row.get(4)?,
        status: FeatureStatus::from_str(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("unknown feature status: {status}").into(),
            )
        })?,
        vote_count: row.get(6)?,
        github_issue_number: row.get(7)?,
        github_issue_url: row.get(8)?,
        github_synced_at: synced_at.as_deref().map(|s| parse_ts(9, s)).transpose()?,
        meta: meta
            .as_deref()
            .map(|s| {
                serde_json::from_str(s).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e))
                })
            })
            .transpose()?,
        created_at: parse_ts(11, &created_at)?,
        updated_at: parse_ts(12, &updated_at)?,
    })
}

/// Find a slug that is unused within the project, appending `-1`,
/// `-2`, ... to the base until one is free. Runs under the connection
/// lock, so two in-process submissions cannot race to the same slug.
fn unique_slug(conn: &Connection, project_id: Uuid, title: &str) -> rusqlite::Result<String> {
    let base = slugify(title);
    let mut candidate = base.clone();
    let mut counter = 1;

    loop {
        let taken: bool = conn
            .query_row(
                "SELECT 1 FROM features WHERE project_id = ?1 AND slug = ?2",
                params![project_id.to_string(), candidate],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !taken {
            return Ok(candidate);
        }
        candidate = format!("{base}-{counter}");
        counter += 1;
    }
}

impl Database {
    /// Create a feature, deriving a project-unique slug from the
    /// title. The slug is fixed at creation; later title edits do not
    /// change it.
    pub fn create_feature(&self, project_id: Uuid, input: CreateFeatureInput) -> Result<Feature> {
        let conn = self.conn();
        let now = Utc::now();
        let feature = Feature {
            id: Uuid::new_v4(),
            project_id,
            slug: unique_slug(&conn, project_id, &input.title)?,
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or(FeatureStatus::Submitted),
            vote_count: 0,
            github_issue_number: input.github_issue_number,
            github_issue_url: input.github_issue_url,
            github_synced_at: input.github_synced_at,
            meta: input.meta,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO features (id, project_id, title, slug, description, status, \
             vote_count, github_issue_number, github_issue_url, github_synced_at, meta, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                feature.id.to_string(),
                project_id.to_string(),
                feature.title,
                feature.slug,
                feature.description,
                feature.status.as_str(),
                feature.github_issue_number,
                feature.github_issue_url,
                feature.github_synced_at.as_ref().map(ts),
                feature.meta.as_ref().map(|m| m.to_string()),
                ts(&now),
                ts(&now),
            ],
        )?;

        Ok(feature)
    }

    pub fn get_feature(&self, id: Uuid) -> Result<Option<Feature>> {
        let conn = self.conn();
        let feature = conn
            .query_row(
                &format!("SELECT {FEATURE_COLUMNS} FROM features WHERE id = ?1"),
                params![id.to_string()],
                feature_from_row,
            )
            .optional()?;
        Ok(feature)
    }

    /// Look up a feature by its external issue key.
    pub fn get_feature_by_issue(
        &self,
        project_id: Uuid,
        issue_number: i64,
    ) -> Result<Option<Feature>> {
        let conn = self.conn();
        let feature = conn
            .query_row(
                &format!(
                    "SELECT {FEATURE_COLUMNS} FROM features \
                     WHERE project_id = ?1 AND github_issue_number = ?2"
                ),
                params![project_id.to_string(), issue_number],
                feature_from_row,
            )
            .optional()?;
        Ok(feature)
    }

    /// List a project's features with status filtering, sorting, and
    /// offset pagination.
    pub fn list_features(&self, project_id: Uuid, query: &FeatureQuery) -> Result<Vec<Feature>> {
        let mut sql = format!("SELECT {FEATURE_COLUMNS} FROM features WHERE project_id = ?1");

        if !query.statuses.is_empty() {
            // Status values come from the enum, not user input.
            let set = query
                .statuses
                .iter()
                .map(|s| format!("'{}'", s.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" AND status IN ({set})"));
        }

        let order = match query.sort {
            FeatureSort::Newest => "created_at DESC",
            FeatureSort::Oldest => "created_at ASC",
            FeatureSort::Top => "vote_count DESC, created_at DESC",
            FeatureSort::Random => "RANDOM()",
        };
        sql.push_str(&format!(" ORDER BY {order} LIMIT ?2 OFFSET ?3"));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let features = stmt
            .query_map(
                params![project_id.to_string(), query.limit, query.offset],
                feature_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(features)
    }

    /// Apply a partial admin update. The slug never changes here.
    pub fn update_feature(&self, id: Uuid, input: UpdateFeatureInput) -> Result<Option<Feature>> {
        let Some(mut feature) = self.get_feature(id)? else {
            return Ok(None);
        };

        if let Some(title) = input.title {
            feature.title = title;
        }
        if let Some(description) = input.description {
            feature.description = Some(description);
        }
        if let Some(status) = input.status {
            feature.status = status;
        }
        if let Some(meta) = input.meta {
            feature.meta = Some(meta);
        }
        feature.updated_at = Utc::now();

        self.conn().execute(
            "UPDATE features SET title = ?2, description = ?3, status = ?4, meta = ?5, \
             updated_at = ?6 WHERE id = ?1",
            params![
                id.to_string(),
                feature.title,
                feature.description,
                feature.status.as_str(),
                feature.meta.as_ref().map(|m| m.to_string()),
                ts(&feature.updated_at),
            ],
        )?;

        Ok(Some(feature))
    }

    /// Overwrite the synced fields from an external issue. Deliberately
    /// narrow: vote_count, status, and slug are not touched, so a
    /// re-sync can never disturb voting state or admin triage.
    pub fn update_synced_feature(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
        issue_url: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "UPDATE features SET title = ?2, description = ?3, github_issue_url = ?4, \
             github_synced_at = ?5, updated_at = ?5 WHERE id = ?1",
            params![
                id.to_string(),
                title,
                description,
                issue_url,
                ts(&synced_at),
            ],
        )?;
        Ok(())
    }

    /// Delete a feature; its votes cascade.
    pub fn delete_feature(&self, id: Uuid) -> Result<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM features WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }
}
