use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{parse_id, parse_ts, ts, Database};
use crate::error::{Error, Result};
use crate::models::{CreateProjectInput, Project, UpdateProjectInput};

const PROJECT_COLUMNS: &str = "id, name, slug, description, is_active, github_owner, \
     github_repo, github_token, github_last_sync, created_at, updated_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let id: String = row.get(0)?;
    let last_sync: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Project {
        id: parse_id(0, &id)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        is_active: row.get(4)?,
        github_owner: row.get(5)?,
        github_repo: row.get(6)?,
        github_token: row.get(7)?,
        github_last_sync: last_sync.as_deref().map(|s| parse_ts(8, s)).transpose()?,
        created_at: parse_ts(9, &created_at)?,
        updated_at: parse_ts(10, &updated_at)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Database {
    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            description: input.description,
            is_active: input.is_active,
            github_owner: input.github_owner,
            github_repo: input.github_repo,
            github_token: input.github_token,
            github_last_sync: None,
            created_at: now,
            updated_at: now,
        };

        let result = self.conn().execute(
            "INSERT INTO projects (id, name, slug, description, is_active, github_owner, \
             github_repo, github_token, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                project.id.to_string(),
                project.name,
                project.slug,
                project.description,
                project.is_active,
                project.github_owner,
                project.github_repo,
                project.github_token,
                ts(&now),
                ts(&now),
            ],
        );

        match result {
            Ok(_) => Ok(project),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::validation("slug", "slug is already taken"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.conn();
        let project = conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id.to_string()],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    pub fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let conn = self.conn();
        let project = conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = ?1"),
                params![slug],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    pub fn list_projects(&self, active_only: bool) -> Result<Vec<Project>> {
        let conn = self.conn();
        let sql = if active_only {
            format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE is_active = 1 ORDER BY name")
        } else {
            format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name")
        };
        let mut stmt = conn.prepare(&sql)?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    /// Apply a partial update; `None` fields are left as they are.
    /// Returns the updated project, or `None` if it doesn't exist.
    pub fn update_project(&self, id: Uuid, input: UpdateProjectInput) -> Result<Option<Project>> {
        let Some(mut project) = self.get_project(id)? else {
            return Ok(None);
        };

        if let Some(name) = input.name {
            project.name = name;
        }
        if let Some(description) = input.description {
            project.description = Some(description);
        }
        if let Some(is_active) = input.is_active {
            project.is_active = is_active;
        }
        if let Some(owner) = input.github_owner {
            project.github_owner = Some(owner);
        }
        if let Some(repo) = input.github_repo {
            project.github_repo = Some(repo);
        }
        if let Some(token) = input.github_token {
            project.github_token = Some(token);
        }
        project.updated_at = Utc::now();

        self.conn().execute(
            "UPDATE projects SET name = ?2, description = ?3, is_active = ?4, \
             github_owner = ?5, github_repo = ?6, github_token = ?7, updated_at = ?8 \
             WHERE id = ?1",
            params![
                id.to_string(),
                project.name,
                project.description,
                project.is_active,
                project.github_owner,
                project.github_repo,
                project.github_token,
                ts(&project.updated_at),
            ],
        )?;

        Ok(Some(project))
    }

    /// Delete a project; features and their votes cascade.
    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM projects WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    /// Stamp the project's last successful sync time.
    pub fn touch_project_sync(&self, id: Uuid, when: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "UPDATE projects SET github_last_sync = ?2, updated_at = ?2 WHERE id = ?1",
            params![id.to_string(), ts(&when)],
        )?;
        Ok(())
    }
}
