//! Project repository
//!
//! Database operations for projects.

use async_trait::async_trait;
use ccr_core::traits::Id;
use ccr_core::types::Percent;
use ccr_models::{NewProject, Project, ProjectChanges, ProjectStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::repository::{RepositoryError, RepositoryResult};
use crate::store::ProjectStore;

const PROJECT_COLUMNS: &str = r#"
    p.id, p.name, p.description, p.address, p.city, p.status, p.progress_percent,
    p.start_date, p.end_date_estimated, p.end_date_actual, p.client_id, p.created_by_id,
    p.created_at, p.updated_at
"#;

/// Project database entity
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub status: String,
    pub progress_percent: Decimal,
    pub start_date: NaiveDate,
    pub end_date_estimated: Option<NaiveDate>,
    pub end_date_actual: Option<NaiveDate>,
    pub client_id: Option<i64>,
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = RepositoryError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ProjectStatus>()
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
        let progress = Percent::new(row.progress_percent).map_err(|e| {
            RepositoryError::Corrupt(format!("project {} progress {}", row.id, e))
        })?;

        Ok(Project {
            id: row.id,
            name: row.name,
            description: row.description,
            address: row.address,
            city: row.city,
            status,
            progress,
            start_date: row.start_date,
            estimated_end_date: row.end_date_estimated,
            actual_end_date: row.end_date_actual,
            client_id: row.client_id,
            created_by_id: row.created_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_projects(rows: Vec<ProjectRow>) -> RepositoryResult<Vec<Project>> {
    rows.into_iter().map(Project::try_from).collect()
}

/// Project repository implementation
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for ProjectRepository {
    async fn find(&self, id: Id) -> RepositoryResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects p WHERE p.id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Project::try_from).transpose()
    }

    async fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects p ORDER BY p.created_at DESC, p.id DESC LIMIT $1",
            PROJECT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_projects(rows)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects p ORDER BY p.created_at DESC, p.id DESC",
            PROJECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        into_projects(rows)
    }

    async fn list_for_client(&self, client_id: Id) -> RepositoryResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            SELECT {} FROM projects p
            WHERE p.client_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            "#,
            PROJECT_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        into_projects(rows)
    }

    async fn list_for_worker(&self, worker_id: Id) -> RepositoryResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            SELECT {} FROM projects p
            INNER JOIN assignments a ON a.project_id = p.id
            WHERE a.worker_id = $1
            ORDER BY a.assigned_at DESC, a.id DESC
            "#,
            PROJECT_COLUMNS
        ))
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;

        into_projects(rows)
    }

    async fn create(&self, project: NewProject) -> RepositoryResult<Project> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            INSERT INTO projects AS p (name, description, address, city, status, start_date,
                                    end_date_estimated, end_date_actual, client_id, created_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.address)
        .bind(&project.city)
        .bind(project.status.as_str())
        .bind(project.start_date)
        .bind(project.estimated_end_date)
        .bind(project.actual_end_date)
        .bind(project.client_id)
        .bind(project.created_by_id)
        .fetch_one(&self.pool)
        .await?;

        let project = Project::try_from(row)?;
        tracing::info!(project_id = project.id, name = %project.name, "Project created");
        Ok(project)
    }

    async fn update(&self, id: Id, changes: ProjectChanges) -> RepositoryResult<Project> {
        let mut project = self
            .find(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found::<Project>(id))?;
        changes.apply_to(&mut project);

        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            UPDATE projects p
            SET name = $2, description = $3, address = $4, city = $5, status = $6,
                start_date = $7, end_date_estimated = $8, end_date_actual = $9,
                client_id = $10, updated_at = NOW()
            WHERE p.id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.address)
        .bind(&project.city)
        .bind(project.status.as_str())
        .bind(project.start_date)
        .bind(project.estimated_end_date)
        .bind(project.actual_end_date)
        .bind(project.client_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found::<Project>(id))?;

        Project::try_from(row)
    }
}
