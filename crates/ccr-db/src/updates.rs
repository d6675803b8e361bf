//! Progress update repository
//!
//! Recording an update and moving the project's progress happen in one
//! transaction.

use async_trait::async_trait;
use ccr_core::traits::Id;
use ccr_core::types::Percent;
use ccr_models::{NewProjectUpdate, Project, ProjectUpdate};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::repository::{RepositoryError, RepositoryResult};
use crate::store::UpdateStore;

const UPDATE_COLUMNS: &str =
    "id, project_id, author_id, date, progress_percent, comment, image_path, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct UpdateRow {
    pub id: i64,
    pub project_id: i64,
    pub author_id: Option<i64>,
    pub date: NaiveDate,
    pub progress_percent: Decimal,
    pub comment: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UpdateRow> for ProjectUpdate {
    type Error = RepositoryError;

    fn try_from(row: UpdateRow) -> Result<Self, Self::Error> {
        let progress = Percent::new(row.progress_percent).map_err(|e| {
            RepositoryError::Corrupt(format!("update {} progress {}", row.id, e))
        })?;

        Ok(ProjectUpdate {
            id: row.id,
            project_id: row.project_id,
            author_id: row.author_id,
            date: row.date,
            progress,
            comment: row.comment,
            image_path: row.image_path,
            created_at: row.created_at,
        })
    }
}

/// Progress update repository implementation
pub struct UpdateRepository {
    pool: PgPool,
}

impl UpdateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UpdateStore for UpdateRepository {
    async fn record(&self, update: NewProjectUpdate) -> RepositoryResult<ProjectUpdate> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UpdateRow>(&format!(
            r#"
            INSERT INTO project_updates (project_id, author_id, progress_percent, comment, image_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            UPDATE_COLUMNS
        ))
        .bind(update.project_id)
        .bind(update.author_id)
        .bind(update.progress.value())
        .bind(&update.comment)
        .bind(&update.image_path)
        .fetch_one(&mut *tx)
        .await?;

        let moved = sqlx::query(
            "UPDATE projects SET progress_percent = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(update.project_id)
        .bind(update.progress.value())
        .execute(&mut *tx)
        .await?;

        if moved.rows_affected() == 0 {
            // dropping the transaction rolls the insert back
            return Err(RepositoryError::not_found::<Project>(update.project_id));
        }

        tx.commit().await?;

        tracing::info!(
            project_id = update.project_id,
            author_id = update.author_id,
            progress = %update.progress,
            "Progress update recorded"
        );

        ProjectUpdate::try_from(row)
    }

    async fn find(&self, id: Id) -> RepositoryResult<Option<ProjectUpdate>> {
        let row = sqlx::query_as::<_, UpdateRow>(&format!(
            "SELECT {} FROM project_updates WHERE id = $1",
            UPDATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProjectUpdate::try_from).transpose()
    }

    async fn list_for_project(&self, project_id: Id) -> RepositoryResult<Vec<ProjectUpdate>> {
        let rows = sqlx::query_as::<_, UpdateRow>(&format!(
            "SELECT {} FROM project_updates WHERE project_id = $1 ORDER BY date DESC, id DESC",
            UPDATE_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProjectUpdate::try_from).collect()
    }
}
