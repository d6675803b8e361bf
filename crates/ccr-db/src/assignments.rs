//! Assignment repository
//!
//! Database operations for worker assignments.

use async_trait::async_trait;
use ccr_core::traits::Id;
use ccr_models::Assignment;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repository::{RepositoryError, RepositoryResult};
use crate::store::AssignmentStore;

#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: i64,
    pub project_id: i64,
    pub worker_id: i64,
    pub assigned_at: DateTime<Utc>,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Assignment {
            id: row.id,
            project_id: row.project_id,
            worker_id: row.worker_id,
            assigned_at: row.assigned_at,
        }
    }
}

/// Assignment repository implementation
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentStore for AssignmentRepository {
    async fn is_assigned(&self, project_id: Id, worker_id: Id) -> RepositoryResult<bool> {
        let assigned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM assignments WHERE project_id = $1 AND worker_id = $2)",
        )
        .bind(project_id)
        .bind(worker_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(assigned)
    }

    async fn assign(&self, project_id: Id, worker_id: Id) -> RepositoryResult<Assignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO assignments (project_id, worker_id)
            VALUES ($1, $2)
            RETURNING id, project_id, worker_id, assigned_at
            "#,
        )
        .bind(project_id)
        .bind(worker_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "This worker is already assigned to the project."))?;

        tracing::info!(project_id, worker_id, "Worker assigned");
        Ok(row.into())
    }

    async fn unassign(&self, project_id: Id, worker_id: Id) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM assignments WHERE project_id = $1 AND worker_id = $2")
            .bind(project_id)
            .bind(worker_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_project(&self, project_id: Id) -> RepositoryResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, project_id, worker_id, assigned_at
            FROM assignments
            WHERE project_id = $1
            ORDER BY assigned_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Assignment::from).collect())
    }
}
