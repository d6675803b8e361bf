//! Document repository

use async_trait::async_trait;
use ccr_core::traits::Id;
use ccr_models::{Document, NewDocument};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repository::RepositoryResult;
use crate::store::DocumentStore;

const DOCUMENT_COLUMNS: &str =
    "id, project_id, uploaded_by_id, title, file_path, uploaded_at, visible_to_client";

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub project_id: i64,
    pub uploaded_by_id: Option<i64>,
    pub title: String,
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub visible_to_client: bool,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            project_id: row.project_id,
            uploaded_by_id: row.uploaded_by_id,
            title: row.title,
            file_path: row.file_path,
            uploaded_at: row.uploaded_at,
            visible_to_client: row.visible_to_client,
        }
    }
}

/// Document repository implementation
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn create(&self, document: NewDocument) -> RepositoryResult<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            INSERT INTO documents (project_id, uploaded_by_id, title, file_path, visible_to_client)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(document.project_id)
        .bind(document.uploaded_by_id)
        .bind(&document.title)
        .bind(&document.file_path)
        .bind(document.visible_to_client)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            document_id = row.id,
            project_id = row.project_id,
            visible_to_client = row.visible_to_client,
            "Document stored"
        );
        Ok(row.into())
    }

    async fn find(&self, id: Id) -> RepositoryResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn list_for_project(
        &self,
        project_id: Id,
        visible_only: bool,
    ) -> RepositoryResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            SELECT {} FROM documents
            WHERE project_id = $1 AND (visible_to_client OR NOT $2)
            ORDER BY uploaded_at DESC, id DESC
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(project_id)
        .bind(visible_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }
}
