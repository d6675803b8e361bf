//! Message repository

use async_trait::async_trait;
use ccr_core::traits::Id;
use ccr_models::{Message, NewMessage};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repository::RepositoryResult;
use crate::store::MessageStore;

const MESSAGE_COLUMNS: &str =
    "m.id, m.project_id, m.sender_id, m.receiver_id, m.subject, m.body, m.sent_at, m.is_read";

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub project_id: Option<i64>,
    pub sender_id: i64,
    pub receiver_id: Option<i64>,
    pub subject: Option<String>,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            project_id: row.project_id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            subject: row.subject,
            body: row.body,
            sent_at: row.sent_at,
            is_read: row.is_read,
        }
    }
}

/// Message repository implementation
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(&self, condition: &str, user_id: Id) -> RepositoryResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages m WHERE {} ORDER BY m.sent_at DESC, m.id DESC",
            MESSAGE_COLUMNS, condition
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn create(&self, message: NewMessage) -> RepositoryResult<Message> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            INSERT INTO messages AS m (project_id, sender_id, receiver_id, subject, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(message.project_id)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.subject)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            message_id = row.id,
            sender_id = row.sender_id,
            receiver_id = ?row.receiver_id,
            "Message sent"
        );
        Ok(row.into())
    }

    async fn find(&self, id: Id) -> RepositoryResult<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages m WHERE m.id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Message::from))
    }

    async fn list_received(&self, user_id: Id) -> RepositoryResult<Vec<Message>> {
        self.list_where("m.receiver_id = $1", user_id).await
    }

    async fn list_sent(&self, user_id: Id) -> RepositoryResult<Vec<Message>> {
        self.list_where("m.sender_id = $1", user_id).await
    }

    async fn list_from_clients(&self) -> RepositoryResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {} FROM messages m
            LEFT JOIN profiles p ON p.user_id = m.sender_id
            WHERE COALESCE(p.role, 'CLIENT') = 'CLIENT'
            ORDER BY m.sent_at DESC, m.id DESC
            "#,
            MESSAGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }
}
