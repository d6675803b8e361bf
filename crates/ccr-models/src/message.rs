//! Internal message model
//!
//! Table: messages

use chrono::{DateTime, Utc};
use ccr_core::traits::{Entity, Id, Identifiable, ProjectScoped};
use serde::{Deserialize, Serialize};

/// Prefix added to the subject of a reply
pub const REPLY_PREFIX: &str = "Re: ";

/// Directed message between a client and the staff team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Id,
    pub project_id: Option<Id>,
    pub sender_id: Id,
    /// `None` addresses the whole staff team
    pub receiver_id: Option<Id>,
    pub subject: Option<String>,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
}

impl Message {
    pub fn is_for_staff(&self) -> bool {
        self.receiver_id.is_none()
    }

    /// Subject for a reply to this message
    pub fn reply_subject(&self) -> String {
        format!("{}{}", REPLY_PREFIX, self.subject.as_deref().unwrap_or(""))
    }
}

impl Identifiable for Message {
    fn id(&self) -> Id {
        self.id
    }
}

impl Entity for Message {
    const TABLE_NAME: &'static str = "messages";
    const TYPE_NAME: &'static str = "Message";
}

impl ProjectScoped for Message {
    fn project_id(&self) -> Option<Id> {
        self.project_id
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub project_id: Option<Id>,
    pub sender_id: Id,
    pub receiver_id: Option<Id>,
    pub subject: Option<String>,
    pub body: String,
}
