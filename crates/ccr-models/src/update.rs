//! Progress update model
//!
//! Table: project_updates

use chrono::{DateTime, NaiveDate, Utc};
use ccr_core::traits::{Entity, Id, Identifiable, ProjectScoped};
use ccr_core::types::Percent;
use serde::{Deserialize, Serialize};

/// Progress report filed by a worker; immutable once recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub id: Id,
    pub project_id: Id,
    /// Null once the author's account is deleted
    pub author_id: Option<Id>,
    pub date: NaiveDate,
    pub progress: Percent,
    pub comment: Option<String>,
    /// Storage path of the attached photo
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for ProjectUpdate {
    fn id(&self) -> Id {
        self.id
    }
}

impl Entity for ProjectUpdate {
    const TABLE_NAME: &'static str = "project_updates";
    const TYPE_NAME: &'static str = "ProjectUpdate";
}

impl ProjectScoped for ProjectUpdate {
    fn project_id(&self) -> Option<Id> {
        Some(self.project_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewProjectUpdate {
    pub project_id: Id,
    pub author_id: Id,
    pub progress: Percent,
    pub comment: Option<String>,
    pub image_path: Option<String>,
}
