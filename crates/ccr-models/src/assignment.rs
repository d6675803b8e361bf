//! Worker assignment model
//!
//! Table: assignments

use chrono::{DateTime, Utc};
use ccr_core::traits::{Entity, Id, Identifiable, ProjectScoped};
use serde::{Deserialize, Serialize};

/// Grants a worker access to one project; unique per (project, worker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Id,
    pub project_id: Id,
    pub worker_id: Id,
    pub assigned_at: DateTime<Utc>,
}

impl Identifiable for Assignment {
    fn id(&self) -> Id {
        self.id
    }
}

impl Entity for Assignment {
    const TABLE_NAME: &'static str = "assignments";
    const TYPE_NAME: &'static str = "Assignment";
}

impl ProjectScoped for Assignment {
    fn project_id(&self) -> Option<Id> {
        Some(self.project_id)
    }
}
