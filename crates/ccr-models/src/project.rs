//! Project model
//!
//! Table: projects

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use ccr_core::traits::{Entity, Id, Identifiable};
use ccr_core::types::Percent;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "EN_PROGRESO")]
    InProgress,
    #[serde(rename = "COMPLETADO")]
    Completed,
    #[serde(rename = "PAUSADO")]
    Paused,
    #[serde(rename = "CANCELADO")]
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Pending,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::Paused,
        ProjectStatus::Cancelled,
    ];

    /// Value stored in `projects.status`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDIENTE",
            Self::InProgress => "EN_PROGRESO",
            Self::Completed => "COMPLETADO",
            Self::Paused => "PAUSADO",
            Self::Cancelled => "CANCELADO",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En Progreso",
            Self::Completed => "Completado",
            Self::Paused => "Pausado",
            Self::Cancelled => "Cancelado",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown project status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ProjectStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Construction or consulting project followed through the portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,

    /// Full street address of the site
    pub address: String,
    pub city: String,

    pub status: ProjectStatus,

    /// Overwritten by every accepted progress update
    pub progress: Percent,

    pub start_date: NaiveDate,
    pub estimated_end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,

    /// Owning client; must have the CLIENT role
    pub client_id: Option<Id>,
    /// Creating staff member; must have the ADMIN or WORKER role
    pub created_by_id: Option<Id>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_owned_by(&self, user_id: Id) -> bool {
        self.client_id == Some(user_id)
    }
}

impl Identifiable for Project {
    fn id(&self) -> Id {
        self.id
    }
}

impl Entity for Project {
    const TABLE_NAME: &'static str = "projects";
    const TYPE_NAME: &'static str = "Project";
}

/// Project row to insert
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProject {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub address: String,

    #[validate(length(min = 1, max = 100))]
    pub city: String,

    #[serde(default)]
    pub status: ProjectStatus,

    pub start_date: NaiveDate,
    pub estimated_end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub client_id: Option<Id>,
    pub created_by_id: Option<Id>,
}

/// Administrator edit of a project's descriptive fields
///
/// Progress is not editable here; it only moves through progress updates.
#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct ProjectChanges {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,

    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,

    /// `Some(None)` clears the date
    pub estimated_end_date: Option<Option<NaiveDate>>,
    pub actual_end_date: Option<Option<NaiveDate>>,

    /// `Some(None)` clears the client
    pub client_id: Option<Option<Id>>,
}

impl ProjectChanges {
    /// Apply changes to a project
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(ref name) = self.name {
            project.name = name.clone();
        }
        if let Some(ref description) = self.description {
            project.description = if description.trim().is_empty() {
                None
            } else {
                Some(description.clone())
            };
        }
        if let Some(ref address) = self.address {
            project.address = address.clone();
        }
        if let Some(ref city) = self.city {
            project.city = city.clone();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(date) = self.estimated_end_date {
            project.estimated_end_date = date;
        }
        if let Some(date) = self.actual_end_date {
            project.actual_end_date = date;
        }
        if let Some(client_id) = self.client_id {
            project.client_id = client_id;
        }
    }
}
