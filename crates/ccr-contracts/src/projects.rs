//! Contracts for the administrator's project and assignment forms

use ccr_core::error::ValidationErrors;
use ccr_core::traits::Id;
use ccr_models::{Project, ProjectChanges, ProjectStatus, Role};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::base::{non_blank, parse_date, parse_id, validate_text, Contract, ValidationResult};

pub const NAME_MAX_LENGTH: usize = 200;
pub const ADDRESS_MAX_LENGTH: usize = 255;
pub const CITY_MAX_LENGTH: usize = 100;

/// Project create/edit form; every field arrives as submitted text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub estimated_end_date: Option<String>,
    #[serde(default)]
    pub actual_end_date: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl From<&Project> for ProjectForm {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            description: project.description.clone(),
            address: project.address.clone(),
            city: project.city.clone(),
            status: Some(project.status.as_str().to_string()),
            start_date: Some(project.start_date.to_string()),
            estimated_end_date: project.estimated_end_date.map(|d| d.to_string()),
            actual_end_date: project.actual_end_date.map(|d| d.to_string()),
            client_id: project.client_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedProject {
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub estimated_end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub client_id: Option<Id>,
}

impl AcceptedProject {
    /// Full replacement of the editable fields of an existing project
    pub fn into_changes(self) -> ProjectChanges {
        ProjectChanges {
            name: Some(self.name),
            description: Some(self.description.unwrap_or_default()),
            address: Some(self.address),
            city: Some(self.city),
            status: Some(self.status),
            start_date: Some(self.start_date),
            estimated_end_date: Some(self.estimated_end_date),
            actual_end_date: Some(self.actual_end_date),
            client_id: Some(self.client_id),
        }
    }
}

pub struct ProjectContract;

impl ProjectContract {
    /// The selected client must hold the CLIENT role
    pub fn check_client(client_role: Option<Role>) -> ValidationResult {
        match client_role {
            None => client_error("does not exist"),
            Some(Role::Client) => Ok(()),
            Some(Role::Admin) | Some(Role::Worker) => client_error("must be a client"),
        }
    }

    /// Projects are created by staff only
    pub fn check_creator(creator_role: Role) -> ValidationResult {
        match creator_role {
            Role::Admin | Role::Worker => Ok(()),
            Role::Client => {
                let mut errors = ValidationErrors::new();
                errors.add("created_by", "must be an administrator or worker");
                Err(errors)
            }
        }
    }
}

fn client_error(message: &str) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    errors.add("client_id", message);
    Err(errors)
}

impl Contract<ProjectForm> for ProjectContract {
    type Output = AcceptedProject;

    fn validate(&self, form: &ProjectForm) -> ValidationResult<AcceptedProject> {
        let mut errors = ValidationErrors::new();

        let name = validate_text("name", &form.name, NAME_MAX_LENGTH, &mut errors);
        let address = validate_text("address", &form.address, ADDRESS_MAX_LENGTH, &mut errors);
        let city = validate_text("city", &form.city, CITY_MAX_LENGTH, &mut errors);

        let status = match non_blank(form.status.as_deref()) {
            None => ProjectStatus::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.add("status", "is not a valid choice");
                ProjectStatus::default()
            }),
        };

        let start_date = parse_date("start_date", form.start_date.as_deref(), &mut errors);
        if start_date.is_none() && !errors.has_error("start_date") {
            errors.add("start_date", "can't be blank");
        }
        let estimated_end_date = parse_date(
            "estimated_end_date",
            form.estimated_end_date.as_deref(),
            &mut errors,
        );
        let actual_end_date =
            parse_date("actual_end_date", form.actual_end_date.as_deref(), &mut errors);

        if let (Some(start), Some(end)) = (start_date, estimated_end_date) {
            if end < start {
                errors.add("estimated_end_date", "can't be before the start date");
            }
        }
        if let (Some(start), Some(end)) = (start_date, actual_end_date) {
            if end < start {
                errors.add("actual_end_date", "can't be before the start date");
            }
        }

        let client_id = parse_id("client_id", form.client_id.as_deref(), &mut errors);

        match (name, address, city, start_date) {
            (Some(name), Some(address), Some(city), Some(start_date)) if errors.is_empty() => {
                Ok(AcceptedProject {
                    name,
                    description: non_blank(form.description.as_deref()),
                    address,
                    city,
                    status,
                    start_date,
                    estimated_end_date,
                    actual_end_date,
                    client_id,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentForm {
    #[serde(default)]
    pub worker_id: Option<String>,
}

pub struct AssignmentContract;

impl AssignmentContract {
    /// Only workers can be assigned to a project
    pub fn check_worker(worker_role: Option<Role>) -> ValidationResult {
        let message = match worker_role {
            Some(Role::Worker) => return Ok(()),
            None => "does not exist",
            Some(Role::Admin) | Some(Role::Client) => "must be a worker",
        };
        let mut errors = ValidationErrors::new();
        errors.add("worker_id", message);
        Err(errors)
    }
}

impl Contract<AssignmentForm> for AssignmentContract {
    type Output = Id;

    fn validate(&self, form: &AssignmentForm) -> ValidationResult<Id> {
        let mut errors = ValidationErrors::new();
        match parse_id("worker_id", form.worker_id.as_deref(), &mut errors) {
            Some(id) => Ok(id),
            None => {
                if errors.is_empty() {
                    errors.add("worker_id", "can't be blank");
                }
                Err(errors)
            }
        }
    }
}
