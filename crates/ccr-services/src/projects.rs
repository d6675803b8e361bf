//! Project detail pages and the administrator's project panel

use ccr_auth::{Access, CurrentUser};
use ccr_contracts::projects::{AssignmentContract, AssignmentForm, ProjectContract, ProjectForm};
use ccr_contracts::Contract;
use ccr_core::error::PortalError;
use ccr_core::result::PortalResult;
use ccr_core::traits::Id;
use ccr_models::{Account, Assignment, Document, NewProject, Project, ProjectUpdate, Role};
use serde::Serialize;
use tracing::{info, instrument};

use crate::context::ServiceContext;
use crate::result::ServiceOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct WorkerProjectView {
    pub project: Project,
    pub updates: Vec<ProjectUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientProjectView {
    pub project: Project,
    pub updates: Vec<ProjectUpdate>,
    /// Only documents visible to the client
    pub documents: Vec<Document>,
}

/// Read-only project pages for workers and clients
pub struct ProjectService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProjectService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn worker_detail(&self, user: &CurrentUser, id: Id) -> PortalResult<WorkerProjectView> {
        let project = self.ctx.project(id).await?;
        let assigned = self.ctx.stores.assignments.is_assigned(id, user.id).await?;
        user.authorize_worker_project(&project, assigned)?;

        let updates = self.ctx.stores.updates.list_for_project(id).await?;
        Ok(WorkerProjectView { project, updates })
    }

    pub async fn client_detail(&self, user: &CurrentUser, id: Id) -> PortalResult<ClientProjectView> {
        let project = self.ctx.project(id).await?;
        user.authorize_client_project(&project)?;

        let updates = self.ctx.stores.updates.list_for_project(id).await?;
        let documents = self.ctx.stores.documents.list_for_project(id, true).await?;
        Ok(ClientProjectView {
            project,
            updates,
            documents,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignedWorker {
    pub assignment: Assignment,
    pub worker: Account,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentPanel {
    pub project: Project,
    pub assigned: Vec<AssignedWorker>,
    /// Workers not yet assigned to the project
    pub available: Vec<Account>,
}

/// Administrator panel: list, create, edit and staff projects
pub struct ProjectAdminService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProjectAdminService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list(&self, user: &CurrentUser) -> PortalResult<Vec<Project>> {
        user.require(Access::Admin)?;
        Ok(self.ctx.stores.projects.list_all().await?)
    }

    /// Accounts that can be chosen as a project's client
    pub async fn client_choices(&self, user: &CurrentUser) -> PortalResult<Vec<Account>> {
        user.require(Access::Admin)?;
        Ok(self.ctx.stores.users.list_by_role(Role::Client).await?)
    }

    pub async fn get(&self, user: &CurrentUser, id: Id) -> PortalResult<Project> {
        let project = self.ctx.project(id).await?;
        user.require(Access::Admin)?;
        Ok(project)
    }

    async fn check_client(&self, client_id: Option<Id>) -> PortalResult<()> {
        if let Some(client_id) = client_id {
            ProjectContract::check_client(self.ctx.role_of(client_id).await?)?;
        }
        Ok(())
    }

    #[instrument(skip(self, user, form), fields(admin_id = user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        form: &ProjectForm,
    ) -> PortalResult<ServiceOutcome<Project>> {
        user.require(Access::Admin)?;
        let accepted = ProjectContract.validate(form)?;
        self.check_client(accepted.client_id).await?;
        ProjectContract::check_creator(user.role)?;

        let project = self
            .ctx
            .stores
            .projects
            .create(NewProject {
                name: accepted.name,
                description: accepted.description,
                address: accepted.address,
                city: accepted.city,
                status: accepted.status,
                start_date: accepted.start_date,
                estimated_end_date: accepted.estimated_end_date,
                actual_end_date: accepted.actual_end_date,
                client_id: accepted.client_id,
                created_by_id: Some(user.id),
            })
            .await?;

        let message = format!("Project \"{}\" created.", project.name);
        Ok(ServiceOutcome::success_with_message(project, message))
    }

    #[instrument(skip(self, user, form), fields(admin_id = user.id))]
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Id,
        form: &ProjectForm,
    ) -> PortalResult<ServiceOutcome<Project>> {
        self.ctx.project(id).await?;
        user.require(Access::Admin)?;
        let accepted = ProjectContract.validate(form)?;
        self.check_client(accepted.client_id).await?;

        let project = self
            .ctx
            .stores
            .projects
            .update(id, accepted.into_changes())
            .await?;
        info!(project_id = id, status = %project.status, "Project updated");

        let message = format!("Project \"{}\" updated.", project.name);
        Ok(ServiceOutcome::success_with_message(project, message))
    }

    pub async fn assignments(&self, user: &CurrentUser, id: Id) -> PortalResult<AssignmentPanel> {
        let project = self.ctx.project(id).await?;
        user.require(Access::Admin)?;

        let assignments = self.ctx.stores.assignments.list_for_project(id).await?;
        let workers = self.ctx.stores.users.list_by_role(Role::Worker).await?;

        let mut assigned = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if let Some(worker) = self.ctx.stores.users.find_account(assignment.worker_id).await? {
                assigned.push(AssignedWorker { assignment, worker });
            }
        }
        let available = workers
            .into_iter()
            .filter(|w| !assigned.iter().any(|a| a.worker.id() == w.id()))
            .collect();

        Ok(AssignmentPanel {
            project,
            assigned,
            available,
        })
    }

    #[instrument(skip(self, user, form), fields(admin_id = user.id))]
    pub async fn assign(
        &self,
        user: &CurrentUser,
        id: Id,
        form: &AssignmentForm,
    ) -> PortalResult<ServiceOutcome<Assignment>> {
        let project = self.ctx.project(id).await?;
        user.require(Access::Admin)?;
        let worker_id = AssignmentContract.validate(form)?;
        AssignmentContract::check_worker(self.ctx.role_of(worker_id).await?)?;

        if self.ctx.stores.assignments.is_assigned(id, worker_id).await? {
            return Err(PortalError::invalid(
                "worker_id",
                "is already assigned to this project",
            ));
        }

        let assignment = self.ctx.stores.assignments.assign(id, worker_id).await?;
        let worker = self.ctx.account(worker_id).await?;
        let message = format!(
            "{} assigned to \"{}\".",
            worker.user.display_name(),
            project.name
        );
        Ok(ServiceOutcome::success_with_message(assignment, message))
    }

    #[instrument(skip(self, user), fields(admin_id = user.id))]
    pub async fn unassign(
        &self,
        user: &CurrentUser,
        id: Id,
        worker_id: Id,
    ) -> PortalResult<ServiceOutcome<()>> {
        let project = self.ctx.project(id).await?;
        user.require(Access::Admin)?;

        if !self.ctx.stores.assignments.unassign(id, worker_id).await? {
            return Err(PortalError::not_found::<Assignment>(worker_id));
        }
        info!(project_id = id, worker_id, "Worker unassigned");

        Ok(ServiceOutcome::success_with_message(
            (),
            format!("Worker removed from \"{}\".", project.name),
        ))
    }
}
