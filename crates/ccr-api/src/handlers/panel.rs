//! Administrator panel: users, projects and worker assignments

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use ccr_auth::CurrentUser;
use ccr_contracts::accounts::ProfileForm;
use ccr_contracts::projects::{AssignmentForm, ProjectForm};
use ccr_core::traits::Id;
use ccr_models::{Account, Project, ProjectStatus, Role};
use ccr_services::{AssignmentPanel, ProjectAdminService, ServiceContext, UserAdminService};
use serde::Serialize;

use crate::error::{into_validation, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser};
use crate::page::FormView;

const USERS_PATH: &str = "/panel/usuarios/";
const PROJECTS_PATH: &str = "/panel/proyectos/";

fn assignments_path(project_id: Id) -> String {
    format!("/panel/proyectos/{}/asignaciones/", project_id)
}

// Users

#[derive(Debug, Serialize)]
pub struct UserEdit {
    pub account: Account,
    pub roles: [Role; 3],
}

/// GET /panel/usuarios/
pub async fn users(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let accounts = UserAdminService::new(&state.services).list(&user).await?;
    user.page(&state, "Users", accounts)
}

/// GET /panel/usuarios/:id/editar/
pub async fn edit_user_form(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let account = UserAdminService::new(&state.services).get(&user, id).await?;
    let form = ProfileForm::from(&account);
    let title = format!("Edit {}", account.user.username);
    user.page(
        &state,
        title,
        FormView::blank(form, UserEdit { account, roles: Role::ALL }),
    )
}

/// POST /panel/usuarios/:id/editar/
pub async fn edit_user(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
    Form(form): Form<ProfileForm>,
) -> ApiResult<Response> {
    let users = UserAdminService::new(&state.services);
    match users.update_profile(&user, id, &form).await {
        Ok(outcome) => user.redirect(&state, outcome.message().map(str::to_string), USERS_PATH),
        Err(e) => {
            let errors = into_validation(e)?;
            let account = users.get(&user, id).await?;
            let title = format!("Edit {}", account.user.username);
            let context = UserEdit { account, roles: Role::ALL };
            let page = user.page(&state, title, FormView::invalid(form, errors, context))?;
            Ok(page.rejected().into_response())
        }
    }
}

/// GET /panel/usuarios/:id/eliminar/
pub async fn delete_user_confirm(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let account = UserAdminService::new(&state.services).get(&user, id).await?;
    let title = format!("Delete {}", account.user.username);
    user.page(&state, title, account)
}

/// POST /panel/usuarios/:id/eliminar/
///
/// The deleted user's sessions end immediately.
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<Response> {
    let outcome = UserAdminService::new(&state.services)
        .delete(&user, id)
        .await?;
    let revoked = state.sessions.delete_user_sessions(id)?;
    tracing::info!(user_id = id, revoked, "Sessions of deleted user revoked");

    user.redirect(&state, outcome.message().map(str::to_string), USERS_PATH)
}

// Projects

#[derive(Debug, Serialize)]
pub struct ProjectChoices {
    pub clients: Vec<Account>,
    pub statuses: [ProjectStatus; 5],
}

#[derive(Debug, Serialize)]
pub struct ProjectPanel {
    pub projects: Vec<Project>,
    #[serde(flatten)]
    pub choices: ProjectChoices,
}

#[derive(Debug, Serialize)]
pub struct ProjectEdit {
    pub project: Project,
    #[serde(flatten)]
    pub choices: ProjectChoices,
}

async fn choices(ctx: &ServiceContext, user: &CurrentUser) -> ApiResult<ProjectChoices> {
    let clients = ProjectAdminService::new(ctx).client_choices(user).await?;
    Ok(ProjectChoices {
        clients,
        statuses: ProjectStatus::ALL,
    })
}

async fn project_panel(ctx: &ServiceContext, user: &CurrentUser) -> ApiResult<ProjectPanel> {
    let projects = ProjectAdminService::new(ctx).list(user).await?;
    Ok(ProjectPanel {
        projects,
        choices: choices(ctx, user).await?,
    })
}

/// GET /panel/proyectos/
pub async fn projects(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let panel = project_panel(&state.services, &user).await?;
    user.page(
        &state,
        "Projects",
        FormView::blank(ProjectForm::default(), panel),
    )
}

/// POST /panel/proyectos/
pub async fn create_project(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Form(form): Form<ProjectForm>,
) -> ApiResult<Response> {
    match ProjectAdminService::new(&state.services)
        .create(&user, &form)
        .await
    {
        Ok(outcome) => user.redirect(&state, outcome.message().map(str::to_string), PROJECTS_PATH),
        Err(e) => {
            let errors = into_validation(e)?;
            let panel = project_panel(&state.services, &user).await?;
            let page = user.page(&state, "Projects", FormView::invalid(form, errors, panel))?;
            Ok(page.rejected().into_response())
        }
    }
}

/// GET /panel/proyectos/:id/editar/
pub async fn edit_project_form(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let project = ProjectAdminService::new(&state.services).get(&user, id).await?;
    let form = ProjectForm::from(&project);
    let title = format!("Edit {}", project.name);
    let context = ProjectEdit {
        project,
        choices: choices(&state.services, &user).await?,
    };
    user.page(&state, title, FormView::blank(form, context))
}

/// POST /panel/proyectos/:id/editar/
pub async fn edit_project(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
    Form(form): Form<ProjectForm>,
) -> ApiResult<Response> {
    let admin = ProjectAdminService::new(&state.services);
    match admin.update(&user, id, &form).await {
        Ok(outcome) => user.redirect(&state, outcome.message().map(str::to_string), PROJECTS_PATH),
        Err(e) => {
            let errors = into_validation(e)?;
            let project = admin.get(&user, id).await?;
            let title = format!("Edit {}", project.name);
            let context = ProjectEdit {
                project,
                choices: choices(&state.services, &user).await?,
            };
            let page = user.page(&state, title, FormView::invalid(form, errors, context))?;
            Ok(page.rejected().into_response())
        }
    }
}

// Assignments

/// GET /panel/proyectos/:id/asignaciones/
pub async fn assignments(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let panel: AssignmentPanel = ProjectAdminService::new(&state.services)
        .assignments(&user, id)
        .await?;
    let title = format!("Workers: {}", panel.project.name);
    user.page(&state, title, FormView::blank(AssignmentForm::default(), panel))
}

/// POST /panel/proyectos/:id/asignaciones/
pub async fn assign(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
    Form(form): Form<AssignmentForm>,
) -> ApiResult<Response> {
    let admin = ProjectAdminService::new(&state.services);
    match admin.assign(&user, id, &form).await {
        Ok(outcome) => {
            let location = assignments_path(id);
            user.redirect(&state, outcome.message().map(str::to_string), &location)
        }
        Err(e) => {
            let errors = into_validation(e)?;
            let panel = admin.assignments(&user, id).await?;
            let title = format!("Workers: {}", panel.project.name);
            let page = user.page(&state, title, FormView::invalid(form, errors, panel))?;
            Ok(page.rejected().into_response())
        }
    }
}

/// POST /panel/proyectos/:id/asignaciones/:worker_id/eliminar/
pub async fn unassign(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, worker_id)): Path<(Id, Id)>,
) -> ApiResult<Response> {
    let outcome = ProjectAdminService::new(&state.services)
        .unassign(&user, id, worker_id)
        .await?;
    let location = assignments_path(id);
    user.redirect(&state, outcome.message().map(str::to_string), &location)
}
