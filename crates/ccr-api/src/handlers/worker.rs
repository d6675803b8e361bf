//! Worker pages: assigned project detail and progress submission

use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
};
use ccr_contracts::progress::ProgressForm;
use ccr_core::traits::Id;
use ccr_services::{ProgressService, ProjectService};

use crate::error::{into_validation, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser};
use crate::page::FormView;
use crate::uploads::MultipartForm;

/// GET /worker/project/:id/
pub async fn project_detail(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let view = ProjectService::new(&state.services)
        .worker_detail(&user, id)
        .await?;
    let title = view.project.name.clone();
    user.page(&state, title, view)
}

/// GET /worker/project/:id/add-update/
pub async fn progress_form(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let view = ProgressService::new(&state.services).form(&user, id).await?;
    let title = format!("Progress update: {}", view.project.name);
    user.page(&state, title, FormView::blank(view.form, view.project))
}

/// POST /worker/project/:id/add-update/
pub async fn submit_progress(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let mut submitted = MultipartForm::read(multipart).await?;
    let form = ProgressForm {
        progress_percent: submitted.text("progress_percent").unwrap_or_default(),
        comment: submitted.text("comment"),
    };
    let image = submitted.take_file("image");

    match ProgressService::new(&state.services)
        .submit(&user, id, &form, image)
        .await
    {
        Ok(outcome) => {
            let location = format!("/worker/project/{}/", id);
            user.redirect(&state, outcome.message().map(str::to_string), &location)
        }
        Err(e) => {
            let errors = into_validation(e)?;
            let project = state.services.project(id).await?;
            let title = format!("Progress update: {}", project.name);
            let page = user.page(&state, title, FormView::invalid(form, errors, project))?;
            Ok(page.rejected().into_response())
        }
    }
}
