//! Staff pages: the client-message inbox, replies and project documents

use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
    Form,
};
use ccr_contracts::documents::DocumentForm;
use ccr_contracts::messages::ReplyForm;
use ccr_core::traits::Id;
use ccr_services::{DocumentService, MessageService};

use crate::error::{into_validation, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser};
use crate::page::FormView;
use crate::uploads::MultipartForm;

/// GET /staff/inbox/
pub async fn inbox(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let messages = MessageService::new(&state.services).staff_inbox(&user).await?;
    user.page(&state, "Client messages", messages)
}

/// GET /staff/message/:id/reply/
pub async fn reply_form(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let view = MessageService::new(&state.services).reply_view(&user, id).await?;
    user.page(&state, "Reply", FormView::blank(ReplyForm::default(), view))
}

/// POST /staff/message/:id/reply/
pub async fn reply(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
    Form(form): Form<ReplyForm>,
) -> ApiResult<Response> {
    let messages = MessageService::new(&state.services);
    match messages.reply(&user, id, &form).await {
        Ok(outcome) => user.redirect(&state, outcome.message().map(str::to_string), "/staff/inbox/"),
        Err(e) => {
            let errors = into_validation(e)?;
            let view = messages.reply_view(&user, id).await?;
            let page = user.page(&state, "Reply", FormView::invalid(form, errors, view))?;
            Ok(page.rejected().into_response())
        }
    }
}

/// GET /staff/project/:id/documents/
pub async fn documents(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let list = DocumentService::new(&state.services).list(&user, id).await?;
    let title = format!("Documents: {}", list.project.name);
    user.page(&state, title, list)
}

/// GET /staff/project/:id/documents/upload/
pub async fn upload_form(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let project = DocumentService::new(&state.services)
        .upload_form(&user, id)
        .await?;
    user.page(
        &state,
        "Upload document",
        FormView::blank(
            DocumentForm {
                visible_to_client: Some(true),
                ..Default::default()
            },
            project,
        ),
    )
}

/// POST /staff/project/:id/documents/upload/
pub async fn upload(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let mut submitted = MultipartForm::read(multipart).await?;
    let form = DocumentForm {
        title: submitted.text("title").unwrap_or_default(),
        visible_to_client: Some(submitted.flag("visible_to_client")?.unwrap_or(false)),
    };
    let file = submitted.take_file("file");

    let documents = DocumentService::new(&state.services);
    match documents.upload(&user, id, &form, file).await {
        Ok(outcome) => {
            let location = format!("/staff/project/{}/documents/", id);
            user.redirect(&state, outcome.message().map(str::to_string), &location)
        }
        Err(e) => {
            let errors = into_validation(e)?;
            let project = documents.upload_form(&user, id).await?;
            let page = user.page(
                &state,
                "Upload document",
                FormView::invalid(form, errors, project),
            )?;
            Ok(page.rejected().into_response())
        }
    }
}
