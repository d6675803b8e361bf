//! Client pages: owned project detail, messages to staff and the inbox

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};
use ccr_contracts::messages::MessageForm;
use ccr_core::traits::Id;
use ccr_services::{MessageService, ProjectService};

use crate::error::{into_validation, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser};
use crate::page::FormView;

/// GET /client/project/:id/
pub async fn project_detail(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let view = ProjectService::new(&state.services)
        .client_detail(&user, id)
        .await?;
    let title = view.project.name.clone();
    user.page(&state, title, view)
}

/// GET /client/project/:id/send-message/
pub async fn message_form(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let project = MessageService::new(&state.services).compose(&user, id).await?;
    user.page(
        &state,
        "Send a message",
        FormView::blank(MessageForm::default(), project),
    )
}

/// POST /client/project/:id/send-message/
pub async fn send_message(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
    Path(id): Path<Id>,
    Form(form): Form<MessageForm>,
) -> ApiResult<Response> {
    let messages = MessageService::new(&state.services);
    match messages.send(&user, id, &form).await {
        Ok(outcome) => {
            let location = format!("/client/project/{}/", id);
            user.redirect(&state, outcome.message().map(str::to_string), &location)
        }
        Err(e) => {
            let errors = into_validation(e)?;
            let project = messages.compose(&user, id).await?;
            let page = user.page(
                &state,
                "Send a message",
                FormView::invalid(form, errors, project),
            )?;
            Ok(page.rejected().into_response())
        }
    }
}

/// GET /client/inbox/
pub async fn inbox(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let inbox = MessageService::new(&state.services).client_inbox(&user).await?;
    user.page(&state, "Inbox", inbox)
}
