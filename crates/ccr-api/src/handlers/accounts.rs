//! Landing page, login, logout and self-registration

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use ccr_auth::FlashMessage;
use ccr_contracts::accounts::{LoginForm, RegistrationForm};
use ccr_services::AccountService;
use serde::{Deserialize, Serialize};

use crate::error::{into_validation, ApiResult};
use crate::extractors::{AppState, Visitor};
use crate::page::FormView;

const DEFAULT_LANDING: &str = "/dashboard/";

/// Only same-site relative paths are followed after login
pub fn safe_next(next: Option<&str>) -> &str {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains("://") =>
        {
            path
        }
        _ => DEFAULT_LANDING,
    }
}

#[derive(Debug, Serialize)]
pub struct Landing {
    pub authenticated: bool,
}

/// GET /
pub async fn home(State(state): State<AppState>, mut visitor: Visitor) -> ApiResult<impl IntoResponse> {
    let authenticated = visitor.user.is_some();
    visitor.page(&state, "Home", Landing { authenticated })
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// GET /login/
pub async fn login_page(
    State(state): State<AppState>,
    mut visitor: Visitor,
    Query(query): Query<NextQuery>,
) -> ApiResult<impl IntoResponse> {
    let form = LoginForm {
        next: query.next,
        ..Default::default()
    };
    visitor.page(&state, "Log in", FormView::blank(form, ()))
}

/// POST /login/
///
/// Bad credentials re-render the login page with a 200 and an inline error.
pub async fn login(
    State(state): State<AppState>,
    mut visitor: Visitor,
    Form(form): Form<LoginForm>,
) -> ApiResult<Response> {
    let account = match AccountService::new(&state.services).login(&form).await {
        Ok(account) => account,
        Err(e) => {
            let errors = into_validation(e)?;
            let page = visitor.page(&state, "Log in", FormView::invalid(form, errors, ()))?;
            return Ok(page.into_response());
        }
    };

    let session = state.start_session(account.user.id, visitor.session.as_ref())?;
    let destination = safe_next(form.next.as_deref());
    Ok(state.with_session_cookie(&session, Redirect::to(destination)))
}

/// GET|POST /logout/
pub async fn logout(State(state): State<AppState>, visitor: Visitor) -> ApiResult<Response> {
    if let Some(session) = visitor.session {
        state.sessions.delete(&session.id)?;
        tracing::info!(user_id = ?session.user_id, "User logged out");
    }
    Ok(state.with_cleared_cookie(Redirect::to("/")))
}

/// GET /register/
pub async fn register_page(
    State(state): State<AppState>,
    mut visitor: Visitor,
) -> ApiResult<impl IntoResponse> {
    visitor.page(&state, "Register", FormView::blank(RegistrationForm::default(), ()))
}

/// POST /register/
pub async fn register(
    State(state): State<AppState>,
    mut visitor: Visitor,
    Form(form): Form<RegistrationForm>,
) -> ApiResult<Response> {
    let account = match AccountService::new(&state.services).register(&form).await {
        Ok(account) => account,
        Err(e) => {
            let errors = into_validation(e)?;
            let page = visitor.page(&state, "Register", FormView::invalid(form, errors, ()))?;
            return Ok(page.rejected().into_response());
        }
    };

    let mut session = state.start_session(account.user.id, visitor.session.as_ref())?;
    session.push_flash(FlashMessage::success(format!(
        "Welcome, {}. Your account has been created.",
        account.user.display_name()
    )));
    state.sessions.set(session.clone())?;

    Ok(state.with_session_cookie(&session, Redirect::to(DEFAULT_LANDING)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/client/inbox/")), "/client/inbox/");
        assert_eq!(safe_next(Some("//evil.example.com/")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("https://evil.example.com/")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("/\\evil.example.com")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("")), DEFAULT_LANDING);
        assert_eq!(safe_next(None), DEFAULT_LANDING);
    }
}
