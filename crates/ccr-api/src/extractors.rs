//! Application state and axum extractors for portal handlers

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use ccr_auth::{extract_session_id, CookieConfig, CurrentUser, FlashMessage, Session, SessionStore};
use ccr_core::config::AppConfig;
use ccr_core::error::PortalError;
use ccr_core::traits::Id;
use ccr_services::ServiceContext;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::page::Page;

/// Site-wide settings handlers read on every request
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub company_name: String,
    pub session_lifetime_seconds: i64,
    pub max_body_size: usize,
}

impl SiteSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            company_name: config.instance.company_name.clone(),
            session_lifetime_seconds: config.auth.session_lifetime_seconds,
            max_body_size: config.server.max_body_size_bytes,
        }
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub services: ServiceContext,
    pub sessions: Arc<dyn SessionStore>,
    pub cookies: Arc<CookieConfig>,
    pub site: Arc<SiteSettings>,
}

impl AppState {
    pub fn new(services: ServiceContext, sessions: Arc<dyn SessionStore>, config: &AppConfig) -> Self {
        Self {
            services,
            sessions,
            cookies: Arc::new(CookieConfig::from_config(&config.auth)),
            site: Arc::new(SiteSettings::from_config(config)),
        }
    }

    fn session_from_headers(&self, headers: &HeaderMap) -> Option<Session> {
        let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
        let session_id = extract_session_id(cookie_header, &self.cookies.name)?;
        self.sessions.get(&session_id)
    }

    /// The user behind a session, re-read so role changes apply immediately
    async fn resolve_user(&self, session: &Session) -> ApiResult<Option<CurrentUser>> {
        let Some(user_id) = session.user_id else {
            return Ok(None);
        };

        match self.services.account(user_id).await {
            Ok(account) if account.user.is_active => Ok(Some(CurrentUser::from(&account))),
            Ok(_) | Err(PortalError::NotFound { .. }) => {
                tracing::debug!(user_id, "Dropping session of unavailable user");
                self.sessions.delete(&session.id)?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace any previous session with a fresh authenticated one
    pub fn start_session(&self, user_id: Id, previous: Option<&Session>) -> ApiResult<Session> {
        if let Some(previous) = previous {
            self.sessions.delete(&previous.id)?;
        }
        let session = Session::authenticated(user_id, self.site.session_lifetime_seconds);
        self.sessions.set(session.clone())?;
        tracing::info!(user_id, "Session started");
        Ok(session)
    }

    /// Response carrying the cookie for `session`
    pub fn with_session_cookie(&self, session: &Session, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Ok(value) = HeaderValue::from_str(&self.cookies.build_cookie(&session.id)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        response
    }

    pub fn with_cleared_cookie(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Ok(value) = HeaderValue::from_str(&self.cookies.build_clear_cookie()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        response
    }

    /// Build a page, consuming the session's pending flash messages
    pub fn page<T: Serialize>(
        &self,
        session: Option<&mut Session>,
        user: Option<&CurrentUser>,
        title: impl Into<String>,
        data: T,
    ) -> ApiResult<Page<T>> {
        let messages = match session {
            Some(session) => {
                let messages = session.take_flash();
                if !messages.is_empty() {
                    self.sessions.set(session.clone())?;
                }
                messages
            }
            None => Vec::new(),
        };

        Ok(Page::new(
            self.site.company_name.clone(),
            title,
            user.cloned(),
            messages,
            data,
        ))
    }
}

/// Request path with query, used as the post-login destination
fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

/// Any visitor, logged in or not
pub struct Visitor {
    pub session: Option<Session>,
    pub user: Option<CurrentUser>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Some(session) = app_state.session_from_headers(&parts.headers) else {
            return Ok(Visitor {
                session: None,
                user: None,
            });
        };

        let user = app_state.resolve_user(&session).await?;
        let session = user.as_ref().map(|_| session);
        Ok(Visitor { session, user })
    }
}

impl Visitor {
    pub fn page<T: Serialize>(
        &mut self,
        state: &AppState,
        title: impl Into<String>,
        data: T,
    ) -> ApiResult<Page<T>> {
        state.page(self.session.as_mut(), self.user.as_ref(), title, data)
    }
}

/// Logged-in user; anonymous requests are redirected to the login page
pub struct AuthenticatedUser {
    pub user: CurrentUser,
    pub session: Session,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let login_required = || ApiError::login_required(requested_path(parts));

        let Some(mut session) = app_state.session_from_headers(&parts.headers) else {
            return Err(login_required());
        };
        let Some(user) = app_state.resolve_user(&session).await? else {
            return Err(login_required());
        };

        session.touch();
        app_state.sessions.set(session.clone())?;
        Ok(AuthenticatedUser { user, session })
    }
}

impl AuthenticatedUser {
    pub fn page<T: Serialize>(
        &mut self,
        state: &AppState,
        title: impl Into<String>,
        data: T,
    ) -> ApiResult<Page<T>> {
        state.page(Some(&mut self.session), Some(&self.user), title, data)
    }

    /// 303 to `location`, showing `message` on the next page
    pub fn redirect(
        mut self,
        state: &AppState,
        message: Option<String>,
        location: &str,
    ) -> ApiResult<Response> {
        if let Some(text) = message {
            self.session.push_flash(FlashMessage::success(text));
            state.sessions.set(self.session)?;
        }
        Ok(Redirect::to(location).into_response())
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.user
    }
}
