//! JSON page contexts
//!
//! Every page answers with the same envelope: the company name, the page
//! title, the visitor, pending flash messages and the page's own data.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ccr_auth::{CurrentUser, FlashMessage};
use ccr_core::error::ValidationErrors;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub company_name: String,
    pub page_title: String,
    pub user: Option<CurrentUser>,
    pub messages: Vec<FlashMessage>,
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> Page<T> {
    pub fn new(
        company_name: String,
        page_title: impl Into<String>,
        user: Option<CurrentUser>,
        messages: Vec<FlashMessage>,
        data: T,
    ) -> Self {
        Self {
            company_name,
            page_title: page_title.into(),
            user,
            messages,
            data,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// A form re-rendered after failed validation
    pub fn rejected(self) -> Self {
        self.with_status(StatusCode::UNPROCESSABLE_ENTITY)
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// A form with its submitted values, field errors and surrounding context
#[derive(Debug, Serialize)]
pub struct FormView<F: Serialize, C: Serialize = ()> {
    pub form: F,
    pub errors: ValidationErrors,
    pub context: C,
}

impl<F: Serialize, C: Serialize> FormView<F, C> {
    pub fn blank(form: F, context: C) -> Self {
        Self {
            form,
            errors: ValidationErrors::default(),
            context,
        }
    }

    pub fn invalid(form: F, errors: ValidationErrors, context: C) -> Self {
        Self {
            form,
            errors,
            context,
        }
    }
}
