//! Core error types for the portal
//!
//! Every failure a request can produce is one of these variants; the API layer
//! turns them into HTTP responses through `status_code` and `error_code`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::traits::{Entity, Id};

/// Core error type for all portal operations
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Not found: {entity} with id={id}")]
    NotFound { entity: &'static str, id: Id },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PortalError {
    pub fn not_found<E: Entity>(id: Id) -> Self {
        PortalError::NotFound {
            entity: E::TYPE_NAME,
            id,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PortalError::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortalError::Conflict {
            message: message.into(),
        }
    }

    /// Single field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        PortalError::Validation(errors)
    }

    pub fn status_code(&self) -> u16 {
        match self {
            PortalError::NotFound { .. } => 404,
            PortalError::Unauthenticated => 401,
            PortalError::Forbidden { .. } => 403,
            PortalError::Validation(_) => 422,
            PortalError::Conflict { .. } => 409,
            PortalError::Database(_) | PortalError::Storage(_) | PortalError::Internal(_) => 500,
            PortalError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PortalError::NotFound { .. } => "not_found",
            PortalError::Unauthenticated => "unauthenticated",
            PortalError::Forbidden { .. } => "forbidden",
            PortalError::Validation(_) => "validation_failed",
            PortalError::Conflict { .. } => "conflict",
            PortalError::Database(_) => "database_error",
            PortalError::Storage(_) => "storage_error",
            PortalError::Internal(_) => "internal_error",
            PortalError::Config(_) => "configuration_error",
        }
    }

    /// Server-side failures whose details must not reach the client
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

/// Validation errors collection
///
/// Field errors are kept in a sorted map so rendered forms list them in a
/// stable order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
    /// Errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when nothing was collected, otherwise a validation error.
    pub fn into_result(self) -> Result<(), PortalError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PortalError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}
