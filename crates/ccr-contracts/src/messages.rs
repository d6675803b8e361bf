//! Contracts for the client message form and the staff reply form

use ccr_core::error::ValidationErrors;
use serde::{Deserialize, Serialize};

use crate::base::{non_blank, validate_max_length, validate_text, Contract, ValidationResult};

pub const SUBJECT_MAX_LENGTH: usize = 255;
pub const BODY_MAX_LENGTH: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedMessage {
    pub subject: Option<String>,
    pub body: String,
}

pub struct MessageContract;

impl Contract<MessageForm> for MessageContract {
    type Output = AcceptedMessage;

    fn validate(&self, form: &MessageForm) -> ValidationResult<AcceptedMessage> {
        let mut errors = ValidationErrors::new();

        let subject = non_blank(form.subject.as_deref());
        if let Some(ref subject) = subject {
            validate_max_length("subject", subject, SUBJECT_MAX_LENGTH, &mut errors);
        }
        let body = validate_text("body", &form.body, BODY_MAX_LENGTH, &mut errors);

        match body {
            Some(body) if errors.is_empty() => Ok(AcceptedMessage { subject, body }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    pub body: String,
}

pub struct ReplyContract;

impl Contract<ReplyForm> for ReplyContract {
    type Output = String;

    fn validate(&self, form: &ReplyForm) -> ValidationResult<String> {
        let mut errors = ValidationErrors::new();
        match validate_text("body", &form.body, BODY_MAX_LENGTH, &mut errors) {
            Some(body) if errors.is_empty() => Ok(body),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_requires_body() {
        let errors = MessageContract
            .validate(&MessageForm {
                subject: Some("Consulta".into()),
                body: "   ".into(),
            })
            .unwrap_err();
        assert!(errors.has_error("body"));
        assert!(!errors.has_error("subject"));
    }

    #[test]
    fn test_blank_subject_is_none() {
        let accepted = MessageContract
            .validate(&MessageForm {
                subject: Some("".into()),
                body: "¿Cuándo terminan?".into(),
            })
            .unwrap();
        assert_eq!(accepted.subject, None);
        assert_eq!(accepted.body, "¿Cuándo terminan?");
    }

    #[test]
    fn test_subject_length() {
        let errors = MessageContract
            .validate(&MessageForm {
                subject: Some("a".repeat(256)),
                body: "Hola".into(),
            })
            .unwrap_err();
        assert!(errors.has_error("subject"));
    }

    #[test]
    fn test_reply() {
        assert_eq!(
            ReplyContract.validate(&ReplyForm { body: " Listo ".into() }).unwrap(),
            "Listo"
        );
        assert!(ReplyContract.validate(&ReplyForm::default()).is_err());
    }
}
