//! Contract for the staff document upload form

use ccr_core::error::ValidationErrors;
use serde::{Deserialize, Serialize};

use crate::base::{validate_text, validate_upload, Contract, UploadInfo, ValidationResult};

pub const TITLE_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentForm {
    #[serde(default)]
    pub title: String,
    /// Omitted means hidden; an unchecked checkbox is not submitted
    #[serde(default)]
    pub visible_to_client: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct DocumentSubmission<'a> {
    pub form: &'a DocumentForm,
    pub file: Option<UploadInfo<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedDocument {
    pub title: String,
    pub visible_to_client: bool,
}

pub struct DocumentContract {
    max_upload_size: usize,
}

impl DocumentContract {
    pub fn new(max_upload_size: usize) -> Self {
        Self { max_upload_size }
    }
}

impl<'a> Contract<DocumentSubmission<'a>> for DocumentContract {
    type Output = AcceptedDocument;

    fn validate(&self, input: &DocumentSubmission<'a>) -> ValidationResult<AcceptedDocument> {
        let mut errors = ValidationErrors::new();

        let title = validate_text("title", &input.form.title, TITLE_MAX_LENGTH, &mut errors);
        validate_upload("file", input.file, true, self.max_upload_size, &mut errors);

        match title {
            Some(title) if errors.is_empty() => Ok(AcceptedDocument {
                title,
                visible_to_client: input.form.visible_to_client.unwrap_or(false),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omitted_visibility_hides_document() {
        let form = DocumentForm {
            title: "Planos estructurales".into(),
            visible_to_client: None,
        };
        let file = UploadInfo { file_name: "planos.pdf", size: 100 };
        let accepted = DocumentContract::new(1000)
            .validate(&DocumentSubmission { form: &form, file: Some(file) })
            .unwrap();
        assert!(!accepted.visible_to_client);
    }

    #[test]
    fn test_visible_document() {
        let form = DocumentForm {
            title: "Planos estructurales".into(),
            visible_to_client: Some(true),
        };
        let file = UploadInfo { file_name: "planos.pdf", size: 100 };
        let accepted = DocumentContract::new(1000)
            .validate(&DocumentSubmission { form: &form, file: Some(file) })
            .unwrap();
        assert!(accepted.visible_to_client);
    }

    #[test]
    fn test_hidden_document() {
        let form = DocumentForm {
            title: "Presupuesto interno".into(),
            visible_to_client: Some(false),
        };
        let file = UploadInfo { file_name: "presupuesto.xlsx", size: 100 };
        let accepted = DocumentContract::new(1000)
            .validate(&DocumentSubmission { form: &form, file: Some(file) })
            .unwrap();
        assert!(!accepted.visible_to_client);
    }

    #[test]
    fn test_title_and_file_required() {
        let form = DocumentForm::default();
        let errors = DocumentContract::new(1000)
            .validate(&DocumentSubmission { form: &form, file: None })
            .unwrap_err();
        assert!(errors.has_error("title"));
        assert!(errors.has_error("file"));
    }
}
