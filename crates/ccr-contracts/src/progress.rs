//! Contract for the worker's progress update form

use ccr_core::error::ValidationErrors;
use ccr_core::types::{Percent, PercentError};
use serde::{Deserialize, Serialize};

use crate::base::{non_blank, validate_upload, Contract, UploadInfo, ValidationResult};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressForm {
    #[serde(default)]
    pub progress_percent: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Progress form plus the optional photo that came with it
#[derive(Debug, Clone, Copy)]
pub struct ProgressSubmission<'a> {
    pub form: &'a ProgressForm,
    pub image: Option<UploadInfo<'a>>,
}

#[derive(Debug, Clone)]
pub struct AcceptedProgress {
    pub progress: Percent,
    pub comment: Option<String>,
}

pub struct ProgressContract {
    max_upload_size: usize,
}

impl ProgressContract {
    pub fn new(max_upload_size: usize) -> Self {
        Self { max_upload_size }
    }

    fn validate_percent(&self, raw: &str, errors: &mut ValidationErrors) -> Option<Percent> {
        if raw.trim().is_empty() {
            errors.add("progress_percent", "can't be blank");
            return None;
        }
        match raw.replace(',', ".").parse::<Percent>() {
            Ok(percent) => Some(percent),
            Err(PercentError::OutOfRange) => {
                errors.add("progress_percent", "must be between 0 and 100");
                None
            }
            Err(e) => {
                errors.add("progress_percent", e.to_string());
                None
            }
        }
    }

    fn validate_image(&self, image: Option<UploadInfo<'_>>, errors: &mut ValidationErrors) {
        validate_upload("image", image, false, self.max_upload_size, errors);
        if let Some(info) = image {
            let extension = info
                .file_name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase());
            let is_image = extension
                .as_deref()
                .map_or(false, |ext| IMAGE_EXTENSIONS.contains(&ext));
            if !is_image {
                errors.add("image", "must be an image file");
            }
        }
    }
}

impl<'a> Contract<ProgressSubmission<'a>> for ProgressContract {
    type Output = AcceptedProgress;

    fn validate(&self, input: &ProgressSubmission<'a>) -> ValidationResult<AcceptedProgress> {
        let mut errors = ValidationErrors::new();

        let progress = self.validate_percent(&input.form.progress_percent, &mut errors);
        self.validate_image(input.image, &mut errors);

        match progress {
            Some(progress) if errors.is_empty() => Ok(AcceptedProgress {
                progress,
                comment: non_blank(input.form.comment.as_deref()),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(percent: &str, image: Option<UploadInfo<'_>>) -> ValidationResult<AcceptedProgress> {
        let form = ProgressForm {
            progress_percent: percent.into(),
            comment: Some("Vaciado de losa".into()),
        };
        ProgressContract::new(1024).validate(&ProgressSubmission { form: &form, image })
    }

    #[test]
    fn test_accepts_bounds() {
        assert_eq!(submit("0", None).unwrap().progress.to_string(), "0.00");
        assert_eq!(submit("100", None).unwrap().progress.to_string(), "100.00");
        assert_eq!(submit("45,5", None).unwrap().progress.to_string(), "45.50");
    }

    #[test]
    fn test_rejects_out_of_range() {
        for raw in ["150", "-1", "100.01"] {
            let errors = submit(raw, None).unwrap_err();
            assert_eq!(
                errors.get("progress_percent"),
                Some(&vec!["must be between 0 and 100".to_string()])
            );
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(submit("", None).unwrap_err().has_error("progress_percent"));
        assert!(submit("mucho", None).unwrap_err().has_error("progress_percent"));
        assert!(submit("10.123", None).unwrap_err().has_error("progress_percent"));
    }

    #[test]
    fn test_image_checks() {
        let photo = UploadInfo { file_name: "losa.JPG", size: 10 };
        assert!(submit("50", Some(photo)).is_ok());

        let pdf = UploadInfo { file_name: "informe.pdf", size: 10 };
        assert!(submit("50", Some(pdf)).unwrap_err().has_error("image"));

        let huge = UploadInfo { file_name: "losa.png", size: 4096 };
        assert!(submit("50", Some(huge)).unwrap_err().has_error("image"));
    }
}
