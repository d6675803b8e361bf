//! Multipart form reading
//!
//! Uploads are read fully into memory; the router's body limit bounds them.

use std::collections::HashMap;

use axum::extract::Multipart;
use ccr_attachments::Upload;

use crate::error::{ApiError, ApiResult};

/// Text fields and files of one multipart submission
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read field {}: {}", name, e)))?;

            match file_name {
                // An empty file input is submitted as a nameless, empty part
                Some(file_name) if file_name.is_empty() && data.is_empty() => {}
                Some(file_name) => {
                    let mut upload = Upload::new(file_name, data);
                    upload.content_type = content_type;
                    form.files.insert(name, upload);
                }
                None => {
                    let text = String::from_utf8(data.to_vec())
                        .map_err(|_| ApiError::bad_request(format!("Field {} is not UTF-8", name)))?;
                    form.fields.insert(name, text);
                }
            }
        }

        tracing::debug!(
            fields = form.fields.len(),
            files = form.files.len(),
            "Multipart form read"
        );
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }

    /// Checkbox value; `None` when the field was not submitted
    pub fn flag(&self, name: &str) -> ApiResult<Option<bool>> {
        self.fields
            .get(name)
            .map(|value| {
                parse_flag(value)
                    .ok_or_else(|| ApiError::bad_request(format!("Invalid value for {}", name)))
            })
            .transpose()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("on"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_flag_absent_is_none() {
        let mut form = MultipartForm::default();
        assert_eq!(form.flag("visible_to_client").unwrap(), None);

        form.fields.insert("visible_to_client".into(), "false".into());
        assert_eq!(form.flag("visible_to_client").unwrap(), Some(false));

        form.fields.insert("visible_to_client".into(), "sometimes".into());
        assert!(form.flag("visible_to_client").is_err());
    }
}
