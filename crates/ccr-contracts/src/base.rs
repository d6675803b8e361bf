//! Base contract system

use ccr_core::error::ValidationErrors;
use chrono::NaiveDate;

/// Result of contract validation
pub type ValidationResult<T = ()> = Result<T, ValidationErrors>;

/// Base contract trait
///
/// `Output` is the typed form of the input once it has been accepted.
pub trait Contract<T>: Send + Sync {
    type Output;

    fn validate(&self, input: &T) -> ValidationResult<Self::Output>;
}

/// Metadata of an uploaded file, as seen by a contract
#[derive(Debug, Clone, Copy)]
pub struct UploadInfo<'a> {
    pub file_name: &'a str,
    pub size: usize,
}

/// Trimmed value, or `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Required text field with a maximum length in characters
pub fn validate_text(
    field: &str,
    value: &str,
    max: usize,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "can't be blank");
        return None;
    }
    validate_max_length(field, value, max, errors);
    Some(value.to_string())
}

pub fn validate_max_length(field: &str, value: &str, max: usize, errors: &mut ValidationErrors) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("is too long (maximum is {} characters)", max),
        );
    }
}

/// Optional `YYYY-MM-DD` date
pub fn parse_date(field: &str, value: Option<&str>, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let value = non_blank(value)?;
    match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "is not a valid date");
            None
        }
    }
}

/// Optional numeric id selected from a list
pub fn parse_id(field: &str, value: Option<&str>, errors: &mut ValidationErrors) -> Option<i64> {
    let value = non_blank(value)?;
    match value.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.add(field, "is not a valid choice");
            None
        }
    }
}

/// Size and presence checks for an uploaded file
pub fn validate_upload(
    field: &str,
    upload: Option<UploadInfo<'_>>,
    required: bool,
    max_size: usize,
    errors: &mut ValidationErrors,
) {
    match upload {
        None if required => errors.add(field, "is required"),
        None => {}
        Some(info) => {
            if info.file_name.trim().is_empty() {
                errors.add(field, "has no file name");
            }
            if info.size == 0 {
                errors.add(field, "is empty");
            } else if info.size > max_size {
                errors.add(
                    field,
                    format!("is too large (maximum is {} bytes)", max_size),
                );
            }
        }
    }
}

fn length_message(error: &validator::ValidationError) -> String {
    let count = error
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .map(|v| v.chars().count() as u64);
    let min = error.params.get("min").and_then(|v| v.as_u64());
    let max = error.params.get("max").and_then(|v| v.as_u64());
    match (count, min, max) {
        (Some(count), _, Some(max)) if count > max => {
            format!("is too long (maximum is {} characters)", max)
        }
        (_, Some(1), _) => "can't be blank".to_string(),
        (_, Some(min), _) => format!("is too short (minimum is {} characters)", min),
        _ => "has an invalid length".to_string(),
    }
}

/// Bridges `validator` derive errors into the portal's error collection
pub fn collect_validator_errors(source: &validator::ValidationErrors) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (field, field_errors) in source.field_errors() {
        for error in field_errors.iter() {
            let message = match error.code.as_ref() {
                "email" => "is not a valid email address".to_string(),
                "length" => length_message(error),
                _ => error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "is invalid".to_string()),
            };
            errors.add(field.to_string(), message);
        }
    }
    errors
}
