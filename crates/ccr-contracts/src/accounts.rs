//! Contracts for account forms: login, self-registration and the
//! administrator's profile edit.

use std::sync::LazyLock;

use ccr_core::error::ValidationErrors;
use ccr_models::{Account, ProfileChanges, Role};
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::base::{collect_validator_errors, non_blank, Contract, ValidationResult};

/// Letters, digits and `@ . + - _`
static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+\-]+$").expect("valid username pattern"));

pub const USERNAME_MAX_LENGTH: usize = 150;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Page to return to after logging in
    #[serde(default)]
    pub next: Option<String>,
}

/// Self-registration form
///
/// A `role` field may be posted but is never read; registration always
/// produces a client account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[serde(default)]
    #[validate(email)]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,

    #[serde(default, skip_serializing)]
    pub password1: String,

    #[serde(default, skip_serializing)]
    pub password2: String,

    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub company_name: Option<String>,
}

/// Accepted registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
}

pub struct RegistrationContract {
    password_min_length: usize,
}

impl RegistrationContract {
    pub fn new(password_min_length: usize) -> Self {
        Self {
            password_min_length,
        }
    }

    fn validate_username(&self, username: &str, errors: &mut ValidationErrors) {
        if !username.is_empty() && !USERNAME_PATTERN.is_match(username) {
            errors.add(
                "username",
                "may contain only letters, numbers, and @/./+/-/_ characters",
            );
        }
    }

    fn validate_password(&self, form: &RegistrationForm, errors: &mut ValidationErrors) {
        if form.password1.is_empty() {
            errors.add("password1", "can't be blank");
            return;
        }
        if form.password1.chars().count() < self.password_min_length {
            errors.add(
                "password1",
                format!(
                    "is too short (minimum is {} characters)",
                    self.password_min_length
                ),
            );
        }
        if form.password1.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password1", "can't be entirely numeric");
        }
        if form.password1 != form.password2 {
            errors.add("password2", "doesn't match the password");
        }
    }
}

impl Contract<RegistrationForm> for RegistrationContract {
    type Output = Registration;

    fn validate(&self, form: &RegistrationForm) -> ValidationResult<Registration> {
        let trimmed = RegistrationForm {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            phone: non_blank(form.phone.as_deref()),
            company_name: non_blank(form.company_name.as_deref()),
            ..form.clone()
        };

        let mut errors = match trimmed.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => collect_validator_errors(&e),
        };
        self.validate_username(&trimmed.username, &mut errors);
        self.validate_password(form, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Registration {
            username: trimmed.username,
            email: trimmed.email,
            first_name: trimmed.first_name,
            last_name: trimmed.last_name,
            password: form.password1.clone(),
            phone: trimmed.phone,
            company_name: trimmed.company_name,
        })
    }
}

/// Administrator edit of a user's role and contact details
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

impl From<&Account> for ProfileForm {
    fn from(account: &Account) -> Self {
        let profile = account.profile.as_ref();
        Self {
            role: account.role().as_str().to_string(),
            phone: profile.and_then(|p| p.phone.clone()),
            company_name: profile.and_then(|p| p.company_name.clone()),
        }
    }
}

pub struct ProfileContract;

impl Contract<ProfileForm> for ProfileContract {
    type Output = ProfileChanges;

    fn validate(&self, form: &ProfileForm) -> ValidationResult<ProfileChanges> {
        let mut errors = ValidationErrors::new();

        let role = match form.role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                errors.add("role", "is not a valid choice");
                None
            }
        };

        let changes = ProfileChanges {
            role: role.unwrap_or_default(),
            phone: non_blank(form.phone.as_deref()),
            company_name: non_blank(form.company_name.as_deref()),
        };
        if let Err(e) = changes.validate() {
            errors.merge(collect_validator_errors(&e));
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }
}
