//! User and profile models
//!
//! Tables: users, profiles

use chrono::{DateTime, Utc};
use ccr_core::traits::{Entity, Id, Identifiable};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::role::Role;

/// Login account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id,

    /// Login name (unique)
    pub username: String,

    pub email: String,
    pub first_name: String,
    pub last_name: String,

    /// argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// "First Last", falling back to the username
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl Identifiable for User {
    fn id(&self) -> Id {
        self.id
    }
}

impl Entity for User {
    const TABLE_NAME: &'static str = "users";
    const TYPE_NAME: &'static str = "User";
}

/// Role and contact details attached one-to-one to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Id,
    pub role: Role,
    pub phone: Option<String>,
    /// Company name, for client accounts
    pub company_name: Option<String>,
}

impl Profile {
    pub fn new(user_id: Id, role: Role) -> Self {
        Self {
            user_id,
            role,
            phone: None,
            company_name: None,
        }
    }
}

/// A user together with its profile, if one exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user: User,
    pub profile: Option<Profile>,
}

impl Account {
    /// Effective role; accounts without a profile are clients
    pub fn role(&self) -> Role {
        self.profile
            .as_ref()
            .map(|profile| profile.role)
            .unwrap_or_default()
    }

    pub fn id(&self) -> Id {
        self.user.id
    }
}

/// User row to insert, created together with its profile
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(max = 150))]
    pub first_name: String,

    #[validate(length(max = 150))]
    pub last_name: String,

    pub password_hash: String,
    pub role: Role,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(length(max = 100))]
    pub company_name: Option<String>,
}

/// Administrator edit of a profile; replaces all editable fields
#[derive(Debug, Clone, Validate)]
pub struct ProfileChanges {
    pub role: Role,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(length(max = 100))]
    pub company_name: Option<String>,
}
