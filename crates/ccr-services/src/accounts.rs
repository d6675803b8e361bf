//! Login, self-registration and the bootstrap administrator

use ccr_auth::{hash_password, verify_password};
use ccr_contracts::accounts::{LoginForm, RegistrationContract, RegistrationForm};
use ccr_contracts::Contract;
use ccr_core::config::BootstrapAdmin;
use ccr_core::error::{PortalError, ValidationErrors};
use ccr_core::result::PortalResult;
use ccr_db::RepositoryError;
use ccr_models::{Account, NewUser, ProfileChanges, Role};
use tracing::{info, instrument, warn};

use crate::context::ServiceContext;

pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub struct AccountService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AccountService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Check credentials; any failure is the same non-field error
    #[instrument(skip(self, form), fields(username = %form.username.trim()))]
    pub async fn login(&self, form: &LoginForm) -> PortalResult<Account> {
        let username = form.username.trim();
        let invalid = || {
            let mut errors = ValidationErrors::new();
            errors.add_base(INVALID_LOGIN);
            PortalError::Validation(errors)
        };

        if username.is_empty() || form.password.is_empty() {
            return Err(invalid());
        }

        let account = match self.ctx.stores.users.find_by_username(username).await? {
            Some(account) => account,
            None => {
                warn!("Login for unknown username");
                return Err(invalid());
            }
        };

        if !account.user.is_active || !verify_password(&form.password, &account.user.password_hash)
        {
            warn!(user_id = account.id(), "Login rejected");
            return Err(invalid());
        }

        self.ctx.stores.users.record_login(account.id()).await?;
        info!(user_id = account.id(), role = %account.role(), "User logged in");
        Ok(account)
    }

    /// Create a client account; a submitted role is never honoured
    #[instrument(skip(self, form), fields(username = %form.username.trim()))]
    pub async fn register(&self, form: &RegistrationForm) -> PortalResult<Account> {
        let contract = RegistrationContract::new(self.ctx.settings.password_min_length);
        let accepted = contract.validate(form);

        let username = form.username.trim();
        let taken = !username.is_empty() && self.ctx.stores.users.username_taken(username).await?;

        let registration = match (accepted, taken) {
            (Ok(registration), false) => registration,
            (result, taken) => {
                let mut errors = result.err().unwrap_or_default();
                if taken {
                    errors.add("username", USERNAME_TAKEN);
                }
                warn!(fields = ?errors.errors.keys().collect::<Vec<_>>(), "Registration rejected");
                return Err(errors.into());
            }
        };

        let password_hash = hash_password(&registration.password)?;
        let account = self
            .ctx
            .stores
            .users
            .create_account(NewUser {
                username: registration.username,
                email: registration.email,
                first_name: registration.first_name,
                last_name: registration.last_name,
                password_hash,
                role: Role::Client,
                phone: registration.phone,
                company_name: registration.company_name,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => PortalError::invalid("username", USERNAME_TAKEN),
                other => other.into(),
            })?;

        info!(user_id = account.id(), "Client registered");
        Ok(account)
    }

    /// Make sure the configured administrator exists and holds the ADMIN role
    #[instrument(skip(self, admin), fields(username = %admin.username))]
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> PortalResult<Account> {
        let users = &self.ctx.stores.users;

        if let Some(account) = users.find_by_username(&admin.username).await? {
            if account.role() == Role::Admin {
                return Ok(account);
            }
            let profile = account.profile.clone();
            let promoted = users
                .update_profile(
                    account.id(),
                    ProfileChanges {
                        role: Role::Admin,
                        phone: profile.as_ref().and_then(|p| p.phone.clone()),
                        company_name: profile.and_then(|p| p.company_name),
                    },
                )
                .await?;
            info!(user_id = promoted.id(), "Existing account promoted to administrator");
            return Ok(promoted);
        }

        let account = users
            .create_account(NewUser {
                username: admin.username.clone(),
                email: admin.email.clone(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: hash_password(&admin.password)?,
                role: Role::Admin,
                phone: None,
                company_name: None,
            })
            .await?;
        info!(user_id = account.id(), "Bootstrap administrator created");
        Ok(account)
    }
}
