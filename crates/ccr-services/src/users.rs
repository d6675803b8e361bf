//! Administrator user management

use ccr_auth::{Access, CurrentUser};
use ccr_contracts::accounts::{ProfileContract, ProfileForm};
use ccr_contracts::Contract;
use ccr_core::error::PortalError;
use ccr_core::result::PortalResult;
use ccr_core::traits::Id;
use ccr_models::Account;
use tracing::{info, instrument};

use crate::context::ServiceContext;
use crate::result::ServiceOutcome;

pub struct UserAdminService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UserAdminService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Every account, ordered by username
    pub async fn list(&self, user: &CurrentUser) -> PortalResult<Vec<Account>> {
        user.require(Access::Admin)?;
        Ok(self.ctx.stores.users.list_accounts().await?)
    }

    pub async fn get(&self, user: &CurrentUser, id: Id) -> PortalResult<Account> {
        let account = self.ctx.account(id).await?;
        user.require(Access::Admin)?;
        Ok(account)
    }

    #[instrument(skip(self, user, form), fields(admin_id = user.id))]
    pub async fn update_profile(
        &self,
        user: &CurrentUser,
        id: Id,
        form: &ProfileForm,
    ) -> PortalResult<ServiceOutcome<Account>> {
        let account = self.ctx.account(id).await?;
        user.require(Access::Admin)?;
        let changes = ProfileContract.validate(form)?;

        let updated = self.ctx.stores.users.update_profile(id, changes).await?;
        info!(user_id = id, role = %updated.role(), "Profile updated");

        Ok(ServiceOutcome::success_with_message(
            updated,
            format!("Profile for {} updated.", account.user.username),
        ))
    }

    /// Delete an account; administrators cannot delete themselves
    #[instrument(skip(self, user), fields(admin_id = user.id))]
    pub async fn delete(&self, user: &CurrentUser, id: Id) -> PortalResult<ServiceOutcome<Account>> {
        let account = self.ctx.account(id).await?;
        user.require(Access::Admin)?;
        if account.id() == user.id {
            return Err(PortalError::forbidden("You cannot delete your own account."));
        }

        self.ctx.stores.users.delete_user(id).await?;
        info!(user_id = id, "User deleted by administrator");

        let message = format!("User {} deleted.", account.user.username);
        Ok(ServiceOutcome::success_with_message(account, message))
    }
}
