//! Role gates
//!
//! Every protected operation names the role set it requires as an `Access`
//! value. Resource-level gates take the facts they need (assignment exists,
//! project owner, document visibility) and never touch storage themselves.

use ccr_core::error::PortalError;
use ccr_core::result::PortalResult;
use ccr_core::traits::Id;
use ccr_models::{Account, Document, Project, Role};
use serde::Serialize;

/// Role sets an operation can require
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Admin,
    /// Administrators and workers
    Staff,
    Worker,
    Client,
    Authenticated,
}

impl Access {
    pub fn permits(self, role: Role) -> bool {
        match (self, role) {
            (Access::Authenticated, _) => true,
            (Access::Admin, Role::Admin) => true,
            (Access::Admin, Role::Worker | Role::Client) => false,
            (Access::Staff, Role::Admin | Role::Worker) => true,
            (Access::Staff, Role::Client) => false,
            (Access::Worker, Role::Worker) => true,
            (Access::Worker, Role::Admin | Role::Client) => false,
            (Access::Client, Role::Client) => true,
            (Access::Client, Role::Admin | Role::Worker) => false,
        }
    }

    fn denial(self) -> &'static str {
        match self {
            Access::Admin => "Only administrators can access this page.",
            Access::Staff => "Only staff members can access this page.",
            Access::Worker => "Only workers can access this page.",
            Access::Client => "Only clients can access this page.",
            Access::Authenticated => "You must be logged in.",
        }
    }
}

/// The authenticated caller, resolved once per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl From<&Account> for CurrentUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.user.id,
            username: account.user.username.clone(),
            email: account.user.email.clone(),
            display_name: account.user.display_name(),
            role: account.role(),
        }
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn require(&self, access: Access) -> PortalResult<()> {
        if access.permits(self.role) {
            Ok(())
        } else {
            tracing::warn!(user_id = self.id, role = %self.role, ?access, "Access denied");
            Err(PortalError::forbidden(access.denial()))
        }
    }

    /// Worker view/update of a project requires an assignment
    pub fn authorize_worker_project(&self, project: &Project, assigned: bool) -> PortalResult<()> {
        self.require(Access::Worker)?;
        if assigned {
            Ok(())
        } else {
            tracing::warn!(user_id = self.id, project_id = project.id, "Worker not assigned");
            Err(PortalError::forbidden("You are not assigned to this project."))
        }
    }

    /// Client view of, or message about, a project requires ownership
    pub fn authorize_client_project(&self, project: &Project) -> PortalResult<()> {
        self.require(Access::Client)?;
        if project.is_owned_by(self.id) {
            Ok(())
        } else {
            tracing::warn!(user_id = self.id, project_id = project.id, "Client does not own project");
            Err(PortalError::forbidden("This project does not belong to you."))
        }
    }

    /// Staff may only reply to messages whose sender is a client
    pub fn authorize_reply(&self, sender_role: Option<Role>) -> PortalResult<()> {
        self.require(Access::Staff)?;
        match sender_role {
            Some(Role::Client) => Ok(()),
            Some(Role::Admin | Role::Worker) | None => Err(PortalError::forbidden(
                "You can only reply to messages sent by clients.",
            )),
        }
    }

    /// Staff read any document; the owning client reads visible ones
    pub fn authorize_document_download(
        &self,
        document: &Document,
        project: &Project,
    ) -> PortalResult<()> {
        match self.role {
            Role::Admin | Role::Worker => Ok(()),
            Role::Client if project.is_owned_by(self.id) && document.visible_to_client => Ok(()),
            Role::Client => Err(PortalError::forbidden(
                "You do not have access to this document.",
            )),
        }
    }

    /// Admins, assigned workers and the owning client read update images
    pub fn authorize_update_image(&self, project: &Project, assigned: bool) -> PortalResult<()> {
        let allowed = match self.role {
            Role::Admin => true,
            Role::Worker => assigned,
            Role::Client => project.is_owned_by(self.id),
        };
        if allowed {
            Ok(())
        } else {
            Err(PortalError::forbidden("You do not have access to this image."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccr_core::types::Percent;
    use chrono::{NaiveDate, Utc};

    fn user(id: Id, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            display_name: format!("user{}", id),
            role,
        }
    }

    fn project(client_id: Option<Id>) -> Project {
        Project {
            id: 10,
            name: "Edificio Central".into(),
            description: None,
            address: "Calle 1".into(),
            city: "Cusco".into(),
            status: Default::default(),
            progress: Percent::ZERO,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            estimated_end_date: None,
            actual_end_date: None,
            client_id,
            created_by_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn document(visible: bool) -> Document {
        Document {
            id: 1,
            project_id: 10,
            uploaded_by_id: Some(1),
            title: "Planos".into(),
            file_path: "project_documents/10/planos.pdf".into(),
            uploaded_at: Utc::now(),
            visible_to_client: visible,
        }
    }

    #[test]
    fn test_access_matrix() {
        assert!(Access::Admin.permits(Role::Admin));
        assert!(!Access::Admin.permits(Role::Worker));
        assert!(Access::Staff.permits(Role::Worker));
        assert!(!Access::Staff.permits(Role::Client));
        assert!(!Access::Worker.permits(Role::Admin));
        assert!(!Access::Client.permits(Role::Admin));
        for role in Role::ALL {
            assert!(Access::Authenticated.permits(role));
        }
    }

    #[test]
    fn test_require_returns_forbidden() {
        let err = user(1, Role::Client).require(Access::Staff).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_worker_needs_assignment() {
        let worker = user(2, Role::Worker);
        assert!(worker.authorize_worker_project(&project(None), true).is_ok());
        assert!(worker.authorize_worker_project(&project(None), false).is_err());
        assert!(user(1, Role::Admin)
            .authorize_worker_project(&project(None), true)
            .is_err());
    }

    #[test]
    fn test_client_needs_ownership() {
        let client = user(3, Role::Client);
        assert!(client.authorize_client_project(&project(Some(3))).is_ok());
        assert!(client.authorize_client_project(&project(Some(4))).is_err());
        assert!(client.authorize_client_project(&project(None)).is_err());
    }

    #[test]
    fn test_reply_only_to_clients() {
        let worker = user(2, Role::Worker);
        assert!(worker.authorize_reply(Some(Role::Client)).is_ok());
        assert!(worker.authorize_reply(Some(Role::Worker)).is_err());
        assert!(worker.authorize_reply(Some(Role::Admin)).is_err());
        assert!(user(3, Role::Client).authorize_reply(Some(Role::Client)).is_err());
    }

    #[test]
    fn test_document_download() {
        let owner = user(3, Role::Client);
        let stranger = user(4, Role::Client);
        let p = project(Some(3));

        assert!(user(2, Role::Worker)
            .authorize_document_download(&document(false), &p)
            .is_ok());
        assert!(owner.authorize_document_download(&document(true), &p).is_ok());
        assert!(owner.authorize_document_download(&document(false), &p).is_err());
        assert!(stranger.authorize_document_download(&document(true), &p).is_err());
    }

    #[test]
    fn test_update_image() {
        let p = project(Some(3));
        assert!(user(1, Role::Admin).authorize_update_image(&p, false).is_ok());
        assert!(user(2, Role::Worker).authorize_update_image(&p, true).is_ok());
        assert!(user(2, Role::Worker).authorize_update_image(&p, false).is_err());
        assert!(user(3, Role::Client).authorize_update_image(&p, false).is_ok());
        assert!(user(4, Role::Client).authorize_update_image(&p, false).is_err());
    }
}
