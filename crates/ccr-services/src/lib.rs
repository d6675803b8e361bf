//! # ccr-services
//!
//! Business workflows for the CCR project portal.
//!
//! Every service method takes the caller as an explicit `CurrentUser` and
//! runs the same sequence: look the resource up (404), check the caller's
//! access (403), validate the submitted form (422), then persist. Nothing is
//! written when an earlier step fails.

pub mod accounts;
pub mod context;
pub mod dashboard;
pub mod documents;
pub mod media;
pub mod messaging;
pub mod progress;
pub mod projects;
pub mod result;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use accounts::AccountService;
pub use context::{ServiceContext, ServiceSettings};
pub use dashboard::{Dashboard, DashboardService};
pub use documents::{DocumentList, DocumentService};
pub use media::{MediaService, StoredFile};
pub use messaging::{ClientInbox, InboxEntry, MessageService, ReplyView};
pub use progress::{ProgressFormView, ProgressService};
pub use projects::{
    AssignedWorker, AssignmentPanel, ClientProjectView, ProjectAdminService, ProjectService,
    WorkerProjectView,
};
pub use result::ServiceOutcome;
pub use users::UserAdminService;
