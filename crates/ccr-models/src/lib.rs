//! # ccr-models
//!
//! Domain models for the CCR project portal.
//!
//! Each persisted model implements the core traits from `ccr-core`
//! (`Entity`, `Identifiable`). `New*` structs describe rows about to be
//! inserted and carry no id.

pub use ccr_core::traits::{Entity, Id, Identifiable, ProjectScoped};

pub mod assignment;
pub mod document;
pub mod message;
pub mod project;
pub mod role;
pub mod update;
pub mod user;

pub use assignment::Assignment;
pub use document::{Document, NewDocument};
pub use message::{Message, NewMessage};
pub use project::{NewProject, Project, ProjectChanges, ProjectStatus};
pub use role::Role;
pub use update::{NewProjectUpdate, ProjectUpdate};
pub use user::{Account, NewUser, Profile, ProfileChanges, User};
