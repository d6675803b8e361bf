//! # ccr-db
//!
//! Persistence layer for the CCR project portal.
//!
//! - Connection pool management and schema migrations
//! - One store trait per aggregate (`UserStore`, `ProjectStore`, ...)
//! - PostgreSQL repositories implementing the store traits with SQLx
//! - `MemoryStore`, an in-process implementation of every store used by tests
//!
//! ## Example
//!
//! ```ignore
//! use ccr_db::{Database, Stores};
//!
//! let db = Database::connect(&config.database).await?;
//! db.migrate().await?;
//! let stores = Stores::postgres(db.pool().clone());
//! let project = stores.projects.find(1).await?;
//! ```

pub mod assignments;
pub mod documents;
pub mod memory;
pub mod messages;
pub mod pool;
pub mod projects;
pub mod repository;
pub mod store;
pub mod updates;
pub mod users;

pub use assignments::AssignmentRepository;
pub use documents::DocumentRepository;
pub use memory::MemoryStore;
pub use messages::MessageRepository;
pub use pool::{Database, PoolStats};
pub use projects::ProjectRepository;
pub use repository::{RepositoryError, RepositoryResult};
pub use store::{
    AssignmentStore, DocumentStore, MessageStore, ProjectStore, Stores, UpdateStore, UserStore,
};
pub use updates::UpdateRepository;
pub use users::UserRepository;
