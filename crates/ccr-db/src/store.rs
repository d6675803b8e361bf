//! Store traits
//!
//! Services talk to storage only through these traits. `Stores` bundles one
//! implementation of each, either PostgreSQL-backed or in-memory.

use std::sync::Arc;

use async_trait::async_trait;
use ccr_core::traits::Id;
use ccr_models::{
    Account, Assignment, Document, Message, NewDocument, NewMessage, NewProject,
    NewProjectUpdate, NewUser, ProfileChanges, Project, ProjectChanges, ProjectUpdate, Role,
};
use sqlx::PgPool;

use crate::memory::MemoryStore;
use crate::repository::RepositoryResult;
use crate::{
    AssignmentRepository, DocumentRepository, MessageRepository, ProjectRepository,
    UpdateRepository, UserRepository,
};

/// Users and their profiles
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_account(&self, id: Id) -> RepositoryResult<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>>;

    /// Case-insensitive check used by registration
    async fn username_taken(&self, username: &str) -> RepositoryResult<bool>;

    /// Insert a user together with its profile
    async fn create_account(&self, new_user: NewUser) -> RepositoryResult<Account>;

    /// All accounts ordered by username
    async fn list_accounts(&self) -> RepositoryResult<Vec<Account>>;

    /// Accounts whose effective role is `role`, ordered by username
    async fn list_by_role(&self, role: Role) -> RepositoryResult<Vec<Account>>;

    /// Replace the profile's editable fields, creating the profile if missing
    async fn update_profile(&self, user_id: Id, changes: ProfileChanges) -> RepositoryResult<Account>;

    async fn record_login(&self, user_id: Id) -> RepositoryResult<()>;

    /// Delete a user; dependent rows follow the schema's referential actions
    async fn delete_user(&self, user_id: Id) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find(&self, id: Id) -> RepositoryResult<Option<Project>>;

    /// Most recently created first
    async fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<Project>>;

    /// Every project, most recently created first
    async fn list_all(&self) -> RepositoryResult<Vec<Project>>;

    async fn list_for_client(&self, client_id: Id) -> RepositoryResult<Vec<Project>>;

    /// Projects the worker is assigned to, most recently assigned first
    async fn list_for_worker(&self, worker_id: Id) -> RepositoryResult<Vec<Project>>;

    async fn create(&self, project: NewProject) -> RepositoryResult<Project>;

    /// Descriptive edit; never touches progress
    async fn update(&self, id: Id, changes: ProjectChanges) -> RepositoryResult<Project>;
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn is_assigned(&self, project_id: Id, worker_id: Id) -> RepositoryResult<bool>;

    /// Fails with `Conflict` when the pair already exists
    async fn assign(&self, project_id: Id, worker_id: Id) -> RepositoryResult<Assignment>;

    /// Returns whether an assignment was removed
    async fn unassign(&self, project_id: Id, worker_id: Id) -> RepositoryResult<bool>;

    async fn list_for_project(&self, project_id: Id) -> RepositoryResult<Vec<Assignment>>;
}

#[async_trait]
pub trait UpdateStore: Send + Sync {
    /// Insert the update and overwrite the project's progress atomically
    async fn record(&self, update: NewProjectUpdate) -> RepositoryResult<ProjectUpdate>;

    async fn find(&self, id: Id) -> RepositoryResult<Option<ProjectUpdate>>;

    /// Newest first
    async fn list_for_project(&self, project_id: Id) -> RepositoryResult<Vec<ProjectUpdate>>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, document: NewDocument) -> RepositoryResult<Document>;

    async fn find(&self, id: Id) -> RepositoryResult<Option<Document>>;

    /// Newest first; `visible_only` drops documents hidden from the client
    async fn list_for_project(&self, project_id: Id, visible_only: bool)
        -> RepositoryResult<Vec<Document>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, message: NewMessage) -> RepositoryResult<Message>;

    async fn find(&self, id: Id) -> RepositoryResult<Option<Message>>;

    /// Messages addressed to the user, newest first
    async fn list_received(&self, user_id: Id) -> RepositoryResult<Vec<Message>>;

    /// Messages sent by the user, newest first
    async fn list_sent(&self, user_id: Id) -> RepositoryResult<Vec<Message>>;

    /// Messages whose sender currently has the CLIENT role, newest first
    async fn list_from_clients(&self) -> RepositoryResult<Vec<Message>>;
}

/// One implementation of every store
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub updates: Arc<dyn UpdateStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            projects: Arc::new(ProjectRepository::new(pool.clone())),
            assignments: Arc::new(AssignmentRepository::new(pool.clone())),
            updates: Arc::new(UpdateRepository::new(pool.clone())),
            documents: Arc::new(DocumentRepository::new(pool.clone())),
            messages: Arc::new(MessageRepository::new(pool)),
        }
    }

    /// Every store backed by one shared `MemoryStore`
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            projects: store.clone(),
            assignments: store.clone(),
            updates: store.clone(),
            documents: store.clone(),
            messages: store,
        }
    }
}
