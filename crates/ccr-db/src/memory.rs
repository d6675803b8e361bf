//! In-memory store
//!
//! Implements every store trait over plain vectors behind one lock. Used by
//! service and router tests, and by the server when no database is wanted.
//! Referential actions of the schema (cascade and set-null on user delete,
//! unique usernames and assignments) are reproduced here.

use std::collections::HashMap;

use async_trait::async_trait;
use ccr_core::traits::Id;
use ccr_core::types::Percent;
use ccr_models::{
    Account, Assignment, Document, Message, NewDocument, NewMessage, NewProject,
    NewProjectUpdate, NewUser, Profile, ProfileChanges, Project, ProjectChanges, ProjectUpdate,
    Role, User,
};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::repository::{RepositoryError, RepositoryResult};
use crate::store::{
    AssignmentStore, DocumentStore, MessageStore, ProjectStore, UpdateStore, UserStore,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    profiles: HashMap<Id, Profile>,
    projects: Vec<Project>,
    assignments: Vec<Assignment>,
    updates: Vec<ProjectUpdate>,
    documents: Vec<Document>,
    messages: Vec<Message>,
    next_id: Id,
}

impl Tables {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn account(&self, user: &User) -> Account {
        Account {
            user: user.clone(),
            profile: self.profiles.get(&user.id).cloned(),
        }
    }

    fn find_account(&self, id: Id) -> Option<Account> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| self.account(u))
    }

    fn role_of(&self, user_id: Id) -> Role {
        self.profiles
            .get(&user_id)
            .map(|p| p.role)
            .unwrap_or_default()
    }

    fn accounts_sorted(&self, filter: impl Fn(&User) -> bool) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .users
            .iter()
            .filter(|u| filter(u))
            .map(|u| self.account(u))
            .collect();
        accounts.sort_by(|a, b| a.user.username.cmp(&b.user.username));
        accounts
    }
}

fn newest_projects_first(projects: &mut [Project]) {
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn newest_messages_first(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));
    messages
}

/// Store holding every table in memory
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_account(&self, id: Id) -> RepositoryResult<Option<Account>> {
        Ok(self.tables.read().await.find_account(id))
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| tables.account(u)))
    }

    async fn username_taken(&self, username: &str) -> RepositoryResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .any(|u| u.username.to_lowercase() == username.to_lowercase()))
    }

    async fn create_account(&self, new_user: NewUser) -> RepositoryResult<Account> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.username.to_lowercase() == new_user.username.to_lowercase())
        {
            return Err(RepositoryError::Conflict(
                "A user with that username already exists.".into(),
            ));
        }

        let id = tables.next_id();
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        };
        tables.profiles.insert(
            id,
            Profile {
                user_id: id,
                role: new_user.role,
                phone: new_user.phone,
                company_name: new_user.company_name,
            },
        );
        tables.users.push(user);

        tables
            .find_account(id)
            .ok_or_else(|| RepositoryError::not_found::<User>(id))
    }

    async fn list_accounts(&self) -> RepositoryResult<Vec<Account>> {
        Ok(self.tables.read().await.accounts_sorted(|_| true))
    }

    async fn list_by_role(&self, role: Role) -> RepositoryResult<Vec<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts_sorted(|u| tables.role_of(u.id) == role))
    }

    async fn update_profile(&self, user_id: Id, changes: ProfileChanges) -> RepositoryResult<Account> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(RepositoryError::not_found::<User>(user_id));
        }

        tables.profiles.insert(
            user_id,
            Profile {
                user_id,
                role: changes.role,
                phone: changes.phone,
                company_name: changes.company_name,
            },
        );

        tables
            .find_account(user_id)
            .ok_or_else(|| RepositoryError::not_found::<User>(user_id))
    }

    async fn record_login(&self, user_id: Id) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Id) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != user_id);
        if tables.users.len() == before {
            return Err(RepositoryError::not_found::<User>(user_id));
        }

        tables.profiles.remove(&user_id);
        tables.assignments.retain(|a| a.worker_id != user_id);
        tables.messages.retain(|m| m.sender_id != user_id);

        for project in tables.projects.iter_mut() {
            if project.client_id == Some(user_id) {
                project.client_id = None;
            }
            if project.created_by_id == Some(user_id) {
                project.created_by_id = None;
            }
        }
        for update in tables.updates.iter_mut() {
            if update.author_id == Some(user_id) {
                update.author_id = None;
            }
        }
        for document in tables.documents.iter_mut() {
            if document.uploaded_by_id == Some(user_id) {
                document.uploaded_by_id = None;
            }
        }
        for message in tables.messages.iter_mut() {
            if message.receiver_id == Some(user_id) {
                message.receiver_id = None;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn find(&self, id: Id) -> RepositoryResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<Project>> {
        let mut projects = self.list_all().await?;
        projects.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(projects)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Project>> {
        let mut projects = self.tables.read().await.projects.clone();
        newest_projects_first(&mut projects);
        Ok(projects)
    }

    async fn list_for_client(&self, client_id: Id) -> RepositoryResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .tables
            .read()
            .await
            .projects
            .iter()
            .filter(|p| p.is_owned_by(client_id))
            .cloned()
            .collect();
        newest_projects_first(&mut projects);
        Ok(projects)
    }

    async fn list_for_worker(&self, worker_id: Id) -> RepositoryResult<Vec<Project>> {
        let tables = self.tables.read().await;
        let mut assignments: Vec<&Assignment> = tables
            .assignments
            .iter()
            .filter(|a| a.worker_id == worker_id)
            .collect();
        assignments.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at).then(b.id.cmp(&a.id)));

        Ok(assignments
            .into_iter()
            .filter_map(|a| tables.projects.iter().find(|p| p.id == a.project_id))
            .cloned()
            .collect())
    }

    async fn create(&self, project: NewProject) -> RepositoryResult<Project> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let now = Utc::now();
        let project = Project {
            id,
            name: project.name,
            description: project.description,
            address: project.address,
            city: project.city,
            status: project.status,
            progress: Percent::ZERO,
            start_date: project.start_date,
            estimated_end_date: project.estimated_end_date,
            actual_end_date: project.actual_end_date,
            client_id: project.client_id,
            created_by_id: project.created_by_id,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());
        Ok(project)
    }

    async fn update(&self, id: Id, changes: ProjectChanges) -> RepositoryResult<Project> {
        let mut tables = self.tables.write().await;
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepositoryError::not_found::<Project>(id))?;
        changes.apply_to(project);
        project.updated_at = Utc::now();
        Ok(project.clone())
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn is_assigned(&self, project_id: Id, worker_id: Id) -> RepositoryResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .iter()
            .any(|a| a.project_id == project_id && a.worker_id == worker_id))
    }

    async fn assign(&self, project_id: Id, worker_id: Id) -> RepositoryResult<Assignment> {
        let mut tables = self.tables.write().await;
        if !tables.projects.iter().any(|p| p.id == project_id) {
            return Err(RepositoryError::not_found::<Project>(project_id));
        }
        if tables
            .assignments
            .iter()
            .any(|a| a.project_id == project_id && a.worker_id == worker_id)
        {
            return Err(RepositoryError::Conflict(
                "This worker is already assigned to the project.".into(),
            ));
        }

        let assignment = Assignment {
            id: tables.next_id(),
            project_id,
            worker_id,
            assigned_at: Utc::now(),
        };
        tables.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn unassign(&self, project_id: Id, worker_id: Id) -> RepositoryResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.assignments.len();
        tables
            .assignments
            .retain(|a| !(a.project_id == project_id && a.worker_id == worker_id));
        Ok(tables.assignments.len() < before)
    }

    async fn list_for_project(&self, project_id: Id) -> RepositoryResult<Vec<Assignment>> {
        let tables = self.tables.read().await;
        let mut assignments: Vec<Assignment> = tables
            .assignments
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect();
        assignments.sort_by(|a, b| a.assigned_at.cmp(&b.assigned_at).then(a.id.cmp(&b.id)));
        Ok(assignments)
    }
}

#[async_trait]
impl UpdateStore for MemoryStore {
    async fn record(&self, update: NewProjectUpdate) -> RepositoryResult<ProjectUpdate> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let now = Utc::now();

        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == update.project_id)
            .ok_or_else(|| RepositoryError::not_found::<Project>(update.project_id))?;
        project.progress = update.progress;
        project.updated_at = now;

        let update = ProjectUpdate {
            id,
            project_id: update.project_id,
            author_id: Some(update.author_id),
            date: now.date_naive(),
            progress: update.progress,
            comment: update.comment,
            image_path: update.image_path,
            created_at: now,
        };
        tables.updates.push(update.clone());
        Ok(update)
    }

    async fn find(&self, id: Id) -> RepositoryResult<Option<ProjectUpdate>> {
        let tables = self.tables.read().await;
        Ok(tables.updates.iter().find(|u| u.id == id).cloned())
    }

    async fn list_for_project(&self, project_id: Id) -> RepositoryResult<Vec<ProjectUpdate>> {
        let tables = self.tables.read().await;
        let mut updates: Vec<ProjectUpdate> = tables
            .updates
            .iter()
            .filter(|u| u.project_id == project_id)
            .cloned()
            .collect();
        updates.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(updates)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, document: NewDocument) -> RepositoryResult<Document> {
        let mut tables = self.tables.write().await;
        if !tables.projects.iter().any(|p| p.id == document.project_id) {
            return Err(RepositoryError::not_found::<Project>(document.project_id));
        }

        let document = Document {
            id: tables.next_id(),
            project_id: document.project_id,
            uploaded_by_id: Some(document.uploaded_by_id),
            title: document.title,
            file_path: document.file_path,
            uploaded_at: Utc::now(),
            visible_to_client: document.visible_to_client,
        };
        tables.documents.push(document.clone());
        Ok(document)
    }

    async fn find(&self, id: Id) -> RepositoryResult<Option<Document>> {
        let tables = self.tables.read().await;
        Ok(tables.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn list_for_project(
        &self,
        project_id: Id,
        visible_only: bool,
    ) -> RepositoryResult<Vec<Document>> {
        let tables = self.tables.read().await;
        let mut documents: Vec<Document> = tables
            .documents
            .iter()
            .filter(|d| d.project_id == project_id && (d.visible_to_client || !visible_only))
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        Ok(documents)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, message: NewMessage) -> RepositoryResult<Message> {
        let mut tables = self.tables.write().await;
        let message = Message {
            id: tables.next_id(),
            project_id: message.project_id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            subject: message.subject,
            body: message.body,
            sent_at: Utc::now(),
            is_read: false,
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn find(&self, id: Id) -> RepositoryResult<Option<Message>> {
        let tables = self.tables.read().await;
        Ok(tables.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_received(&self, user_id: Id) -> RepositoryResult<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(newest_messages_first(
            tables
                .messages
                .iter()
                .filter(|m| m.receiver_id == Some(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_sent(&self, user_id: Id) -> RepositoryResult<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(newest_messages_first(
            tables
                .messages
                .iter()
                .filter(|m| m.sender_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_from_clients(&self) -> RepositoryResult<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(newest_messages_first(
            tables
                .messages
                .iter()
                .filter(|m| tables.role_of(m.sender_id) == Role::Client)
                .cloned()
                .collect(),
        ))
    }
}
