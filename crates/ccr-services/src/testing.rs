//! Fixtures shared by the service tests

use std::sync::Arc;

use ccr_attachments::MemoryStorage;
use ccr_auth::CurrentUser;
use ccr_core::traits::Id;
use ccr_db::Stores;
use ccr_models::{Account, NewProject, NewUser, Project, Role};
use chrono::NaiveDate;

use crate::context::{ServiceContext, ServiceSettings};

pub struct Portal {
    pub ctx: ServiceContext,
    pub storage: Arc<MemoryStorage>,
    pub admin: CurrentUser,
    pub worker: CurrentUser,
    pub other_worker: CurrentUser,
    pub client: CurrentUser,
    pub other_client: CurrentUser,
    /// Owned by `client`, `worker` assigned
    pub project: Project,
}

pub async fn create_account(ctx: &ServiceContext, username: &str, role: Role) -> Account {
    ctx.stores
        .users
        .create_account(NewUser {
            username: username.into(),
            email: format!("{}@example.com", username),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "not-a-hash".into(),
            role,
            phone: None,
            company_name: None,
        })
        .await
        .unwrap()
}

pub async fn create_project(ctx: &ServiceContext, name: &str, client_id: Option<Id>) -> Project {
    ctx.stores
        .projects
        .create(NewProject {
            name: name.into(),
            description: None,
            address: "Av. Ejercito 710".into(),
            city: "Arequipa".into(),
            status: Default::default(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            estimated_end_date: None,
            actual_end_date: None,
            client_id,
            created_by_id: None,
        })
        .await
        .unwrap()
}

pub async fn portal() -> Portal {
    let storage = Arc::new(MemoryStorage::new());
    let ctx = ServiceContext::new(Stores::memory(), storage.clone(), ServiceSettings::default());

    let admin = create_account(&ctx, "admin", Role::Admin).await;
    let worker = create_account(&ctx, "obrero", Role::Worker).await;
    let other_worker = create_account(&ctx, "obrero2", Role::Worker).await;
    let client = create_account(&ctx, "cliente", Role::Client).await;
    let other_client = create_account(&ctx, "cliente2", Role::Client).await;

    let project = create_project(&ctx, "Residencial Los Pinos", Some(client.id())).await;
    ctx.stores
        .assignments
        .assign(project.id, worker.id())
        .await
        .unwrap();

    Portal {
        ctx,
        storage,
        admin: CurrentUser::from(&admin),
        worker: CurrentUser::from(&worker),
        other_worker: CurrentUser::from(&other_worker),
        client: CurrentUser::from(&client),
        other_client: CurrentUser::from(&other_client),
        project,
    }
}
