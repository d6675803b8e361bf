//! Role-branched project listing shown after login

use ccr_auth::CurrentUser;
use ccr_core::result::PortalResult;
use ccr_models::{Project, Role};
use serde::Serialize;

use crate::context::ServiceContext;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub role: Role,
    pub projects: Vec<Project>,
}

pub struct DashboardService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DashboardService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn load(&self, user: &CurrentUser) -> PortalResult<Dashboard> {
        let projects = &self.ctx.stores.projects;
        let listed = match user.role {
            Role::Admin => {
                projects
                    .list_recent(self.ctx.settings.dashboard_recent_limit)
                    .await?
            }
            Role::Worker => projects.list_for_worker(user.id).await?,
            Role::Client => projects.list_for_client(user.id).await?,
        };

        tracing::debug!(user_id = user.id, role = %user.role, count = listed.len(), "Dashboard loaded");
        Ok(Dashboard {
            role: user.role,
            projects: listed,
        })
    }
}
