//! Worker progress updates
//!
//! An accepted update overwrites the project's progress with the submitted
//! value. The last committed update wins.

use ccr_attachments::{ArtifactKind, Upload};
use ccr_auth::CurrentUser;
use ccr_contracts::progress::{ProgressContract, ProgressForm, ProgressSubmission};
use ccr_contracts::Contract;
use ccr_core::result::PortalResult;
use ccr_core::traits::Id;
use ccr_models::{NewProjectUpdate, Project, ProjectUpdate};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::context::{upload_info, ServiceContext};
use crate::result::ServiceOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct ProgressFormView {
    pub project: Project,
    /// Pre-filled with the project's current progress
    pub form: ProgressForm,
}

pub struct ProgressService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProgressService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    async fn authorized_project(&self, user: &CurrentUser, id: Id) -> PortalResult<Project> {
        let project = self.ctx.project(id).await?;
        let assigned = self.ctx.stores.assignments.is_assigned(id, user.id).await?;
        user.authorize_worker_project(&project, assigned)?;
        Ok(project)
    }

    pub async fn form(&self, user: &CurrentUser, id: Id) -> PortalResult<ProgressFormView> {
        let project = self.authorized_project(user, id).await?;
        let form = ProgressForm {
            progress_percent: project.progress.to_string(),
            comment: None,
        };
        Ok(ProgressFormView { project, form })
    }

    #[instrument(skip(self, user, form, image), fields(user_id = user.id))]
    pub async fn submit(
        &self,
        user: &CurrentUser,
        id: Id,
        form: &ProgressForm,
        image: Option<Upload>,
    ) -> PortalResult<ServiceOutcome<ProjectUpdate>> {
        let project = self.authorized_project(user, id).await?;

        let submission = ProgressSubmission {
            form,
            image: upload_info(image.as_ref()),
        };
        let accepted = ProgressContract::new(self.ctx.settings.max_upload_size)
            .validate(&submission)
            .map_err(|errors| {
                warn!(project_id = id, errors = %errors, "Progress update rejected");
                errors
            })?;

        let image_path = match image.as_ref() {
            Some(upload) => Some(
                self.ctx
                    .store_upload(ArtifactKind::ProjectUpdates, &project, upload)
                    .await?,
            ),
            None => None,
        };

        let recorded = self
            .ctx
            .stores
            .updates
            .record(NewProjectUpdate {
                project_id: id,
                author_id: user.id,
                progress: accepted.progress,
                comment: accepted.comment,
                image_path: image_path.clone(),
            })
            .await;

        let update = match recorded {
            Ok(update) => update,
            Err(e) => {
                if let Some(key) = image_path {
                    self.ctx.discard_upload(&key).await;
                }
                return Err(e.into());
            }
        };

        info!(project_id = id, update_id = update.id, progress = %update.progress, "Progress recorded");
        let message = format!(
            "Progress recorded for \"{}\" ({}%).",
            project.name, update.progress
        );
        Ok(ServiceOutcome::success_with_message(update, message))
    }
}
