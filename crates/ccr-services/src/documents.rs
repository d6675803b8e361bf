//! Staff document management

use ccr_attachments::{ArtifactKind, Upload};
use ccr_auth::{Access, CurrentUser};
use ccr_contracts::documents::{DocumentContract, DocumentForm, DocumentSubmission};
use ccr_contracts::Contract;
use ccr_core::error::PortalError;
use ccr_core::result::PortalResult;
use ccr_core::traits::Id;
use ccr_models::{Document, NewDocument, Project};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::context::{upload_info, ServiceContext};
use crate::result::ServiceOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentList {
    pub project: Project,
    pub documents: Vec<Document>,
}

pub struct DocumentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DocumentService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    async fn staff_project(&self, user: &CurrentUser, project_id: Id) -> PortalResult<Project> {
        let project = self.ctx.project(project_id).await?;
        user.require(Access::Staff)?;
        Ok(project)
    }

    /// All documents of a project, hidden ones included
    pub async fn list(&self, user: &CurrentUser, project_id: Id) -> PortalResult<DocumentList> {
        let project = self.staff_project(user, project_id).await?;
        let documents = self
            .ctx
            .stores
            .documents
            .list_for_project(project_id, false)
            .await?;
        Ok(DocumentList { project, documents })
    }

    pub async fn upload_form(&self, user: &CurrentUser, project_id: Id) -> PortalResult<Project> {
        self.staff_project(user, project_id).await
    }

    #[instrument(skip(self, user, form, file), fields(user_id = user.id))]
    pub async fn upload(
        &self,
        user: &CurrentUser,
        project_id: Id,
        form: &DocumentForm,
        file: Option<Upload>,
    ) -> PortalResult<ServiceOutcome<Document>> {
        let project = self.staff_project(user, project_id).await?;

        let submission = DocumentSubmission {
            form,
            file: upload_info(file.as_ref()),
        };
        let accepted = DocumentContract::new(self.ctx.settings.max_upload_size)
            .validate(&submission)
            .map_err(|errors| {
                warn!(project_id, errors = %errors, "Document upload rejected");
                errors
            })?;

        let Some(file) = file else {
            return Err(PortalError::invalid("file", "is required"));
        };
        let key = self
            .ctx
            .store_upload(ArtifactKind::ProjectDocuments, &project, &file)
            .await?;

        let created = self
            .ctx
            .stores
            .documents
            .create(NewDocument {
                project_id,
                uploaded_by_id: user.id,
                title: accepted.title,
                file_path: key.clone(),
                visible_to_client: accepted.visible_to_client,
            })
            .await;

        let document = match created {
            Ok(document) => document,
            Err(e) => {
                self.ctx.discard_upload(&key).await;
                return Err(e.into());
            }
        };

        info!(
            project_id,
            document_id = document.id,
            visible_to_client = document.visible_to_client,
            "Document uploaded"
        );
        let message = format!("Document \"{}\" uploaded.", document.title);
        Ok(ServiceOutcome::success_with_message(document, message))
    }
}
