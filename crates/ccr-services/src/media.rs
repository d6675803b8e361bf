//! Authorized reads of stored files
//!
//! Uploaded files are never served straight from the media directory; every
//! download goes through the same access rules as the page that links to it.

use bytes::Bytes;
use ccr_attachments::storage::guess_content_type;
use ccr_attachments::{display_name, StorageError};
use ccr_auth::CurrentUser;
use ccr_core::error::PortalError;
use ccr_core::result::PortalResult;
use ccr_core::traits::{Entity, Id};
use ccr_models::{Document, ProjectUpdate};
use tracing::{debug, error};

use crate::context::ServiceContext;

/// File contents ready to be sent to the browser
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

pub struct MediaService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MediaService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    async fn read<E: Entity>(&self, id: Id, key: &str) -> PortalResult<StoredFile> {
        let data = match self.ctx.storage.get(key).await {
            Ok(data) => data,
            Err(StorageError::NotFound(_)) => {
                error!(entity = E::TYPE_NAME, id, key = %key, "Stored file is missing");
                return Err(PortalError::not_found::<E>(id));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(key = %key, size = data.len(), "Serving stored file");
        Ok(StoredFile {
            file_name: display_name(key).to_string(),
            content_type: guess_content_type(key),
            data,
        })
    }

    pub async fn document(&self, user: &CurrentUser, id: Id) -> PortalResult<StoredFile> {
        let document = self
            .ctx
            .stores
            .documents
            .find(id)
            .await?
            .ok_or_else(|| PortalError::not_found::<Document>(id))?;
        let project = self.ctx.project(document.project_id).await?;
        user.authorize_document_download(&document, &project)?;

        self.read::<Document>(id, &document.file_path).await
    }

    pub async fn update_image(&self, user: &CurrentUser, id: Id) -> PortalResult<StoredFile> {
        let update = self
            .ctx
            .stores
            .updates
            .find(id)
            .await?
            .ok_or_else(|| PortalError::not_found::<ProjectUpdate>(id))?;
        let Some(key) = update.image_path else {
            return Err(PortalError::not_found::<ProjectUpdate>(id));
        };
        let project = self.ctx.project(update.project_id).await?;
        let assigned = self
            .ctx
            .stores
            .assignments
            .is_assigned(project.id, user.id)
            .await?;
        user.authorize_update_image(&project, assigned)?;

        self.read::<ProjectUpdate>(id, &key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccr_attachments::{Storage, Upload};
    use ccr_contracts::documents::DocumentForm;
    use ccr_contracts::progress::ProgressForm;

    use crate::documents::DocumentService;
    use crate::progress::ProgressService;
    use crate::testing::{portal, Portal};

    async fn upload_document(p: &Portal, visible: bool) -> Document {
        DocumentService::new(&p.ctx)
            .upload(
                &p.admin,
                p.project.id,
                &DocumentForm {
                    title: "Planos".into(),
                    visible_to_client: Some(visible),
                },
                Some(Upload::new("planos.pdf", &b"%PDF-1.4"[..])),
            )
            .await
            .unwrap()
            .into_result()
    }

    #[tokio::test]
    async fn test_document_download() {
        let p = portal().await;
        let document = upload_document(&p, true).await;
        let media = MediaService::new(&p.ctx);

        let file = media.document(&p.client, document.id).await.unwrap();
        assert_eq!(file.file_name, "planos.pdf");
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(&file.data[..], b"%PDF-1.4");

        assert!(media.document(&p.other_worker, document.id).await.is_ok());
        assert_eq!(
            media.document(&p.other_client, document.id).await.unwrap_err().status_code(),
            403
        );
    }

    #[tokio::test]
    async fn test_hidden_document_is_staff_only() {
        let p = portal().await;
        let document = upload_document(&p, false).await;
        let media = MediaService::new(&p.ctx);

        assert_eq!(
            media.document(&p.client, document.id).await.unwrap_err().status_code(),
            403
        );
        assert!(media.document(&p.worker, document.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let p = portal().await;
        let document = upload_document(&p, true).await;
        p.storage.delete(&document.file_path).await.unwrap();

        let media = MediaService::new(&p.ctx);
        assert_eq!(
            media.document(&p.admin, document.id).await.unwrap_err().status_code(),
            404
        );
        assert_eq!(media.document(&p.admin, 9_999).await.unwrap_err().status_code(), 404);
    }

    #[tokio::test]
    async fn test_update_image_access() {
        let p = portal().await;
        let update = ProgressService::new(&p.ctx)
            .submit(
                &p.worker,
                p.project.id,
                &ProgressForm {
                    progress_percent: "35".into(),
                    comment: None,
                },
                Some(Upload::new("losa.png", &b"\x89PNG"[..])),
            )
            .await
            .unwrap()
            .into_result();
        let media = MediaService::new(&p.ctx);

        let image = media.update_image(&p.client, update.id).await.unwrap();
        assert_eq!(image.file_name, "losa.png");
        assert_eq!(image.content_type, "image/png");
        assert!(media.update_image(&p.worker, update.id).await.is_ok());
        assert!(media.update_image(&p.admin, update.id).await.is_ok());

        for user in [&p.other_worker, &p.other_client] {
            assert_eq!(
                media.update_image(user, update.id).await.unwrap_err().status_code(),
                403
            );
        }
    }

    #[tokio::test]
    async fn test_update_without_image_is_not_found() {
        let p = portal().await;
        let update = ProgressService::new(&p.ctx)
            .submit(
                &p.worker,
                p.project.id,
                &ProgressForm {
                    progress_percent: "35".into(),
                    comment: None,
                },
                None,
            )
            .await
            .unwrap()
            .into_result();

        let err = MediaService::new(&p.ctx)
            .update_image(&p.admin, update.id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
