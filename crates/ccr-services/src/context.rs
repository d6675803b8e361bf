//! Shared service dependencies

use std::sync::Arc;

use ccr_attachments::{ArtifactKind, PathLayout, Storage, Upload};
use ccr_contracts::UploadInfo;
use ccr_core::config::AppConfig;
use ccr_core::error::PortalError;
use ccr_core::result::PortalResult;
use ccr_core::traits::Id;
use ccr_db::Stores;
use ccr_models::{Account, Message, Project, Role, User};

/// Tunables the workflows read from configuration
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub layout: PathLayout,
    pub max_upload_size: usize,
    pub password_min_length: usize,
    pub dashboard_recent_limit: i64,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            layout: PathLayout::new(config.storage.layout),
            max_upload_size: config.storage.max_upload_size,
            password_min_length: config.auth.password_min_length,
            dashboard_recent_limit: config.instance.dashboard_recent_limit,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Stores, file storage and settings shared by every service
#[derive(Clone)]
pub struct ServiceContext {
    pub stores: Stores,
    pub storage: Arc<dyn Storage>,
    pub settings: ServiceSettings,
}

impl ServiceContext {
    pub fn new(stores: Stores, storage: Arc<dyn Storage>, settings: ServiceSettings) -> Self {
        Self {
            stores,
            storage,
            settings,
        }
    }

    pub async fn project(&self, id: Id) -> PortalResult<Project> {
        self.stores
            .projects
            .find(id)
            .await?
            .ok_or_else(|| PortalError::not_found::<Project>(id))
    }

    pub async fn account(&self, id: Id) -> PortalResult<Account> {
        self.stores
            .users
            .find_account(id)
            .await?
            .ok_or_else(|| PortalError::not_found::<User>(id))
    }

    pub async fn message(&self, id: Id) -> PortalResult<Message> {
        self.stores
            .messages
            .find(id)
            .await?
            .ok_or_else(|| PortalError::not_found::<Message>(id))
    }

    /// Effective role of a user, `None` when the user does not exist
    pub async fn role_of(&self, user_id: Id) -> PortalResult<Option<Role>> {
        Ok(self
            .stores
            .users
            .find_account(user_id)
            .await?
            .map(|account| account.role()))
    }

    /// Write an upload under a fresh key and return the key
    pub async fn store_upload(
        &self,
        kind: ArtifactKind,
        project: &Project,
        upload: &Upload,
    ) -> PortalResult<String> {
        let key = self
            .settings
            .layout
            .key_for(kind, project, &upload.file_name);
        let metadata = self.storage.put(&key, upload.data.clone()).await?;
        tracing::info!(
            key = %key,
            size = metadata.size,
            digest = %metadata.digest,
            storage = self.storage.name(),
            "Upload stored"
        );
        Ok(key)
    }

    /// Remove a file written for a request that then failed
    pub async fn discard_upload(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to discard upload");
        }
    }
}

/// Metadata of an optional upload in the shape contracts expect
pub(crate) fn upload_info(upload: Option<&Upload>) -> Option<UploadInfo<'_>> {
    upload.map(|u| UploadInfo {
        file_name: &u.file_name,
        size: u.size(),
    })
}
