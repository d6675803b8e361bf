//! # ccr-attachments
//!
//! Storage for uploaded project documents and progress-update images.
//!
//! ## Example
//!
//! ```ignore
//! use ccr_attachments::{ArtifactKind, LocalStorage, PathLayout, Storage};
//!
//! let storage = LocalStorage::new("media");
//! let key = PathLayout::new(StorageLayout::ProjectId).key_for(ArtifactKind::ProjectDocuments, &project, "planos.pdf");
//! storage.put(&key, bytes).await?;
//! ```

pub mod layout;
pub mod storage;

pub use layout::{display_name, sanitize_file_name, ArtifactKind, PathLayout, Upload};
pub use storage::{FileMetadata, LocalStorage, MemoryStorage, Storage, StorageError, StorageResult};
