//! Storage key layout
//!
//! Files live under `<artifact>/<project key>/<unique file name>`.

use bytes::Bytes;
use ccr_core::config::StorageLayout;
use ccr_models::Project;
use uuid::Uuid;

const FALLBACK_FILE_NAME: &str = "file";
const UNIQUE_PREFIX_LENGTH: usize = 12;

/// Top-level folder per kind of stored file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ProjectDocuments,
    ProjectUpdates,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::ProjectDocuments => "project_documents",
            ArtifactKind::ProjectUpdates => "project_updates",
        }
    }
}

/// A file received in a multipart form
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Keep only the final path segment and characters safe in a file name
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = sanitize_segment(base);
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

fn sanitize_segment(segment: &str) -> String {
    let mapped: String = segment
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    mapped.trim_start_matches('.').to_string()
}

/// Maps uploads to storage keys according to the configured layout
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLayout {
    layout: StorageLayout,
}

impl PathLayout {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Folder name identifying the project
    pub fn project_key(&self, project: &Project) -> String {
        match self.layout {
            StorageLayout::ProjectId => project.id.to_string(),
            StorageLayout::ProjectName => {
                let key = sanitize_segment(&project.name.replace(' ', "_"));
                if key.is_empty() {
                    project.id.to_string()
                } else {
                    key
                }
            }
        }
    }

    /// Fresh key for an uploaded file; never collides with an earlier upload
    pub fn key_for(&self, kind: ArtifactKind, project: &Project, file_name: &str) -> String {
        let unique = Uuid::new_v4().simple().to_string();
        format!(
            "{}/{}/{}_{}",
            kind.as_str(),
            self.project_key(project),
            &unique[..UNIQUE_PREFIX_LENGTH],
            sanitize_file_name(file_name)
        )
    }
}

/// File name shown to users, without the uniqueness prefix
pub fn display_name(key: &str) -> &str {
    let file = key.rsplit('/').next().unwrap_or(key);
    match file.split_once('_') {
        Some((prefix, rest))
            if prefix.len() == UNIQUE_PREFIX_LENGTH
                && prefix.chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            rest
        }
        _ => file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccr_core::types::Percent;
    use chrono::{NaiveDate, Utc};

    fn project(name: &str) -> Project {
        Project {
            id: 42,
            name: name.into(),
            description: None,
            address: "Av. Dolores 300".into(),
            city: "Arequipa".into(),
            status: Default::default(),
            progress: Percent::ZERO,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            estimated_end_date: None,
            actual_end_date: None,
            client_id: None,
            created_by_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("planos finales.pdf"), "planos_finales.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\fotos\\obra.jpg"), "obra.jpg");
        assert_eq!(sanitize_file_name(".htaccess"), "htaccess");
        assert_eq!(sanitize_file_name("..."), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn test_id_layout() {
        let key = PathLayout::new(StorageLayout::ProjectId).key_for(
            ArtifactKind::ProjectDocuments,
            &project("Torre Norte"),
            "planos.pdf",
        );
        assert!(key.starts_with("project_documents/42/"));
        assert!(key.ends_with("_planos.pdf"));
        assert_eq!(display_name(&key), "planos.pdf");
    }

    #[test]
    fn test_name_layout() {
        let layout = PathLayout::new(StorageLayout::ProjectName);
        assert_eq!(layout.project_key(&project("Torre Norte")), "Torre_Norte");
        assert_eq!(layout.project_key(&project("../x")), "_x");
        assert_eq!(layout.project_key(&project("..")), "42");

        let key = layout.key_for(ArtifactKind::ProjectUpdates, &project("Torre Norte"), "a.png");
        assert!(key.starts_with("project_updates/Torre_Norte/"));
    }

    #[test]
    fn test_keys_are_unique() {
        let layout = PathLayout::default();
        let p = project("Torre Norte");
        assert_ne!(
            layout.key_for(ArtifactKind::ProjectUpdates, &p, "a.png"),
            layout.key_for(ArtifactKind::ProjectUpdates, &p, "a.png")
        );
    }

    #[test]
    fn test_display_name_keeps_unprefixed_names() {
        assert_eq!(display_name("project_documents/Obra/contrato_final.pdf"), "contrato_final.pdf");
    }
}
