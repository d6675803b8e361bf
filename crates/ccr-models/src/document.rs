//! Project document model
//!
//! Table: documents

use chrono::{DateTime, Utc};
use ccr_core::traits::{Entity, Id, Identifiable, ProjectScoped};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Id,
    pub project_id: Id,
    pub uploaded_by_id: Option<Id>,
    pub title: String,
    /// Storage path of the file
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
    /// Whether the project's client may see and download it
    pub visible_to_client: bool,
}

impl Document {
    /// Name of the stored file without its directory
    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit('/')
            .next()
            .unwrap_or(self.file_path.as_str())
    }
}

impl Identifiable for Document {
    fn id(&self) -> Id {
        self.id
    }
}

impl Entity for Document {
    const TABLE_NAME: &'static str = "documents";
    const TYPE_NAME: &'static str = "Document";
}

impl ProjectScoped for Document {
    fn project_id(&self) -> Option<Id> {
        Some(self.project_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub project_id: Id,
    pub uploaded_by_id: Id,
    pub title: String,
    pub file_path: String,
    pub visible_to_client: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let document = Document {
            id: 1,
            project_id: 2,
            uploaded_by_id: None,
            title: "Planos".into(),
            file_path: "project_documents/2/planos.pdf".into(),
            uploaded_at: Utc::now(),
            visible_to_client: true,
        };
        assert_eq!(document.file_name(), "planos.pdf");
    }
}
