use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A workspace as the rest of the crate sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub slug: String,
    pub name: String,
    pub documents: u64,
}

impl Workspace {
    /// Case-insensitive match against a primary tag.
    pub fn matches(&self, tag: &str) -> bool {
        self.name.to_lowercase() == tag.to_lowercase()
    }
}

/// Case-insensitive workspace lookup by name.
pub fn find_workspace<'a>(workspaces: &'a [Workspace], name: &str) -> Option<&'a Workspace> {
    workspaces.iter().find(|ws| ws.matches(name))
}

/// One entry of `GET /v1/openai/vector_stores`. `id` is the workspace slug.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorStore {
    pub id: String,
    pub name: String,
    pub file_counts: FileCounts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileCounts {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoresResponse {
    pub data: Vec<VectorStore>,
}

impl VectorStoresResponse {
    /// Maps to [`Workspace`] records sorted by name (byte-wise).
    pub fn into_workspaces(self) -> Vec<Workspace> {
        let mut workspaces: Vec<Workspace> = self
            .data
            .into_iter()
            .map(|vs| Workspace {
                slug: vs.id,
                name: vs.name,
                documents: vs.file_counts.total,
            })
            .collect();
        workspaces.sort_by(|a, b| a.name.cmp(&b.name));
        workspaces
    }
}

/// Workspace record returned by `POST /v1/workspace/new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedWorkspace {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkspaceResponse {
    pub workspace: Option<CreatedWorkspace>,
    #[serde(default)]
    pub message: Option<String>,
}

impl NewWorkspaceResponse {
    pub fn into_workspace(self) -> Result<CreatedWorkspace, ApiError> {
        self.workspace.ok_or_else(|| {
            ApiError::Rejected(
                self.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| {
                        "Workspace creation response did not contain workspace data.".to_string()
                    }),
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedDocument {
    pub location: String,
}

/// Body of `POST /v1/document/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub documents: Vec<UploadedDocument>,
}

impl UploadResponse {
    /// The first document's `location` is the document path used for embedding.
    pub fn into_location(self) -> Result<String, ApiError> {
        match self.documents.into_iter().next() {
            Some(doc) if self.success => Ok(doc.location),
            _ => Err(ApiError::Rejected(
                self.error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Unknown error during file upload.".to_string()),
            )),
        }
    }
}

/// Body of `POST /v1/workspace/{slug}/update-embeddings`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateEmbeddingsRequest<'a> {
    pub adds: &'a [String],
    pub deletes: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_stores_map_to_sorted_workspaces() {
        let body = r#"{
            "data": [
                {"id": "research", "name": "research", "file_counts": {"total": 3}},
                {"id": "finance-1", "name": "Finance", "file_counts": {"total": 12}},
                {"id": "archive", "name": "archive", "file_counts": {"total": 0}}
            ]
        }"#;
        let parsed: VectorStoresResponse = serde_json::from_str(body).unwrap();
        let workspaces = parsed.into_workspaces();

        let names: Vec<&str> = workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Finance", "archive", "research"]);
        assert_eq!(workspaces[0].slug, "finance-1");
        assert_eq!(workspaces[0].documents, 12);
    }

    #[test]
    fn workspace_lookup_ignores_case() {
        let workspaces = vec![Workspace {
            slug: "finance-1".into(),
            name: "Finance".into(),
            documents: 0,
        }];
        assert_eq!(
            find_workspace(&workspaces, "FINANCE").map(|w| w.slug.as_str()),
            Some("finance-1")
        );
        assert!(find_workspace(&workspaces, "legal").is_none());
    }

    #[test]
    fn upload_response_yields_first_location() {
        let body = r#"{
            "success": true,
            "error": null,
            "documents": [
                {"location": "custom-documents/q3-report-abc.json", "title": "Q3_Report.docx"},
                {"location": "custom-documents/other.json"}
            ]
        }"#;
        let parsed: UploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.into_location().unwrap(),
            "custom-documents/q3-report-abc.json"
        );
    }

    #[test]
    fn failed_upload_surfaces_server_error() {
        let body = r#"{"success": false, "error": "Unsupported file type", "documents": []}"#;
        let parsed: UploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.into_location().unwrap_err().to_string(),
            "Unsupported file type"
        );

        let empty: UploadResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(
            empty.into_location().unwrap_err().to_string(),
            "Unknown error during file upload."
        );
    }

    #[test]
    fn create_response_without_workspace_is_rejected() {
        let parsed: NewWorkspaceResponse =
            serde_json::from_str(r#"{"workspace": null, "message": null}"#).unwrap();
        assert!(matches!(parsed.into_workspace(), Err(ApiError::Rejected(_))));

        let ok: NewWorkspaceResponse = serde_json::from_str(
            r#"{"workspace": {"id": 7, "name": "finance", "slug": "finance"}, "message": "Workspace created"}"#,
        )
        .unwrap();
        assert_eq!(ok.into_workspace().unwrap().slug, "finance");
    }
}
