//! AnythingLLM document backend: workspace directory and document locker.

pub mod client;
pub mod schema;

pub use client::AnythingLlmClient;
pub use schema::{find_workspace, CreatedWorkspace, Workspace};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::upload::Upload;

/// The document-embedding backend the pipeline talks to.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// All workspaces sorted by name, with document counts.
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, ApiError>;

    async fn create_workspace(&self, name: &str) -> Result<CreatedWorkspace, ApiError>;

    /// Put a file in the locker and return its document path.
    async fn upload_document(&self, upload: &Upload) -> Result<String, ApiError>;

    /// Embed locker documents into the workspace with `slug`.
    async fn add_documents(&self, slug: &str, doc_paths: &[String]) -> Result<(), ApiError>;
}
