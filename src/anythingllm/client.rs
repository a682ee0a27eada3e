use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, multipart, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

use super::schema::{
    CreatedWorkspace, NewWorkspaceResponse, UpdateEmbeddingsRequest, UploadResponse,
    VectorStoresResponse, Workspace,
};
use super::DocumentBackend;
use crate::config::AnythingLlmConfig;
use crate::error::ApiError;
use crate::upload::Upload;

/// reqwest client for the AnythingLLM developer API.
pub struct AnythingLlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AnythingLlmClient {
    pub fn new(config: &AnythingLlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Turn non-success statuses into [`ApiError::Http`].
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status, &body))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl DocumentBackend for AnythingLlmClient {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
        let response = self
            .request(Method::GET, "openai/vector_stores")
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "listing workspaces failed"))?;
        let stores: VectorStoresResponse = Self::read_json(response).await?;
        Ok(stores.into_workspaces())
    }

    async fn create_workspace(&self, name: &str) -> Result<CreatedWorkspace, ApiError> {
        let response = self
            .request(Method::POST, "workspace/new")
            .json(&json!({ "name": name }))
            .send()
            .await?;
        let created: NewWorkspaceResponse = Self::read_json(response).await?;
        let workspace = created.into_workspace()?;
        tracing::debug!(name, slug = %workspace.slug, "workspace created");
        Ok(workspace)
    }

    async fn upload_document(&self, upload: &Upload) -> Result<String, ApiError> {
        let part = multipart::Part::bytes(upload.data.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .request(Method::POST, "document/upload")
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = Self::read_json(response).await?;
        uploaded.into_location()
    }

    async fn add_documents(&self, slug: &str, doc_paths: &[String]) -> Result<(), ApiError> {
        if doc_paths.is_empty() {
            return Ok(());
        }
        let body = UpdateEmbeddingsRequest {
            adds: doc_paths,
            deletes: &[],
        };
        let response = self
            .request(Method::POST, &format!("workspace/{slug}/update-embeddings"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
