//! Vertex AI RAG Engine corpora client
//!
//! Manages RAG corpora over the v1beta1 REST surface: corpus listing and
//! creation (a long-running operation polled to completion), file upload
//! via the multipart upload endpoint, and corpus file listing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::auth::GcpAuth;
use crate::error::{Error, Result};
use crate::providers::corpus::CorpusService;
use crate::types::{CorpusRecord, RagFileRecord};

/// Delay between polls of the corpus-create operation
const CREATE_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Maximum polls before corpus creation is reported as failed
const CREATE_POLL_ATTEMPTS: u32 = 30;

/// Vertex AI RAG corpora client
pub struct VertexRagClient {
    auth: Arc<GcpAuth>,
    location: String,
    embedding_model: String,
    timeout: Duration,
}

impl VertexRagClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `auth` - GCP authentication
    /// * `location` - GCP region (e.g., "us-central1")
    /// * `embedding_model` - embedding model applied to created corpora
    /// * `timeout` - per-request timeout
    pub fn new(
        auth: Arc<GcpAuth>,
        location: String,
        embedding_model: String,
        timeout: Duration,
    ) -> Self {
        Self {
            auth,
            location,
            embedding_model,
            timeout,
        }
    }

    fn api_base(&self) -> String {
        format!("https://{}-aiplatform.googleapis.com/v1beta1", self.location)
    }

    fn parent(&self) -> String {
        format!(
            "projects/{}/locations/{}",
            self.auth.project_id(),
            self.location
        )
    }

    fn corpora_endpoint(&self) -> String {
        format!("{}/{}/ragCorpora", self.api_base(), self.parent())
    }

    fn files_endpoint(&self, corpus: &str) -> String {
        format!("{}/{}/ragFiles", self.api_base(), corpus)
    }

    fn upload_endpoint(&self, corpus: &str) -> String {
        format!(
            "https://{}-aiplatform.googleapis.com/upload/v1beta1/{}/ragFiles:upload",
            self.location, corpus
        )
    }

    /// Embedding model as a full publisher resource name
    fn embedding_model_resource(&self) -> String {
        if self.embedding_model.starts_with("projects/") {
            self.embedding_model.clone()
        } else {
            format!("{}/{}", self.parent(), self.embedding_model)
        }
    }

    /// Poll a long-running operation until it completes
    async fn poll_operation(
        &self,
        client: &reqwest::Client,
        operation: Operation,
    ) -> Result<RagCorpusResource> {
        let mut operation = operation;
        let mut attempts = 0u32;
        loop {
            if operation.done {
                if let Some(error) = operation.error {
                    return Err(Error::resolution(format!(
                        "corpus creation failed: {} (code {})",
                        error.message, error.code
                    )));
                }
                return operation.response.ok_or_else(|| {
                    Error::resolution("corpus creation completed without a resource")
                });
            }
            if attempts >= CREATE_POLL_ATTEMPTS {
                return Err(Error::resolution(format!(
                    "corpus creation did not complete after {} polls",
                    CREATE_POLL_ATTEMPTS
                )));
            }
            attempts += 1;
            tokio::time::sleep(CREATE_POLL_INTERVAL).await;

            let url = format!("{}/{}", self.api_base(), operation.name);
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| Error::resolution(format!("operation poll failed: {}", e)))?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::resolution(format!(
                    "operation poll failed ({}): {}",
                    status, body
                )));
            }
            operation = response
                .json()
                .await
                .map_err(|e| Error::resolution(format!("invalid operation response: {}", e)))?;
        }
    }
}

/// Whether an upload rejection is the remote service's quota signal
fn quota_signal(status: u16, body: &str) -> bool {
    status == 429 || body.contains("RESOURCE_EXHAUSTED") || body.contains("Quota exceeded")
}

#[derive(serde::Serialize)]
struct CreateCorpusRequest {
    #[serde(rename = "displayName")]
    display_name: String,
    description: String,
    #[serde(rename = "ragEmbeddingModelConfig")]
    rag_embedding_model_config: RagEmbeddingModelConfig,
}

#[derive(serde::Serialize)]
struct RagEmbeddingModelConfig {
    #[serde(rename = "vertexPredictionEndpoint")]
    vertex_prediction_endpoint: VertexPredictionEndpoint,
}

#[derive(serde::Serialize)]
struct VertexPredictionEndpoint {
    #[serde(rename = "publisherModel")]
    publisher_model: String,
}

#[derive(serde::Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<RpcStatus>,
    #[serde(default)]
    response: Option<RagCorpusResource>,
}

#[derive(serde::Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(serde::Deserialize)]
struct RagCorpusResource {
    name: String,
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(serde::Deserialize)]
struct ListCorporaResponse {
    #[serde(rename = "ragCorpora", default)]
    rag_corpora: Vec<RagCorpusResource>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(serde::Deserialize)]
struct RagFileResource {
    name: String,
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "createTime", default)]
    create_time: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(serde::Deserialize)]
struct ListRagFilesResponse {
    #[serde(rename = "ragFiles", default)]
    rag_files: Vec<RagFileResource>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(serde::Deserialize)]
struct UploadRagFileResponse {
    #[serde(rename = "ragFile", default)]
    rag_file: Option<RagFileResource>,
    #[serde(default)]
    error: Option<RpcStatus>,
}

impl From<RagCorpusResource> for CorpusRecord {
    fn from(resource: RagCorpusResource) -> Self {
        Self {
            resource_name: resource.name,
            display_name: resource.display_name,
            description: resource.description.unwrap_or_default(),
        }
    }
}

impl From<RagFileResource> for RagFileRecord {
    fn from(resource: RagFileResource) -> Self {
        Self {
            resource_name: resource.name,
            display_name: resource.display_name,
            description: resource.description.unwrap_or_default(),
            create_time: resource.create_time,
        }
    }
}

#[async_trait]
impl CorpusService for VertexRagClient {
    async fn list_corpora(&self) -> Result<Vec<CorpusRecord>> {
        let client = self.auth.authorized_client(self.timeout).await?;
        let mut corpora = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = client.get(self.corpora_endpoint());
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let response = request
                .send()
                .await
                .map_err(|e| Error::resolution(format!("listing corpora failed: {}", e)))?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::resolution(format!(
                    "listing corpora failed ({}): {}",
                    status, body
                )));
            }
            let page: ListCorporaResponse = response
                .json()
                .await
                .map_err(|e| Error::resolution(format!("invalid corpora listing: {}", e)))?;
            corpora.extend(page.rag_corpora.into_iter().map(CorpusRecord::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        tracing::debug!("Listed {} corpora in {}", corpora.len(), self.parent());
        Ok(corpora)
    }

    async fn create_corpus(&self, display_name: &str, description: &str) -> Result<CorpusRecord> {
        let client = self.auth.authorized_client(self.timeout).await?;
        let request = CreateCorpusRequest {
            display_name: display_name.to_string(),
            description: description.to_string(),
            rag_embedding_model_config: RagEmbeddingModelConfig {
                vertex_prediction_endpoint: VertexPredictionEndpoint {
                    publisher_model: self.embedding_model_resource(),
                },
            },
        };

        let response = client
            .post(self.corpora_endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::resolution(format!("corpus creation request failed: {}", e)))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::resolution(format!(
                "corpus creation failed ({}): {}",
                status, body
            )));
        }

        let operation: Operation = response
            .json()
            .await
            .map_err(|e| Error::resolution(format!("invalid operation response: {}", e)))?;
        let resource = self.poll_operation(&client, operation).await?;
        let corpus = CorpusRecord::from(resource);
        tracing::info!(
            "Created corpus '{}' ({})",
            corpus.display_name,
            corpus.resource_name
        );
        Ok(corpus)
    }

    async fn upload_file(
        &self,
        corpus: &str,
        path: &Path,
        display_name: &str,
        description: &str,
    ) -> Result<RagFileRecord> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| Error::upload(&filename, format!("cannot read file: {}", e)))?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let metadata = serde_json::json!({
            "ragFile": {
                "displayName": display_name,
                "description": description,
            }
        })
        .to_string();
        let file_part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.clone())
            .mime_str(mime.essence_str())
            .map_err(|e| Error::upload(&filename, format!("invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("metadata", metadata)
            .part("file", file_part);

        let client = self.auth.authorized_client(self.timeout).await?;
        let response = client
            .post(self.upload_endpoint(corpus))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::upload(&filename, format!("upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if quota_signal(status.as_u16(), &body) {
                return Err(Error::quota(format!(
                    "upload of '{}' rejected ({}): {}",
                    filename, status, body
                )));
            }
            return Err(Error::upload(&filename, format!("{}: {}", status, body)));
        }

        let upload: UploadRagFileResponse = response
            .json()
            .await
            .map_err(|e| Error::upload(&filename, format!("unexpected upload response: {}", e)))?;
        if let Some(error) = upload.error {
            if quota_signal(0, &error.message) {
                return Err(Error::quota(format!(
                    "upload of '{}' rejected: {}",
                    filename, error.message
                )));
            }
            return Err(Error::upload(
                &filename,
                format!("{} (code {})", error.message, error.code),
            ));
        }
        let resource = upload
            .rag_file
            .ok_or_else(|| Error::upload(&filename, "response contained no ragFile"))?;
        Ok(RagFileRecord::from(resource))
    }

    async fn list_files(&self, corpus: &str) -> Result<Vec<RagFileRecord>> {
        let client = self.auth.authorized_client(self.timeout).await?;
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = client.get(self.files_endpoint(corpus));
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let response = request
                .send()
                .await
                .map_err(|e| Error::internal(format!("listing corpus files failed: {}", e)))?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::internal(format!(
                    "listing corpus files failed ({}): {}",
                    status, body
                )));
            }
            let page: ListRagFilesResponse = response
                .json()
                .await
                .map_err(|e| Error::internal(format!("invalid file listing: {}", e)))?;
            files.extend(page.rag_files.into_iter().map(RagFileRecord::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(files)
    }

    async fn health_check(&self) -> Result<bool> {
        self.list_corpora().await.map(|_| true)
    }

    fn name(&self) -> &str {
        "vertex-rag"
    }
}
