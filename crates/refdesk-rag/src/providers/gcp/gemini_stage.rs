//! Gemini stage runner
//!
//! Executes pipeline stages against the Vertex AI generate-content
//! endpoint. The stage instruction becomes the system instruction, the
//! user query the single user turn, and the stage's tool specs are lowered
//! to Gemini's native retrieval and web-search tools.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::auth::GcpAuth;
use crate::error::{Error, Result};
use crate::providers::stage::StageRunner;
use crate::types::{ToolBinding, ToolSpec};

/// Gemini stage runner via Vertex AI
pub struct GeminiStageRunner {
    auth: Arc<GcpAuth>,
    location: String,
    model: String,
    timeout: Duration,
}

impl GeminiStageRunner {
    /// Create a new stage runner
    ///
    /// # Arguments
    /// * `auth` - GCP authentication
    /// * `location` - GCP region (e.g., "us-central1")
    /// * `model` - Model name (e.g., "gemini-2.5-flash")
    /// * `timeout` - per-request timeout
    pub fn new(auth: Arc<GcpAuth>, location: String, model: String, timeout: Duration) -> Self {
        Self {
            auth,
            location,
            model,
            timeout,
        }
    }

    /// Get the API endpoint URL
    fn endpoint(&self) -> String {
        format!(
            "https://{}-aiplatform.googleapis.com/v1beta1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.location,
            self.auth.project_id(),
            self.location,
            self.model
        )
    }
}

#[derive(serde::Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolWire>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Part {
    text: String,
}

#[derive(serde::Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "topP")]
    top_p: f32,
}

#[derive(serde::Serialize)]
struct ToolWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    retrieval: Option<RetrievalWire>,
    #[serde(rename = "googleSearch", skip_serializing_if = "Option::is_none")]
    google_search: Option<GoogleSearchWire>,
}

#[derive(serde::Serialize)]
struct RetrievalWire {
    #[serde(rename = "vertexRagStore")]
    vertex_rag_store: VertexRagStoreWire,
}

#[derive(serde::Serialize)]
struct VertexRagStoreWire {
    #[serde(rename = "ragResources")]
    rag_resources: Vec<RagResourceWire>,
    #[serde(rename = "similarityTopK")]
    similarity_top_k: u32,
    #[serde(rename = "vectorDistanceThreshold")]
    vector_distance_threshold: f64,
}

#[derive(serde::Serialize)]
struct RagResourceWire {
    #[serde(rename = "ragCorpus")]
    rag_corpus: String,
}

#[derive(serde::Serialize)]
struct GoogleSearchWire {}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(serde::Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Lower declarative tool specs to the native wire format
fn lower_tools(tools: &[ToolSpec]) -> Vec<ToolWire> {
    tools
        .iter()
        .map(|tool| match &tool.binding {
            ToolBinding::CorpusRetrieval {
                corpus,
                similarity_top_k,
                distance_threshold,
            } => ToolWire {
                retrieval: Some(RetrievalWire {
                    vertex_rag_store: VertexRagStoreWire {
                        rag_resources: vec![RagResourceWire {
                            rag_corpus: corpus.clone(),
                        }],
                        similarity_top_k: *similarity_top_k,
                        vector_distance_threshold: *distance_threshold,
                    },
                }),
                google_search: None,
            },
            ToolBinding::WebSearch => ToolWire {
                retrieval: None,
                google_search: Some(GoogleSearchWire {}),
            },
        })
        .collect()
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let parts = candidate.content?.parts;
    let text: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join(""))
    }
}

#[async_trait]
impl StageRunner for GeminiStageRunner {
    async fn invoke(&self, instruction: &str, query: &str, tools: &[ToolSpec]) -> Result<String> {
        let client = self.auth.authorized_client(self.timeout).await?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: query.to_string(),
                }],
            }],
            system_instruction: if instruction.is_empty() {
                None
            } else {
                Some(SystemInstruction {
                    parts: vec![Part {
                        text: instruction.to_string(),
                    }],
                })
            },
            tools: lower_tools(tools),
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 4096,
                top_p: 0.9,
            },
        };

        let response = client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::internal(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::internal(format!(
                "Gemini generation failed ({}): {}",
                status, body
            )));
        }

        let gen_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("Failed to parse Gemini response: {}", e)))?;

        extract_text(gen_response)
            .ok_or_else(|| Error::internal("No text in Gemini response".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        self.auth.get_token().await.map(|_| true)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
