//! Google Cloud Platform provider implementations
//!
//! Backs the corpus service and stage runner with:
//! - Vertex AI RAG Engine for corpus management and file ingestion
//! - Gemini for stage execution with native retrieval and web-search tools
//! - Service-account JWT authentication

mod auth;
mod gemini_stage;
mod rag_client;

pub use auth::GcpAuth;
pub use gemini_stage::GeminiStageRunner;
pub use rag_client::VertexRagClient;
