//! Stage runner trait for remote model invocation

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ToolSpec;

/// Trait for executing a single pipeline stage against a remote model
///
/// Implementations:
/// - `GeminiStageRunner`: Gemini generate-content with native retrieval
///   and web-search tools
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Invoke the model with a rendered stage instruction, the user query,
    /// and the stage's tools. Returns the model's text response.
    async fn invoke(&self, instruction: &str, query: &str, tools: &[ToolSpec]) -> Result<String>;

    /// Check if the backing model endpoint is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get runner name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
