//! Sequential pipeline execution
//!
//! Runs the declared stages strictly in order against a stage runner.
//! Every run owns a fresh `StageState`; a stage failure fails the whole
//! run with an error naming that stage, and no partial state escapes.

use std::sync::Arc;
use uuid::Uuid;

use super::spec::PipelineSpec;
use super::state::StageState;
use crate::error::{Error, Result};
use crate::providers::StageRunner;

/// Executes a validated pipeline against a stage runner
pub struct PipelineOrchestrator {
    spec: PipelineSpec,
    runner: Arc<dyn StageRunner>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator for a validated pipeline
    pub fn new(spec: PipelineSpec, runner: Arc<dyn StageRunner>) -> Self {
        Self { spec, runner }
    }

    /// The pipeline being executed
    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Run the pipeline once for a query and return the final stage's
    /// output.
    ///
    /// Concurrent runs may share one orchestrator; state is per-run.
    pub async fn run(&self, query: &str) -> Result<String> {
        let run_id = Uuid::new_v4();
        let mut state = StageState::new();
        tracing::info!(
            "[{}] Running {}-stage pipeline on {}",
            run_id,
            self.spec.stages().len(),
            self.runner.name()
        );
        tracing::debug!("[{}] Query: {}", run_id, query);

        for stage in self.spec.stages() {
            tracing::info!(
                "[{}] Stage '{}' starting ({} tools)",
                run_id,
                stage.name(),
                stage.tools().len()
            );
            let instruction = state
                .render(stage.instruction())
                .map_err(|e| Error::stage(stage.name(), e.to_string()))?;
            let output = self
                .runner
                .invoke(&instruction, query, stage.tools())
                .await
                .map_err(|e| Error::stage(stage.name(), e.to_string()))?;
            tracing::info!(
                "[{}] Stage '{}' wrote '{}' ({} chars)",
                run_id,
                stage.name(),
                stage.output_key(),
                output.len()
            );
            state
                .insert(stage.output_key(), output)
                .map_err(|e| Error::stage(stage.name(), e.to_string()))?;
        }

        let final_key = self.spec.final_output_key();
        state.take(final_key).ok_or_else(|| {
            Error::internal(format!("final output '{}' missing from state", final_key))
        })
    }
}
