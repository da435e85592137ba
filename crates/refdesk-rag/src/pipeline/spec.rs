//! Pipeline definition
//!
//! A pipeline is an ordered list of stages. Each stage declares an
//! instruction template, the tools it may use, and the single state key it
//! writes; the keys its instruction consumes are derived from the
//! template's placeholders. Definitions are validated once at build time
//! and immutable afterwards.

use std::collections::HashSet;

use super::state::{is_state_key, placeholders};
use crate::error::{Error, Result};
use crate::types::ToolSpec;

/// One stage of a pipeline
#[derive(Debug, Clone)]
pub struct StageSpec {
    name: String,
    instruction: String,
    tools: Vec<ToolSpec>,
    output_key: String,
}

impl StageSpec {
    /// Declare a stage
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        tools: Vec<ToolSpec>,
        output_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            tools,
            output_key: output_key.into(),
        }
    }

    /// Stage name, used in logs and stage errors
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instruction template (may reference earlier outputs via `{key}`)
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Tools available to this stage
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// State key this stage writes
    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// State keys this stage's instruction consumes
    pub fn input_keys(&self) -> Vec<String> {
        placeholders(&self.instruction)
    }
}

/// A validated, immutable pipeline definition
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    stages: Vec<StageSpec>,
}

impl PipelineSpec {
    /// Validate stage declarations and build the pipeline.
    ///
    /// Rejected at build time:
    /// - an empty stage list, empty or duplicate stage names
    /// - output keys that are not valid state keys, or written by two stages
    /// - an instruction placeholder no earlier stage's output satisfies
    pub fn new(stages: Vec<StageSpec>) -> Result<Self> {
        if stages.is_empty() {
            return Err(Error::pipeline("pipeline has no stages"));
        }

        let mut seen_names: HashSet<&str> = HashSet::new();
        let mut written: HashSet<&str> = HashSet::new();
        for stage in &stages {
            if stage.name.is_empty() {
                return Err(Error::pipeline("stage with empty name"));
            }
            if !seen_names.insert(stage.name.as_str()) {
                return Err(Error::pipeline(format!(
                    "duplicate stage name '{}'",
                    stage.name
                )));
            }
            if !is_state_key(&stage.output_key) {
                return Err(Error::pipeline(format!(
                    "stage '{}' has invalid output key '{}'",
                    stage.name, stage.output_key
                )));
            }
            for input in stage.input_keys() {
                if !written.contains(input.as_str()) {
                    return Err(Error::pipeline(format!(
                        "stage '{}' references '{{{}}}' before any stage writes it",
                        stage.name, input
                    )));
                }
            }
            if !written.insert(stage.output_key.as_str()) {
                return Err(Error::pipeline(format!(
                    "output key '{}' written by more than one stage",
                    stage.output_key
                )));
            }
        }

        Ok(Self { stages })
    }

    /// Stages in execution order
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Output key of the last stage, the pipeline's return value
    pub fn final_output_key(&self) -> &str {
        // Non-empty by validation
        &self.stages[self.stages.len() - 1].output_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str, instruction: &str, output_key: &str) -> StageSpec {
        StageSpec::new(name, instruction, Vec::new(), output_key)
    }

    #[test]
    fn test_valid_two_stage_pipeline() {
        let pipeline = PipelineSpec::new(vec![
            stage("retrieval", "Answer from the corpus.", "rag_response"),
            stage("augmentation", "Improve {rag_response}.", "final_response"),
        ])
        .unwrap();

        assert_eq!(pipeline.stages().len(), 2);
        assert_eq!(pipeline.final_output_key(), "final_response");
        assert_eq!(pipeline.stages()[1].input_keys(), vec!["rag_response"]);
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineSpec::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Pipeline(_)));
    }

    #[test]
    fn test_unsatisfied_placeholder_rejected() {
        let err = PipelineSpec::new(vec![
            stage("retrieval", "Answer.", "rag_response"),
            stage("augmentation", "Use {other_draft}.", "final_response"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("{other_draft}"));
    }

    #[test]
    fn test_stage_cannot_consume_its_own_output() {
        let err = PipelineSpec::new(vec![stage(
            "retrieval",
            "Refine {rag_response}.",
            "rag_response",
        )])
        .unwrap_err();
        assert!(err.to_string().contains("{rag_response}"));
    }

    #[test]
    fn test_duplicate_output_keys_rejected() {
        let err = PipelineSpec::new(vec![
            stage("first", "One.", "rag_response"),
            stage("second", "Two.", "rag_response"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("rag_response"));
    }

    #[test]
    fn test_duplicate_stage_names_rejected() {
        let err = PipelineSpec::new(vec![
            stage("retrieval", "One.", "rag_response"),
            stage("retrieval", "Two.", "final_response"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate stage name"));
    }

    #[test]
    fn test_invalid_output_key_rejected() {
        let err = PipelineSpec::new(vec![stage("retrieval", "One.", "Rag Response")]).unwrap_err();
        assert!(err.to_string().contains("invalid output key"));
    }
}
