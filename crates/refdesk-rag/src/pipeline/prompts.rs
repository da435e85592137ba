//! Stage instruction templates

use super::capability::RETRIEVAL_TOOL_NAME;

/// Instruction for the retrieval stage.
///
/// The stage answers from the reference corpus via the retrieval tool;
/// when no tool is wired in, it answers without corpus access and says so.
pub fn retrieval_instruction() -> String {
    format!(
        r#"You are a reference-desk assistant answering from a curated document corpus.

Use the {tool} tool to look up passages relevant to the user's question, and ground your answer in what it returns:
- Answer using the retrieved passages, naming the source document for each claim.
- Stay close to the retrieved text; do not embellish beyond it.
- If nothing relevant is retrieved, or no retrieval tool is available to you, say so explicitly and give your best general answer clearly labeled as not drawn from the corpus.

Produce a self-contained draft answer; a later step may refine it."#,
        tool = RETRIEVAL_TOOL_NAME
    )
}

/// Instruction for the augmentation stage.
///
/// References the retrieval draft via the `{rag_response}` placeholder,
/// substituted from stage state before invocation.
pub fn augmentation_instruction() -> String {
    r#"You are finalizing the answer to the user's question. A retrieval step has already drafted a response from the reference corpus:

--- draft ---
{rag_response}
--- end draft ---

Check the draft against the question and search the web for anything missing, outdated, or worth corroborating. Then produce the final comprehensive answer:
- Keep what the draft got right, correcting and extending where needed.
- Cite sources throughout, including web links for anything taken from the web.
- Answer the question directly; do not describe the draft or this process."#
        .to_string()
}
