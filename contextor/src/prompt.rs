//! Prompt builder for "stuff"-style question answering.
//!
//! All retrieved chunks are placed verbatim into a single prompt, nearest
//! first, followed by the question.

use rag_store::RagHit;

/// Instruction placed before the context.
pub const INSTRUCTION: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Context block used when retrieval returned nothing and the caller proceeds anyway.
pub const NO_CONTEXT: &str = "(no context found)";

/// Build the user prompt: instruction, context chunks, then the question.
///
/// # Example
/// ```
/// # use contextor::prompt::build_user_prompt;
/// let prompt = build_user_prompt("How to X?", &[]);
/// assert!(prompt.ends_with("Question: How to X?\nHelpful Answer:"));
/// ```
pub fn build_user_prompt(question: &str, hits: &[RagHit]) -> String {
    let context = if hits.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        hits.iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "{INSTRUCTION}\n\n{context}\n\nQuestion: {}\nHelpful Answer:",
        question.trim()
    )
}
