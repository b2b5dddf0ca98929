//! Public API types re-used by external crates (e.g., the HTTP API layer).

/// A compact record of a context chunk that was fed to the LLM.
///
/// # Example
/// ```
/// use contextor::UsedChunk;
/// let c = UsedChunk {
///     score: 0.92,
///     source: "sky.txt".into(),
///     order: 0,
///     text: "The sky is blue.".into(),
/// };
/// assert!(c.score > 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct UsedChunk {
    pub score: f32,
    pub source: String,
    pub order: usize,
    pub text: String,
}

/// Final answer together with the exact context passed to the model.
#[derive(Clone, Debug)]
pub struct QaAnswer {
    pub answer: String,
    pub context: Vec<UsedChunk>,
}
