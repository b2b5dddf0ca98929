//! RAG + LLM answer pipeline.
//!
//! [`Contextor`] owns the shared LLM service and the [`RagStore`]. For each
//! question it retrieves the nearest chunks from the (cached) corpus index,
//! builds a single "stuff" prompt and asks the completion model. Credentials
//! are passed per call and never stored.

pub mod cfg;
mod error;
pub mod llm;
pub mod prompt;

mod api_types;

pub use api_types::{QaAnswer, UsedChunk};
pub use cfg::{ContextorConfig, EmptyContextPolicy};
pub use error::ContextorError;

use std::sync::Arc;

use ai_llm_service::{ApiKey, LlmServiceProfiles};
use llm::{ChatModel, OpenAiChat};
use rag_store::{EmbeddingsProvider, IndexStatus, OpenAiEmbedder, RagError, RagQuery, RagStore};
use tracing::{debug, info};

/// Question-answering service over the local corpus.
pub struct Contextor {
    svc: Arc<LlmServiceProfiles>,
    store: RagStore,
    empty_context: EmptyContextPolicy,
}

impl Contextor {
    /// # Errors
    /// Returns `ContextorError::Rag` if the RAG configuration does not validate.
    pub fn new(cfg: ContextorConfig) -> Result<Self, ContextorError> {
        Ok(Self {
            svc: cfg.svc,
            store: RagStore::new(cfg.rag)?,
            empty_context: cfg.empty_context,
        })
    }

    /// Builds the pipeline from environment variables.
    pub fn from_env() -> Result<Self, ContextorError> {
        Self::new(ContextorConfig::from_env()?)
    }

    pub fn store(&self) -> &RagStore {
        &self.store
    }

    /// Current state of the corpus index.
    pub async fn index_status(&self) -> IndexStatus {
        self.store.status().await
    }

    /// Answers `question` with the OpenAI-backed embedder and chat model,
    /// both authenticated with `key`.
    ///
    /// # Errors
    /// Propagates `ContextorError` from the corpus, embeddings, retrieval or chat.
    ///
    /// # Example
    /// ```no_run
    /// # use contextor::Contextor;
    /// # use ai_llm_service::ApiKey;
    /// # #[tokio::main] async fn main() {
    /// let ctx = Contextor::from_env().unwrap();
    /// let key = ApiKey::new("sk-...").unwrap();
    /// let qa = ctx.answer("What color is the sky?", &key).await.unwrap();
    /// println!("{} ({} chunks)", qa.answer, qa.context.len());
    /// # }
    /// ```
    pub async fn answer(&self, question: &str, key: &ApiKey) -> Result<QaAnswer, ContextorError> {
        let embedder = OpenAiEmbedder::new(self.svc.clone(), key.clone());
        let chat = OpenAiChat::new(self.svc.clone(), key.clone());
        self.answer_with(question, &embedder, &chat).await
    }

    /// Answers `question` with explicit embedding and chat backends.
    ///
    /// # Errors
    /// - `ContextorError::EmptyContext` when nothing was retrieved under
    ///   [`EmptyContextPolicy::Error`].
    /// - `ContextorError::Rag` / `ContextorError::Llm` from the backends.
    pub async fn answer_with(
        &self,
        question: &str,
        embedder: &dyn EmbeddingsProvider,
        chat: &dyn ChatModel,
    ) -> Result<QaAnswer, ContextorError> {
        let query = RagQuery {
            text: question,
            top_k: self.store.config().top_k,
        };
        let hits = match self.store.rag_context(query, embedder).await {
            Ok(hits) => hits,
            Err(RagError::EmptyIndex) => match self.empty_context {
                EmptyContextPolicy::Proceed => Vec::new(),
                EmptyContextPolicy::Error => return Err(ContextorError::EmptyContext),
            },
            Err(e) => return Err(e.into()),
        };
        debug!("contextor::answer hits={}", hits.len());

        if hits.is_empty() && self.empty_context == EmptyContextPolicy::Error {
            return Err(ContextorError::EmptyContext);
        }

        let user_prompt = prompt::build_user_prompt(question, &hits);
        let answer = chat.complete(&user_prompt).await?;
        info!(
            "contextor::answer done context={} answer_chars={}",
            hits.len(),
            answer.chars().count()
        );

        let context = hits
            .into_iter()
            .map(|h| UsedChunk {
                score: h.score,
                source: h.source,
                order: h.order,
                text: h.text,
            })
            .collect();
        Ok(QaAnswer { answer, context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::{AiLlmError, LlmModelConfig, RetryPolicy};
    use llm::ChatFuture;
    use rag_store::{EmbedFuture, RagConfig};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct TopicEmbedder;

    impl EmbeddingsProvider for TopicEmbedder {
        fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async move {
                Ok(texts
                    .iter()
                    .map(|t| {
                        let t = t.to_lowercase();
                        vec![t.contains("sky") as u8 as f32, t.contains("grass") as u8 as f32, 0.1]
                    })
                    .collect())
            })
        }

        fn model_id(&self) -> &str {
            "topics"
        }
    }

    /// Records prompts and answers with a fixed string.
    #[derive(Default)]
    struct RecordingChat {
        prompts: Mutex<Vec<String>>,
    }

    impl ChatModel for RecordingChat {
        fn complete<'a>(&'a self, prompt: &'a str) -> ChatFuture<'a> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Box::pin(async { Ok("Blue.".to_string()) })
        }
    }

    fn rag_cfg(dir: &std::path::Path) -> RagConfig {
        let mut rag = RagConfig::new_default(dir);
        rag.chunk_size = 1000;
        rag.chunk_overlap = 0;
        rag
    }

    fn svc(uri: &str) -> Arc<LlmServiceProfiles> {
        let retry = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        Arc::new(
            LlmServiceProfiles::new(
                LlmModelConfig::new("chat-model", uri),
                LlmModelConfig::new("embedding-model", uri),
                retry,
            )
            .unwrap(),
        )
    }

    fn corpus(text: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("facts.txt"), text).unwrap();
        dir
    }

    fn contextor(dir: &std::path::Path, uri: &str, policy: EmptyContextPolicy) -> Contextor {
        let mut cfg = ContextorConfig::new(svc(uri), rag_cfg(dir));
        cfg.empty_context = policy;
        Contextor::new(cfg).unwrap()
    }

    #[tokio::test]
    async fn answers_from_the_single_chunk() {
        let dir = corpus("The sky is blue. Grass is green.");
        let ctx = contextor(dir.path(), "http://127.0.0.1:9", EmptyContextPolicy::Error);
        let chat = RecordingChat::default();

        let qa = ctx
            .answer_with("What color is the sky?", &TopicEmbedder, &chat)
            .await
            .unwrap();

        assert_eq!(qa.answer, "Blue.");
        assert_eq!(qa.context.len(), 1);
        assert_eq!(qa.context[0].source, "facts.txt");

        let prompts = chat.prompts.lock().unwrap();
        let p = &prompts[0];
        let chunk = p.find("The sky is blue. Grass is green.").unwrap();
        let question = p.find("What color is the sky?").unwrap();
        assert!(chunk < question);
    }

    #[tokio::test]
    async fn empty_corpus_fails_under_error_policy() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = contextor(dir.path(), "http://127.0.0.1:9", EmptyContextPolicy::Error);
        let chat = RecordingChat::default();

        let err = ctx.answer_with("Anything?", &TopicEmbedder, &chat).await.unwrap_err();
        assert!(matches!(err, ContextorError::EmptyContext), "got {err:?}");
        assert_eq!(err.code(), "EMPTY_CONTEXT");
        assert!(chat.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_corpus_proceeds_without_context() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = contextor(dir.path(), "http://127.0.0.1:9", EmptyContextPolicy::Proceed);
        let chat = RecordingChat::default();

        let qa = ctx.answer_with("Anything?", &TopicEmbedder, &chat).await.unwrap();
        assert!(qa.context.is_empty());
        assert!(chat.prompts.lock().unwrap()[0].contains(prompt::NO_CONTEXT));
    }

    #[tokio::test]
    async fn auth_failure_during_build_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = corpus("The sky is blue.");
        let ctx = contextor(dir.path(), &server.uri(), EmptyContextPolicy::Error);
        let key = ApiKey::new("sk-bad").unwrap();

        let started = Instant::now();
        let err = ctx.answer("What color is the sky?", &key).await.unwrap_err();
        assert!(
            matches!(err, ContextorError::Rag(RagError::Embedding(AiLlmError::Auth { .. }))),
            "got {err:?}"
        );
        assert_eq!(err.code(), "AUTH_ERROR");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(ctx.index_status().await, IndexStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn transient_rate_limit_still_answers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "index": 0, "embedding": [1.0, 0.0] }]
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "The sky is blue." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = corpus("The sky is blue. Grass is green.");
        let ctx = contextor(dir.path(), &server.uri(), EmptyContextPolicy::Error);
        let key = ApiKey::new("sk-test").unwrap();

        let qa = ctx.answer("What color is the sky?", &key).await.unwrap();
        assert_eq!(qa.answer, "The sky is blue.");
        assert_eq!(
            ctx.index_status().await,
            IndexStatus::Ready { documents: 1, chunks: 1 }
        );
    }

    #[tokio::test]
    async fn embeddings_rate_limit_during_build_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "index": 0, "embedding": [1.0, 0.0] }]
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "The sky is blue." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = corpus("The sky is blue.");
        let ctx = contextor(dir.path(), &server.uri(), EmptyContextPolicy::Error);
        let key = ApiKey::new("sk-test").unwrap();

        let qa = ctx.answer("What color is the sky?", &key).await.unwrap();
        assert_eq!(qa.answer, "The sky is blue.");
        assert_eq!(qa.context.len(), 1);
        assert_eq!(
            ctx.index_status().await,
            IndexStatus::Ready { documents: 1, chunks: 1 }
        );
    }
}
