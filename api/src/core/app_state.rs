use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use contextor::Contextor;

use crate::error_handler::AppError;

/// Listener and static asset settings.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for every path without a route.
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Load `API_HOST`, `PORT` and `STATIC_DIR` from the environment.
    ///
    /// # Errors
    /// `AppError::Config` when `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self, AppError> {
        let port = match std::env::var("PORT") {
            Ok(v) if !v.trim().is_empty() => v
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("PORT has an invalid value `{v}`")))?,
            _ => 3000,
        };
        Ok(Self {
            host: env_or("API_HOST", "0.0.0.0"),
            port,
            static_dir: env_or("STATIC_DIR", "public").into(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Answer pipeline with the cached corpus index.
    pub contextor: Arc<Contextor>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(contextor: Contextor) -> Self {
        Self {
            contextor: Arc::new(contextor),
            started_at: Instant::now(),
        }
    }

    /// Build the pipeline from environment variables.
    ///
    /// # Errors
    /// `AppError::Init` on malformed LLM or RAG settings.
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(Contextor::from_env().map_err(AppError::Init)?))
    }
}

fn env_or(k: &str, dflt: &str) -> String {
    match std::env::var(k) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => dflt.to_string(),
    }
}
