pub mod api_key;
pub mod default_config;
pub mod llm_model_config;
