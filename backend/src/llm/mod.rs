pub mod client;
pub mod gateway;

pub use client::{ChatCompletion, OpenAiChatClient};
pub use gateway::{CredentialSource, EnvCredential, LlmGateway};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{0} environment variable is not set")]
    Configuration(String),
    #[error("LLM invocation failed: {0}")]
    Invocation(String),
}
