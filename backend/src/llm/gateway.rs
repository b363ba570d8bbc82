use actix_web::web;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::{ChatCompletion, LlmError};
use crate::check::models::Prompt;

/// Where the LLM API key comes from. Resolved on every call, so a key added
/// to the environment after startup is picked up.
pub trait CredentialSource: Send + Sync {
    fn name(&self) -> &str;
    fn resolve(&self) -> Option<String>;
}

pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredential {
    fn name(&self) -> &str {
        &self.var
    }

    fn resolve(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Runs the blocking chat client on actix's blocking pool, never inline on a
/// request worker. At most `workers` calls are in flight at once.
#[derive(Clone)]
pub struct LlmGateway {
    client: Arc<dyn ChatCompletion>,
    credential: Arc<dyn CredentialSource>,
    workers: Arc<Semaphore>,
}

impl LlmGateway {
    pub fn new(
        client: Arc<dyn ChatCompletion>,
        credential: Arc<dyn CredentialSource>,
        workers: usize,
    ) -> Self {
        Self {
            client,
            credential,
            workers: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    pub async fn invoke(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let api_key = self
            .credential
            .resolve()
            .ok_or_else(|| LlmError::Configuration(self.credential.name().to_string()))?;

        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LlmError::Invocation("LLM worker pool is closed".to_string()))?;
        debug!("LLM worker acquired, {} left", self.available_workers());

        let client = Arc::clone(&self.client);
        let prompt = prompt.as_str().to_owned();

        // The permit lives inside the closure: if the request is dropped, the
        // slot stays taken until the blocking call actually returns.
        let completion = web::block(move || {
            let _permit = permit;
            client.complete(&api_key, &prompt)
        })
        .await
        .map_err(|e| LlmError::Invocation(format!("LLM worker failed: {}", e)))??;

        info!("LLM completion received ({} chars)", completion.len());
        Ok(completion)
    }
}
