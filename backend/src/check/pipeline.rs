use log::{debug, error, info};
use shared::CheckResponse;
use uuid::Uuid;

use super::error::CheckError;
use super::models::CheckForm;
use crate::inference::LocalInferenceClient;
use crate::llm::LlmGateway;
use crate::triage::{classify, synthesize};

/// Sequences one `/check` run: local inference, classification, prompt,
/// LLM. The first failure ends the run.
#[derive(Clone)]
pub struct CheckPipeline {
    local_inference: LocalInferenceClient,
    llm: LlmGateway,
}

impl CheckPipeline {
    pub fn new(local_inference: LocalInferenceClient, llm: LlmGateway) -> Self {
        Self {
            local_inference,
            llm,
        }
    }

    pub async fn run(&self, form: CheckForm) -> Result<CheckResponse, CheckError> {
        let check_id = Uuid::new_v4();
        let CheckForm { image, answers } = form;
        info!(
            "[{}] Check started: file={:?} size={} sha256={}",
            check_id,
            image.file_name,
            image.len(),
            image.digest()
        );

        let result = self.local_inference.predict(image).await.map_err(|e| {
            error!("[{}] Local inference failed: {}", check_id, e);
            CheckError::from(e)
        })?;

        let prediction = classify(&result.generated_text);
        info!("[{}] Prediction: {}", check_id, prediction);

        let prompt = synthesize(&result, &answers);
        debug!("[{}] Prompt: {}", check_id, prompt.as_str());

        let sensitive_response = self.llm.invoke(&prompt).await.map_err(|e| {
            error!("[{}] LLM call failed: {}", check_id, e);
            CheckError::from(e)
        })?;

        info!("[{}] Check completed", check_id);
        Ok(CheckResponse {
            sensitive_response,
            prediction,
        })
    }
}
