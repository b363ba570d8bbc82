use log::{debug, error, info};
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use shared::PredictResponse;
use std::time::Duration;
use url::Url;

use crate::check::models::{LocalInferenceResult, UploadedImage};

#[derive(Debug, thiserror::Error)]
pub enum LocalInferenceError {
    #[error("Local inference backend unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("Local inference backend returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Invalid response from local inference backend: {0}")]
    Schema(String),
    #[error("Invalid upload content type {0:?}")]
    ContentType(String),
}

/// Client for the vision backend's `POST /predict`.
#[derive(Clone)]
pub struct LocalInferenceClient {
    http_client: HttpClient,
    predict_url: Url,
}

impl LocalInferenceClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        // base_url always ends with '/', so this join cannot fail
        let predict_url = base_url
            .join("predict")
            .unwrap_or_else(|_| base_url.clone());

        Ok(Self {
            http_client,
            predict_url,
        })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    /// Sends the image as multipart field `file`. One attempt, no retry.
    pub async fn predict(
        &self,
        image: UploadedImage,
    ) -> Result<LocalInferenceResult, LocalInferenceError> {
        let UploadedImage {
            bytes,
            file_name,
            content_type,
        } = image;

        let form = Form::new().part("file", file_part(bytes, file_name, content_type)?);

        let response = self
            .http_client
            .post(self.predict_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Error contacting local inference backend at {}: {}", self.predict_url, e);
                LocalInferenceError::Unavailable(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!("Local inference backend returned {}: {}", status, body);
            return Err(LocalInferenceError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        debug!("Local inference response: {}", String::from_utf8_lossy(&body));
        let result = parse_predict_response(&body)?;
        info!(
            "Local inference result: {:?} (confidence: {})",
            result.generated_text, result.confidence
        );
        Ok(result)
    }
}

fn file_part(
    bytes: Vec<u8>,
    file_name: String,
    content_type: Option<String>,
) -> Result<Part, LocalInferenceError> {
    let part = Part::bytes(bytes).file_name(file_name);
    match content_type {
        Some(content_type) => part
            .mime_str(&content_type)
            .map_err(|_| LocalInferenceError::ContentType(content_type)),
        None => Ok(part),
    }
}

/// Decodes and validates a `/predict` body.
pub fn parse_predict_response(body: &[u8]) -> Result<LocalInferenceResult, LocalInferenceError> {
    let parsed: PredictResponse = serde_json::from_slice(body)
        .map_err(|e| LocalInferenceError::Schema(e.to_string()))?;

    if !parsed.confidence.is_finite() || !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(LocalInferenceError::Schema(format!(
            "confidence {} is outside [0, 1]",
            parsed.confidence
        )));
    }

    Ok(LocalInferenceResult {
        generated_text: parsed.generated_text,
        confidence: parsed.confidence,
    })
}
