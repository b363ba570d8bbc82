use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

use crate::inference::LocalInferenceError;
use crate::llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Could not read the uploaded file")]
    Unreadable(#[source] actix_multipart::MultipartError),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("Uploaded file exceeds {limit} bytes")]
    FileTooLarge { limit: usize },
    #[error("Field {field} exceeds {limit} bytes")]
    FieldTooLarge { field: &'static str, limit: usize },
    #[error("Field {0} is not valid UTF-8")]
    InvalidText(&'static str),
}

/// Every way a `/check` request can fail.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    LocalInference(#[from] LocalInferenceError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl CheckError {
    /// Message shown to the caller. Upstream bodies stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            CheckError::Intake(e) => e.to_string(),
            CheckError::LocalInference(LocalInferenceError::Unavailable(_)) => {
                "Error contacting local prediction service".to_string()
            }
            CheckError::LocalInference(LocalInferenceError::Rejected { .. }) => {
                "Local prediction service returned an error".to_string()
            }
            CheckError::LocalInference(LocalInferenceError::Schema(_)) => {
                "Invalid response from local prediction service".to_string()
            }
            CheckError::LocalInference(LocalInferenceError::ContentType(_)) => {
                "Uploaded file has an invalid content type".to_string()
            }
            CheckError::Llm(LlmError::Configuration(var)) => {
                format!("{} environment variable is not set", var)
            }
            CheckError::Llm(LlmError::Invocation(msg)) => format!("Error calling LLM: {}", msg),
        }
    }
}

impl ResponseError for CheckError {
    fn status_code(&self) -> StatusCode {
        match self {
            CheckError::Intake(_)
            | CheckError::LocalInference(LocalInferenceError::ContentType(_)) => {
                StatusCode::BAD_REQUEST
            }
            CheckError::LocalInference(LocalInferenceError::Rejected { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            CheckError::LocalInference(_) | CheckError::Llm(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.client_message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> CheckError {
        LocalInferenceError::Rejected {
            status,
            body: "boom".into(),
        }
        .into()
    }

    #[test]
    fn intake_errors_are_bad_requests() {
        let err: CheckError = IntakeError::MissingField("q3").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "Missing required field: q3");
    }

    #[test]
    fn upstream_status_is_propagated() {
        assert_eq!(rejected(503).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(rejected(422).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            rejected(503).client_message(),
            "Local prediction service returned an error"
        );
    }

    #[test]
    fn server_side_failures_are_500() {
        let schema: CheckError = LocalInferenceError::Schema("missing field".into()).into();
        let config: CheckError = LlmError::Configuration("NEBIUS_KEY".into()).into();
        let llm: CheckError = LlmError::Invocation("timeout".into()).into();

        for err in [&schema, &config, &llm] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        assert_eq!(config.client_message(), "NEBIUS_KEY environment variable is not set");
        assert_eq!(llm.client_message(), "Error calling LLM: timeout");
    }

    #[test]
    fn bad_upload_content_type_is_a_bad_request() {
        let err: CheckError = LocalInferenceError::ContentType("image/".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "Uploaded file has an invalid content type");
    }
}
