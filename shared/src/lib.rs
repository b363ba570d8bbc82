use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Triage outcome derived from the vision backend's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Prediction {
    Positive,
    Negative,
    Unsure,
}

/// Body returned by `POST /check`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CheckResponse {
    pub sensitive_response: String,
    pub prediction: Prediction,
}

/// Body returned by the local inference backend's `POST /predict`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictResponse {
    pub generated_text: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
