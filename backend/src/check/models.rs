use sha2::{Digest, Sha256};

pub const QUESTION_COUNT: usize = 8;

/// Form field names of the questionnaire, in label order.
pub const QUESTION_FIELDS: [&str; QUESTION_COUNT] =
    ["q1", "q2", "q3", "q4", "q5", "q6", "q7", "q8"];

/// The photograph exactly as it was uploaded.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, file_name: String, content_type: Option<String>) -> Self {
        Self {
            bytes,
            file_name,
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Hex SHA-256 of the payload, used to identify the upload in logs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }
}

/// Answers to the eight fixed clinical questions, in question order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionnaireAnswers([String; QUESTION_COUNT]);

impl QuestionnaireAnswers {
    pub fn new(answers: [String; QUESTION_COUNT]) -> Self {
        Self(answers)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalInferenceResult {
    pub generated_text: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A fully validated `/check` submission.
#[derive(Debug)]
pub struct CheckForm {
    pub image: UploadedImage,
    pub answers: QuestionnaireAnswers,
}
