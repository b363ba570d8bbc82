use crate::check::models::{LocalInferenceResult, Prompt, QUESTION_COUNT, QuestionnaireAnswers};

/// Clinical labels for `q1..q8`, in questionnaire order.
pub const QUESTION_LABELS: [&str; QUESTION_COUNT] = [
    "Previous melanoma",
    "Previous basal/squamous cell carcinoma",
    "Many moles",
    "Family history of skin cancer",
    "Fair-skinned",
    "History of sunburns",
    "Parkinson's disease",
    "Compromised immune system",
];

pub const ASSESSMENT_INSTRUCTION: &str = "Provide a brief (2-3 sentences) medical assessment focusing on key findings and clear next steps. If urgent attention is needed, state this first.";

/// Renders the LLM prompt from the image analysis and the questionnaire.
pub fn synthesize(result: &LocalInferenceResult, answers: &QuestionnaireAnswers) -> Prompt {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "\nImage Analysis Result: {} (confidence: {})\n\n",
        result.generated_text,
        format_confidence(result.confidence)
    ));

    prompt.push_str("Patient Questionnaire Responses:\n");
    for (i, (label, answer)) in QUESTION_LABELS.iter().zip(answers.as_slice()).enumerate() {
        prompt.push_str(&format!("{}. {}: {}\n", i + 1, label, answer));
    }

    prompt.push('\n');
    prompt.push_str(ASSESSMENT_INSTRUCTION);
    prompt.push('\n');

    Prompt::new(prompt)
}

/// Shortest decimal form, keeping one fractional digit for whole numbers
/// (`0.92`, `1.0`).
fn format_confidence(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
