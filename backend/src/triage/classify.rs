use shared::Prediction;

/// Maps the vision backend's free text onto a triage label.
///
/// Case-insensitive substring search, first hit wins: `"yes"` before `"no"`.
/// Text containing both therefore resolves to `Positive`, and any word that
/// merely contains `no` (e.g. "nodule") counts as a negative.
pub fn classify(text: &str) -> Prediction {
    let lower = text.to_lowercase();

    if lower.contains("yes") {
        return Prediction::Positive;
    }

    if lower.contains("no") {
        return Prediction::Negative;
    }

    Prediction::Unsure
}
