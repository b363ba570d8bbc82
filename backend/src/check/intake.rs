use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;
use log::debug;

use super::error::IntakeError;
use super::models::{
    CheckForm, QUESTION_COUNT, QUESTION_FIELDS, QuestionnaireAnswers, UploadedImage,
};

pub const MAX_ANSWER_BYTES: usize = 64 * 1024;
const DEFAULT_FILE_NAME: &str = "upload";

#[derive(Debug, Clone, Copy)]
pub struct IntakeLimits {
    pub max_upload_bytes: usize,
}

/// Reads the `/check` form: `file` plus `q1..q8`. Other fields are drained
/// and ignored. Later duplicates of a field replace earlier ones.
pub async fn read_check_form(
    mut payload: Multipart,
    limits: IntakeLimits,
) -> Result<CheckForm, IntakeError> {
    let mut image: Option<UploadedImage> = None;
    let mut answers: [Option<String>; QUESTION_COUNT] = Default::default();

    while let Some(mut field) = payload.try_next().await.map_err(IntakeError::Unreadable)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_string();
                let content_type = field.content_type().map(|mime| mime.to_string());
                let bytes = read_field(&mut field, limits.max_upload_bytes)
                    .await?
                    .ok_or(IntakeError::FileTooLarge {
                        limit: limits.max_upload_bytes,
                    })?;
                image = Some(UploadedImage::new(bytes, file_name, content_type));
            }
            Some(other) => match QUESTION_FIELDS.iter().position(|q| *q == other) {
                Some(index) => {
                    let field_name = QUESTION_FIELDS[index];
                    let bytes = read_field(&mut field, MAX_ANSWER_BYTES)
                        .await?
                        .ok_or(IntakeError::FieldTooLarge {
                            field: field_name,
                            limit: MAX_ANSWER_BYTES,
                        })?;
                    let text =
                        String::from_utf8(bytes).map_err(|_| IntakeError::InvalidText(field_name))?;
                    answers[index] = Some(text);
                }
                None => {
                    debug!("Ignoring unexpected form field {:?}", other);
                    drain_field(&mut field).await?;
                }
            },
            None => drain_field(&mut field).await?,
        }
    }

    let image = image.ok_or(IntakeError::MissingField("file"))?;
    if image.bytes.is_empty() {
        return Err(IntakeError::EmptyFile);
    }

    if let Some(index) = answers.iter().position(Option::is_none) {
        return Err(IntakeError::MissingField(QUESTION_FIELDS[index]));
    }

    Ok(CheckForm {
        image,
        answers: QuestionnaireAnswers::new(answers.map(Option::unwrap_or_default)),
    })
}

/// Collects a field's bytes; `None` once it grows past `limit`.
async fn read_field(field: &mut Field, limit: usize) -> Result<Option<Vec<u8>>, IntakeError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(IntakeError::Unreadable)? {
        if data.len() + chunk.len() > limit {
            return Ok(None);
        }
        data.extend_from_slice(&chunk);
    }
    Ok(Some(data))
}

async fn drain_field(field: &mut Field) -> Result<(), IntakeError> {
    while field.try_next().await.map_err(IntakeError::Unreadable)?.is_some() {}
    Ok(())
}
