use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::language::LanguageTag;
use crate::workflow::Artifact;
use super::error::HttpError;
use super::AppState;

const AUDIO_CONTENT_TYPES: &[&str] = &["audio/wav", "audio/x-wav", "audio/wave"];
const SUBTITLE_CONTENT_TYPES: &[&str] = &["application/x-subrip", "text/plain"];

/// Uploaded file part
#[derive(Debug)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Media type without parameters, lowercased.
    pub fn mime(&self) -> String {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Extension of the uploaded filename, used as the container hint.
    pub fn extension(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
    }

    fn stem(&self) -> &str {
        self.filename
            .as_deref()
            .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name))
            .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
            .filter(|stem| !stem.is_empty())
            .unwrap_or("audio")
    }
}

/// Multipart form: one `file` part plus text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    file: Option<Upload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, HttpError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "file" {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                form.file = Some(Upload {
                    filename,
                    content_type,
                    bytes,
                });
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn take_file(&mut self) -> Result<Upload, HttpError> {
        self.file
            .take()
            .ok_or_else(|| HttpError::bad_request("Missing form field: file"))
    }

    pub fn field(&self, name: &str) -> Result<&str, HttpError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| HttpError::bad_request(format!("Missing form field: {}", name)))
    }
}

fn multipart_error(err: MultipartError) -> HttpError {
    let status = err.status();
    HttpError::bad_request(format!("Malformed upload: {}", err.body_text())).with_status(status)
}

fn subtitle_response(artifact: Artifact) -> Response {
    let disposition = format!("attachment; filename={}", artifact.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format!("{}; charset=utf-8", artifact.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.content,
    )
        .into_response()
}

fn resolve_language(state: &AppState, form: &UploadForm, name: &str) -> Result<String, HttpError> {
    let value = form.field(name)?;
    state
        .languages
        .resolve(value)
        .map_err(|e| HttpError::bad_request(e.to_string()))
}

fn require_video(upload: &Upload) -> Result<(), HttpError> {
    if !upload.mime().starts_with("video/") {
        return Err(HttpError::bad_request("Must upload a video file"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ExtractedAudio {
    pub filename: String,
    pub content_type: &'static str,
    /// Hex-encoded WAV bytes
    pub data: String,
}

/// POST /extract-audio/
pub async fn extract_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractedAudio>, HttpError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    require_video(&upload)?;

    tracing::info!(
        bytes = upload.bytes.len(),
        content_type = %upload.mime(),
        "received extract-audio request"
    );

    let audio = state
        .workflow
        .extract_audio(&upload.bytes, upload.extension())
        .await
        .map_err(|error| {
            tracing::error!(error = %error, "extract-audio request failed");
            HttpError::from(error)
        })?;

    tracing::info!(duration_secs = audio.duration_secs(), "extract-audio request completed");
    Ok(Json(ExtractedAudio {
        filename: format!("{}.wav", upload.stem()),
        content_type: audio.content_type(),
        data: hex::encode(audio.bytes()),
    }))
}

/// POST /generate-subs/
pub async fn generate_subs(State(state): State<AppState>, multipart: Multipart) -> Result<Response, HttpError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    if !AUDIO_CONTENT_TYPES.contains(&upload.mime().as_str()) {
        return Err(HttpError::bad_request("Audio must be WAV (16kHz mono)"));
    }
    let language = resolve_language(&state, &form, "target_lang")?;

    tracing::info!(
        bytes = upload.bytes.len(),
        target_lang = %language,
        "received generate-subs request"
    );

    let artifact = state
        .workflow
        .generate_from_audio(upload.bytes, &language)
        .await
        .map_err(|error| {
            tracing::error!(error = %error, "generate-subs request failed");
            HttpError::from(error)
        })?;

    tracing::info!(block_count = artifact.block_count, "generate-subs request completed");
    Ok(subtitle_response(artifact))
}

/// POST /translate-srt/
pub async fn translate_srt(State(state): State<AppState>, multipart: Multipart) -> Result<Response, HttpError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    if !SUBTITLE_CONTENT_TYPES.contains(&upload.mime().as_str()) {
        return Err(HttpError::bad_request("Upload must be an .srt file"));
    }
    let from = resolve_language(&state, &form, "from_lang")?;
    let to = resolve_language(&state, &form, "to_lang")?;

    tracing::info!(
        bytes = upload.bytes.len(),
        from_lang = %from,
        to_lang = %to,
        "received translate-srt request"
    );

    let artifact = state
        .workflow
        .translate_subtitles(&upload.bytes, &from, &to)
        .await
        .map_err(|error| {
            tracing::error!(error = %error, "translate-srt request failed");
            HttpError::from(error)
        })?;

    tracing::info!(block_count = artifact.block_count, "translate-srt request completed");
    Ok(subtitle_response(artifact))
}

/// POST /process-video/
pub async fn process_video(State(state): State<AppState>, multipart: Multipart) -> Result<Response, HttpError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    require_video(&upload)?;
    let language = resolve_language(&state, &form, "target_lang")?;

    tracing::info!(
        bytes = upload.bytes.len(),
        target_lang = %language,
        "received process-video request"
    );

    let artifact = state
        .workflow
        .generate_from_video(&upload.bytes, upload.extension(), &language)
        .await
        .map_err(|error| {
            tracing::error!(error = %error, "process-video request failed");
            HttpError::from(error)
        })?;

    tracing::info!(block_count = artifact.block_count, "process-video request completed");
    Ok(subtitle_response(artifact))
}

/// GET /languages
pub async fn languages(State(state): State<AppState>) -> Json<&'static [LanguageTag]> {
    Json(state.languages.entries())
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(filename: Option<&str>, content_type: Option<&str>) -> Upload {
        Upload {
            filename: filename.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: Vec::new(),
        }
    }

    #[test]
    fn test_mime_ignores_parameters() {
        assert_eq!(upload(None, Some("Text/Plain; charset=utf-8")).mime(), "text/plain");
        assert_eq!(upload(None, None).mime(), "");
    }

    #[test]
    fn test_extension_and_stem() {
        let clip = upload(Some("holiday.clip.mp4"), None);
        assert_eq!(clip.extension(), Some("mp4"));
        assert_eq!(clip.stem(), "holiday.clip");

        let bare = upload(Some("C:\\videos\\movie.mkv"), None);
        assert_eq!(bare.stem(), "movie");
        assert_eq!(upload(None, None).stem(), "audio");
        assert_eq!(upload(None, None).extension(), None);
    }
}
