//! Upload handlers.
//!
//! Accepts a multipart form with the image, a language selector and the
//! desired export format, runs recognition and writes the export next to the
//! stored upload.

use askama::Template;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::{Html, Json},
};
use mime_guess::Mime;
use serde::Serialize;

use crate::AppState;
use crate::error::AppError;
use crate::export::{self, ExportFormat};
use crate::recognition::{AUTO_LANGUAGE, Language, RecognizedText};
use crate::storage::{StoredFile, StoredUpload};
use crate::ui::ResultTemplate;

const FILE_FIELD: &str = "file";
const LANGUAGE_FIELD: &str = "language";
const FORMAT_FIELD: &str = "output_format";

/// Raw multipart fields of an upload request.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<FilePart>,
    language: Option<String>,
    output_format: Option<String>,
}

#[derive(Debug)]
struct FilePart {
    filename: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Everything produced by one successful upload.
#[derive(Debug)]
pub struct ProcessedUpload {
    pub upload: StoredUpload,
    pub artifact: StoredFile,
    pub languages: Vec<Language>,
    pub format: ExportFormat,
    pub text: RecognizedText,
}

impl ProcessedUpload {
    /// Selector echoed back to the client: the single language code, or
    /// `auto` when several languages were used.
    pub fn language_label(&self) -> &'static str {
        match self.languages.as_slice() {
            [language] => language.code(),
            _ => AUTO_LANGUAGE,
        }
    }
}

/// JSON body of `POST /api/upload`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub language: String,
    pub format: ExportFormat,
    pub fragments: Vec<String>,
    pub text: String,
    pub image_url: String,
    pub download_url: String,
}

impl From<ProcessedUpload> for UploadResponse {
    fn from(processed: ProcessedUpload) -> Self {
        Self {
            filename: processed.upload.filename.clone(),
            language: processed.language_label().to_string(),
            format: processed.format,
            text: processed.text.joined(),
            image_url: processed.upload.public_url(),
            download_url: processed.artifact.download_url(),
            fragments: processed.text.fragments,
        }
    }
}

/// POST /upload
///
/// Browser form submission; responds with the rendered result page.
pub async fn upload_page_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let processed = process_upload(&state, multipart).await?;

    let text = processed.text.joined();
    let image_url = processed.upload.public_url();
    let download_url = processed.artifact.download_url();
    let page = ResultTemplate {
        title: "Extracted Text",
        filename: &processed.upload.filename,
        language: processed.language_label(),
        format_label: processed.format.label(),
        text: &text,
        fragment_count: processed.text.fragments.len(),
        image_url: &image_url,
        download_url: &download_url,
    }
    .render()?;

    Ok(Html(page))
}

/// POST /api/upload
///
/// Same pipeline as the form endpoint, answered with JSON.
pub async fn upload_api_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let processed = process_upload(&state, multipart).await?;
    Ok(Json(processed.into()))
}

/// Validate, store, recognise and export one upload.
///
/// Every check that can reject the request runs before anything touches
/// the storage area.
pub async fn process_upload(
    state: &AppState,
    multipart: Multipart,
) -> Result<ProcessedUpload, AppError> {
    let form = read_form(multipart).await?;

    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{FILE_FIELD}' field")))?;
    let format: ExportFormat = form
        .output_format
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{FORMAT_FIELD}' field")))?
        .parse()?;
    let languages = state
        .recognizer
        .resolve_languages(form.language.as_deref().unwrap_or(AUTO_LANGUAGE))?;

    let mime_type = effective_mime_type(&file);
    if !mime_type.starts_with("image/") || !state.recognizer.supports_mime_type(&mime_type) {
        return Err(AppError::UnsupportedMediaType(mime_type));
    }

    let upload = state
        .storage
        .save_upload(&file.filename, &mime_type, &file.bytes)
        .await?;
    tracing::info!(
        key = %upload.key,
        size = file.bytes.len(),
        mime_type = %mime_type,
        format = %format,
        languages = %Language::tesseract_spec(&languages),
        "Processing upload"
    );

    let recognized = state
        .recognizer
        .recognize(&upload.path, &mime_type, &languages)
        .await;
    let text = match recognized {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(
                key = %upload.key,
                provider = state.recognizer.provider_name(),
                error = %e,
                "Text recognition failed"
            );
            return Err(e.into());
        }
    };

    let artifact =
        export::write_artifact(&state.storage, &upload, format, &text.fragments).await?;

    tracing::info!(
        key = %upload.key,
        artifact = %artifact.key,
        fragments = text.fragments.len(),
        "Upload processed"
    );

    Ok(ProcessedUpload {
        upload,
        artifact,
        languages,
        format,
        text,
    })
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.file = Some(FilePart {
                    filename,
                    content_type,
                    bytes,
                });
            }
            Some(LANGUAGE_FIELD) => form.language = Some(field.text().await?),
            Some(FORMAT_FIELD) => form.output_format = Some(field.text().await?),
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

/// Essence of the declared content type, or the type guessed from the
/// filename when the client sent none, a generic one or one that does not
/// parse. Parameters such as `charset` are dropped.
fn effective_mime_type(file: &FilePart) -> String {
    let declared = file
        .content_type
        .as_deref()
        .and_then(|declared| declared.trim().parse::<Mime>().ok())
        .filter(|mime| *mime != mime_guess::mime::APPLICATION_OCTET_STREAM);

    match declared {
        Some(mime) => mime.essence_str().to_ascii_lowercase(),
        None => mime_guess::from_path(&file.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(filename: &str, content_type: Option<&str>) -> FilePart {
        FilePart {
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from_static(b"data"),
        }
    }

    #[test]
    fn test_declared_content_type_wins() {
        assert_eq!(
            effective_mime_type(&part("scan.bin", Some("image/png"))),
            "image/png"
        );
    }

    #[test]
    fn test_falls_back_to_filename_guess() {
        assert_eq!(effective_mime_type(&part("scan.jpg", None)), "image/jpeg");
        assert_eq!(
            effective_mime_type(&part("scan.png", Some("application/octet-stream"))),
            "image/png"
        );
        assert_eq!(
            effective_mime_type(&part("notes", None)),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_declared_parameters_are_dropped() {
        assert_eq!(
            effective_mime_type(&part("scan", Some("image/png; name=scan"))),
            "image/png"
        );
        assert_eq!(
            effective_mime_type(&part("scan", Some("IMAGE/JPEG"))),
            "image/jpeg"
        );
    }

    #[test]
    fn test_unparseable_declared_type_falls_back() {
        assert_eq!(
            effective_mime_type(&part("scan.gif", Some("not a type"))),
            "image/gif"
        );
    }
}
