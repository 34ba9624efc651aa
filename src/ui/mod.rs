//! Askama views for the browser front-end.
//!
//! Each struct corresponds to an HTML template in the templates/ directory.

use askama::Template;

use crate::export::ExportFormat;
use crate::recognition::{AUTO_LANGUAGE, Language, RecognitionService};

/// One `<option>` of a select box.
#[derive(Debug)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Upload form.
#[derive(Debug, Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub languages: Vec<SelectOption>,
    pub formats: Vec<SelectOption>,
    pub max_upload_mb: usize,
}

impl<'a> IndexTemplate<'a> {
    pub fn new(recognizer: &RecognitionService, max_upload_bytes: usize) -> Self {
        Self {
            title: "Image to Text",
            languages: language_options(recognizer.supported_languages()),
            formats: ExportFormat::ALL
                .into_iter()
                .map(|f| SelectOption::new(f.extension(), f.label()))
                .collect(),
            max_upload_mb: max_upload_bytes.div_ceil(1024 * 1024),
        }
    }
}

/// Outcome of a recognition request.
#[derive(Debug, Template)]
#[template(path = "result.html")]
pub struct ResultTemplate<'a> {
    pub title: &'a str,
    pub filename: &'a str,
    pub language: &'a str,
    pub format_label: &'a str,
    pub text: &'a str,
    pub fragment_count: usize,
    pub image_url: &'a str,
    pub download_url: &'a str,
}

fn language_options(languages: &[Language]) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new(AUTO_LANGUAGE, "Auto-detect"))
        .chain(
            languages
                .iter()
                .map(|l| SelectOption::new(l.code(), l.display_name())),
        )
        .collect()
}
