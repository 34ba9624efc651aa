//! Text recognition behind a provider abstraction.
//!
//! The OCR engine itself is an external collaborator. This module defines the
//! contract ("image in, ordered paragraphs out"), the concrete providers, and
//! the process-wide [`RecognitionService`] that every request shares.
//!
//! # Providers
//!
//! - [`KreuzbergProvider`] - Kreuzberg Rust core with its Tesseract backend (local, CPU only)
//! - [`MistralProvider`] - Mistral OCR API (hosted)
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::recognition::{RecognizerFactory, RecognitionService};
//!
//! let recognizer = RecognizerFactory::create(&config.recognition)?;
//! let service = RecognitionService::new(recognizer, &config.recognition)?;
//! let text = service
//!     .recognize(Path::new("uploads/scan.png"), "image/png", &[Language::English])
//!     .await?;
//! ```

mod factory;
mod kreuzberg;
mod language;
mod mistral;
mod provider;
mod service;

pub use factory::RecognizerFactory;
pub use kreuzberg::KreuzbergProvider;
pub use language::Language;
pub use mistral::MistralProvider;
pub use provider::{RecognitionError, RecognizedText, TextRecognizer};
pub use service::{AUTO_LANGUAGE, RecognitionService};

/// Split raw engine output into paragraphs.
///
/// Paragraphs are separated by blank lines. Lines inside a paragraph are
/// joined with a single space, mirroring how paragraph-mode OCR groups
/// neighbouring text boxes.
pub fn segment_paragraphs(raw: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}
