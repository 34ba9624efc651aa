use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::provider::RecognitionError;

/// Languages the recognition engine can be loaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Spanish,
    French,
    German,
    Italian,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Italian,
    ];

    /// Two-letter code used on the wire and in configuration.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Italian => "it",
        }
    }

    /// Tesseract traineddata name.
    pub fn tesseract_code(self) -> &'static str {
        match self {
            Language::English => "eng",
            Language::Spanish => "spa",
            Language::French => "fra",
            Language::German => "deu",
            Language::Italian => "ita",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Italian => "Italian",
        }
    }

    /// Tesseract language string for a set, e.g. `eng+fra`.
    pub fn tesseract_spec(languages: &[Language]) -> String {
        languages
            .iter()
            .map(|l| l.tesseract_code())
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = RecognitionError;

    /// Accepts the two-letter code or the Tesseract code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == needle || l.tesseract_code() == needle)
            .ok_or_else(|| RecognitionError::UnsupportedLanguage(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!(" DE ".parse::<Language>().unwrap(), Language::German);
        assert_eq!("spa".parse::<Language>().unwrap(), Language::Spanish);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "klingon".parse::<Language>().unwrap_err();
        assert!(matches!(err, RecognitionError::UnsupportedLanguage(ref l) if l == "klingon"));
    }

    #[test]
    fn test_tesseract_spec() {
        assert_eq!(
            Language::tesseract_spec(&[Language::English, Language::Italian]),
            "eng+ita"
        );
        assert_eq!(Language::tesseract_spec(&[Language::French]), "fra");
    }
}
