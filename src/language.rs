//! Display-name ↔ code table used by the HTTP and CLI front ends.
//!
//! The pipeline itself only ever sees normalized short codes
//! (see [`normalize_code`]).

use std::sync::LazyLock;

use serde::Serialize;

use crate::error::{Result, SubgenError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageTag {
    pub name: &'static str,
    pub code: &'static str,
}

static LANGUAGES: LazyLock<Vec<LanguageTag>> = LazyLock::new(|| {
    [
        ("Afrikaans", "af"),
        ("Albanian", "sq"),
        ("Arabic", "ar"),
        ("Bengali", "bn"),
        ("Chinese", "zh"),
        ("Dutch", "nl"),
        ("English", "en"),
        ("French", "fr"),
        ("German", "de"),
        ("Hindi", "hi"),
        ("Italian", "it"),
        ("Japanese", "ja"),
        ("Korean", "ko"),
        ("Portuguese", "pt"),
        ("Russian", "ru"),
        ("Spanish", "es"),
        ("Swahili", "sw"),
        ("Tamil", "ta"),
        ("Turkish", "tr"),
        ("Urdu", "ur"),
        ("Vietnamese", "vi"),
    ]
    .into_iter()
    .map(|(name, code)| LanguageTag { name, code })
    .collect()
});

/// Immutable lookup table, shared by reference.
#[derive(Debug, Clone, Copy)]
pub struct LanguageTable {
    entries: &'static [LanguageTag],
}

impl LanguageTable {
    pub fn standard() -> Self {
        Self {
            entries: LANGUAGES.as_slice(),
        }
    }

    pub fn entries(&self) -> &'static [LanguageTag] {
        self.entries
    }

    pub fn by_name(&self, name: &str) -> Option<LanguageTag> {
        self.entries
            .iter()
            .find(|tag| tag.name.eq_ignore_ascii_case(name.trim()))
            .copied()
    }

    pub fn by_code(&self, code: &str) -> Option<LanguageTag> {
        self.entries
            .iter()
            .find(|tag| tag.code.eq_ignore_ascii_case(code.trim()))
            .copied()
    }

    /// Accepts either a display name from the table or a language code.
    /// Codes outside the table are passed through once they are well-formed.
    pub fn resolve(&self, input: &str) -> Result<String> {
        if let Some(tag) = self.by_name(input) {
            return Ok(tag.code.to_string());
        }
        normalize_code(input)
    }

    /// Human-readable form for prompts: `Spanish (es)`, or the bare code.
    pub fn describe(&self, code: &str) -> String {
        match self.by_code(code) {
            Some(tag) => format!("{} ({})", tag.name, code),
            None => code.to_string(),
        }
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Checks a language code (`en`, `pt-BR`, ...) and returns it trimmed.
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim();
    let well_formed = !code.is_empty()
        && code.len() <= 16
        && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !code.starts_with('-')
        && !code.ends_with('-');

    if well_formed {
        Ok(code.to_string())
    } else {
        Err(SubgenError::Validation(format!("Invalid language code: {:?}", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_code() {
        let table = LanguageTable::standard();
        assert_eq!(table.entries().len(), 21);
        assert_eq!(table.by_name("spanish").map(|t| t.code), Some("es"));
        assert_eq!(table.by_code("JA").map(|t| t.name), Some("Japanese"));
        assert!(table.by_name("Klingon").is_none());
    }

    #[test]
    fn test_resolve_accepts_names_and_codes() {
        let table = LanguageTable::standard();
        assert_eq!(table.resolve("French").unwrap(), "fr");
        assert_eq!(table.resolve(" es ").unwrap(), "es");
        assert_eq!(table.resolve("pt-BR").unwrap(), "pt-BR");
        assert!(table.resolve("").is_err());
        assert!(table.resolve("en; drop").is_err());
        assert_eq!(table.describe("es"), "Spanish (es)");
        assert_eq!(table.describe("pt-BR"), "pt-BR");
    }

    #[test]
    fn test_normalize_code_rejects_garbage() {
        assert!(normalize_code("-en").is_err());
        assert!(normalize_code("e n").is_err());
        assert!(normalize_code("abcdefghijklmnopq").is_err());
        assert_eq!(normalize_code("zh-Hant").unwrap(), "zh-Hant");
    }
}
