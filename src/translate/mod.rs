// Translation requester
//
// Translates the text of an existing subtitle file while keeping its
// structure. The answer must reproduce the source's block numbers and
// timestamps exactly; only text may change:
// - Prompt: translation instructions

pub mod prompt;

use std::sync::Arc;
use tracing::{debug, info, warn};

pub use prompt::build_translation_prompt;

use crate::error::{Result, SubgenError};
use crate::language::{normalize_code, LanguageTable};
use crate::model::{GenerativeModel, ModelRequest};
use crate::subtitle::{Numbering, RepairPolicy, SrtParser, SubtitleDocument};

/// Decode uploaded subtitle bytes as UTF-8, dropping invalid sequences.
pub fn decode_subtitle_bytes(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Parse a user-supplied subtitle file. Source files only need increasing
/// block numbers; anything malformed is the caller's input error.
pub fn parse_source(text: &str) -> Result<SubtitleDocument> {
    let parser = SrtParser::new(RepairPolicy::Lenient).with_numbering(Numbering::Increasing);
    let (document, repairs) = parser
        .parse(text)
        .into_result()
        .map_err(|e| match e {
            SubgenError::FormatViolation { reason, .. } => {
                SubgenError::Validation(format!("Uploaded subtitles are malformed: {}", reason))
            }
            other => other,
        })?;

    for repair in &repairs {
        debug!("Cleaned uploaded subtitles: {}", repair);
    }
    Ok(document)
}

/// Check that `translated` kept every `(number, start, end)` of `source`.
pub fn verify_structure(source: &SubtitleDocument, translated: &SubtitleDocument, raw: &str) -> Result<()> {
    let expected = source.timings();
    let actual = translated.timings();

    for (want, got) in expected.iter().zip(actual.iter()) {
        if want != got {
            return Err(SubgenError::format_violation(
                format!(
                    "block {} changed: expected {} {} --> {}, found {} {} --> {}",
                    want.0,
                    want.0,
                    want.1,
                    want.2,
                    got.0,
                    got.1,
                    got.2
                ),
                raw,
            ));
        }
    }

    if expected.len() != actual.len() {
        let reason = if actual.len() > expected.len() {
            format!(
                "translation added blocks: expected {}, found {} (first extra is block {})",
                expected.len(),
                actual.len(),
                actual[expected.len()].0
            )
        } else {
            format!(
                "translation dropped blocks: expected {}, found {} (first missing is block {})",
                expected.len(),
                actual.len(),
                expected[actual.len()].0
            )
        };
        return Err(SubgenError::format_violation(reason, raw));
    }

    Ok(())
}

/// Translates subtitle text between languages
pub struct Translator {
    model: Arc<dyn GenerativeModel>,
    parser: SrtParser,
    languages: LanguageTable,
}

impl Translator {
    pub fn new(model: Arc<dyn GenerativeModel>, policy: RepairPolicy) -> Self {
        Self {
            model,
            parser: SrtParser::new(policy).with_numbering(Numbering::Increasing),
            languages: LanguageTable::standard(),
        }
    }

    /// Translate raw uploaded subtitle bytes.
    pub async fn translate_bytes(
        &self,
        bytes: &[u8],
        source_language: &str,
        target_language: &str,
    ) -> Result<SubtitleDocument> {
        let source = parse_source(&decode_subtitle_bytes(bytes))?;
        self.translate(&source, source_language, target_language).await
    }

    pub async fn translate(
        &self,
        source: &SubtitleDocument,
        source_language: &str,
        target_language: &str,
    ) -> Result<SubtitleDocument> {
        let raw = self.request(source, source_language, target_language).await?;
        self.format(source, &raw)
    }

    /// Send the canonical source and instructions; returns the untouched answer text.
    pub async fn request(
        &self,
        source: &SubtitleDocument,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let source_language = normalize_code(source_language)?;
        let target_language = normalize_code(target_language)?;

        info!(
            "Translating {} subtitle blocks from {} to {} with {}",
            source.len(),
            source_language,
            target_language,
            self.model.model_name()
        );

        let request = ModelRequest::new().text(source.to_srt()).text(build_translation_prompt(
            &self.languages.describe(&source_language),
            &self.languages.describe(&target_language),
        ));

        self.model.generate(request).await
    }

    /// Validate a model answer against the structure of `source`.
    pub fn format(&self, source: &SubtitleDocument, raw: &str) -> Result<SubtitleDocument> {
        let (translated, repairs) = self.parser.parse(raw).into_result()?;
        for repair in &repairs {
            warn!("Repaired model output: {}", repair);
        }
        verify_structure(source, &translated, raw)?;

        let unchanged = source
            .blocks()
            .iter()
            .zip(translated.blocks())
            .filter(|(a, b)| a.lines == b.lines)
            .count();
        if unchanged > 0 {
            debug!("{} block(s) kept their original text", unchanged);
        }

        info!("Translation completed ({} blocks)", translated.len());
        Ok(translated)
    }
}
