// Transcription requester
//
// One multi-part model call (inline WAV + instructions) per request. The
// answer is untrusted text and only leaves this module as a validated
// SubtitleDocument:
// - Prompt: instructions and the worked example

pub mod prompt;

use std::sync::Arc;
use tracing::{info, warn};

pub use prompt::build_transcription_prompt;

use crate::error::Result;
use crate::language::{normalize_code, LanguageTable};
use crate::media::AudioPayload;
use crate::model::{GenerativeModel, ModelRequest};
use crate::subtitle::{Numbering, RepairPolicy, SrtParser, SubtitleDocument};

/// Turns audio into subtitles in a target language
pub struct Transcriber {
    model: Arc<dyn GenerativeModel>,
    parser: SrtParser,
    languages: LanguageTable,
}

impl Transcriber {
    pub fn new(model: Arc<dyn GenerativeModel>, policy: RepairPolicy) -> Self {
        Self {
            model,
            parser: SrtParser::new(policy).with_numbering(Numbering::Sequential),
            languages: LanguageTable::standard(),
        }
    }

    /// Full transcription: one model call, then validation of the answer.
    pub async fn transcribe(&self, audio: &AudioPayload, target_language: &str) -> Result<SubtitleDocument> {
        let raw = self.request(audio, target_language).await?;
        self.format(&raw)
    }

    /// Send the audio and instructions; returns the untouched answer text.
    pub async fn request(&self, audio: &AudioPayload, target_language: &str) -> Result<String> {
        let target_language = normalize_code(target_language)?;

        info!(
            "Requesting {} subtitles for {:.1}s of audio from {}",
            target_language,
            audio.duration_secs(),
            self.model.model_name()
        );

        let request = ModelRequest::new()
            .inline_data(audio.content_type(), audio.bytes().to_vec())
            .text(build_transcription_prompt(&self.languages.describe(&target_language)));

        self.model.generate(request).await
    }

    /// Validate a model answer into a document numbered contiguously from 1.
    pub fn format(&self, raw: &str) -> Result<SubtitleDocument> {
        let (document, repairs) = self.parser.parse(raw).into_result()?;
        for repair in &repairs {
            warn!("Repaired model output: {}", repair);
        }

        info!("Transcription produced {} subtitle blocks", document.len());
        Ok(document)
    }
}
