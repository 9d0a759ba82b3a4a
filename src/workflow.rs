use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SubgenError;
use crate::language::normalize_code;
use crate::media::{AudioPayload, MediaExtractor, MediaExtractorFactory};
use crate::model::GenerativeModel;
use crate::subtitle::{RepairPolicy, SubtitleDocument};
use crate::transcribe::Transcriber;
use crate::translate::{decode_subtitle_bytes, parse_source, Translator};

pub const SUBTITLE_CONTENT_TYPE: &str = "text/plain";

/// Lifecycle of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    AwaitingMedia,
    Extracting,
    AwaitingModelResponse,
    Formatting,
    Done,
    Failed,
}

impl PipelineState {
    /// The state after `next`, if that transition is allowed.
    pub fn advance(self, next: PipelineState) -> Option<PipelineState> {
        use PipelineState::*;

        let allowed = match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Idle, AwaitingMedia) => true,
            (AwaitingMedia, Extracting) => true,
            // Subtitle translation and uploaded audio have nothing to extract.
            (AwaitingMedia, AwaitingModelResponse) => true,
            (Extracting, AwaitingModelResponse) => true,
            // Audio extraction on its own ends here.
            (Extracting, Done) => true,
            (AwaitingModelResponse, Formatting) => true,
            (Formatting, Done) => true,
            _ => false,
        };

        allowed.then_some(next)
    }

    /// Stage blamed for a failure that happens in this state.
    pub fn stage(self) -> Stage {
        match self {
            PipelineState::Idle | PipelineState::AwaitingMedia => Stage::Input,
            PipelineState::Extracting => Stage::Extraction,
            PipelineState::AwaitingModelResponse => Stage::ModelRequest,
            PipelineState::Formatting | PipelineState::Done | PipelineState::Failed => Stage::Formatting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Extraction,
    ModelRequest,
    Formatting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Extraction => "extraction",
            Stage::ModelRequest => "model_request",
            Stage::Formatting => "formatting",
        };
        f.write_str(name)
    }
}

/// A failed run: the error and the stage it came from.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub error: SubgenError,
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Subtitle file produced by a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub content: String,
    pub filename: String,
    pub content_type: &'static str,
    pub block_count: usize,
}

impl Artifact {
    pub fn subtitles(document: &SubtitleDocument, filename: String) -> Self {
        Self {
            content: document.to_srt(),
            filename,
            content_type: SUBTITLE_CONTENT_TYPE,
            block_count: document.len(),
        }
    }
}

impl Artifact {
    pub async fn write_to<P: AsRef<Path>>(&self, output_path: P) -> crate::error::Result<()> {
        let output_path = output_path.as_ref();
        info!("Writing SRT file: {}", output_path.display());

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(output_path, &self.content).await?;

        info!("SRT file written with {} blocks", self.block_count);
        Ok(())
    }
}

pub fn generated_filename(language: &str) -> String {
    format!("subtitles_{}.srt", language)
}

pub fn translated_filename(language: &str) -> String {
    format!("translated_{}.srt", language)
}

/// Checked state tracker for a single run
struct PipelineRun {
    operation: &'static str,
    state: PipelineState,
}

impl PipelineRun {
    fn start(operation: &'static str) -> PipelineResult<Self> {
        let mut run = Self {
            operation,
            state: PipelineState::Idle,
        };
        run.advance(PipelineState::AwaitingMedia)?;
        Ok(run)
    }

    fn advance(&mut self, next: PipelineState) -> PipelineResult<()> {
        match self.state.advance(next) {
            Some(state) => {
                debug!("{}: {:?} -> {:?}", self.operation, self.state, state);
                self.state = state;
                Ok(())
            }
            None => {
                let error = SubgenError::Internal(format!(
                    "illegal pipeline transition {:?} -> {:?}",
                    self.state, next
                ));
                Err(self.fail(error))
            }
        }
    }

    fn fail(&mut self, error: SubgenError) -> PipelineError {
        let stage = self.state.stage();
        warn!("{} failed during {}: {}", self.operation, stage, error);
        self.state = PipelineState::Failed;
        PipelineError { stage, error }
    }

    /// Run one stage's work, moving to `Failed` if it errors.
    fn check<T>(&mut self, result: crate::error::Result<T>) -> PipelineResult<T> {
        result.map_err(|error| self.fail(error))
    }
}

/// Pipeline orchestrator: extraction, model requests and output validation
pub struct Workflow {
    extractor: Arc<dyn MediaExtractor>,
    transcriber: Transcriber,
    translator: Translator,
}

impl Workflow {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        model: Arc<dyn GenerativeModel>,
        policy: RepairPolicy,
    ) -> Self {
        Self {
            extractor,
            transcriber: Transcriber::new(model.clone(), policy),
            translator: Translator::new(model, policy),
        }
    }

    /// Build the default pipeline (ffmpeg extractor) around a model client.
    pub fn from_config(config: &Config, model: Arc<dyn GenerativeModel>) -> Self {
        let extractor: Arc<dyn MediaExtractor> =
            Arc::from(MediaExtractorFactory::create_extractor(config.media.clone()));
        Self::new(extractor, model, config.subtitle.repair_policy)
    }

    pub fn extractor(&self) -> &Arc<dyn MediaExtractor> {
        &self.extractor
    }

    /// Video bytes to canonical WAV audio.
    pub async fn extract_audio(&self, video: &[u8], format_hint: Option<&str>) -> PipelineResult<AudioPayload> {
        let mut run = PipelineRun::start("extract_audio")?;

        run.check(require_media(video, "Video"))?;
        run.advance(PipelineState::Extracting)?;
        let audio = run.check(self.extractor.extract_audio(video, format_hint).await)?;
        run.advance(PipelineState::Done)?;

        Ok(audio)
    }

    /// Uploaded WAV audio to subtitles in `target_language`.
    pub async fn generate_from_audio(&self, audio: Vec<u8>, target_language: &str) -> PipelineResult<Artifact> {
        let mut run = PipelineRun::start("generate_from_audio")?;

        let language = run.check(normalize_code(target_language))?;
        let audio = run.check(AudioPayload::from_wav_bytes(audio))?;

        self.transcribe(&mut run, &audio, &language).await
    }

    /// Full pipeline: video bytes to subtitles in `target_language`.
    pub async fn generate_from_video(
        &self,
        video: &[u8],
        format_hint: Option<&str>,
        target_language: &str,
    ) -> PipelineResult<Artifact> {
        let mut run = PipelineRun::start("generate_from_video")?;

        let language = run.check(normalize_code(target_language))?;
        run.check(require_media(video, "Video"))?;

        run.advance(PipelineState::Extracting)?;
        let audio = run.check(self.extractor.extract_audio(video, format_hint).await)?;

        self.transcribe(&mut run, &audio, &language).await
    }

    /// Translate an uploaded subtitle file, keeping numbers and timestamps.
    pub async fn translate_subtitles(
        &self,
        subtitles: &[u8],
        source_language: &str,
        target_language: &str,
    ) -> PipelineResult<Artifact> {
        let mut run = PipelineRun::start("translate_subtitles")?;

        let from = run.check(normalize_code(source_language))?;
        let to = run.check(normalize_code(target_language))?;
        run.check(require_media(subtitles, "Subtitle file"))?;
        let source = run.check(parse_source(&decode_subtitle_bytes(subtitles)))?;

        run.advance(PipelineState::AwaitingModelResponse)?;
        let raw = run.check(self.translator.request(&source, &from, &to).await)?;

        run.advance(PipelineState::Formatting)?;
        let translated = run.check(self.translator.format(&source, &raw))?;

        run.advance(PipelineState::Done)?;
        info!("Translated subtitles ready ({} blocks)", translated.len());
        Ok(Artifact::subtitles(&translated, translated_filename(&to)))
    }

    async fn transcribe(
        &self,
        run: &mut PipelineRun,
        audio: &AudioPayload,
        language: &str,
    ) -> PipelineResult<Artifact> {
        run.advance(PipelineState::AwaitingModelResponse)?;
        let raw = run.check(self.transcriber.request(audio, language).await)?;

        run.advance(PipelineState::Formatting)?;
        let document = run.check(self.transcriber.format(&raw))?;

        run.advance(PipelineState::Done)?;
        info!("Subtitles ready ({} blocks)", document.len());
        Ok(Artifact::subtitles(&document, generated_filename(language)))
    }
}

fn require_media(bytes: &[u8], what: &str) -> crate::error::Result<()> {
    if bytes.is_empty() {
        return Err(SubgenError::Validation(format!("{} upload is empty", what)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaExtractor;
    use crate::model::MockGenerativeModel;

    const SPANISH: &str = "1\n00:00:00,000 --> 00:00:02,000\nHola\n\n2\n00:00:02,000 --> 00:00:04,000\nMundo\n";

    fn wav() -> Vec<u8> {
        AudioPayload::from_samples(&vec![0i16; 3200]).unwrap().into_bytes()
    }

    fn model_answering(answer: &'static str) -> MockGenerativeModel {
        let mut model = MockGenerativeModel::new();
        model.expect_model_name().return_const("mock".to_string());
        model
            .expect_generate()
            .times(1)
            .returning(move |_| Ok(answer.to_string()));
        model
    }

    fn idle_model() -> MockGenerativeModel {
        let mut model = MockGenerativeModel::new();
        model.expect_generate().never();
        model
    }

    fn extractor_returning_wav() -> MockMediaExtractor {
        let mut extractor = MockMediaExtractor::new();
        extractor
            .expect_extract_audio()
            .times(1)
            .returning(|_, _| AudioPayload::from_wav_bytes(wav()));
        extractor
    }

    fn workflow(extractor: MockMediaExtractor, model: MockGenerativeModel) -> Workflow {
        Workflow::new(Arc::new(extractor), Arc::new(model), RepairPolicy::Lenient)
    }

    #[test]
    fn test_state_transitions() {
        use PipelineState::*;

        assert_eq!(Idle.advance(AwaitingMedia), Some(AwaitingMedia));
        assert_eq!(AwaitingMedia.advance(AwaitingModelResponse), Some(AwaitingModelResponse));
        assert_eq!(Extracting.advance(Done), Some(Done));
        assert_eq!(Formatting.advance(Failed), Some(Failed));
        assert_eq!(Idle.advance(Formatting), None);
        assert_eq!(AwaitingModelResponse.advance(Done), None);
        assert_eq!(Done.advance(Failed), None);
        assert_eq!(Failed.advance(AwaitingMedia), None);
    }

    #[test]
    fn test_illegal_transition_fails_run() {
        let mut run = PipelineRun::start("test").unwrap();
        let err = run.advance(PipelineState::Done).unwrap_err();
        assert_eq!(err.stage, Stage::Input);
        assert!(matches!(err.error, SubgenError::Internal(_)));
        assert_eq!(run.state, PipelineState::Failed);
    }

    #[tokio::test]
    async fn test_video_to_subtitles() {
        let flow = workflow(extractor_returning_wav(), model_answering(SPANISH));

        let artifact = flow
            .generate_from_video(b"fake mp4 bytes", Some("mp4"), "es")
            .await
            .unwrap();

        assert_eq!(artifact.filename, "subtitles_es.srt");
        assert_eq!(artifact.content_type, "text/plain");
        assert_eq!(artifact.block_count, 2);
        assert!(artifact.content.starts_with("1\n00:00:00,000 --> 00:00:02,000\nHola\n"));
    }

    #[tokio::test]
    async fn test_extraction_failure_is_tagged() {
        let mut extractor = MockMediaExtractor::new();
        extractor
            .expect_extract_audio()
            .returning(|_, _| Err(SubgenError::Extraction("moov atom not found".to_string())));
        let flow = workflow(extractor, idle_model());

        let err = flow
            .generate_from_video(b"broken", Some("mp4"), "es")
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Extraction);
        assert!(err.error.to_string().contains("moov atom not found"));
    }

    #[tokio::test]
    async fn test_empty_audio_is_rejected_before_model() {
        let flow = workflow(MockMediaExtractor::new(), idle_model());

        let err = flow.generate_from_audio(Vec::new(), "en").await.unwrap_err();
        assert_eq!(err.stage, Stage::Input);
        assert!(matches!(err.error, SubgenError::Validation(_)));
    }

    #[tokio::test]
    async fn test_uploaded_audio_skips_extraction() {
        let mut extractor = MockMediaExtractor::new();
        extractor.expect_extract_audio().never();
        let flow = workflow(extractor, model_answering(SPANISH));

        let artifact = flow.generate_from_audio(wav(), "es").await.unwrap();
        assert_eq!(artifact.block_count, 2);
    }

    #[tokio::test]
    async fn test_model_failure_is_tagged() {
        let mut model = MockGenerativeModel::new();
        model.expect_model_name().return_const("mock".to_string());
        model
            .expect_generate()
            .returning(|_| Err(SubgenError::ModelRequest("401 Unauthorized".to_string())));
        let flow = workflow(MockMediaExtractor::new(), model);

        let err = flow.generate_from_audio(wav(), "es").await.unwrap_err();
        assert_eq!(err.stage, Stage::ModelRequest);
    }

    #[tokio::test]
    async fn test_malformed_answer_is_tagged_formatting() {
        let flow = workflow(
            MockMediaExtractor::new(),
            model_answering("1\nHola sin tiempo\n"),
        );

        let err = flow.generate_from_audio(wav(), "es").await.unwrap_err();
        assert_eq!(err.stage, Stage::Formatting);
        assert!(matches!(err.error, SubgenError::FormatViolation { .. }));
    }

    #[tokio::test]
    async fn test_translate_subtitles() {
        let source = "1\n00:00:00,000 --> 00:00:02,000\nHello\n\n2\n00:00:02,000 --> 00:00:04,000\nWorld\n";
        let flow = workflow(MockMediaExtractor::new(), model_answering(SPANISH));

        let artifact = flow
            .translate_subtitles(source.as_bytes(), "en", "es")
            .await
            .unwrap();
        assert_eq!(artifact.filename, "translated_es.srt");
        assert_eq!(artifact.content, SPANISH);
    }

    #[tokio::test]
    async fn test_malformed_source_is_input_error() {
        let flow = workflow(MockMediaExtractor::new(), idle_model());

        let err = flow
            .translate_subtitles(b"just some text", "en", "es")
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Input);
        assert!(matches!(err.error, SubgenError::Validation(_)));
    }

    #[tokio::test]
    async fn test_artifact_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("subtitles_es.srt");
        let document = crate::translate::parse_source(SPANISH).unwrap();
        let artifact = Artifact::subtitles(&document, generated_filename("es"));

        artifact.write_to(&path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), SPANISH);
    }

    #[tokio::test]
    async fn test_extract_audio_only() {
        let flow = workflow(extractor_returning_wav(), idle_model());

        let audio = flow.extract_audio(b"fake", Some("mkv")).await.unwrap();
        assert_eq!(audio.content_type(), "audio/wav");
    }

    #[tokio::test]
    async fn test_container_hint_reaches_extractor() {
        let mut extractor = MockMediaExtractor::new();
        extractor
            .expect_extract_audio()
            .times(1)
            .returning(|video, hint| {
                assert_eq!(video, b"fake video".as_slice());
                assert_eq!(hint, Some("webm"));
                AudioPayload::from_wav_bytes(wav())
            });
        let flow = workflow(extractor, model_answering(SPANISH));

        let artifact = flow
            .generate_from_video(b"fake video", Some("webm"), "es")
            .await
            .unwrap();
        assert_eq!(artifact.block_count, 2);
    }
}
