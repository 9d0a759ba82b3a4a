use async_trait::async_trait;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, SubgenError};
use super::{AudioPayload, MediaCommandBuilder, MediaExtractor};

/// FFmpeg-backed extractor
pub struct FfmpegExtractor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegExtractor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }

    fn temp_file(&self, prefix: &str, suffix: &str) -> Result<NamedTempFile> {
        let mut builder = Builder::new();
        builder.prefix(prefix).suffix(suffix);
        let file = match &self.config.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

/// Container extension to give the temporary input file, e.g. `.mkv`.
fn input_suffix(format_hint: Option<&str>) -> String {
    format_hint
        .map(|hint| hint.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[async_trait]
impl MediaExtractor for FfmpegExtractor {
    async fn extract_audio<'a>(&self, video: &[u8], format_hint: Option<&'a str>) -> Result<AudioPayload> {
        if video.is_empty() {
            return Err(SubgenError::Validation("Video upload is empty".to_string()));
        }

        // Both guards delete their file when dropped, whichever way this returns.
        let video_file = self.temp_file("subgen-video-", &input_suffix(format_hint))?;
        let audio_file = self.temp_file("subgen-audio-", ".wav")?;

        tokio::fs::write(video_file.path(), video).await?;
        info!(
            "Extracting audio from {} byte video ({})",
            video.len(),
            format_hint.unwrap_or("unknown container")
        );

        let command = self.command_builder.extract_audio(
            video_file.path(),
            audio_file.path(),
            &self.config.extract_options,
        );
        command.execute().await?;

        let bytes = tokio::fs::read(audio_file.path()).await?;
        debug!("FFmpeg wrote {} bytes of audio", bytes.len());

        let payload = AudioPayload::from_wav_bytes(bytes)
            .map_err(|e| SubgenError::Extraction(format!("FFmpeg produced unusable audio: {}", e)))?;

        info!("Audio extraction completed ({:.1}s of audio)", payload.duration_secs());
        Ok(payload)
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| SubgenError::Config(format!("Media processor not available: {}", e)))?;

        info!("Media processor is available");
        Ok(())
    }

    async fn version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let stdout = self.command_builder.version_check().execute_capture().await?;
        Ok(stdout.lines().next().unwrap_or("Unknown version").to_string())
    }
}
