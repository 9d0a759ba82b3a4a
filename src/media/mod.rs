// Media extraction
//
// Turns an uploaded video container into the canonical audio payload:
// - Audio: validated WAV payload (PCM s16le, mono, 16kHz)
// - Commands: ffmpeg command builder
// - Processor: ffmpeg-backed extractor with scoped temporary files

pub mod audio;
pub mod commands;
pub mod processor;

use async_trait::async_trait;

pub use audio::*;
pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Turns video bytes into canonical audio
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Extract the audio track. `format_hint` is the container extension of
    /// the upload (e.g. `mp4`), used only to name the temporary input file.
    async fn extract_audio<'a>(&self, video: &[u8], format_hint: Option<&'a str>) -> Result<AudioPayload>;

    /// Check that the external tool can be invoked
    async fn check_availability(&self) -> Result<()>;

    /// First line of the tool's version banner
    async fn version_info(&self) -> Result<String>;
}

/// Factory for creating media extractor instances
pub struct MediaExtractorFactory;

impl MediaExtractorFactory {
    /// Create the default extractor (FFmpeg-based)
    pub fn create_extractor(config: MediaConfig) -> Box<dyn MediaExtractor> {
        Box::new(processor::FfmpegExtractor::new(config))
    }
}
