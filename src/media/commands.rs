use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SubgenError};
use super::audio::{CHANNELS, SAMPLE_RATE};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u16) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Force the output container format
    pub fn format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-f").arg(format)
    }

    async fn run(&self) -> Result<Output> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SubgenError::Extraction(format!("Failed to execute media processor: {}", e)))
    }

    /// Execute the command; a non-zero exit carries the tool's stderr.
    pub async fn execute(&self) -> Result<()> {
        let output = self.run().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubgenError::Extraction(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Execute the command and return its stdout
    pub async fn execute_capture(&self) -> Result<String> {
        let output = self.run().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubgenError::Extraction(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Builder for the media processing operations the pipeline needs
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build audio extraction command (PCM s16le, mono, 16kHz WAV)
    pub fn extract_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        additional_options: &[String],
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(SAMPLE_RATE)
            .audio_channels(CHANNELS)
            .args(additional_options.iter().cloned())
            .format("wav")
            .output(audio_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_audio_arguments() {
        let builder = MediaCommandBuilder::new("ffmpeg");
        let command = builder.extract_audio(
            Path::new("/tmp/in.mp4"),
            Path::new("/tmp/out.wav"),
            &["-af".to_string(), "loudnorm".to_string()],
        );

        assert_eq!(command.binary_path, "ffmpeg");
        assert_eq!(
            command.args,
            vec![
                "-y", "-i", "/tmp/in.mp4", "-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac",
                "1", "-af", "loudnorm", "-f", "wav", "/tmp/out.wav",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_extraction_error() {
        let command = MediaCommandBuilder::new("subgen-no-such-binary").version_check();
        match command.execute().await {
            Err(SubgenError::Extraction(msg)) => assert!(msg.contains("Failed to execute")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
