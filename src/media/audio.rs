use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{Result, SubgenError};

pub const SAMPLE_RATE: u32 = 16_000;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const CONTENT_TYPE: &str = "audio/wav";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// PCM s16le, mono, 16 kHz: the only format the model requesters accept.
    pub const CANONICAL: AudioFormat = AudioFormat {
        sample_rate: SAMPLE_RATE,
        channels: CHANNELS,
        bits_per_sample: BITS_PER_SAMPLE,
    };
}

/// WAV bytes that passed header validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    bytes: Vec<u8>,
    format: AudioFormat,
    samples: u32,
}

impl AudioPayload {
    pub fn from_wav_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(SubgenError::Validation("Audio payload is empty".to_string()));
        }

        let reader = WavReader::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| SubgenError::Validation(format!("Audio is not a valid WAV file: {}", e)))?;
        let spec = reader.spec();
        let samples = reader.len();

        if spec.sample_format != SampleFormat::Int {
            return Err(SubgenError::Validation(
                "Audio must be integer PCM, found floating point samples".to_string(),
            ));
        }
        let format = AudioFormat {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
        };
        if format != AudioFormat::CANONICAL {
            return Err(SubgenError::Validation(format!(
                "Audio must be 16-bit PCM mono at 16kHz, found {}-bit, {} channel(s), {}Hz",
                format.bits_per_sample, format.channels, format.sample_rate
            )));
        }
        if samples == 0 {
            return Err(SubgenError::Validation("Audio contains no samples".to_string()));
        }

        Ok(Self {
            bytes,
            format,
            samples,
        })
    }

    /// Encode mono 16 kHz samples as a WAV payload.
    pub fn from_samples(samples: &[i16]) -> Result<Self> {
        let spec = WavSpec {
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)
                .map_err(|e| SubgenError::Validation(format!("Failed to encode WAV: {}", e)))?;
            for sample in samples {
                writer
                    .write_sample(*sample)
                    .map_err(|e| SubgenError::Validation(format!("Failed to encode WAV: {}", e)))?;
            }
            writer
                .finalize()
                .map_err(|e| SubgenError::Validation(format!("Failed to encode WAV: {}", e)))?;
        }

        Self::from_wav_bytes(cursor.into_inner())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples as f64 / self.format.sample_rate as f64
    }
}
