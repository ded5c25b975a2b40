use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::DecodeError;

use super::buffer::SampleBuffer;
use super::ffmpeg::pipe;

/// Output format requested from ffmpeg for non-WAV input
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    pub ffmpeg: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            sample_rate: 44_100,
            channels: 2,
        }
    }
}

/// Audio decoder: WAV in-process, everything else through an ffmpeg subprocess
pub struct AudioDecoder {
    config: DecodeConfig,
}

impl AudioDecoder {
    pub fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    /// Read and decode a file
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn decode_file(&self, path: &Path) -> Result<SampleBuffer, DecodeError> {
        let bytes = tokio::fs::read(path).await?;
        self.decode(&bytes).await
    }

    /// Decode raw file bytes to PCM
    #[instrument(skip(self, input))]
    pub async fn decode(&self, input: &[u8]) -> Result<SampleBuffer, DecodeError> {
        debug!(input_bytes = input.len(), "Decoding audio");

        let buffer = if is_riff_wave(input) {
            decode_wav(input)?
        } else {
            self.decode_with_ffmpeg(input).await?
        };

        debug!(
            channels = buffer.channel_count(),
            frames = buffer.frame_count(),
            sample_rate = buffer.sample_rate(),
            duration_secs = buffer.duration_secs(),
            "Decode complete"
        );

        Ok(buffer)
    }

    async fn decode_with_ffmpeg(&self, input: &[u8]) -> Result<SampleBuffer, DecodeError> {
        // Whatever comes in on stdin leaves as f32le at the configured rate and channel count
        let args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            "pipe:0".into(),
            "-f".into(),
            "f32le".into(),
            "-acodec".into(),
            "pcm_f32le".into(),
            "-ar".into(),
            self.config.sample_rate.to_string(),
            "-ac".into(),
            self.config.channels.to_string(),
            "pipe:1".into(),
        ];

        let output = pipe(&self.config.ffmpeg, &args, input.to_vec()).await?;
        if output.is_empty() {
            return Err(DecodeError::EmptyOutput);
        }

        let samples: Vec<f32> = output
            .chunks_exact(4)
            .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect();

        Ok(SampleBuffer::from_interleaved(
            &samples,
            self.config.channels as usize,
            self.config.sample_rate,
        )?)
    }
}

fn is_riff_wave(input: &[u8]) -> bool {
    input.len() >= 12 && &input[0..4] == b"RIFF" && &input[8..12] == b"WAVE"
}

/// Parse a WAV file at its native rate and channel count
fn decode_wav(input: &[u8]) -> Result<SampleBuffer, DecodeError> {
    let mut reader = hound::WavReader::new(Cursor::new(input))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(DecodeError::UnsupportedFormat(format!(
                    "{}-bit integer PCM",
                    spec.bits_per_sample
                )));
            }
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(SampleBuffer::from_interleaved(
        &samples,
        spec.channels as usize,
        spec.sample_rate,
    )?)
}
