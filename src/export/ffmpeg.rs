use std::future::Future;
use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::audio::ffmpeg::pipe;
use crate::audio::SampleBuffer;
use crate::error::EncodeError;

/// Compressed output settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompressedFormat {
    Mp3 { bitrate_kbps: u32 },
    /// Vorbis VBR quality, 0-10
    Ogg { quality: u8 },
}

/// Planar PCM handed to a compressed encoder
#[derive(Debug, Clone, Copy)]
pub struct PcmData<'a> {
    pub channels: &'a [Vec<f32>],
    pub sample_rate: u32,
}

impl<'a> PcmData<'a> {
    pub fn from_buffer(buffer: &'a SampleBuffer) -> Self {
        Self {
            channels: buffer.channels(),
            sample_rate: buffer.sample_rate(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Interleaved f32 little-endian bytes
    pub fn to_f32le(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.frame_count() * self.channels.len() * 4);
        for frame in 0..self.frame_count() {
            for channel in self.channels {
                out.extend_from_slice(&channel[frame].to_le_bytes());
            }
        }
        out
    }
}

/// External encoder for compressed formats
pub trait CompressedEncoder {
    fn encode<'a>(
        &'a self,
        pcm: PcmData<'a>,
        format: CompressedFormat,
    ) -> impl Future<Output = Result<Vec<u8>, EncodeError>> + Send + 'a;
}

/// Encodes MP3 (libmp3lame) and Ogg Vorbis (libvorbis) through ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }

    fn output_args(format: CompressedFormat) -> Vec<String> {
        match format {
            CompressedFormat::Mp3 { bitrate_kbps } => vec![
                "-f".into(),
                "mp3".into(),
                "-codec:a".into(),
                "libmp3lame".into(),
                "-b:a".into(),
                format!("{}k", bitrate_kbps),
            ],
            CompressedFormat::Ogg { quality } => vec![
                "-f".into(),
                "ogg".into(),
                "-codec:a".into(),
                "libvorbis".into(),
                "-q:a".into(),
                quality.min(10).to_string(),
            ],
        }
    }

    #[instrument(skip(self, pcm), fields(frames = pcm.frame_count()))]
    async fn run(&self, pcm: PcmData<'_>, format: CompressedFormat) -> Result<Vec<u8>, EncodeError> {
        // Raw f32le on stdin, container on stdout
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "f32le".into(),
            "-ar".into(),
            pcm.sample_rate.to_string(),
            "-ac".into(),
            pcm.channels.len().to_string(),
            "-i".into(),
            "pipe:0".into(),
        ];
        args.extend(Self::output_args(format));
        args.push("pipe:1".into());

        debug!(?format, "Encoding with ffmpeg");
        let output = pipe(&self.ffmpeg, &args, pcm.to_f32le()).await?;
        if output.is_empty() {
            return Err(EncodeError::Ffmpeg("Encoder produced no output".into()));
        }
        Ok(output)
    }
}

impl CompressedEncoder for FfmpegEncoder {
    fn encode<'a>(
        &'a self,
        pcm: PcmData<'a>,
        format: CompressedFormat,
    ) -> impl Future<Output = Result<Vec<u8>, EncodeError>> + Send + 'a {
        self.run(pcm, format)
    }
}
