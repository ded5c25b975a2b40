mod ffmpeg;
mod wav;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::audio::SampleBuffer;
use crate::error::EncodeError;

pub use ffmpeg::{CompressedEncoder, CompressedFormat, FfmpegEncoder, PcmData};
pub use wav::{encode_wav, quantize, HEADER_LEN};

/// Base name for exported files
pub const DEFAULT_FILE_STEM: &str = "edited_audio";

/// Export container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Wav,
    Mp3,
    Ogg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
            ExportFormat::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "audio/wav",
            ExportFormat::Mp3 => "audio/mpeg",
            ExportFormat::Ogg => "audio/ogg",
        }
    }

    /// `edited_audio.<ext>`
    pub fn default_file_name(&self) -> String {
        format!("{}.{}", DEFAULT_FILE_STEM, self.extension())
    }

    /// Guess from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "wav" => Some(ExportFormat::Wav),
            "mp3" => Some(ExportFormat::Mp3),
            "ogg" | "oga" => Some(ExportFormat::Ogg),
            _ => None,
        }
    }
}

/// Compressed encoder settings and fallback policy
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub mp3_bitrate_kbps: u32,
    pub ogg_quality: u8,
    /// Write WAV when a compressed encode fails
    pub wav_fallback: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mp3_bitrate_kbps: 192,
            ogg_quality: 5,
            wav_fallback: true,
        }
    }
}

/// Encoded bytes plus the format actually produced
#[derive(Debug, Clone)]
pub struct ExportedAudio {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// Requested format failed and WAV was written instead
    pub fell_back: bool,
}

impl ExportedAudio {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// A file written to disk
#[derive(Debug, Clone, Serialize)]
pub struct SavedExport {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub mime_type: &'static str,
    pub bytes: usize,
    pub fell_back: bool,
}

/// Encodes a buffer in the requested format
pub struct Exporter<E> {
    encoder: E,
    config: ExportConfig,
}

impl<E: CompressedEncoder> Exporter<E> {
    pub fn new(encoder: E, config: ExportConfig) -> Self {
        Self { encoder, config }
    }

    /// Encode, falling back to WAV when enabled and a compressed encode fails
    #[instrument(skip(self, buffer))]
    pub async fn export(&self, buffer: &SampleBuffer, format: ExportFormat) -> Result<ExportedAudio, EncodeError> {
        let compressed = match format {
            ExportFormat::Wav => {
                return Ok(ExportedAudio {
                    format,
                    bytes: encode_wav(buffer)?,
                    fell_back: false,
                })
            }
            ExportFormat::Mp3 => CompressedFormat::Mp3 {
                bitrate_kbps: self.config.mp3_bitrate_kbps,
            },
            ExportFormat::Ogg => CompressedFormat::Ogg {
                quality: self.config.ogg_quality,
            },
        };

        match self.encoder.encode(PcmData::from_buffer(buffer), compressed).await {
            Ok(bytes) => Ok(ExportedAudio {
                format,
                bytes,
                fell_back: false,
            }),
            Err(e) if self.config.wav_fallback => {
                warn!(error = %e, ?format, "Compressed export failed, writing WAV instead");
                Ok(ExportedAudio {
                    format: ExportFormat::Wav,
                    bytes: encode_wav(buffer)?,
                    fell_back: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Encode and write
    ///
    /// A directory target receives `edited_audio.<ext>`; a file target keeps
    /// its name, with the extension switched when WAV fallback kicked in.
    pub async fn export_to(
        &self,
        buffer: &SampleBuffer,
        format: ExportFormat,
        target: &Path,
    ) -> Result<SavedExport, EncodeError> {
        let exported = self.export(buffer, format).await?;
        let path = output_path(target, &exported).await;

        tokio::fs::write(&path, &exported.bytes).await?;

        info!(
            path = %path.display(),
            format = exported.format.extension(),
            bytes = exported.bytes.len(),
            fell_back = exported.fell_back,
            "Export written"
        );

        Ok(SavedExport {
            path,
            format: exported.format,
            mime_type: exported.mime_type(),
            bytes: exported.bytes.len(),
            fell_back: exported.fell_back,
        })
    }
}

async fn output_path(target: &Path, exported: &ExportedAudio) -> PathBuf {
    let is_dir = tokio::fs::metadata(target)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    if is_dir {
        target.join(exported.format.default_file_name())
    } else if exported.fell_back {
        target.with_extension(exported.format.extension())
    } else {
        target.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;

    struct FixedEncoder(Result<Vec<u8>, ()>);

    impl CompressedEncoder for FixedEncoder {
        fn encode<'a>(
            &'a self,
            _pcm: PcmData<'a>,
            _format: CompressedFormat,
        ) -> impl Future<Output = Result<Vec<u8>, EncodeError>> + Send + 'a {
            let result = self
                .0
                .clone()
                .map_err(|_| EncodeError::Ffmpeg("encoder unavailable".into()));
            async move { result }
        }
    }

    fn buffer() -> SampleBuffer {
        SampleBuffer::from_channels(vec![vec![0.1, -0.2, 0.3]], 8000).unwrap()
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::Wav.default_file_name(), "edited_audio.wav");
        assert_eq!(ExportFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(ExportFormat::Ogg.mime_type(), "audio/ogg");
        assert_eq!(ExportFormat::from_path(Path::new("a/b.MP3")), Some(ExportFormat::Mp3));
        assert_eq!(ExportFormat::from_path(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn test_wav_bypasses_encoder() {
        let exporter = Exporter::new(FixedEncoder(Err(())), ExportConfig::default());
        let exported = exporter.export(&buffer(), ExportFormat::Wav).await.unwrap();
        assert_eq!(exported.format, ExportFormat::Wav);
        assert_eq!(exported.bytes, encode_wav(&buffer()).unwrap());
        assert!(!exported.fell_back);
    }

    #[tokio::test]
    async fn test_compressed_bytes_pass_through() {
        let exporter = Exporter::new(FixedEncoder(Ok(vec![0xff, 0xfb])), ExportConfig::default());
        let exported = exporter.export(&buffer(), ExportFormat::Mp3).await.unwrap();
        assert_eq!(exported.format, ExportFormat::Mp3);
        assert_eq!(exported.bytes, vec![0xff, 0xfb]);
    }

    #[tokio::test]
    async fn test_failed_encoder_falls_back_to_wav() {
        let exporter = Exporter::new(FixedEncoder(Err(())), ExportConfig::default());
        let exported = exporter.export(&buffer(), ExportFormat::Ogg).await.unwrap();
        assert!(exported.fell_back);
        assert_eq!(exported.format, ExportFormat::Wav);
        assert_eq!(exported.mime_type(), "audio/wav");
        assert_eq!(&exported.bytes[0..4], b"RIFF");
    }

    #[tokio::test]
    async fn test_fallback_can_be_disabled() {
        let config = ExportConfig {
            wav_fallback: false,
            ..ExportConfig::default()
        };
        let exporter = Exporter::new(FixedEncoder(Err(())), config);
        let result = exporter.export(&buffer(), ExportFormat::Mp3).await;
        assert!(matches!(result, Err(EncodeError::Ffmpeg(_))));
    }

    #[tokio::test]
    async fn test_export_into_directory_uses_default_name() {
        let dir = std::env::temp_dir().join(format!("wavecut-export-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let exporter = Exporter::new(FixedEncoder(Err(())), ExportConfig::default());
        let saved = exporter.export_to(&buffer(), ExportFormat::Mp3, &dir).await.unwrap();
        assert_eq!(saved.path, dir.join("edited_audio.wav"));
        assert!(saved.fell_back);

        let written = tokio::fs::read(&saved.path).await.unwrap();
        assert_eq!(written.len(), saved.bytes);

        let file_target = dir.join("song.mp3");
        let saved = exporter.export_to(&buffer(), ExportFormat::Mp3, &file_target).await.unwrap();
        assert_eq!(saved.path, dir.join("song.wav"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
