use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum WavecutError {
    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Timecode error: {0}")]
    Timecode(#[from] TimecodeError),

    #[error("TUI error: {0}")]
    Tui(#[from] TuiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Sample buffer and edit operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Invalid buffer dimensions: {channels} channels, {sample_rate} Hz")]
    InvalidDimension { channels: usize, sample_rate: u32 },

    #[error("Channel {channel} has {len} frames, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        len: usize,
        expected: usize,
    },

    #[error("No selection - select a region first")]
    NoSelection,

    #[error("Selection {start:.3}s - {end:.3}s is empty")]
    DegenerateRange { start: f64, end: f64 },

    #[error("Gain factor must be greater than 0 (got {0})")]
    InvalidGain(f32),
}

/// Audio decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("ffmpeg not found - please install ffmpeg to open non-WAV files")]
    FfmpegNotFound,

    #[error("ffmpeg failed with status {status}: {stderr}")]
    FfmpegFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("ffmpeg error: {0}")]
    Ffmpeg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV parse error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Decoder produced no audio")]
    EmptyOutput,

    #[error("Decoded audio is invalid: {0}")]
    InvalidBuffer(#[from] EditError),
}

/// Failures running ffmpeg as a stdin -> stdout filter
#[derive(Error, Debug)]
pub enum PipeError {
    #[error("ffmpeg not found")]
    NotFound,

    #[error("Failed to spawn ffmpeg: {0}")]
    Spawn(std::io::Error),

    #[error("ffmpeg pipe error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffmpeg failed with status {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

impl From<PipeError> for DecodeError {
    fn from(err: PipeError) -> Self {
        match err {
            PipeError::NotFound => DecodeError::FfmpegNotFound,
            PipeError::Spawn(e) => DecodeError::Ffmpeg(format!("Failed to spawn ffmpeg: {}", e)),
            PipeError::Io(e) => DecodeError::Io(e),
            PipeError::Failed { status, stderr } => DecodeError::FfmpegFailed { status, stderr },
        }
    }
}

impl From<PipeError> for EncodeError {
    fn from(err: PipeError) -> Self {
        match err {
            PipeError::NotFound => EncodeError::FfmpegNotFound,
            PipeError::Spawn(e) => EncodeError::Ffmpeg(format!("Failed to spawn ffmpeg: {}", e)),
            PipeError::Io(e) => EncodeError::Io(e),
            PipeError::Failed { status, stderr } => EncodeError::FfmpegFailed { status, stderr },
        }
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("ffmpeg not found - WAV export is still available")]
    FfmpegNotFound,

    #[error("ffmpeg failed with status {status}: {stderr}")]
    FfmpegFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("ffmpeg error: {0}")]
    Ffmpeg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio too large for a WAV container ({0} data bytes)")]
    TooLarge(u64),
}

/// Playback errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("No audio loaded")]
    NoBuffer,

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("No audio device available")]
    NoDevice,
}

/// Typed time entry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimecodeError {
    #[error("Invalid time '{0}'")]
    Invalid(String),

    #[error("Minutes must be less than 60")]
    MinutesOutOfRange,

    #[error("Seconds must be less than 60")]
    SecondsOutOfRange,

    #[error("Milliseconds must be less than 1000")]
    MillisOutOfRange,

    #[error("Time {time:.3}s is out of range (0 - {duration:.3}s)")]
    OutOfRange { time: f64, duration: f64 },
}

/// TUI errors
#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Terminal IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for wavecut operations
pub type Result<T> = std::result::Result<T, WavecutError>;

impl WavecutError {
    /// Errors caused by what the user asked for, not by the environment
    pub fn is_user_facing(&self) -> bool {
        match self {
            WavecutError::Edit(EditError::NoSelection) => true,
            WavecutError::Edit(EditError::DegenerateRange { .. }) => true,
            WavecutError::Edit(EditError::InvalidGain(_)) => true,
            WavecutError::Playback(PlaybackError::NoBuffer) => true,
            WavecutError::Decode(_) => true,
            WavecutError::Encode(_) => true,
            WavecutError::Timecode(_) => true,
            _ => false,
        }
    }
}
