use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::export::ExportFormat;

#[derive(Parser, Debug, Clone)]
#[command(name = "wavecut")]
#[command(about = "Cut, fade and reshape audio files from the terminal")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    // Decoding
    /// Path to the ffmpeg binary used for non-WAV input and compressed export
    #[arg(long, global = true, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Sample rate requested from ffmpeg for non-WAV input
    #[arg(long, global = true, default_value = "44100")]
    pub decode_rate: u32,

    /// Channel count requested from ffmpeg for non-WAV input
    #[arg(long, global = true, default_value = "2", value_parser = clap::value_parser!(u16).range(1..=8))]
    pub decode_channels: u16,

    // Playback
    /// Playback volume in percent
    #[arg(long, global = true, default_value = "100", value_parser = clap::value_parser!(u16).range(0..=150))]
    pub volume: u16,

    /// Seek step for the arrow keys (seconds)
    #[arg(long, global = true, default_value = "1.0")]
    pub seek_step: f64,

    // Selection
    /// Pointer travel (terminal columns) before a press becomes a drag
    #[arg(long, global = true, default_value = "1.0")]
    pub drag_threshold: f64,

    /// Shortest drag selection kept (seconds)
    #[arg(long, global = true, default_value = "0.1")]
    pub min_selection: f64,

    // Export
    /// MP3 bitrate (kbps)
    #[arg(long, global = true, default_value = "192")]
    pub mp3_bitrate: u32,

    /// Ogg Vorbis quality (0-10)
    #[arg(long, global = true, default_value = "5", value_parser = clap::value_parser!(u8).range(0..=10))]
    pub ogg_quality: u8,

    /// Fail instead of writing WAV when a compressed export fails
    #[arg(long, global = true)]
    pub no_wav_fallback: bool,

    // Debug
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print duration, sample rate, channel count and peak level
    Info {
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply edits in order and export the result
    ///
    /// Edits are written `name[=value][@start-end]`: trim, delete, fade-in,
    /// fade-out, gain=1.5 (or gain=150%), normalize, reverse. Times are
    /// seconds or [[h:]m:]s[.mmm].
    Edit {
        input: PathBuf,

        /// Edit to apply (repeatable)
        #[arg(long = "op", required = true)]
        ops: Vec<String>,

        /// Output file or directory (defaults to edited_audio.<ext> here)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (defaults to the output extension, then WAV)
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
    },

    /// Open the interactive editor
    Open {
        input: PathBuf,

        /// Audio output device index (see `devices`)
        #[arg(long)]
        device: Option<usize>,

        /// Directory exports are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Format written by the export key ('w' always writes WAV)
        #[arg(long, value_enum, default_value = "mp3")]
        format: ExportFormat,
    },

    /// List audio output devices
    Devices,
}

impl Args {
    /// Volume as a gain factor
    pub fn volume_gain(&self) -> f32 {
        self.volume as f32 / 100.0
    }

    /// Whether logs must stay off the terminal
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, Command::Open { .. })
    }
}
