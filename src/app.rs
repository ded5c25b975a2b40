use std::path::PathBuf;

use crate::audio::{DecodeConfig, SelectionConfig};
use crate::cli::Args;
use crate::export::ExportConfig;

/// Volume presets cycled from the editor, as gain factors
pub const VOLUME_PRESETS: [f32; 3] = [0.5, 1.0, 1.5];

/// Largest playback gain the editor allows
pub const MAX_VOLUME: f32 = 1.5;

/// Runtime settings derived from the command line
#[derive(Debug, Clone)]
pub struct Settings {
    pub decode: DecodeConfig,
    pub selection: SelectionConfig,
    pub export: ExportConfig,
    pub volume: f32,
    pub seek_step_secs: f64,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            decode: DecodeConfig {
                ffmpeg: args.ffmpeg.clone(),
                sample_rate: args.decode_rate,
                channels: args.decode_channels,
            },
            selection: SelectionConfig {
                drag_threshold: args.drag_threshold.max(0.0),
                min_duration: args.min_selection.max(0.0),
            },
            export: ExportConfig {
                mp3_bitrate_kbps: args.mp3_bitrate,
                ogg_quality: args.ogg_quality,
                wav_fallback: !args.no_wav_fallback,
            },
            volume: args.volume_gain().clamp(0.0, MAX_VOLUME),
            seek_step_secs: args.seek_step.abs(),
        }
    }

    /// Step up through the presets: 50% -> 100% -> 150%
    pub fn volume_up(&mut self) {
        self.volume = VOLUME_PRESETS
            .iter()
            .copied()
            .find(|&preset| preset > self.volume + f32::EPSILON)
            .unwrap_or(MAX_VOLUME);
    }

    /// Step down through the presets: 150% -> 100% -> 50%
    pub fn volume_down(&mut self) {
        self.volume = VOLUME_PRESETS
            .iter()
            .rev()
            .copied()
            .find(|&preset| preset < self.volume - f32::EPSILON)
            .unwrap_or(VOLUME_PRESETS[0]);
    }

    /// Volume in whole percent
    pub fn volume_percent(&self) -> u32 {
        (self.volume * 100.0).round() as u32
    }
}

/// Log file for the interactive editor (`<cache>/wavecut/wavecut.log`)
pub fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("wavecut").join("wavecut.log"))
}
