pub mod info;
pub mod waveform;
