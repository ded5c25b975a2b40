mod buffer;
mod decode;
pub mod ffmpeg;
pub mod ops;
mod selection;
pub mod timecode;
pub mod waveform;

pub use buffer::SampleBuffer;
pub use decode::{AudioDecoder, DecodeConfig};
pub use selection::{PointerRelease, SelectionConfig, SelectionModel, TimeRange};
