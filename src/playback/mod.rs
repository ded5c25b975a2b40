mod clock;
mod graph;
mod rodio_graph;
mod source;

pub use clock::{PlaybackClock, TransportState};
pub use graph::{AudioGraph, SourceNode};
pub use rodio_graph::{list_audio_devices, AudioDevice, RodioGraph, RodioSource};
pub use source::{BufferSource, FrameClock};

#[cfg(test)]
pub(crate) use graph::fake;
