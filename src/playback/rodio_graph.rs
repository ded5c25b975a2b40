use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, info, instrument, warn};

use crate::audio::SampleBuffer;
use crate::error::PlaybackError;

use super::graph::{AudioGraph, SourceNode};
use super::source::{BufferSource, FrameClock};

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub name: String,
    pub index: usize,
    pub is_default: bool,
}

/// Get list of available audio output devices
pub fn list_audio_devices() -> Result<Vec<AudioDevice>, PlaybackError> {
    let host = rodio::cpal::default_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let output_devices = host
        .output_devices()
        .map_err(|e| PlaybackError::Device(format!("Failed to enumerate audio devices: {}", e)))?;

    let devices = output_devices
        .enumerate()
        .map(|(index, device)| {
            let name = device.name().unwrap_or_else(|_| format!("Device {}", index));
            let is_default = default_name.as_deref() == Some(name.as_str());
            AudioDevice {
                name,
                index,
                is_default,
            }
        })
        .collect();

    Ok(devices)
}

/// Volume shared by the graph and the sink currently playing
struct GainStage {
    volume: f32,
    active: Option<Weak<Sink>>,
}

/// Output graph on a rodio stream
///
/// Each source gets its own sink so stopping one never touches the next.
/// The graph clock only moves while the device pulls frames from the
/// current source, so it runs ahead of what is heard by the output's
/// buffer latency and never drifts from the samples actually played.
pub struct RodioGraph {
    /// Keep the stream alive (dropping it stops audio)
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    clock: Arc<FrameClock>,
    gain: Arc<Mutex<GainStage>>,
}

impl RodioGraph {
    /// Open a specific device, or the default one
    #[instrument]
    pub fn with_device(device_index: Option<usize>) -> Result<Self, PlaybackError> {
        info!("Initializing audio output");

        let opened = match device_index {
            Some(index) => open_device(index),
            None => None,
        };

        let (stream, stream_handle) = match opened {
            Some(pair) => pair,
            None => OutputStream::try_default().map_err(|e| match e {
                rodio::StreamError::NoDevice => PlaybackError::NoDevice,
                e => PlaybackError::Device(format!("Failed to open audio device: {}", e)),
            })?,
        };

        debug!("Audio output initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
            clock: Arc::new(FrameClock::default()),
            gain: Arc::new(Mutex::new(GainStage {
                volume: 1.0,
                active: None,
            })),
        })
    }
}

fn open_device(index: usize) -> Option<(OutputStream, OutputStreamHandle)> {
    let host = rodio::cpal::default_host();
    let device = match host.output_devices() {
        Ok(mut devices) => devices.nth(index),
        Err(e) => {
            warn!(error = %e, "Failed to enumerate audio devices, using default");
            return None;
        }
    };

    let Some(device) = device else {
        warn!(index, "Device index out of range, using default");
        return None;
    };

    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    match OutputStream::try_from_device(&device) {
        Ok(pair) => {
            info!(device = %name, index, "Using selected audio device");
            Some(pair)
        }
        Err(e) => {
            warn!(device = %name, error = %e, "Failed to open selected device, using default");
            None
        }
    }
}

impl AudioGraph for RodioGraph {
    type Source = RodioSource;

    fn current_time(&self) -> f64 {
        self.clock.secs()
    }

    fn create_source(&mut self, buffer: Arc<SampleBuffer>) -> Result<RodioSource, PlaybackError> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| PlaybackError::Device(format!("Failed to create audio sink: {}", e)))?;
        sink.pause();

        Ok(RodioSource {
            sink: Arc::new(sink),
            buffer,
            gain: Arc::clone(&self.gain),
            clock: Arc::clone(&self.clock),
            generation: self.clock.next_generation(),
        })
    }

    fn set_gain(&mut self, gain: f32) {
        let mut stage = self.gain.lock();
        stage.volume = gain;
        if let Some(sink) = stage.active.as_ref().and_then(Weak::upgrade) {
            sink.set_volume(gain);
        }
        debug!(volume = gain, "Gain updated");
    }
}

/// One sink playing one buffer
pub struct RodioSource {
    sink: Arc<Sink>,
    buffer: Arc<SampleBuffer>,
    gain: Arc<Mutex<GainStage>>,
    clock: Arc<FrameClock>,
    generation: u64,
}

impl SourceNode for RodioSource {
    fn start(&mut self, offset_secs: f64) {
        let mut stage = self.gain.lock();
        self.sink.set_volume(stage.volume);
        stage.active = Some(Arc::downgrade(&self.sink));
        drop(stage);

        let source = BufferSource::from_offset(Arc::clone(&self.buffer), offset_secs)
            .with_clock(Arc::clone(&self.clock), self.generation);
        self.sink.append(source);
        self.sink.play();

        debug!(
            offset_secs,
            channels = self.buffer.channel_count(),
            sample_rate = self.buffer.sample_rate(),
            "Source started"
        );
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for RodioSource {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
