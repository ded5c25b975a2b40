use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::audio::SampleBuffer;
use crate::error::PlaybackError;

use super::graph::{AudioGraph, SourceNode};

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}

impl TransportState {
    pub fn label(&self) -> &'static str {
        match self {
            TransportState::Stopped => "Stopped",
            TransportState::Playing => "Playing",
            TransportState::Paused => "Paused",
        }
    }
}

/// Playback transport over an output graph
///
/// While playing, the position is always derived from the graph clock
/// (`now - started_at + from`), never accumulated per tick.
pub struct PlaybackClock<G: AudioGraph> {
    graph: G,
    buffer: Option<Arc<SampleBuffer>>,
    node: Option<G::Source>,
    state: TransportState,
    position_secs: f64,
    started_at: f64,
    from_secs: f64,
    volume: f32,
}

impl<G: AudioGraph> PlaybackClock<G> {
    pub fn new(mut graph: G, volume: f32) -> Self {
        let volume = volume.max(0.0);
        graph.set_gain(volume);
        Self {
            graph,
            buffer: None,
            node: None,
            state: TransportState::Stopped,
            position_secs: 0.0,
            started_at: 0.0,
            from_secs: 0.0,
            volume,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Position as of the last `tick` or transport change
    pub fn position(&self) -> f64 {
        self.position_secs
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn duration(&self) -> f64 {
        self.buffer.as_ref().map_or(0.0, |b| b.duration_secs())
    }

    /// Start playing `buffer` from `from_secs`
    #[instrument(skip(self, buffer))]
    pub fn play(
        &mut self,
        buffer: Option<Arc<SampleBuffer>>,
        from_secs: f64,
        volume: f32,
    ) -> Result<(), PlaybackError> {
        let buffer = buffer.ok_or(PlaybackError::NoBuffer)?;
        let from = from_secs.clamp(0.0, buffer.duration_secs());
        self.set_volume(volume);

        // The old node keeps playing until its replacement exists
        let mut node = match self.graph.create_source(Arc::clone(&buffer)) {
            Ok(node) => node,
            Err(e) => {
                self.halt();
                warn!(error = %e, position_secs = self.position_secs, "Could not create playback source");
                return Err(e);
            }
        };
        self.stop_node();

        self.started_at = self.graph.current_time();
        node.start(from);
        self.from_secs = from;
        self.position_secs = from;
        self.buffer = Some(buffer);
        self.node = Some(node);
        self.state = TransportState::Playing;

        info!(from_secs = from, volume = self.volume, "Playback started");
        Ok(())
    }

    /// Freeze at the current position; no-op unless playing
    pub fn pause(&mut self) {
        if self.state != TransportState::Playing {
            return;
        }
        self.position_secs = self.elapsed().min(self.duration());
        self.stop_node();
        self.state = TransportState::Paused;
        debug!(position_secs = self.position_secs, "Playback paused");
    }

    pub fn stop(&mut self) {
        self.stop_node();
        self.position_secs = 0.0;
        self.state = TransportState::Stopped;
        debug!("Playback stopped");
    }

    /// Move the playhead; a playing transport restarts from the new offset
    pub fn seek(&mut self, to_secs: f64) -> Result<(), PlaybackError> {
        let to = to_secs.clamp(0.0, self.duration());
        if self.state == TransportState::Playing {
            let buffer = self.buffer.clone();
            return self.play(buffer, to, self.volume);
        }
        self.position_secs = to;
        debug!(position_secs = to, "Playhead moved");
        Ok(())
    }

    /// Refresh the position from the graph clock, stopping at the end
    pub fn tick(&mut self) -> f64 {
        if self.state == TransportState::Playing {
            let duration = self.duration();
            let elapsed = self.elapsed();
            let drained = self.node.as_ref().is_some_and(SourceNode::is_finished);
            if elapsed >= duration || drained {
                self.stop_node();
                self.position_secs = duration;
                self.state = TransportState::Stopped;
                info!(duration_secs = duration, "Playback reached end of buffer");
            } else {
                self.position_secs = elapsed;
            }
        }
        self.position_secs
    }

    /// Adjust the gain stage without touching the transport
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
        self.graph.set_gain(self.volume);
    }

    /// Follow the session onto a new buffer
    ///
    /// A playing transport restarts on the new buffer from where it was,
    /// clamped to the new length; otherwise only the position is clamped.
    pub fn replace_buffer(&mut self, buffer: Arc<SampleBuffer>) -> Result<(), PlaybackError> {
        if let Some(current) = &self.buffer {
            if Arc::ptr_eq(current, &buffer) {
                return Ok(());
            }
        }

        let duration = buffer.duration_secs();
        if self.state == TransportState::Playing {
            let position = self.elapsed().min(duration);
            let restarted = self.play(Some(Arc::clone(&buffer)), position, self.volume);
            if restarted.is_err() {
                self.position_secs = self.position_secs.min(duration);
                self.buffer = Some(buffer);
            }
            return restarted;
        }

        self.position_secs = self.position_secs.min(duration);
        self.buffer = Some(buffer);
        Ok(())
    }

    fn elapsed(&self) -> f64 {
        self.graph.current_time() - self.started_at + self.from_secs
    }

    /// Leave Playing without a node: freeze the position and pause
    fn halt(&mut self) {
        if self.state == TransportState::Playing {
            self.position_secs = self.elapsed().clamp(0.0, self.duration());
            self.state = TransportState::Paused;
        }
        self.stop_node();
    }

    fn stop_node(&mut self) {
        if let Some(mut node) = self.node.take() {
            node.stop();
        }
    }
}

impl<G: AudioGraph> Drop for PlaybackClock<G> {
    fn drop(&mut self) {
        self.stop_node();
    }
}
