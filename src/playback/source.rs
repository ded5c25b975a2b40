use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::Source;

use crate::audio::SampleBuffer;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Time advanced by the output pulling frames, not by a wall clock
///
/// Only sources of the current generation move it, so a source that is
/// still draining after being replaced cannot skew the playhead.
#[derive(Debug, Default)]
pub struct FrameClock {
    nanos: AtomicU64,
    generation: AtomicU64,
}

impl FrameClock {
    pub fn secs(&self) -> f64 {
        self.nanos.load(Ordering::Acquire) as f64 / NANOS_PER_SEC as f64
    }

    /// Retire every existing source and return the new generation
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn advance(&self, generation: u64, nanos: u64) {
        if self.generation.load(Ordering::Acquire) == generation {
            self.nanos.fetch_add(nanos, Ordering::AcqRel);
        }
    }
}

/// Plays a shared buffer once, from a frame offset, interleaving channels
pub struct BufferSource {
    buffer: Arc<SampleBuffer>,
    /// Current frame
    frame: usize,
    /// Next channel within the current frame
    channel: usize,
    clock: Option<(Arc<FrameClock>, u64)>,
    /// Frames handed out so far
    played: u64,
}

impl BufferSource {
    pub fn new(buffer: Arc<SampleBuffer>) -> Self {
        Self::from_offset(buffer, 0.0)
    }

    /// Start `offset_secs` into the buffer
    pub fn from_offset(buffer: Arc<SampleBuffer>, offset_secs: f64) -> Self {
        let frame = buffer.frame_index(offset_secs);
        Self {
            buffer,
            frame,
            channel: 0,
            clock: None,
            played: 0,
        }
    }

    /// Advance `clock` by one frame period per frame played
    pub fn with_clock(mut self, clock: Arc<FrameClock>, generation: u64) -> Self {
        self.clock = Some((clock, generation));
        self
    }

    fn frame_done(&mut self) {
        self.frame += 1;
        let Some((clock, generation)) = &self.clock else {
            return;
        };
        // Cumulative rounding keeps the total exact over long runs
        let rate = self.buffer.sample_rate() as u64;
        let before = self.played * NANOS_PER_SEC / rate;
        self.played += 1;
        let after = self.played * NANOS_PER_SEC / rate;
        clock.advance(*generation, after - before);
    }

    fn remaining_samples(&self) -> usize {
        let remaining_frames = self.buffer.frame_count().saturating_sub(self.frame);
        (remaining_frames * self.buffer.channel_count()).saturating_sub(self.channel)
    }
}

impl Source for BufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.remaining_samples())
    }

    fn channels(&self) -> u16 {
        self.buffer.channel_count() as u16
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        let frames = self.buffer.frame_count().saturating_sub(self.frame);
        let secs = frames as f64 / self.buffer.sample_rate() as f64;
        Some(Duration::from_secs_f64(secs))
    }
}

impl Iterator for BufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.frame >= self.buffer.frame_count() {
            return None;
        }

        let sample = self.buffer.channel(self.channel)[self.frame];

        self.channel += 1;
        if self.channel == self.buffer.channel_count() {
            self.channel = 0;
            self.frame_done();
        }

        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining_samples();
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Arc<SampleBuffer> {
        Arc::new(SampleBuffer::from_channels(vec![left, right], sample_rate).unwrap())
    }

    #[test]
    fn test_source_plays_once_frame_major() {
        let buffer = stereo(vec![0.1, 0.2], vec![-0.1, -0.2], 10);
        let mut source = BufferSource::new(buffer);

        assert_eq!(source.channels(), 2);
        assert_eq!(source.current_frame_len(), Some(4));

        let output: Vec<f32> = std::iter::from_fn(|| source.next()).collect();
        assert_eq!(output, vec![0.1, -0.1, 0.2, -0.2]);
        assert!(source.next().is_none());
        assert_eq!(source.current_frame_len(), Some(0));
    }

    #[test]
    fn test_source_starts_at_offset() {
        let buffer = stereo(vec![0.0, 0.1, 0.2, 0.3], vec![0.0, -0.1, -0.2, -0.3], 10);
        let source = BufferSource::from_offset(buffer, 0.2);

        let duration = source.total_duration().unwrap();
        assert!((duration.as_secs_f64() - 0.2).abs() < 1e-9);

        let output: Vec<f32> = source.collect();
        assert_eq!(output, vec![0.2, -0.2, 0.3, -0.3]);
    }

    #[test]
    fn test_offset_past_end_is_silent() {
        let buffer = stereo(vec![0.5; 10], vec![0.5; 10], 10);
        let mut source = BufferSource::from_offset(buffer, 30.0);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_frame_clock_follows_frames_played() {
        let clock = Arc::new(FrameClock::default());
        let generation = clock.next_generation();
        let buffer = stereo(vec![0.0; 30], vec![0.0; 30], 3);

        let mut source = BufferSource::from_offset(buffer, 2.0).with_clock(Arc::clone(&clock), generation);
        // Half a frame does not move the clock
        source.next();
        assert_eq!(clock.secs(), 0.0);

        let rest = source.by_ref().count();
        assert_eq!(rest, 47);
        assert!((clock.secs() - 8.0).abs() < 1e-9, "clock at {}", clock.secs());
    }

    #[test]
    fn test_retired_source_does_not_move_clock() {
        let clock = Arc::new(FrameClock::default());
        let old = clock.next_generation();
        let buffer = Arc::new(SampleBuffer::from_channels(vec![vec![0.0; 10]], 10).unwrap());

        let mut draining = BufferSource::new(Arc::clone(&buffer)).with_clock(Arc::clone(&clock), old);
        draining.next();
        assert!((clock.secs() - 0.1).abs() < 1e-9);

        let current = clock.next_generation();
        draining.next();
        assert!((clock.secs() - 0.1).abs() < 1e-9);

        let mut playing = BufferSource::new(buffer).with_clock(Arc::clone(&clock), current);
        playing.next();
        assert!((clock.secs() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_source_keeps_old_buffer_alive() {
        let buffer = Arc::new(SampleBuffer::from_channels(vec![vec![0.25; 4]], 10).unwrap());
        let mut source = BufferSource::new(Arc::clone(&buffer));
        drop(buffer);
        assert_eq!(source.next(), Some(0.25));
    }
}
