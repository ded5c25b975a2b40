use std::ops::Range;

use crate::error::EditError;

/// Decoded multi-channel PCM audio
///
/// One vector per channel, all of equal length. Every committed sample lies
/// in `[-1.0, 1.0]`. `Clone` is a deep copy, so two buffers never share
/// channel storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Per-channel samples (f32, -1.0 to 1.0)
    channels: Vec<Vec<f32>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl SampleBuffer {
    /// Allocate a silent buffer
    pub fn new(channel_count: usize, frame_count: usize, sample_rate: u32) -> Result<Self, EditError> {
        check_dimensions(channel_count, sample_rate)?;
        Ok(Self {
            channels: vec![vec![0.0; frame_count]; channel_count],
            sample_rate,
        })
    }

    /// Build a buffer from per-channel samples, hard-clipping every value
    pub fn from_channels(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, EditError> {
        check_dimensions(channels.len(), sample_rate)?;

        let expected = channels[0].len();
        for (channel, data) in channels.iter().enumerate() {
            if data.len() != expected {
                return Err(EditError::ChannelLengthMismatch {
                    channel,
                    len: data.len(),
                    expected,
                });
            }
        }

        for data in &mut channels {
            for sample in data.iter_mut() {
                *sample = clip(*sample);
            }
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Build a buffer from interleaved (frame-major) samples
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Result<Self, EditError> {
        check_dimensions(channel_count, sample_rate)?;

        let frame_count = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frame_count); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self::from_channels(channels, sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Frame index for a time: `floor(secs * sample_rate)` clamped to `[0, frame_count]`
    pub fn frame_index(&self, secs: f64) -> usize {
        let frame = (secs * self.sample_rate as f64).floor();
        if frame.is_nan() || frame <= 0.0 {
            0
        } else {
            (frame as usize).min(self.frame_count())
        }
    }

    /// Frame range for a time range, `None` when the clamped start is past the clamped end
    pub fn frame_range(&self, start_secs: f64, end_secs: f64) -> Option<Range<usize>> {
        let start = self.frame_index(start_secs);
        let end = self.frame_index(end_secs);
        (start <= end).then_some(start..end)
    }

    /// Interleave channels frame-major (frame 0 ch 0, frame 0 ch 1, ...)
    pub fn interleaved(&self) -> Vec<f32> {
        let channel_count = self.channel_count();
        let mut out = Vec::with_capacity(self.frame_count() * channel_count);
        for frame in 0..self.frame_count() {
            for channel in &self.channels {
                out.push(channel[frame]);
            }
        }
        out
    }

    /// Largest absolute sample value over all channels
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}

fn check_dimensions(channel_count: usize, sample_rate: u32) -> Result<(), EditError> {
    if channel_count < 1 || sample_rate == 0 {
        return Err(EditError::InvalidDimension {
            channels: channel_count,
            sample_rate,
        });
    }
    Ok(())
}

/// Hard-clip to `[-1.0, 1.0]`
#[inline]
pub fn clip(sample: f32) -> f32 {
    sample.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_silent() {
        let buffer = SampleBuffer::new(2, 100, 44_100).unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 100);
        assert!(buffer.channels().iter().all(|c| c.iter().all(|&s| s == 0.0)));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert_eq!(
            SampleBuffer::new(0, 10, 44_100),
            Err(EditError::InvalidDimension {
                channels: 0,
                sample_rate: 44_100
            })
        );
        assert!(SampleBuffer::new(1, 10, 0).is_err());
        assert!(SampleBuffer::from_channels(vec![], 48_000).is_err());
    }

    #[test]
    fn test_zero_frames_allowed() {
        let buffer = SampleBuffer::new(1, 0, 8_000).unwrap();
        assert_eq!(buffer.frame_count(), 0);
        assert_eq!(buffer.duration_secs(), 0.0);
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let err = SampleBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 8_000).unwrap_err();
        assert_eq!(
            err,
            EditError::ChannelLengthMismatch {
                channel: 1,
                len: 3,
                expected: 4
            }
        );
    }

    #[test]
    fn test_from_channels_clips() {
        let buffer = SampleBuffer::from_channels(vec![vec![1.5, -2.0, 0.25]], 8_000).unwrap();
        assert_eq!(buffer.channel(0), &[1.0, -1.0, 0.25]);
    }

    #[test]
    fn test_interleave_round_trip() {
        let interleaved = vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = SampleBuffer::from_interleaved(&interleaved, 2, 8_000).unwrap();
        assert_eq!(buffer.channel(0), &[0.1, 0.2, 0.3]);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2, -0.3]);
        assert_eq!(buffer.interleaved(), interleaved);
    }

    #[test]
    fn test_clone_does_not_alias() {
        let original = SampleBuffer::from_channels(vec![vec![0.5; 8]], 8_000).unwrap();
        let mut copy = original.clone();
        copy.channels_mut()[0][0] = -0.5;
        assert_eq!(original.channel(0)[0], 0.5);
        assert_eq!(copy.channel(0)[0], -0.5);
    }

    #[test]
    fn test_frame_index_floors_and_clamps() {
        let buffer = SampleBuffer::new(1, 44_100, 44_100).unwrap();
        assert_eq!(buffer.frame_index(0.5), 22_050);
        assert_eq!(buffer.frame_index(0.000_01), 0);
        assert_eq!(buffer.frame_index(-1.0), 0);
        assert_eq!(buffer.frame_index(5.0), 44_100);
        assert_eq!(buffer.frame_range(0.5, 0.25), None);
        assert_eq!(buffer.frame_range(0.25, 9.0), Some(11_025..44_100));
    }

    #[test]
    fn test_duration_and_peak() {
        let buffer = SampleBuffer::from_channels(vec![vec![0.1, -0.7], vec![0.3, 0.2]], 2).unwrap();
        assert_eq!(buffer.duration_secs(), 1.0);
        assert_eq!(buffer.peak(), 0.7);
    }
}
