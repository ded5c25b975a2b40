//! Destructive sample transforms.
//!
//! Each operation converts its time arguments with
//! [`SampleBuffer::frame_index`] and quietly does nothing when the clamped
//! range is inverted. Request validation (selection present, range not
//! empty) happens in the edit session before any of these run.

use super::buffer::{clip, SampleBuffer};

/// Peak level reached by [`normalize`] (5% headroom)
pub const NORMALIZE_TARGET: f32 = 0.95;

/// Multiply samples in `[start, end)` by `factor`, hard-clipping to `[-1, 1]`
pub fn gain(buffer: &mut SampleBuffer, factor: f32, start_secs: f64, end_secs: f64) {
    let Some(range) = buffer.frame_range(start_secs, end_secs) else {
        return;
    };

    for channel in buffer.channels_mut() {
        for sample in &mut channel[range.clone()] {
            *sample = clip(*sample * factor);
        }
    }
}

/// Scale the region so its peak sits at [`NORMALIZE_TARGET`]
///
/// Whole buffer when `range` is `None`. Silence is left alone.
pub fn normalize(buffer: &mut SampleBuffer, range: Option<(f64, f64)>) {
    let Some(frames) = resolve(buffer, range) else {
        return;
    };

    let peak = buffer
        .channels()
        .iter()
        .flat_map(|c| c[frames.clone()].iter())
        .fold(0.0f32, |peak, s| peak.max(s.abs()));
    if peak <= 0.0 {
        return;
    }

    let factor = NORMALIZE_TARGET / peak;
    for channel in buffer.channels_mut() {
        for sample in &mut channel[frames.clone()] {
            *sample = clip(*sample * factor);
        }
    }
}

/// Reverse sample order inside the region; whole buffer when `range` is `None`
pub fn reverse(buffer: &mut SampleBuffer, range: Option<(f64, f64)>) {
    let Some(frames) = resolve(buffer, range) else {
        return;
    };

    for channel in buffer.channels_mut() {
        channel[frames.clone()].reverse();
    }
}

/// Linear ramp 0 -> 1 across the region
pub fn fade_in(buffer: &mut SampleBuffer, start_secs: f64, end_secs: f64) {
    apply_ramp(buffer, start_secs, end_secs, |progress| progress);
}

/// Linear ramp 1 -> 0 across the region
pub fn fade_out(buffer: &mut SampleBuffer, start_secs: f64, end_secs: f64) {
    apply_ramp(buffer, start_secs, end_secs, |progress| 1.0 - progress);
}

/// Keep only `[start, end)`, discarding the rest
pub fn trim(buffer: &SampleBuffer, start_secs: f64, end_secs: f64) -> SampleBuffer {
    let Some(range) = buffer.frame_range(start_secs, end_secs) else {
        return buffer.clone();
    };

    let mut out = buffer.clone();
    for (dst, src) in out.channels_mut().iter_mut().zip(buffer.channels()) {
        *dst = src[range.clone()].to_vec();
    }
    out
}

/// Remove `[start, end)` and join what remains on either side
pub fn delete(buffer: &SampleBuffer, start_secs: f64, end_secs: f64) -> SampleBuffer {
    let Some(range) = buffer.frame_range(start_secs, end_secs) else {
        return buffer.clone();
    };

    let new_len = buffer.frame_count() - range.len();
    let mut out = buffer.clone();
    for (dst, src) in out.channels_mut().iter_mut().zip(buffer.channels()) {
        let mut joined = Vec::with_capacity(new_len);
        joined.extend_from_slice(&src[..range.start]);
        joined.extend_from_slice(&src[range.end..]);
        *dst = joined;
    }
    out
}

fn resolve(buffer: &SampleBuffer, range: Option<(f64, f64)>) -> Option<std::ops::Range<usize>> {
    match range {
        Some((start, end)) => buffer.frame_range(start, end),
        None => Some(0..buffer.frame_count()),
    }
}

fn apply_ramp(buffer: &mut SampleBuffer, start_secs: f64, end_secs: f64, curve: impl Fn(f32) -> f32) {
    let Some(range) = buffer.frame_range(start_secs, end_secs) else {
        return;
    };
    if range.is_empty() {
        return;
    }

    let len = range.len() as f32;
    for channel in buffer.channels_mut() {
        for i in range.clone() {
            let progress = (i - range.start) as f32 / len;
            channel[i] *= curve(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn sine_buffer(channels: usize, frames: usize, sample_rate: u32, amplitude: f32) -> SampleBuffer {
        let data = (0..channels)
            .map(|c| {
                (0..frames)
                    .map(|i| {
                        let t = i as f32 / sample_rate as f32;
                        (440.0 * std::f32::consts::TAU * t + c as f32).sin() * amplitude
                    })
                    .collect()
            })
            .collect();
        SampleBuffer::from_channels(data, sample_rate).unwrap()
    }

    fn ramp_buffer(frames: usize) -> SampleBuffer {
        let data: Vec<f32> = (0..frames).map(|i| i as f32 / frames as f32).collect();
        SampleBuffer::from_channels(vec![data.clone(), data.iter().map(|s| -s).collect()], 10).unwrap()
    }

    #[test]
    fn test_gain_clips_to_full_scale() {
        let mut buffer = SampleBuffer::from_channels(vec![vec![0.6, -0.6, 0.2]], 3).unwrap();
        let duration = buffer.duration_secs();
        gain(&mut buffer, 2.0, 0.0, duration);
        assert_eq!(buffer.channel(0), &[1.0, -1.0, 0.4]);
    }

    #[test]
    fn test_gain_output_always_in_range() {
        let mut rng = rand::thread_rng();
        let data: Vec<f32> = (0..4096).map(|_| rng.gen_range(-1.0..=1.0)).collect();
        for _ in 0..20 {
            let factor: f32 = rng.gen_range(0.01..50.0);
            let mut buffer = SampleBuffer::from_channels(vec![data.clone()], 4096).unwrap();
            gain(&mut buffer, factor, 0.0, 1.0);
            assert!(
                buffer.channel(0).iter().all(|s| (-1.0..=1.0).contains(s)),
                "factor {} produced a sample outside [-1, 1]",
                factor
            );
        }
    }

    #[test]
    fn test_gain_only_touches_region() {
        let mut buffer = SampleBuffer::from_channels(vec![vec![0.5; 10]], 10).unwrap();
        gain(&mut buffer, 0.5, 0.2, 0.5);
        assert_eq!(
            buffer.channel(0),
            &[0.5, 0.5, 0.25, 0.25, 0.25, 0.5, 0.5, 0.5, 0.5, 0.5]
        );
    }

    #[test]
    fn test_normalize_reaches_target_peak() {
        let mut buffer = sine_buffer(2, 4_800, 48_000, 0.3);
        normalize(&mut buffer, None);
        assert!((buffer.peak() - NORMALIZE_TARGET).abs() < 1e-6, "peak was {}", buffer.peak());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut buffer = sine_buffer(2, 4_800, 48_000, 0.4);
        normalize(&mut buffer, None);
        let once = buffer.clone();
        normalize(&mut buffer, None);

        for (a, b) in once.channels().iter().zip(buffer.channels()) {
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-6, "sample drifted from {} to {}", x, y);
            }
        }
    }

    #[test]
    fn test_normalize_silence_is_noop() {
        let mut buffer = SampleBuffer::new(1, 100, 100).unwrap();
        normalize(&mut buffer, Some((0.1, 0.5)));
        assert!(buffer.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_normalize_region_uses_region_peak() {
        let mut buffer = SampleBuffer::from_channels(vec![vec![0.9, 0.1, 0.2, 0.9]], 4).unwrap();
        normalize(&mut buffer, Some((0.25, 0.75)));
        let data = buffer.channel(0);
        assert_eq!(data[0], 0.9);
        assert_eq!(data[3], 0.9);
        assert!((data[2] - 0.95).abs() < 1e-6);
        assert!((data[1] - 0.475).abs() < 1e-6);
    }

    #[test]
    fn test_reverse_is_self_inverse() {
        let original = ramp_buffer(100);
        let mut buffer = original.clone();
        reverse(&mut buffer, Some((2.0, 7.5)));
        assert_ne!(buffer, original);
        reverse(&mut buffer, Some((2.0, 7.5)));
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_reverse_leaves_outside_untouched() {
        let original = ramp_buffer(100);
        let mut buffer = original.clone();
        reverse(&mut buffer, Some((2.0, 7.5)));

        for (before, after) in original.channels().iter().zip(buffer.channels()) {
            assert_eq!(before[..20], after[..20]);
            assert_eq!(before[75..], after[75..]);
            assert_eq!(after[20], before[74]);
            assert_eq!(after[74], before[20]);
        }
    }

    #[test]
    fn test_fade_in_scenario() {
        let sample_rate = 44_100;
        let mut buffer = SampleBuffer::from_channels(vec![vec![0.5; 10 * sample_rate as usize]], sample_rate).unwrap();
        let before = buffer.clone();

        fade_in(&mut buffer, 2.0, 4.0);

        let at_start = buffer.frame_index(2.0);
        let near_end = buffer.frame_index(3.999);
        assert!(buffer.channel(0)[at_start].abs() < 1e-6);
        assert!((buffer.channel(0)[near_end] - before.channel(0)[near_end]).abs() < 1e-3);
        // Outside the region nothing changes
        assert_eq!(buffer.channel(0)[at_start - 1], 0.5);
        assert_eq!(buffer.channel(0)[buffer.frame_index(4.0)], 0.5);

        let trimmed = trim(&buffer, 2.0, 4.0);
        assert_eq!(trimmed.frame_count(), 88_200);
    }

    #[test]
    fn test_fade_out_ramps_down() {
        let mut buffer = SampleBuffer::from_channels(vec![vec![1.0; 4]], 4).unwrap();
        fade_out(&mut buffer, 0.0, 1.0);
        assert_eq!(buffer.channel(0), &[1.0, 0.75, 0.5, 0.25]);
    }

    #[test]
    fn test_fade_degenerate_is_noop() {
        let original = ramp_buffer(10);
        let mut buffer = original.clone();
        fade_in(&mut buffer, 0.5, 0.5);
        fade_out(&mut buffer, 0.7, 0.2);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_trim_length_per_channel() {
        let buffer = ramp_buffer(100);
        let trimmed = trim(&buffer, 1.0, 3.5);
        assert_eq!(trimmed.frame_count(), 25);
        assert_eq!(trimmed.channel_count(), 2);
        assert_eq!(trimmed.channel(0), &buffer.channel(0)[10..35]);
        assert_eq!(trimmed.channel(1), &buffer.channel(1)[10..35]);
    }

    #[test]
    fn test_trim_and_delete_are_complementary() {
        let buffer = ramp_buffer(100);
        let kept = trim(&buffer, 3.0, 6.0);
        let removed = delete(&buffer, 3.0, 6.0);

        assert_eq!(kept.frame_count() + removed.frame_count(), buffer.frame_count());
        for c in 0..buffer.channel_count() {
            let mut rebuilt = removed.channel(c)[..30].to_vec();
            rebuilt.extend_from_slice(kept.channel(c));
            rebuilt.extend_from_slice(&removed.channel(c)[30..]);
            assert_eq!(rebuilt, buffer.channel(c));
        }
    }

    #[test]
    fn test_trim_inverted_range_returns_copy() {
        let buffer = ramp_buffer(10);
        assert_eq!(trim(&buffer, 0.8, 0.2), buffer);
        assert_eq!(delete(&buffer, 0.8, 0.2), buffer);
    }

    #[test]
    fn test_ranges_clamp_to_buffer() {
        let buffer = ramp_buffer(10);
        let removed = delete(&buffer, 0.5, 100.0);
        assert_eq!(removed.frame_count(), 5);
        assert_eq!(trim(&buffer, -3.0, 0.35).frame_count(), 3);
    }
}
