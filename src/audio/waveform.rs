use super::buffer::SampleBuffer;
use super::selection::TimeRange;

/// Channel shown in the waveform display
pub const DISPLAY_CHANNEL: usize = 0;

/// Min/max of one display column
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

/// Everything a waveform renderer reads for one frame
#[derive(Debug, Clone, Copy)]
pub struct WaveformView<'a> {
    pub samples: &'a [f32],
    pub frame_count: usize,
    pub sample_rate: u32,
    pub selection: Option<TimeRange>,
    pub playhead_secs: f64,
}

impl<'a> WaveformView<'a> {
    pub fn new(buffer: &'a SampleBuffer, selection: Option<TimeRange>, playhead_secs: f64) -> Self {
        Self {
            samples: buffer.channel(DISPLAY_CHANNEL),
            frame_count: buffer.frame_count(),
            sample_rate: buffer.sample_rate(),
            selection,
            playhead_secs,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate as f64
    }

    /// Column for a time, `None` for an empty buffer
    pub fn column_for(&self, secs: f64, columns: usize) -> Option<usize> {
        let duration = self.duration_secs();
        if duration <= 0.0 || columns == 0 {
            return None;
        }
        let column = (secs / duration * columns as f64).floor().max(0.0) as usize;
        Some(column.min(columns - 1))
    }
}

/// Bucket samples into `columns` min/max pairs
///
/// Buckets split the samples as evenly as possible; a column with no samples
/// (more columns than samples) reads as silence.
pub fn peaks(samples: &[f32], columns: usize) -> Vec<Peak> {
    let len = samples.len();
    (0..columns)
        .map(|col| {
            let start = col * len / columns;
            let end = (col + 1) * len / columns;
            let bucket = &samples[start..end];
            if bucket.is_empty() {
                return Peak::default();
            }
            bucket.iter().fold(
                Peak {
                    min: f32::MAX,
                    max: f32::MIN,
                },
                |peak, &s| Peak {
                    min: peak.min.min(s),
                    max: peak.max.max(s),
                },
            )
        })
        .collect()
}

/// Time under display column `column` of `columns`
///
/// The first column is the start of the file and the last one its end, so
/// the whole duration is reachable with a pointer.
pub fn time_at_column(column: u16, columns: u16, duration_secs: f64) -> f64 {
    if columns <= 1 {
        return 0.0;
    }
    let last = (columns - 1) as f64;
    (column as f64 / last).clamp(0.0, 1.0) * duration_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peaks_even_buckets() {
        let samples = [0.1, -0.2, 0.5, 0.3, -0.9, 0.0];
        let result = peaks(&samples, 3);
        assert_eq!(
            result,
            vec![
                Peak { min: -0.2, max: 0.1 },
                Peak { min: 0.3, max: 0.5 },
                Peak { min: -0.9, max: 0.0 },
            ]
        );
    }

    #[test]
    fn test_peaks_more_columns_than_samples() {
        let result = peaks(&[0.5, -0.5], 4);
        assert_eq!(result.len(), 4);
        assert_eq!(result[0], Peak::default());
        assert_eq!(result[1], Peak { min: 0.5, max: 0.5 });
        assert_eq!(result[3], Peak { min: -0.5, max: -0.5 });
    }

    #[test]
    fn test_peaks_zero_columns() {
        assert!(peaks(&[0.1, 0.2], 0).is_empty());
    }

    #[test]
    fn test_view_columns() {
        let buffer = SampleBuffer::new(2, 100, 10).unwrap();
        let view = WaveformView::new(&buffer, None, 0.0);
        assert_eq!(view.duration_secs(), 10.0);
        assert_eq!(view.column_for(5.0, 80), Some(40));
        assert_eq!(view.column_for(10.0, 80), Some(79));
        assert_eq!(view.column_for(-1.0, 80), Some(0));

        let empty = SampleBuffer::new(1, 0, 10).unwrap();
        assert_eq!(WaveformView::new(&empty, None, 0.0).column_for(0.0, 80), None);
    }

    #[test]
    fn test_time_at_column_spans_whole_file() {
        assert_eq!(time_at_column(0, 81, 10.0), 0.0);
        assert_eq!(time_at_column(40, 81, 10.0), 5.0);
        assert_eq!(time_at_column(80, 81, 10.0), 10.0);
        assert_eq!(time_at_column(200, 81, 10.0), 10.0);
        assert_eq!(time_at_column(0, 1, 10.0), 0.0);
        assert_eq!(time_at_column(3, 0, 10.0), 0.0);
    }

    #[test]
    fn test_column_time_round_trip() {
        let buffer = SampleBuffer::new(1, 1000, 100).unwrap();
        let view = WaveformView::new(&buffer, None, 0.0);
        for column in 0..80u16 {
            let t = time_at_column(column, 80, view.duration_secs());
            assert_eq!(view.column_for(t, 80), Some(column as usize), "column {}", column);
        }
    }
}
