//! Time-range selection driven by pointer gestures or typed timecodes.

use tracing::debug;

use crate::error::TimecodeError;

/// Half-open time range `[start, end)` in seconds, always `start <= end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    /// Build a range from two times in any order
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Clamp both ends into `[0, duration]`
    pub fn clamp_to(&self, duration: f64) -> Self {
        Self::new(self.start.clamp(0.0, duration), self.end.clamp(0.0, duration))
    }
}

/// Gesture tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    /// Pointer travel (in pointer units) that turns a press into a drag
    pub drag_threshold: f64,
    /// Drag selections at or below this length (seconds) are discarded
    pub min_duration: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            min_duration: 0.1,
        }
    }
}

/// What a pointer release meant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerRelease {
    /// No gesture was in progress
    Idle,
    /// The pointer never travelled past the threshold: seek to this time
    Click(f64),
    /// The drag produced a selection
    Selected(TimeRange),
    /// The drag was too short to keep
    Discarded,
}

#[derive(Debug, Clone, Copy)]
struct Anchor {
    time: f64,
    x: f64,
    dragging: bool,
}

/// Selection state for the loaded buffer
#[derive(Debug, Clone)]
pub struct SelectionModel {
    config: SelectionConfig,
    duration: f64,
    start: Option<f64>,
    end: Option<f64>,
    anchor: Option<Anchor>,
}

impl SelectionModel {
    pub fn new(config: SelectionConfig, duration: f64) -> Self {
        Self {
            config,
            duration: duration.max(0.0),
            start: None,
            end: None,
            anchor: None,
        }
    }

    /// The published selection, if both ends are set
    pub fn selection(&self) -> Option<TimeRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(TimeRange { start, end }),
            _ => None,
        }
    }

    pub fn start(&self) -> Option<f64> {
        self.start
    }

    pub fn end(&self) -> Option<f64> {
        self.end
    }

    /// Pointer pressed: remember the anchor and drop any previous selection
    pub fn begin(&mut self, time: f64, x: f64) {
        self.clear();
        self.anchor = Some(Anchor {
            time: self.bound(time),
            x,
            dragging: false,
        });
    }

    /// Pointer moved: publish `[min(anchor, now), max(anchor, now))` once dragging
    pub fn update(&mut self, time: f64, x: f64) -> Option<TimeRange> {
        let threshold = self.config.drag_threshold;
        let now = self.bound(time);
        let anchor = self.anchor.as_mut()?;

        if !anchor.dragging && (x - anchor.x).abs() > threshold {
            anchor.dragging = true;
        }
        if !anchor.dragging {
            return None;
        }

        let range = TimeRange::new(anchor.time, now);
        self.publish(range);
        Some(range)
    }

    /// Pointer released
    pub fn end_gesture(&mut self) -> PointerRelease {
        let Some(anchor) = self.anchor.take() else {
            return PointerRelease::Idle;
        };

        if !anchor.dragging {
            self.clear();
            return PointerRelease::Click(anchor.time);
        }

        match self.selection() {
            Some(range) if range.duration() > self.config.min_duration => {
                debug!(start = range.start, end = range.end, "Selection made");
                PointerRelease::Selected(range)
            }
            _ => {
                self.clear();
                PointerRelease::Discarded
            }
        }
    }

    /// Drop the selection and any gesture in progress
    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
        self.anchor = None;
    }

    /// Set the selection start from a typed time
    pub fn set_start(&mut self, time: f64) -> Result<(), TimecodeError> {
        self.check_in_range(time)?;
        self.start = Some(time);
        self.normalize();
        Ok(())
    }

    /// Set the selection end from a typed time
    pub fn set_end(&mut self, time: f64) -> Result<(), TimecodeError> {
        self.check_in_range(time)?;
        self.end = Some(time);
        self.normalize();
        Ok(())
    }

    /// Replace the selection outright (clamped to the buffer)
    #[cfg(test)]
    pub fn select(&mut self, range: TimeRange) {
        self.anchor = None;
        self.publish(range.clamp_to(self.duration));
    }

    /// Rebind to a buffer of a new length, clamping a stored selection
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        self.anchor = None;
        if let Some(range) = self.selection() {
            self.publish(range.clamp_to(self.duration));
        } else {
            self.start = self.start.map(|t| t.min(self.duration));
            self.end = self.end.map(|t| t.min(self.duration));
        }
    }

    pub fn check_in_range(&self, time: f64) -> Result<(), TimecodeError> {
        if !(0.0..=self.duration).contains(&time) {
            return Err(TimecodeError::OutOfRange {
                time,
                duration: self.duration,
            });
        }
        Ok(())
    }

    fn publish(&mut self, range: TimeRange) {
        self.start = Some(range.start);
        self.end = Some(range.end);
    }

    fn normalize(&mut self) {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                self.start = Some(end);
                self.end = Some(start);
            }
        }
    }

    fn bound(&self, time: f64) -> f64 {
        time.clamp(0.0, self.duration)
    }
}
