use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::audio::timecode::parse_timecode;
use crate::audio::{ops, SampleBuffer, SelectionConfig, SelectionModel, TimeRange};
use crate::error::{EditError, WavecutError};

/// Edit operation kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOp {
    /// Keep the range, discard the rest
    Trim,
    /// Remove the range
    Delete,
    FadeIn,
    FadeOut,
    /// Multiply by a factor (amplify > 1, reduce < 1)
    Gain(f32),
    Normalize,
    Reverse,
}

impl EditOp {
    /// Operations that refuse to run without an explicit range
    pub fn requires_range(&self) -> bool {
        matches!(self, EditOp::Trim | EditOp::Delete | EditOp::FadeIn | EditOp::FadeOut)
    }

    /// Operations that produce a buffer of a different length
    pub fn changes_length(&self) -> bool {
        matches!(self, EditOp::Trim | EditOp::Delete)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditOp::Trim => "trim",
            EditOp::Delete => "delete",
            EditOp::FadeIn => "fade-in",
            EditOp::FadeOut => "fade-out",
            EditOp::Gain(_) => "gain",
            EditOp::Normalize => "normalize",
            EditOp::Reverse => "reverse",
        }
    }
}

/// An operation plus an optional explicit range (the selection is used otherwise)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditCommand {
    pub op: EditOp,
    pub range: Option<TimeRange>,
}

impl EditCommand {
    pub fn new(op: EditOp) -> Self {
        Self { op, range: None }
    }

    pub fn with_range(op: EditOp, range: TimeRange) -> Self {
        Self {
            op,
            range: Some(range),
        }
    }
}

impl fmt::Display for EditCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op.name())?;
        if let EditOp::Gain(factor) = self.op {
            write!(f, "={}", factor)?;
        }
        if let Some(range) = self.range {
            write!(f, "@{}-{}", range.start, range.end)?;
        }
        Ok(())
    }
}

/// `name[=value][@start-end]`, e.g. `fade-in@0-1.5`, `gain=150%`, `trim@0:02-0:04.250`
impl FromStr for EditCommand {
    type Err = WavecutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |msg: &str| WavecutError::Config(format!("invalid edit '{}': {}", s, msg));

        let (head, range) = match s.split_once('@') {
            Some((head, range)) => {
                let (start, end) = range
                    .split_once('-')
                    .ok_or_else(|| bad("range must be start-end"))?;
                let range = TimeRange::new(parse_timecode(start)?, parse_timecode(end)?);
                (head, Some(range))
            }
            None => (s, None),
        };

        let (name, value) = match head.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (head, None),
        };

        let op = match (name.trim().to_ascii_lowercase().as_str(), value) {
            ("trim", None) => EditOp::Trim,
            ("delete", None) => EditOp::Delete,
            ("fade-in", None) => EditOp::FadeIn,
            ("fade-out", None) => EditOp::FadeOut,
            ("normalize", None) => EditOp::Normalize,
            ("reverse", None) => EditOp::Reverse,
            ("gain", Some(value)) => {
                let factor = parse_gain(value).ok_or_else(|| bad("gain needs a factor or percentage"))?;
                EditOp::Gain(factor)
            }
            ("gain", None) => return Err(bad("gain needs a value, e.g. gain=1.5 or gain=150%")),
            (_, Some(_)) => return Err(bad("only gain takes a value")),
            _ => return Err(bad("unknown operation")),
        };

        Ok(match range {
            Some(range) => Self::with_range(op, range),
            None => Self::new(op),
        })
    }
}

/// `1.5` or `150%`
pub fn parse_gain(value: &str) -> Option<f32> {
    let value = value.trim();
    match value.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f32>().ok().map(|p| p / 100.0),
        None => value.parse().ok(),
    }
}

/// Result of a successful edit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditReport {
    pub op: EditOp,
    pub range: Option<TimeRange>,
    pub frames_before: usize,
    pub frames_after: usize,
}

/// One editing session over a loaded file
///
/// Owns the current buffer, the original kept for reset, and the selection.
/// Edits never touch a buffer that may be shared: each one builds a new
/// buffer and swaps the `Arc` in a single assignment, so a playback source
/// still holding the previous buffer keeps reading unchanged data.
pub struct EditSession {
    name: String,
    current: Arc<SampleBuffer>,
    original: Arc<SampleBuffer>,
    selection: SelectionModel,
    generation: u64,
}

impl EditSession {
    pub fn new(name: impl Into<String>, buffer: SampleBuffer, config: SelectionConfig) -> Self {
        let duration = buffer.duration_secs();
        let buffer = Arc::new(buffer);
        Self {
            name: name.into(),
            original: Arc::new((*buffer).clone()),
            current: buffer,
            selection: SelectionModel::new(config, duration),
            generation: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current buffer
    pub fn buffer(&self) -> &Arc<SampleBuffer> {
        &self.current
    }

    pub fn original(&self) -> &SampleBuffer {
        &self.original
    }

    /// Bumped every time the current buffer is replaced
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionModel {
        &mut self.selection
    }

    pub fn duration_secs(&self) -> f64 {
        self.current.duration_secs()
    }

    /// Validate, then apply an edit
    ///
    /// On error the buffer and selection are untouched.
    #[instrument(skip(self, command), fields(op = command.op.name()))]
    pub fn apply(&mut self, command: EditCommand) -> Result<EditReport, EditError> {
        let op = command.op;
        if let EditOp::Gain(factor) = op {
            if !(factor > 0.0 && factor.is_finite()) {
                return Err(EditError::InvalidGain(factor));
            }
        }

        let range = match command.range.or_else(|| self.selection.selection()) {
            Some(r) => Some(self.check_range(r)?),
            None if op.requires_range() => return Err(EditError::NoSelection),
            None => None,
        };

        let before = &self.current;
        let frames_before = before.frame_count();
        let bounds = range.map(|r| (r.start, r.end));
        let r = range.unwrap_or_else(|| TimeRange::new(0.0, before.duration_secs()));

        let next = match op {
            EditOp::Trim => ops::trim(before, r.start, r.end),
            EditOp::Delete => ops::delete(before, r.start, r.end),
            EditOp::FadeIn => edited_copy(before, |b| ops::fade_in(b, r.start, r.end)),
            EditOp::FadeOut => edited_copy(before, |b| ops::fade_out(b, r.start, r.end)),
            EditOp::Gain(factor) => edited_copy(before, |b| ops::gain(b, factor, r.start, r.end)),
            EditOp::Normalize => edited_copy(before, |b| ops::normalize(b, bounds)),
            EditOp::Reverse => edited_copy(before, |b| ops::reverse(b, bounds)),
        };

        let frames_after = next.frame_count();
        self.replace(next);

        if op.changes_length() {
            self.selection.clear();
        }

        info!(
            start = range.map(|r| r.start),
            end = range.map(|r| r.end),
            frames_before,
            frames_after,
            "Edit applied"
        );

        Ok(EditReport {
            op,
            range,
            frames_before,
            frames_after,
        })
    }

    /// Restore the buffer as it was when the file was loaded
    pub fn reset(&mut self) {
        info!("Resetting to original audio");
        self.replace((*self.original).clone());
        self.selection.clear();
    }

    fn replace(&mut self, buffer: SampleBuffer) {
        self.current = Arc::new(buffer);
        self.generation += 1;
        self.selection.set_duration(self.current.duration_secs());
        debug!(generation = self.generation, "Buffer replaced");
    }

    /// Clamp to the buffer and reject ranges that cover no frames
    fn check_range(&self, range: TimeRange) -> Result<TimeRange, EditError> {
        let range = range.clamp_to(self.current.duration_secs());
        let start = self.current.frame_index(range.start);
        let end = self.current.frame_index(range.end);
        if start >= end {
            return Err(EditError::DegenerateRange {
                start: range.start,
                end: range.end,
            });
        }
        Ok(range)
    }
}

/// Deep copy, then mutate the copy
fn edited_copy(buffer: &SampleBuffer, edit: impl FnOnce(&mut SampleBuffer)) -> SampleBuffer {
    let mut next = buffer.clone();
    edit(&mut next);
    next
}
