use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::Settings;
use crate::audio::timecode::{format_precise, parse_timecode};
use crate::audio::{PointerRelease, SampleBuffer};
use crate::error::{PlaybackError, WavecutError};
use crate::export::{ExportFormat, SavedExport};
use crate::playback::{AudioGraph, PlaybackClock};
use crate::session::{parse_gain, EditCommand, EditOp, EditSession};

use super::input::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

/// Footer message
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}

/// What a typed time is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    GoTo,
    SelectionStart,
    SelectionEnd,
    /// Factor or percentage applied to the selection
    Gain,
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::GoTo => "Go to",
            PromptKind::SelectionStart => "Selection start",
            PromptKind::SelectionEnd => "Selection end",
            PromptKind::Gain => "Gain",
        }
    }

    /// Accepted input, shown next to the entry
    pub fn hint(&self) -> &'static str {
        match self {
            PromptKind::Gain => "150% or 1.5",
            _ => "[[h:]m:]s[.mmm]",
        }
    }

    fn accepts(&self, c: char) -> bool {
        match self {
            PromptKind::Gain => c.is_ascii_digit() || matches!(c, '.' | '%' | '-'),
            _ => c.is_ascii_digit() || matches!(c, ':' | '.'),
        }
    }
}

/// Time entry in progress
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
}

/// A snapshot to hand to the export worker
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub buffer: Arc<SampleBuffer>,
    pub format: ExportFormat,
}

/// Editor state behind the terminal UI: session, transport and messages
pub struct Editor<G: AudioGraph> {
    session: EditSession,
    clock: PlaybackClock<G>,
    settings: Settings,
    export_format: ExportFormat,
    exporting: Option<ExportFormat>,
    message: Option<StatusMessage>,
    prompt: Option<Prompt>,
}

impl<G: AudioGraph> Editor<G> {
    pub fn new(
        session: EditSession,
        graph: G,
        settings: Settings,
        export_format: ExportFormat,
    ) -> Result<Self, PlaybackError> {
        let mut clock = PlaybackClock::new(graph, settings.volume);
        clock.replace_buffer(Arc::clone(session.buffer()))?;

        Ok(Self {
            session,
            clock,
            settings,
            export_format,
            exporting: None,
            message: None,
            prompt: None,
        })
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn clock(&self) -> &PlaybackClock<G> {
        &self.clock
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn exporting(&self) -> Option<ExportFormat> {
        self.exporting
    }

    pub fn export_format(&self) -> ExportFormat {
        self.export_format
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn prompt_input(&mut self, c: char) {
        if let Some(prompt) = self.prompt.as_mut() {
            if prompt.kind.accepts(c) {
                prompt.text.push(c);
            }
        }
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.text.pop();
        }
    }

    pub fn prompt_cancel(&mut self) {
        self.prompt = None;
    }

    /// Parse the typed time and apply it; a bad entry leaves everything as it was
    pub fn prompt_submit(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };

        if prompt.kind == PromptKind::Gain {
            self.typed_gain(&prompt.text);
            return;
        }

        match self.apply_typed_time(prompt.kind, &prompt.text) {
            Ok(secs) => {
                self.message = Some(StatusMessage::info(format!(
                    "{}: {}",
                    prompt.kind.label(),
                    format_precise(secs)
                )));
            }
            Err(e) => {
                warn!(kind = prompt.kind.label(), input = %prompt.text, error = %e, "Typed time rejected");
                self.fail(e.to_string());
            }
        }
    }

    /// Advance the playhead from the graph clock
    pub fn tick(&mut self) -> f64 {
        self.clock.tick()
    }

    /// Run an action; returns an export request when one should be started
    pub fn perform(&mut self, action: Action) -> Option<ExportRequest> {
        debug!(?action, "Editor action");
        match action {
            Action::TogglePlay => self.toggle_play(),
            Action::Stop => self.clock.stop(),
            Action::SeekBack => self.seek_by(-self.settings.seek_step_secs),
            Action::SeekForward => self.seek_by(self.settings.seek_step_secs),
            Action::VolumeUp => {
                self.settings.volume_up();
                self.apply_volume();
            }
            Action::VolumeDown => {
                self.settings.volume_down();
                self.apply_volume();
            }
            Action::Edit(op) => self.edit(op),
            Action::ClearSelection => {
                self.session.selection_mut().clear();
                self.message = None;
            }
            Action::Reset => {
                self.session.reset();
                self.follow_buffer();
                self.message = Some(StatusMessage::info("Reset to original audio"));
            }
            Action::Prompt(kind) => {
                self.prompt = Some(Prompt {
                    kind,
                    text: String::new(),
                });
            }
            Action::Export => return self.request_export(self.export_format),
            Action::ExportWav => return self.request_export(ExportFormat::Wav),
            Action::Quit => {}
        }
        None
    }

    /// Left button pressed at `time`, pointer column `x`
    pub fn pointer_down(&mut self, time: f64, x: f64) {
        self.session.selection_mut().begin(time, x);
    }

    pub fn pointer_drag(&mut self, time: f64, x: f64) {
        self.session.selection_mut().update(time, x);
    }

    /// Left button released: a click seeks, a drag selects
    pub fn pointer_up(&mut self) {
        match self.session.selection_mut().end_gesture() {
            PointerRelease::Click(time) => {
                if let Err(e) = self.clock.seek(time) {
                    self.fail(e.to_string());
                }
            }
            PointerRelease::Selected(range) => {
                self.message = Some(StatusMessage::info(format!(
                    "Selected {} - {} ({:.3}s)",
                    format_precise(range.start),
                    format_precise(range.end),
                    range.duration()
                )));
            }
            PointerRelease::Discarded | PointerRelease::Idle => {}
        }
    }

    pub fn export_started(&mut self, format: ExportFormat) {
        self.message = Some(StatusMessage::info(format!(
            "Exporting {}...",
            format.extension().to_uppercase()
        )));
    }

    pub fn export_finished(&mut self, saved: &SavedExport) {
        self.exporting = None;
        let note = if saved.fell_back {
            " (compressed export failed, wrote WAV)"
        } else {
            ""
        };
        self.message = Some(StatusMessage::info(format!(
            "Saved {} [{}, {} bytes]{}",
            saved.path.display(),
            saved.mime_type,
            saved.bytes,
            note
        )));
    }

    pub fn export_failed(&mut self, error: String) {
        self.exporting = None;
        self.fail(error);
    }

    fn toggle_play(&mut self) {
        if self.clock.is_playing() {
            self.clock.pause();
            return;
        }

        // Replay from the top once the playhead has reached the end
        let position = self.clock.position();
        let from = if position >= self.session.duration_secs() {
            0.0
        } else {
            position
        };

        let buffer = Some(Arc::clone(self.session.buffer()));
        if let Err(e) = self.clock.play(buffer, from, self.settings.volume) {
            self.fail(e.to_string());
        }
    }

    /// Rejected factors (unparseable, zero or negative) leave the buffer untouched
    fn typed_gain(&mut self, text: &str) {
        match parse_gain(text) {
            Some(factor) => self.edit(EditOp::Gain(factor)),
            None => {
                warn!(input = %text, "Typed gain rejected");
                self.fail(format!("Gain needs a factor or percentage like 150%, got '{}'", text));
            }
        }
    }

    fn apply_typed_time(&mut self, kind: PromptKind, text: &str) -> Result<f64, WavecutError> {
        let secs = parse_timecode(text)?;
        match kind {
            PromptKind::GoTo => {
                self.session.selection().check_in_range(secs)?;
                self.clock.seek(secs)?;
            }
            PromptKind::SelectionStart => self.session.selection_mut().set_start(secs)?,
            PromptKind::SelectionEnd => self.session.selection_mut().set_end(secs)?,
            PromptKind::Gain => {}
        }
        Ok(secs)
    }

    fn seek_by(&mut self, delta: f64) {
        let target = self.clock.position() + delta;
        if let Err(e) = self.clock.seek(target) {
            self.fail(e.to_string());
        }
    }

    fn apply_volume(&mut self) {
        self.clock.set_volume(self.settings.volume);
        self.message = Some(StatusMessage::info(format!(
            "Volume {}%",
            self.settings.volume_percent()
        )));
    }

    fn edit(&mut self, op: EditOp) {
        match self.session.apply(EditCommand::new(op)) {
            Ok(report) => {
                self.follow_buffer();
                let text = match report.range {
                    Some(range) => format!(
                        "{} applied to {} - {}",
                        op.name(),
                        format_precise(range.start),
                        format_precise(range.end)
                    ),
                    None => format!("{} applied to the whole file", op.name()),
                };
                self.message = Some(StatusMessage::info(text));
            }
            Err(e) => {
                warn!(op = op.name(), error = %e, "Edit rejected");
                self.fail(e.to_string());
            }
        }
    }

    /// Point the transport at the session's current buffer
    fn follow_buffer(&mut self) {
        if let Err(e) = self.clock.replace_buffer(Arc::clone(self.session.buffer())) {
            self.fail(e.to_string());
        }
    }

    fn request_export(&mut self, format: ExportFormat) -> Option<ExportRequest> {
        if let Some(running) = self.exporting {
            self.message = Some(StatusMessage::error(format!(
                "Already exporting {}",
                running.extension().to_uppercase()
            )));
            return None;
        }

        info!(format = format.extension(), "Export requested");
        self.exporting = Some(format);
        Some(ExportRequest {
            buffer: Arc::clone(self.session.buffer()),
            format,
        })
    }

    fn fail(&mut self, text: String) {
        self.message = Some(StatusMessage::error(text));
    }
}
