use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::audio::waveform::{time_at_column, WaveformView};
use crate::error::TuiError;
use crate::playback::{RodioGraph, TransportState};
use crate::tasks::{ExportCommand, ExportEvent};

use super::editor::{Editor, MessageLevel, Prompt, StatusMessage};
use super::input::{action_for, Action};
use super::widgets::info::{self, InfoPanel};
use super::widgets::waveform::Waveform;

/// Terminal front end for one editing session
pub struct TuiApp {
    editor: Editor<RodioGraph>,
    cmd_tx: mpsc::Sender<ExportCommand>,
    out_dir: PathBuf,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Inner waveform area from the last draw, for mouse hit testing
    waveform_area: Rect,
}

impl TuiApp {
    pub fn new(
        editor: Editor<RodioGraph>,
        cmd_tx: mpsc::Sender<ExportCommand>,
        out_dir: PathBuf,
    ) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            editor,
            cmd_tx,
            out_dir,
            terminal,
            waveform_area: Rect::default(),
        })
    }

    /// Restore terminal state
    fn restore_terminal(&mut self) -> Result<(), TuiError> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Update the playhead from the audio clock
    pub fn tick(&mut self) {
        self.editor.tick();
    }

    /// Apply an event from the export worker
    pub fn handle_export_event(&mut self, event: ExportEvent) {
        match event {
            ExportEvent::Started(format) => self.editor.export_started(format),
            ExportEvent::Finished(saved) => self.editor.export_finished(&saved),
            ExportEvent::Failed(message) => self.editor.export_failed(message),
            ExportEvent::Shutdown => debug!("Export worker stopped"),
        }
    }

    /// Handle keyboard and mouse input (non-blocking)
    pub async fn handle_input(&mut self) -> Result<bool, TuiError> {
        if !event::poll(Duration::from_millis(16))? {
            return Ok(false);
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press && self.editor.prompt().is_some() => {
                self.handle_prompt_key(key);
            }
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let Some(action) = action_for(key) else {
                    return Ok(false);
                };
                if action == Action::Quit {
                    info!("Quit requested");
                    let _ = self.cmd_tx.send(ExportCommand::Quit).await;
                    return Ok(true);
                }
                if let Some(request) = self.editor.perform(action) {
                    let command = ExportCommand::Export {
                        buffer: request.buffer,
                        format: request.format,
                        target: self.out_dir.clone(),
                    };
                    if self.cmd_tx.send(command).await.is_err() {
                        self.editor.export_failed("Export worker is not running".into());
                    }
                }
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }

        Ok(false)
    }

    /// Keys while a time is being typed
    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.editor.prompt_submit(),
            KeyCode::Esc => self.editor.prompt_cancel(),
            KeyCode::Backspace => self.editor.prompt_backspace(),
            KeyCode::Char(c) => self.editor.prompt_input(c),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let area = self.waveform_area;
        if area.width == 0 {
            return;
        }

        let column = mouse.column.saturating_sub(area.x);
        let time = time_at_column(column, area.width, self.editor.session().duration_secs());
        let x = mouse.column as f64;

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let inside = area.contains(Position::new(mouse.column, mouse.row));
                if inside {
                    self.editor.pointer_down(time, x);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => self.editor.pointer_drag(time, x),
            MouseEventKind::Up(MouseButton::Left) => self.editor.pointer_up(),
            _ => {}
        }
    }

    /// Draw the TUI
    pub fn draw(&mut self) -> Result<(), TuiError> {
        let editor = &self.editor;
        let session = editor.session();
        let buffer = session.buffer();
        let clock = editor.clock();

        let view = WaveformView::new(buffer, session.selection().selection(), clock.position());
        let panel = InfoPanel {
            duration_secs: buffer.duration_secs(),
            sample_rate: buffer.sample_rate(),
            channels: buffer.channel_count(),
            position_secs: clock.position(),
            selection_start: session.selection().start(),
            selection_end: session.selection().end(),
            volume_percent: editor.settings().volume_percent(),
            state: clock.state(),
            edits: session.generation(),
        };
        let exporting = editor.exporting().map(|f| f.extension().to_uppercase());
        let export_key = editor.export_format().extension().to_uppercase();
        let message = editor.message().cloned();
        let prompt = editor.prompt().cloned();
        let name = session.name().to_string();

        let mut waveform_area = self.waveform_area;

        self.terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: header, waveform, info, footer
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2), // Header
                    Constraint::Min(8),    // Waveform
                    Constraint::Length(6), // Info
                    Constraint::Length(2), // Footer
                ])
                .split(area);

            render_header(frame, chunks[0], &name, panel.state, exporting.as_deref());

            let block = Block::default()
                .title(" Waveform ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray));
            let inner = block.inner(chunks[1]);
            // Last inner row is the time ruler
            waveform_area = Rect {
                height: inner.height.saturating_sub(1),
                ..inner
            };
            frame.render_widget(Waveform::new(view).block(block), chunks[1]);

            info::render(frame, chunks[2], &panel);
            match &prompt {
                Some(prompt) => render_prompt(frame, chunks[3], prompt),
                None => render_footer(frame, chunks[3], message.as_ref(), &export_key),
            }
        })?;

        self.waveform_area = waveform_area;
        Ok(())
    }

    /// Run cleanup on drop
    pub fn cleanup(&mut self) {
        if let Err(e) = self.restore_terminal() {
            error!(error = %e, "Failed to restore terminal");
        }
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Render the header bar
fn render_header(
    frame: &mut Frame,
    area: Rect,
    name: &str,
    state: TransportState,
    exporting: Option<&str>,
) {
    let mut spans = vec![
        Span::styled(" wavecut ", Style::default().bold().fg(Color::Cyan)),
        Span::raw("| "),
        Span::styled(state.label().to_uppercase(), Style::default().fg(info::state_color(state))),
        Span::raw(" | "),
        Span::styled(name.to_string(), Style::default().fg(Color::White)),
    ];
    if let Some(format) = exporting {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("exporting {}", format),
            Style::default().fg(Color::Yellow).italic(),
        ));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(Line::from(spans)).block(block).centered();
    frame.render_widget(paragraph, area);
}

/// Render the time entry line in place of the footer
fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt) {
    let line = Line::from(vec![
        Span::styled(format!("{} ", prompt.kind.label()), Style::default().fg(Color::Cyan)),
        Span::styled(format!("{}: ", prompt.kind.hint()), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{}_", prompt.text), Style::default().fg(Color::White).bold()),
        Span::styled("  enter:apply  esc:cancel", Style::default().fg(Color::DarkGray)),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Paragraph::new(line).block(block).centered(), area);
}

/// Render the footer with controls, or the last message
fn render_footer(frame: &mut Frame, area: Rect, message: Option<&StatusMessage>, export_key: &str) {
    let line = match message {
        Some(StatusMessage {
            level: MessageLevel::Error,
            text,
        }) => Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red)),
            Span::styled(text.clone(), Style::default().fg(Color::Red)),
        ]),
        Some(StatusMessage { text, .. }) => Line::from(Span::styled(text.clone(), Style::default().fg(Color::Green))),
        None => {
            let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
            Line::from(vec![
                key("space"),
                Span::raw(":play  "),
                key("s"),
                Span::raw(":stop  "),
                key("←/→"),
                Span::raw(":seek  "),
                key("+/-"),
                Span::raw(":vol  "),
                key("t/x"),
                Span::raw(":trim/del  "),
                key("i/o"),
                Span::raw(":fade  "),
                key("[/]/G"),
                Span::raw(":gain  "),
                key("n/r"),
                Span::raw(":norm/rev  "),
                key("g/a/b"),
                Span::raw(":goto/start/end  "),
                key("c/R"),
                Span::raw(":clear/reset  "),
                key("e"),
                Span::raw(format!(":{}  ", export_key)),
                key("w"),
                Span::raw(":wav  "),
                key("q"),
                Span::raw(":quit"),
            ])
        }
    };

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(line).block(block).centered();
    frame.render_widget(paragraph, area);
}
