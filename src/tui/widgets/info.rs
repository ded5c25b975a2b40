use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::audio::timecode::{format_clock, format_precise};
use crate::playback::TransportState;

/// Values shown in the info panel
pub struct InfoPanel {
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: usize,
    pub position_secs: f64,
    /// Either end may be set alone while typing times
    pub selection_start: Option<f64>,
    pub selection_end: Option<f64>,
    pub volume_percent: u32,
    pub state: TransportState,
    pub edits: u64,
}

/// Render the info panel
pub fn render(frame: &mut Frame, area: Rect, info: &InfoPanel) {
    let block = Block::default()
        .title(" Info ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Gray));

    let selection = match (info.selection_start, info.selection_end) {
        (Some(start), Some(end)) => Line::from(vec![
            label("Selection: "),
            Span::styled(
                format!("{} - {}", format_precise(start), format_precise(end)),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(format!(" ({:.3}s)", end - start), Style::default().fg(Color::DarkGray)),
        ]),
        (start, end) if start.is_some() || end.is_some() => {
            let show = |t: Option<f64>| t.map_or_else(|| "--:--.---".to_string(), format_precise);
            Line::from(vec![
                label("Selection: "),
                Span::styled(
                    format!("{} - {}", show(start), show(end)),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        _ => Line::from(vec![
            label("Selection: "),
            Span::styled("none (drag to select)", Style::default().fg(Color::DarkGray)),
        ]),
    };

    let channels = match info.channels {
        1 => "mono".to_string(),
        2 => "stereo".to_string(),
        n => format!("{} ch", n),
    };

    let lines = vec![
        Line::from(vec![
            label("Position: "),
            Span::styled(
                format!("{} / {}", format_precise(info.position_secs), format_clock(info.duration_secs)),
                Style::default().fg(Color::White).bold(),
            ),
        ]),
        selection,
        Line::from(vec![
            label("Format: "),
            Span::styled(
                format!("{} Hz, {}", info.sample_rate, channels),
                Style::default().fg(Color::Magenta),
            ),
        ]),
        Line::from(vec![
            label("Volume: "),
            Span::styled(format!("{}%", info.volume_percent), Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            label("Edits: "),
            Span::styled(info.edits.to_string(), Style::default().fg(Color::White)),
            Span::raw("  "),
            label("Transport: "),
            Span::styled(info.state.label(), Style::default().fg(state_color(info.state))),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

pub fn state_color(state: TransportState) -> Color {
    match state {
        TransportState::Stopped => Color::Gray,
        TransportState::Playing => Color::Green,
        TransportState::Paused => Color::Yellow,
    }
}
