use ratatui::prelude::*;
use ratatui::widgets::{Block, Widget};

use crate::audio::timecode::{format_clock, ruler_interval};
use crate::audio::waveform::{peaks, WaveformView};

const WAVE_CHAR: char = '█';
const PLAYHEAD_CHAR: char = '┃';

/// Waveform with selection highlight, playhead and a time ruler on the last row
pub struct Waveform<'a> {
    view: WaveformView<'a>,
    block: Option<Block<'a>>,
}

impl<'a> Waveform<'a> {
    pub fn new(view: WaveformView<'a>) -> Self {
        Self { view, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for Waveform<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };

        if inner.height < 2 || inner.width == 0 {
            return;
        }

        let wave = Rect {
            height: inner.height - 1,
            ..inner
        };
        render_wave(&self.view, wave, buf);
        render_ruler(&self.view, inner.x, inner.bottom() - 1, inner.width, buf);
    }
}

fn render_wave(view: &WaveformView<'_>, area: Rect, buf: &mut Buffer) {
    let columns = area.width as usize;
    let selection = view.selection.and_then(|range| {
        Some((
            view.column_for(range.start, columns)?,
            view.column_for(range.end, columns)?,
        ))
    });
    let playhead = view.column_for(view.playhead_secs, columns);

    for (col, peak) in peaks(view.samples, columns).iter().enumerate() {
        let x = area.x + col as u16;
        let selected = selection.is_some_and(|(start, end)| col >= start && col <= end);
        let top = amplitude_row(peak.max, area.height);
        let bottom = amplitude_row(peak.min, area.height);

        for row in 0..area.height {
            let Some(cell) = buf.cell_mut((x, area.y + row)) else {
                continue;
            };

            let mut style = Style::default();
            if selected {
                style = style.bg(Color::Blue);
            }

            if playhead == Some(col) {
                cell.set_char(PLAYHEAD_CHAR);
                style = style.fg(Color::Red);
            } else if row >= top && row <= bottom {
                cell.set_char(WAVE_CHAR);
                style = style.fg(if selected { Color::Yellow } else { Color::Cyan });
            } else {
                cell.set_char(' ');
            }
            cell.set_style(style);
        }
    }
}

fn render_ruler(view: &WaveformView<'_>, x: u16, y: u16, width: u16, buf: &mut Buffer) {
    let duration = view.duration_secs();
    let columns = width as usize;
    let interval = ruler_interval(duration);
    let style = Style::default().fg(Color::DarkGray);

    // First column still free for a label
    let mut free = 0usize;
    let mut t = 0.0;
    while t <= duration {
        if let Some(col) = view.column_for(t, columns) {
            let label = format_clock(t);
            if col >= free && col + label.len() <= columns {
                buf.set_string(x + col as u16, y, &label, style);
                free = col + label.len() + 1;
            }
        }
        t += interval;
    }
}

/// Row for an amplitude, row 0 at +1.0
fn amplitude_row(amplitude: f32, height: u16) -> u16 {
    let span = height.saturating_sub(1) as f32;
    ((1.0 - amplitude.clamp(-1.0, 1.0)) / 2.0 * span).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SampleBuffer, TimeRange};

    fn render(view: WaveformView<'_>, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        Waveform::new(view).render(area, &mut buf);
        buf
    }

    fn symbol(buf: &Buffer, x: u16, y: u16) -> String {
        buf.cell((x, y)).map(|c| c.symbol().to_string()).unwrap_or_default()
    }

    #[test]
    fn test_amplitude_rows() {
        assert_eq!(amplitude_row(1.0, 9), 0);
        assert_eq!(amplitude_row(0.0, 9), 4);
        assert_eq!(amplitude_row(-1.0, 9), 8);
        assert_eq!(amplitude_row(5.0, 9), 0);
        assert_eq!(amplitude_row(0.5, 1), 0);
    }

    #[test]
    fn test_playhead_and_selection_are_drawn() {
        // 20 s at 1 Hz, full-scale
        let buffer = SampleBuffer::from_channels(vec![vec![1.0; 20]], 1).unwrap();
        let selection = Some(TimeRange::new(0.0, 5.0));
        let view = WaveformView::new(&buffer, selection, 10.0);
        let buf = render(view, 20, 6);

        assert_eq!(symbol(&buf, 10, 0), PLAYHEAD_CHAR.to_string());
        assert_eq!(buf.cell((10, 0)).map(|c| c.fg), Some(Color::Red));
        assert_eq!(buf.cell((2, 0)).map(|c| c.bg), Some(Color::Blue));
        assert_eq!(buf.cell((15, 0)).map(|c| c.bg), Some(Color::Reset));
        assert_eq!(symbol(&buf, 15, 0), WAVE_CHAR.to_string());
    }

    #[test]
    fn test_ruler_labels_do_not_overlap() {
        let buffer = SampleBuffer::new(1, 30, 1).unwrap();
        let view = WaveformView::new(&buffer, None, 0.0);
        let buf = render(view, 30, 3);

        let ruler: String = (0..30).map(|x| symbol(&buf, x, 2)).collect();
        assert!(ruler.starts_with("00:00"));
        assert!(ruler.contains("00:06"));
        assert!(!ruler.contains("00:01"));
    }

    #[test]
    fn test_tiny_area_is_ignored() {
        let buffer = SampleBuffer::new(1, 10, 1).unwrap();
        let view = WaveformView::new(&buffer, None, 0.0);
        let buf = render(view, 10, 1);
        assert_eq!(symbol(&buf, 0, 0), " ");
    }
}
