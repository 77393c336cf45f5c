//! Mixer strips: one row per track with flags, fader values and a meter

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph},
    Frame,
};

use saavy_studio::dsp::amplify::gain_to_db;

use super::UiState;

/// Width of the label column.
const LABEL_WIDTH: u16 = 48;

pub fn render_mixer(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().title(" Mixer ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.tracks.is_empty() {
        let empty = Paragraph::new(" no tracks").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let rows = state.tracks.len().min(inner.height as usize);
    // Keep the selection on screen
    let first = state.selected.saturating_sub(rows.saturating_sub(1));

    for (row, track) in state.tracks.iter().skip(first).take(rows).enumerate() {
        let index = first + row;
        let line_area = Rect {
            y: inner.y + row as u16,
            height: 1,
            ..inner
        };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(LABEL_WIDTH), Constraint::Min(10)])
            .split(line_area);

        let selected = index == state.selected;
        let name_style = if selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        let flag = |on: bool, text: &'static str, color: Color| {
            if on {
                Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
            } else {
                Span::styled(text, Style::default().fg(Color::DarkGray))
            }
        };

        let label = Line::from(vec![
            Span::styled(format!(" {:<14.14} ", track.name), name_style),
            flag(track.mute, " M", Color::Yellow),
            flag(track.solo, " S ", Color::Green),
            Span::styled(
                format!("vol {} ", volume_label(track.volume)),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("pan {:>+4.1} ", track.pan),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("{}c", track.clip_count),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(label), columns[0]);

        let level = track.meter_value.clamp(0.0, 1.0) as f64;
        let color = match level {
            l if l > 0.8 => Color::Red,
            l if l > 0.5 => Color::Yellow,
            _ => Color::Green,
        };
        let meter = LineGauge::default()
            .filled_style(Style::default().fg(color))
            .unfilled_style(Style::default().fg(Color::DarkGray))
            .label("")
            .ratio(level);
        frame.render_widget(meter, columns[1]);
    }
}

/// Fader value in dB, `-inf` at silence.
fn volume_label(volume: f32) -> String {
    let db = gain_to_db(volume);
    if db.is_finite() {
        format!("{db:>+5.1}dB")
    } else {
        " -inf dB".to_string()
    }
}
